//! Document model: drafts, pages, scene objects, groups, and their primitives.
//!
//! A [`Draft`] owns an ordered list of [`Page`]s. Each page owns its objects
//! (array order is the default z-order) and the groups scoped to it. Groups
//! reference objects by id and objects point back at their group through
//! `group_id`; the two sides are kept consistent by every mutation here and by
//! the grouping controller in [`crate::group`].
//!
//! Data flows into this layer from the persistence layer (JSON
//! deserialization), from tool factories (`upsert`), and from the transform
//! engine (geometry mutations). Everything is plain nested records with ids
//! instead of pointers so the tree serializes without cycles.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clip::ClipImage;
use crate::dynamic::DynamicContent;
use crate::edit::{Edit, EditRecorder};
use crate::error::{PreconditionError, SceneResult};
use crate::geom::{Point, Rect};
use crate::project::{self, PageSize, RelBox};

/// Identifier of a scene object. Stable for the object's lifetime.
pub type ObjectId = String;

/// Identifier of a group, unique within its page.
pub type GroupId = String;

/// Generate a fresh object or group id.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================
// Object payloads
// =============================================================

/// Coarse z-order bucket. `Back` objects draw beneath all `Front` objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Back,
    #[default]
    Front,
}

/// How an image fills its box before any manual pan/zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Typography shared by plain and rich text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub color: String,
    pub align: TextAlign,
    pub bold: bool,
    pub italic: bool,
    pub line_height: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Inter".into(),
            font_size: 16.0,
            color: "#111111".into(),
            align: TextAlign::Left,
            bold: false,
            italic: false,
            line_height: 1.2,
        }
    }
}

/// One styled span of a rich paragraph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub style: TextStyle,
    /// Data-bound placeholder; when present the renderer shows the resolved value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicContent>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichTextBody {
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBody {
    pub src: String,
    #[serde(default)]
    pub fit: ImageFit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rect,
    RoundRect,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fill {
    Solid { color: String },
    Gradient { angle: f64, stops: Vec<GradientStop> },
}

impl Default for Fill {
    fn default() -> Self {
        Self::Solid { color: "#D9D9D9".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeBody {
    #[serde(default)]
    pub kind: ShapeKind,
    #[serde(default)]
    pub fill: Fill,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    #[serde(default)]
    pub corner_radius: f64,
}

/// A shape whose outline clips an independently pannable/zoomable image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipShapeBody {
    #[serde(flatten)]
    pub shape: ShapeBody,
    pub image: ClipImage,
}

/// Type-specific payload, tagged by `type` in the draft format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectBody {
    Text(TextBody),
    #[serde(alias = "paragraph")]
    Richtext(RichTextBody),
    Image(ImageBody),
    Shape(ShapeBody),
    ClipShape(ClipShapeBody),
}

impl ObjectBody {
    /// The `type` tag as written in the draft.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Richtext(_) => "richtext",
            Self::Image(_) => "image",
            Self::Shape(_) => "shape",
            Self::ClipShape(_) => "clip_shape",
        }
    }
}

fn default_opacity() -> f64 {
    1.0
}

// =============================================================
// SceneObject
// =============================================================

/// One placeable visual element on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    /// Left edge of the unrotated box in page pixels.
    pub x: f64,
    /// Top edge of the unrotated box in page pixels.
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Clockwise rotation in degrees around the box center. Not normalized.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_rel: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_rel: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w_rel: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_rel: Option<f64>,
    #[serde(default)]
    pub layer: Layer,
    /// Back-reference to the owning group. The group owns the membership list.
    #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(flatten)]
    pub body: ObjectBody,
}

impl SceneObject {
    /// Build an ungrouped, unrotated, fully opaque object on the front layer.
    #[must_use]
    pub fn new(id: impl Into<ObjectId>, rect: Rect, body: ObjectBody) -> Self {
        Self {
            id: id.into(),
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            rotation: 0.0,
            opacity: 1.0,
            x_rel: None,
            y_rel: None,
            w_rel: None,
            h_rel: None,
            layer: Layer::Front,
            group_id: None,
            body,
        }
    }

    /// The absolute, unrotated box.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    #[must_use]
    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// The stored relative box, if all four fractions are present.
    #[must_use]
    pub fn rel_box(&self) -> Option<RelBox> {
        Some(RelBox { x: self.x_rel?, y: self.y_rel?, w: self.w_rel?, h: self.h_rel? })
    }

    pub fn set_rel_box(&mut self, rel: Option<RelBox>) {
        self.x_rel = rel.map(|r| r.x);
        self.y_rel = rel.map(|r| r.y);
        self.w_rel = rel.map(|r| r.w);
        self.h_rel = rel.map(|r| r.h);
    }

    /// Re-derive the relative box from the absolute one.
    pub fn refresh_relative(&mut self, page: PageSize) {
        self.set_rel_box(Some(project::to_relative(&self.rect(), page)));
    }

    #[must_use]
    pub fn clip_image(&self) -> Option<&ClipImage> {
        match &self.body {
            ObjectBody::ClipShape(c) => Some(&c.image),
            _ => None,
        }
    }

    pub fn clip_image_mut(&mut self) -> Option<&mut ClipImage> {
        match &mut self.body {
            ObjectBody::ClipShape(c) => Some(&mut c.image),
            _ => None,
        }
    }
}

/// Sparse update for a scene object. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
    /// Replacement payload. May change the object's type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<ObjectBody>,
}

impl PartialObject {
    fn touches_geometry(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.w.is_some() || self.h.is_some()
    }

    fn apply(&self, obj: &mut SceneObject) {
        if let Some(x) = self.x {
            obj.x = x;
        }
        if let Some(y) = self.y {
            obj.y = y;
        }
        if let Some(w) = self.w {
            obj.w = w;
        }
        if let Some(h) = self.h {
            obj.h = h;
        }
        if let Some(r) = self.rotation {
            obj.rotation = r;
        }
        if let Some(o) = self.opacity {
            obj.opacity = o.clamp(0.0, 1.0);
        }
        if let Some(layer) = self.layer {
            obj.layer = layer;
        }
        if let Some(ref body) = self.body {
            obj.body = body.clone();
        }
    }
}

// =============================================================
// Group / Page / Draft
// =============================================================

/// A non-nested aggregation of two or more objects on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(rename = "childIds")]
    pub child_ids: Vec<ObjectId>,
}

/// One page of a draft. Identified by its index in [`Draft::pages`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<GroupId, Group>,
    /// Pixel size reported by the page renderer. Never persisted.
    #[serde(skip)]
    pub size: Option<PageSize>,
}

impl Page {
    #[must_use]
    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    /// The group an object belongs to, if any.
    #[must_use]
    pub fn group_of(&self, object_id: &str) -> Option<&Group> {
        let gid = self.object(object_id)?.group_id.as_ref()?;
        self.groups.get(gid)
    }

    /// Re-derive every object's relative box from its absolute box.
    pub fn refresh_all_relative(&mut self) {
        if let Some(size) = self.size {
            for obj in &mut self.objects {
                obj.refresh_relative(size);
            }
        }
    }

    /// Record the renderer's pixel size for this page.
    ///
    /// Stored relative boxes are authoritative: an absolute box is re-derived
    /// when the size differs from a previously known one, or when it is more
    /// than a pixel away from its relative box (a draft saved at another
    /// size). Objects with no relative box get one computed from their
    /// absolute box. Returns how many objects were touched.
    pub fn attach_size(&mut self, size: PageSize) -> usize {
        let resized = self.size.is_some_and(|old| old != size);
        self.size = Some(size);
        let mut touched = 0;
        for obj in &mut self.objects {
            match obj.rel_box() {
                Some(rel) => {
                    let derived = project::to_absolute(&rel, size);
                    if resized || !derived.within(&obj.rect(), 1.0) {
                        obj.set_rect(derived);
                        touched += 1;
                    }
                }
                None => {
                    obj.refresh_relative(size);
                    touched += 1;
                }
            }
        }
        debug!(width = size.width, height = size.height, resized, touched, "page size attached");
        touched
    }

    /// Check the object-id and group-membership invariants.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateObjectId` or `GroupMembership` describing the first violation.
    pub fn validate(&self) -> Result<(), PreconditionError> {
        let mut seen = HashSet::new();
        for obj in &self.objects {
            if !seen.insert(obj.id.as_str()) {
                return Err(PreconditionError::DuplicateObjectId(obj.id.clone()));
            }
        }

        let mut claimed: HashSet<&str> = HashSet::new();
        for (gid, group) in &self.groups {
            if gid != &group.id {
                return Err(PreconditionError::GroupMembership(format!("group key {gid} holds group {}", group.id)));
            }
            if group.child_ids.len() < 2 {
                return Err(PreconditionError::GroupMembership(format!("group {gid} has fewer than 2 members")));
            }
            for child in &group.child_ids {
                let Some(obj) = self.object(child) else {
                    return Err(PreconditionError::GroupMembership(format!("group {gid} lists missing object {child}")));
                };
                if obj.group_id.as_deref() != Some(gid.as_str()) {
                    return Err(PreconditionError::GroupMembership(format!(
                        "object {child} is listed by group {gid} but does not point back"
                    )));
                }
                if !claimed.insert(child.as_str()) {
                    return Err(PreconditionError::GroupMembership(format!("object {child} is listed twice")));
                }
            }
        }

        for obj in &self.objects {
            if obj.group_id.is_some() && !claimed.contains(obj.id.as_str()) {
                return Err(PreconditionError::GroupMembership(format!(
                    "object {} points at a group that does not list it",
                    obj.id
                )));
            }
        }
        Ok(())
    }

    /// Drop `object_id` from its group; dissolve the group when fewer than 2 remain.
    fn detach_from_group(&mut self, object_id: &str, gid: &str) {
        let Some(group) = self.groups.get_mut(gid) else {
            return;
        };
        group.child_ids.retain(|c| c != object_id);
        if group.child_ids.len() < 2 {
            let remaining = std::mem::take(&mut group.child_ids);
            self.groups.remove(gid);
            for child in remaining {
                if let Some(obj) = self.object_mut(&child) {
                    obj.group_id = None;
                }
            }
            info!(group = gid, "group dissolved after losing members");
        }
    }
}

/// The root persisted scene document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Monotonic counter bumped on every committed edit.
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Draft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a draft from its JSON form and check its invariants.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDraft` for unparsable JSON, or the first invariant
    /// violation found by [`Draft::validate`].
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let draft: Draft = serde_json::from_str(json)
            .map_err(|e| PreconditionError::MalformedDraft(e.to_string()))?;
        draft.validate()?;
        Ok(draft)
    }

    /// Check every page's invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), PreconditionError> {
        self.pages.iter().try_for_each(Page::validate)
    }

    /// Page `index`, created (along with any missing pages before it) if absent.
    pub fn page_or_create(&mut self, index: usize) -> &mut Page {
        if self.pages.len() <= index {
            self.pages.resize_with(index + 1, Page::default);
        }
        &mut self.pages[index]
    }

    /// # Errors
    ///
    /// Returns `PageNotFound` when the page does not exist.
    pub fn page(&self, index: usize) -> Result<&Page, PreconditionError> {
        self.pages.get(index).ok_or(PreconditionError::PageNotFound(index))
    }

    /// # Errors
    ///
    /// Returns `PageNotFound` when the page does not exist.
    pub fn page_mut(&mut self, index: usize) -> Result<&mut Page, PreconditionError> {
        self.pages.get_mut(index).ok_or(PreconditionError::PageNotFound(index))
    }

    /// All objects of a page in array order.
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` when the page does not exist.
    pub fn objects(&self, page: usize) -> Result<&[SceneObject], PreconditionError> {
        Ok(&self.page(page)?.objects)
    }

    /// # Errors
    ///
    /// Returns `PageNotFound` or `ObjectNotFound`.
    pub fn find_object(&self, page: usize, id: &str) -> Result<&SceneObject, PreconditionError> {
        self.page(page)?
            .object(id)
            .ok_or_else(|| PreconditionError::ObjectNotFound { page, id: id.to_string() })
    }

    /// # Errors
    ///
    /// Returns `PageNotFound` or `ObjectNotFound`.
    pub fn find_object_mut(&mut self, page: usize, id: &str) -> Result<&mut SceneObject, PreconditionError> {
        self.page_mut(page)?
            .object_mut(id)
            .ok_or_else(|| PreconditionError::ObjectNotFound { page, id: id.to_string() })
    }

    /// Insert `obj` if its id is new on the page, otherwise merge it into the
    /// existing record in place (keeping its id, array position, and group).
    ///
    /// Group membership is owned by the grouping controller: a new object must
    /// arrive ungrouped, and an update must not change `group_id`.
    ///
    /// # Errors
    ///
    /// Returns `GroupMembership` when the incoming `group_id` would break the
    /// membership invariant. The page is left unchanged.
    pub fn upsert(&mut self, page_index: usize, mut obj: SceneObject) -> SceneResult<Edit> {
        let current = self.pages.get(page_index).and_then(|p| p.object(&obj.id));
        match current {
            Some(existing) if obj.group_id.is_some() && obj.group_id != existing.group_id => {
                return Err(PreconditionError::GroupMembership(format!(
                    "upsert cannot move object {} between groups",
                    obj.id
                ))
                .into());
            }
            None if obj.group_id.is_some() => {
                return Err(PreconditionError::GroupMembership(format!(
                    "new object {} cannot join a group on insert",
                    obj.id
                ))
                .into());
            }
            _ => {}
        }

        let page = self.page_or_create(page_index);
        let recorder = EditRecorder::begin(page_index, page);
        let size = page.size;

        if let Some(existing) = page.object_mut(&obj.id) {
            obj.group_id.clone_from(&existing.group_id);
            if obj.rel_box().is_none() {
                obj.set_rel_box(existing.rel_box());
            }
            let geometry_changed = existing.rect() != obj.rect();
            *existing = obj;
            if let Some(size) = size {
                if geometry_changed || existing.rel_box().is_none() {
                    existing.refresh_relative(size);
                }
            }
            debug!(page = page_index, id = %existing.id, "object updated");
        } else {
            if let Some(size) = size {
                obj.refresh_relative(size);
            }
            debug!(page = page_index, id = %obj.id, "object inserted");
            page.objects.push(obj);
        }

        Ok(self.finish(recorder))
    }

    /// Merge a sparse update into an existing object.
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` or `ObjectNotFound`.
    pub fn apply_partial(&mut self, page_index: usize, id: &str, partial: &PartialObject) -> SceneResult<Edit> {
        let page = self.page_mut(page_index)?;
        let recorder = EditRecorder::begin(page_index, page);
        let size = page.size;
        let obj = page
            .object_mut(id)
            .ok_or_else(|| PreconditionError::ObjectNotFound { page: page_index, id: id.to_string() })?;
        partial.apply(obj);
        if let Some(size) = size {
            if partial.touches_geometry() {
                obj.refresh_relative(size);
            }
        }
        Ok(self.finish(recorder))
    }

    /// Delete an object and repair group membership.
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` or `ObjectNotFound`; the page is left unchanged.
    pub fn remove(&mut self, page_index: usize, id: &str) -> SceneResult<Edit> {
        self.remove_many(page_index, &[id.to_string()])
    }

    /// Delete several objects at once as a single edit.
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound`, or `ObjectNotFound` for the first missing id
    /// (checked before anything is removed).
    pub fn remove_many(&mut self, page_index: usize, ids: &[ObjectId]) -> SceneResult<Edit> {
        let page = self.page_mut(page_index)?;
        if let Some(missing) = ids.iter().find(|id| page.object(id).is_none()) {
            return Err(PreconditionError::ObjectNotFound { page: page_index, id: missing.clone() }.into());
        }

        let recorder = EditRecorder::begin(page_index, page);
        for id in ids {
            let Some(index) = page.index_of(id) else {
                continue;
            };
            let removed = page.objects.remove(index);
            if let Some(gid) = removed.group_id.as_deref() {
                page.detach_from_group(id, gid);
            }
            info!(page = page_index, %id, "object deleted");
        }
        Ok(self.finish(recorder))
    }

    /// Move an object between the back and front z-order buckets.
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` or `ObjectNotFound`.
    pub fn set_layer(&mut self, page_index: usize, id: &str, layer: Layer) -> SceneResult<Edit> {
        self.apply_partial(page_index, id, &PartialObject { layer: Some(layer), ..Default::default() })
    }

    /// Close an edit and bump the version when it changed anything.
    pub(crate) fn finish(&mut self, recorder: EditRecorder) -> Edit {
        let edit = match self.pages.get(recorder.page()) {
            Some(page) => recorder.finish(page),
            None => Edit::empty(recorder.page()),
        };
        if !edit.is_empty() {
            self.version += 1;
        }
        edit
    }
}
