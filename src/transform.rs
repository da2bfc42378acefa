//! Transform engine: move, resize and rotate driven by pointer drags.
//!
//! A transform runs `Idle -> Moving | Resizing | Rotating -> Idle`. Each
//! pointer move is applied to the draft immediately (a "live" change); the
//! transform ends with [`TransformEngine::end`], which refreshes relative
//! boxes and returns the reversible [`Edit`] for the whole gesture.
//!
//! Every update is computed from the state captured at begin (start pointer,
//! original boxes), never from the previous update, so coalesced or repeated
//! pointer events land on the same result.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::config::{EngineConfig, SnapOp};
use crate::consts::EPSILON;
use crate::doc::{Draft, GroupId, ObjectId, Page};
use crate::edit::{Edit, EditRecorder};
use crate::error::{GeometryError, PreconditionError, SceneError, SceneResult};
use crate::geom::{Point, Rect, angle_deg, quantize, rotate_vector};
use crate::group;
use crate::hit::Handle;
use crate::input::Modifiers;
use crate::snap::{self, Guides};

// =============================================================
// Pure math
// =============================================================

/// Options for [`resize_box`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    /// Keep the original width/height ratio.
    pub aspect_lock: bool,
    /// Grow and shrink about the center instead of the opposite handle.
    pub symmetric: bool,
    /// Floor for either dimension.
    pub min_size: f64,
}

/// New unrotated box after dragging `handle` by the world-space `delta`.
///
/// The delta is rotated into the object's local frame, only the dimensions
/// the handle controls change, and the result is placed so that the opposite
/// handle (or the center, when symmetric) stays fixed in world space. Sizes
/// are clamped to `min_size`, never rejected.
#[must_use]
pub fn resize_box(orig: Rect, rotation: f64, handle: Handle, delta: Point, opts: ResizeOptions) -> Rect {
    let (sx, sy) = handle.signs();
    let local = rotate_vector(delta, -rotation);
    let min = opts.min_size.max(0.0);

    let mut w = orig.w + sx * local.x;
    let mut h = orig.h + sy * local.y;

    if opts.aspect_lock && orig.w > 0.0 && orig.h > 0.0 {
        let ratio = orig.w / orig.h;
        let width_drives = if sx == 0.0 {
            false
        } else if sy == 0.0 {
            true
        } else {
            (w - orig.w).abs() >= (h - orig.h).abs()
        };
        if width_drives {
            w = w.max(min);
            h = w / ratio;
        } else {
            h = h.max(min);
            w = h * ratio;
        }
        if w > 0.0 && h > 0.0 {
            let k = (min / w).max(min / h).max(1.0);
            w *= k;
            h *= k;
        }
    }
    w = w.max(min);
    h = h.max(min);

    let center = if opts.symmetric {
        orig.center()
    } else {
        let anchor = Point::new(-sx * orig.w * 0.5, -sy * orig.h * 0.5);
        let local_center = anchor + Point::new(sx * w * 0.5, sy * h * 0.5);
        orig.center() + rotate_vector(local_center, rotation)
    };
    Rect::new(center.x - w * 0.5, center.y - h * 0.5, w, h)
}

/// Rotation after dragging the rotate handle from `start` to `pointer`
/// around `center`. Unnormalized.
#[must_use]
pub fn rotation_for(center: Point, start: Point, pointer: Point, base_rotation: f64) -> f64 {
    base_rotation + (angle_deg(center, pointer) - angle_deg(center, start))
}

fn is_unrotated(rotation: f64) -> bool {
    let r = rotation.rem_euclid(360.0);
    r < EPSILON || 360.0 - r < EPSILON
}

fn finite(p: Point, what: &'static str) -> Result<Point, GeometryError> {
    if p.is_finite() { Ok(p) } else { Err(GeometryError::NonFinite { what, x: p.x, y: p.y }) }
}

// =============================================================
// State machine
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Move,
    Resize,
    Rotate,
}

/// The active gesture, with everything needed to recompute from scratch.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TransformState {
    #[default]
    Idle,
    Moving {
        page: usize,
        start: Point,
        origins: BTreeMap<ObjectId, Point>,
        /// Union of the moving boxes at begin; what the snapper sees.
        start_bbox: Rect,
        /// Set when the moving set is exactly one group.
        group_id: Option<GroupId>,
    },
    Resizing {
        page: usize,
        id: ObjectId,
        handle: Handle,
        start: Point,
        orig: Rect,
        rotation: f64,
    },
    Rotating {
        page: usize,
        id: ObjectId,
        center: Point,
        start: Point,
        base_rotation: f64,
    },
}

impl TransformState {
    #[must_use]
    pub fn kind(&self) -> Option<TransformKind> {
        match self {
            Self::Idle => None,
            Self::Moving { .. } => Some(TransformKind::Move),
            Self::Resizing { .. } => Some(TransformKind::Resize),
            Self::Rotating { .. } => Some(TransformKind::Rotate),
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Moving { page, .. } | Self::Resizing { page, .. } | Self::Rotating { page, .. } => Some(*page),
        }
    }

    /// Objects the gesture writes to.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        match self {
            Self::Idle => Vec::new(),
            Self::Moving { origins, .. } => origins.keys().cloned().collect(),
            Self::Resizing { id, .. } | Self::Rotating { id, .. } => vec![id.clone()],
        }
    }
}

/// Outcome of one pointer update.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Geometry was written for these objects.
    Live(Vec<ObjectId>),
    /// The input was unusable; the transform ended with the geometry from the
    /// last good update. `edit` covers the changes made before the failure.
    Aborted { error: GeometryError, edit: Option<Edit> },
}

/// A finished transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub kind: TransformKind,
    pub page: usize,
    pub ids: Vec<ObjectId>,
    pub edit: Edit,
}

#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    state: TransformState,
    recorder: Option<EditRecorder>,
    guides: Guides,
}

impl TransformEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &TransformState {
        &self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state != TransformState::Idle
    }

    /// Distance guides from the latest update; empty when idle.
    #[must_use]
    pub fn guides(&self) -> &Guides {
        &self.guides
    }

    fn ensure_idle(&self) -> Result<(), PreconditionError> {
        if self.is_active() { Err(PreconditionError::TransformInProgress) } else { Ok(()) }
    }

    fn start(&mut self, page_index: usize, page: &Page, state: TransformState) {
        self.recorder = Some(EditRecorder::begin(page_index, page));
        self.guides = Guides::default();
        debug!(page = page_index, kind = ?state.kind(), ids = ?state.object_ids(), "transform begin");
        self.state = state;
    }

    /// Start moving `ids` with the pointer at `start`.
    ///
    /// # Errors
    ///
    /// `TransformInProgress`, `EmptySelection`, `PageNotFound`,
    /// `ObjectNotFound`, or `NonFinite` for a bad start point.
    pub fn begin_move(&mut self, draft: &Draft, page_index: usize, ids: &[ObjectId], start: Point) -> SceneResult<()> {
        self.ensure_idle()?;
        finite(start, "move start")?;
        if ids.is_empty() {
            return Err(PreconditionError::EmptySelection.into());
        }
        let page = draft.page(page_index)?;
        let mut origins = BTreeMap::new();
        let mut boxes = Vec::with_capacity(ids.len());
        for id in ids {
            let obj = page.object(id).ok_or_else(|| PreconditionError::ObjectNotFound { page: page_index, id: id.clone() })?;
            origins.insert(id.clone(), Point::new(obj.x, obj.y));
            boxes.push(obj.rect());
        }
        let start_bbox = Rect::union_all(boxes).unwrap_or_default();
        let group_id = whole_group(page, &origins);
        self.start(page_index, page, TransformState::Moving { page: page_index, start, origins, start_bbox, group_id });
        Ok(())
    }

    /// Start resizing object `id` by `handle`.
    ///
    /// # Errors
    ///
    /// `TransformInProgress`, `PageNotFound`, `ObjectNotFound`, or `NonFinite`.
    pub fn begin_resize(&mut self, draft: &Draft, page_index: usize, id: &str, handle: Handle, start: Point) -> SceneResult<()> {
        self.ensure_idle()?;
        finite(start, "resize start")?;
        let page = draft.page(page_index)?;
        let obj = page.object(id).ok_or_else(|| PreconditionError::ObjectNotFound { page: page_index, id: id.to_string() })?;
        let state = TransformState::Resizing {
            page: page_index,
            id: id.to_string(),
            handle,
            start,
            orig: obj.rect(),
            rotation: obj.rotation,
        };
        self.start(page_index, page, state);
        Ok(())
    }

    /// Start rotating object `id` around its center.
    ///
    /// # Errors
    ///
    /// `TransformInProgress`, `PageNotFound`, `ObjectNotFound`, or `NonFinite`.
    pub fn begin_rotate(&mut self, draft: &Draft, page_index: usize, id: &str, start: Point) -> SceneResult<()> {
        self.ensure_idle()?;
        finite(start, "rotate start")?;
        let page = draft.page(page_index)?;
        let obj = page.object(id).ok_or_else(|| PreconditionError::ObjectNotFound { page: page_index, id: id.to_string() })?;
        let state = TransformState::Rotating {
            page: page_index,
            id: id.to_string(),
            center: obj.center(),
            start,
            base_rotation: obj.rotation,
        };
        self.start(page_index, page, state);
        Ok(())
    }

    /// Apply the pointer at `pointer` to the active transform.
    ///
    /// # Errors
    ///
    /// `NoTransform` when idle. If the page or an object vanished the
    /// transform is dropped and `PageNotFound`/`ObjectNotFound` is returned.
    pub fn update(
        &mut self,
        draft: &mut Draft,
        pointer: Point,
        modifiers: Modifiers,
        config: &EngineConfig,
    ) -> Result<Step, PreconditionError> {
        if !self.is_active() {
            return Err(PreconditionError::NoTransform);
        }
        if let Err(error) = finite(pointer, "pointer") {
            warn!(x = pointer.x, y = pointer.y, "non-finite pointer, aborting transform");
            let edit = self.abort(draft);
            return Ok(Step::Aborted { error, edit });
        }

        let result = self.apply(draft, pointer, modifiers, config);
        match result {
            Ok(ids) => Ok(Step::Live(ids)),
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    fn apply(
        &mut self,
        draft: &mut Draft,
        pointer: Point,
        modifiers: Modifiers,
        config: &EngineConfig,
    ) -> Result<Vec<ObjectId>, PreconditionError> {
        match &self.state {
            TransformState::Idle => Err(PreconditionError::NoTransform),
            TransformState::Moving { page, start, origins, start_bbox, group_id } => {
                let page_index = *page;
                let page = draft.page_mut(page_index)?;
                let proposed = start_bbox.translate(pointer.x - start.x, pointer.y - start.y);
                let exclude: Vec<&ObjectId> = origins.keys().collect();
                let snapped = snap::snap_box(page, proposed, &exclude, SnapOp::Move, modifiers.grid(), &config.snap);
                let delta = Point::new(snapped.rect.x - start_bbox.x, snapped.rect.y - start_bbox.y);
                self.guides = snapped.guides;

                match group_id {
                    Some(gid) => {
                        group::move_group_from(page, page_index, gid, origins, delta).map_err(|e| match e {
                            SceneError::Precondition(p) => p,
                            other => PreconditionError::GroupMembership(other.to_string()),
                        })?;
                    }
                    None => {
                        for (id, origin) in origins {
                            let obj = page
                                .object_mut(id)
                                .ok_or_else(|| PreconditionError::ObjectNotFound { page: page_index, id: id.clone() })?;
                            obj.x = origin.x + delta.x;
                            obj.y = origin.y + delta.y;
                        }
                    }
                }
                Ok(origins.keys().cloned().collect())
            }
            TransformState::Resizing { page, id, handle, start, orig, rotation } => {
                let page_index = *page;
                let page = draft.page_mut(page_index)?;
                let opts = ResizeOptions {
                    aspect_lock: modifiers.constrain(),
                    symmetric: modifiers.symmetric(),
                    min_size: config.transform.min_size,
                };
                let mut rect = resize_box(*orig, *rotation, *handle, pointer - *start, opts);

                // The grid only makes sense for boxes aligned with it.
                if is_unrotated(*rotation) && config.snap.grid.applies(SnapOp::Resize, modifiers.grid()) {
                    rect = snap::snap_to_grid(rect, config.snap.grid.step, SnapOp::Resize);
                    rect.w = rect.w.max(opts.min_size);
                    rect.h = rect.h.max(opts.min_size);
                }
                self.guides = if config.snap.guides.enabled {
                    snap::nearest_neighbors(page, &rect, &[id.as_str()], &config.snap.guides)
                } else {
                    Guides::default()
                };

                let obj = page
                    .object_mut(id)
                    .ok_or_else(|| PreconditionError::ObjectNotFound { page: page_index, id: id.clone() })?;
                obj.set_rect(rect);
                Ok(vec![id.clone()])
            }
            TransformState::Rotating { page, id, center, start, base_rotation } => {
                let page_index = *page;
                let mut rotation = rotation_for(*center, *start, pointer, *base_rotation);
                if modifiers.constrain() {
                    rotation = quantize(rotation, config.transform.rotation_step_deg);
                }
                let obj = draft.find_object_mut(page_index, id)?;
                obj.rotation = rotation;
                Ok(vec![id.clone()])
            }
        }
    }

    /// Finish the transform: refresh relative boxes and return the edit.
    ///
    /// # Errors
    ///
    /// `NoTransform` when idle.
    pub fn end(&mut self, draft: &mut Draft) -> Result<Commit, PreconditionError> {
        let state = std::mem::take(&mut self.state);
        let recorder = self.recorder.take();
        self.guides = Guides::default();
        let (Some(kind), Some(page_index), Some(recorder)) = (state.kind(), state.page(), recorder) else {
            return Err(PreconditionError::NoTransform);
        };
        let ids = state.object_ids();

        if let Ok(page) = draft.page_mut(page_index) {
            if let Some(size) = page.size {
                for id in &ids {
                    if let Some(obj) = page.object_mut(id) {
                        obj.refresh_relative(size);
                    }
                }
            }
        }
        let edit = draft.finish(recorder);
        debug!(page = page_index, ?kind, count = ids.len(), changed = !edit.is_empty(), "transform commit");
        Ok(Commit { kind, page: page_index, ids, edit })
    }

    /// Drop the transform, keeping whatever geometry the last update wrote.
    /// Returns the edit for those changes, or `None` when idle.
    pub fn abort(&mut self, draft: &mut Draft) -> Option<Edit> {
        let kind = self.state.kind()?;
        let recorder = self.recorder.take();
        self.reset();
        let edit = recorder.map(|r| draft.finish(r));
        debug!(?kind, "transform aborted");
        edit
    }

    fn reset(&mut self) {
        self.state = TransformState::Idle;
        self.recorder = None;
        self.guides = Guides::default();
    }
}

/// The group whose membership is exactly the moving set, if any.
fn whole_group(page: &Page, origins: &BTreeMap<ObjectId, Point>) -> Option<GroupId> {
    let first = origins.keys().next()?;
    let group = page.group_of(first)?;
    let members: BTreeSet<&ObjectId> = group.child_ids.iter().collect();
    let moving: BTreeSet<&ObjectId> = origins.keys().collect();
    (members == moving).then(|| group.id.clone())
}

// =============================================================
// Discrete moves
// =============================================================

/// Translate `ids` by `(dx, dy)` as one edit (keyboard nudge). A set that is
/// exactly one group moves through the group primitive.
///
/// # Errors
///
/// `EmptySelection`, `PageNotFound`, `ObjectNotFound`, or `NonFinite`.
pub fn translate_objects(draft: &mut Draft, page_index: usize, ids: &[ObjectId], dx: f64, dy: f64) -> SceneResult<Edit> {
    finite(Point::new(dx, dy), "nudge")?;
    if ids.is_empty() {
        return Err(PreconditionError::EmptySelection.into());
    }
    let page = draft.page_mut(page_index)?;
    let mut origins = BTreeMap::new();
    for id in ids {
        let obj = page.object(id).ok_or_else(|| PreconditionError::ObjectNotFound { page: page_index, id: id.clone() })?;
        origins.insert(id.clone(), Point::new(obj.x, obj.y));
    }
    if let Some(gid) = whole_group(page, &origins) {
        return group::move_group(draft, page_index, &gid, dx, dy);
    }

    let recorder = EditRecorder::begin(page_index, page);
    let size = page.size;
    for (id, origin) in &origins {
        if let Some(obj) = page.object_mut(id) {
            obj.x = origin.x + dx;
            obj.y = origin.y + dy;
            if let Some(size) = size {
                obj.refresh_relative(size);
            }
        }
    }
    Ok(draft.finish(recorder))
}
