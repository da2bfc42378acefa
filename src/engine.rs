//! Host-facing engine.
//!
//! [`EngineCore`] owns one open draft together with its selection, the active
//! transform and the configuration. The host feeds it pointer events already
//! converted to page pixels and gets back [`Action`]s describing what changed.
//! Live changes during a drag and the final commit are reported separately so
//! the host can coalesce persistence writes.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, info};

use crate::clip::{self, ClipImage};
use crate::config::EngineConfig;
use crate::doc::{Draft, GroupId, ImageFit, Layer, ObjectId, Page, PartialObject, SceneObject};
use crate::edit::Edit;
use crate::error::{GeometryError, PreconditionError, SceneResult};
use crate::geom::{Point, Rect};
use crate::group;
use crate::hit::{self, Handle, HitPart};
use crate::input::{Button, Modifiers, is_additive};
use crate::project::PageSize;
use crate::selection::{SelectionController, SelectionInfo};
use crate::snap::Guides;
use crate::transform::{self, Step, TransformEngine, TransformState};

/// Notifications returned from engine calls for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Geometry changed during a drag. Not yet committed.
    Changed { page: usize, ids: Vec<ObjectId> },
    /// A finished mutation with its reversible edit.
    Committed { page: usize, ids: Vec<ObjectId>, edit: Edit },
    /// The active transform stopped without a commit. `edit` covers whatever
    /// live changes it had already written.
    TransformAborted { page: usize, edit: Option<Edit>, error: Option<GeometryError> },
    SelectionChanged(Option<SelectionInfo>),
    RenderNeeded,
}

/// A rubber-band selection in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Marquee {
    page: usize,
    start: Point,
    current: Point,
    additive: bool,
}

impl Marquee {
    fn rect(&self) -> Rect {
        Rect::from_corners(self.start, self.current)
    }
}

/// Core engine state: everything between host input and the draft.
#[derive(Debug, Clone, Default)]
pub struct EngineCore {
    pub draft: Draft,
    pub config: EngineConfig,
    selection: SelectionController,
    transform: TransformEngine,
    marquee: Option<Marquee>,
    pending_move: Option<(Point, Modifiers)>,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config, ..Self::default() }
    }

    // --- Data inputs ---

    /// Replace the open draft. Selection and any gesture are dropped.
    pub fn load_draft(&mut self, draft: Draft) {
        info!(pages = draft.pages.len(), version = draft.version, "draft loaded");
        self.draft = draft;
        self.selection.clear();
        self.transform = TransformEngine::new();
        self.marquee = None;
        self.pending_move = None;
    }

    /// Parse, validate and load a draft from JSON.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDraft` or the first invariant violation; the open
    /// draft is kept.
    pub fn load_json(&mut self, json: &str) -> SceneResult<()> {
        let draft = Draft::from_json(json)?;
        self.load_draft(draft);
        Ok(())
    }

    /// Record the renderer's pixel size for `page`, creating the page if needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPageSize` for non-positive or non-finite dimensions.
    pub fn set_page_size(&mut self, page: usize, width: f64, height: f64) -> SceneResult<Vec<Action>> {
        let size = PageSize::new(width, height)?;
        let touched = self.draft.page_or_create(page).attach_size(size);
        let mut actions = Vec::new();
        if touched > 0 {
            if self.selection.page() == Some(page) {
                actions.push(self.selection_changed());
            }
            actions.push(Action::RenderNeeded);
        }
        Ok(actions)
    }

    /// Insert or merge an object (tool factories, style panels, remote updates).
    ///
    /// # Errors
    ///
    /// See [`Draft::upsert`].
    pub fn upsert(&mut self, page: usize, obj: SceneObject) -> SceneResult<Vec<Action>> {
        let edit = self.draft.upsert(page, obj)?;
        Ok(self.committed(page, edit))
    }

    /// # Errors
    ///
    /// See [`Draft::apply_partial`].
    pub fn apply_partial(&mut self, page: usize, id: &str, partial: &PartialObject) -> SceneResult<Vec<Action>> {
        let edit = self.draft.apply_partial(page, id, partial)?;
        Ok(self.committed(page, edit))
    }

    /// # Errors
    ///
    /// See [`Draft::remove`].
    pub fn remove(&mut self, page: usize, id: &str) -> SceneResult<Vec<Action>> {
        let edit = self.draft.remove(page, id)?;
        Ok(self.committed(page, edit))
    }

    /// # Errors
    ///
    /// See [`Draft::set_layer`].
    pub fn set_layer(&mut self, page: usize, id: &str, layer: Layer) -> SceneResult<Vec<Action>> {
        let edit = self.draft.set_layer(page, id, layer)?;
        Ok(self.committed(page, edit))
    }

    // --- Pointer input ---

    /// Pointer pressed at `p` on `page`.
    ///
    /// A handle of the single selected object starts a resize or rotate; an
    /// object body updates the selection and starts a move; empty space
    /// clears (unless additive) and starts a lasso.
    ///
    /// # Errors
    ///
    /// `TransformInProgress` while a transform is active, `PageNotFound`, or
    /// `NonFinite` for a bad pointer.
    pub fn on_pointer_down(&mut self, page: usize, p: Point, button: Button, modifiers: Modifiers) -> SceneResult<Vec<Action>> {
        if self.transform.is_active() {
            return Err(PreconditionError::TransformInProgress.into());
        }
        if !p.is_finite() {
            return Err(GeometryError::NonFinite { what: "pointer", x: p.x, y: p.y }.into());
        }
        if button == Button::Middle {
            return Ok(Vec::new());
        }
        self.marquee = None;
        self.pending_move = None;

        // A page the host has not reported yet has nothing on it.
        let blank = Page::default();
        let page_ref = self.draft.pages.get(page).unwrap_or(&blank);
        let single = if self.selection.page() == Some(page) && self.selection.len() == 1 {
            self.selection.ids().iter().next().cloned()
        } else {
            None
        };
        let hit = hit::hit_test(page_ref, p, single.as_deref(), &self.config.hit);
        let additive = is_additive(button, modifiers);
        debug!(page, x = p.x, y = p.y, ?button, hit = ?hit.as_ref().map(|h| &h.object_id), "pointer down");

        let mut actions = Vec::new();
        match hit {
            Some(hit) => match hit.part {
                HitPart::ResizeHandle(handle) => {
                    self.transform.begin_resize(&self.draft, page, &hit.object_id, handle, p)?;
                }
                HitPart::RotateHandle => {
                    self.transform.begin_rotate(&self.draft, page, &hit.object_id, p)?;
                }
                HitPart::Body => {
                    if self.selection.click(page, page_ref, Some(hit.object_id.as_str()), additive) {
                        actions.push(self.selection_changed());
                        actions.push(Action::RenderNeeded);
                    }
                    if self.selection.contains(&hit.object_id) {
                        let ids = self.selection.id_list();
                        self.transform.begin_move(&self.draft, page, &ids, p)?;
                    }
                }
            },
            None => {
                if self.selection.click(page, page_ref, None, additive) {
                    actions.push(self.selection_changed());
                    actions.push(Action::RenderNeeded);
                }
                self.marquee = Some(Marquee { page, start: p, current: p, additive });
            }
        }
        Ok(actions)
    }

    /// Pointer moved. Applies immediately; see [`EngineCore::queue_pointer_move`]
    /// for frame-coalesced delivery.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the transform's page or objects
    /// vanished; the transform is dropped.
    pub fn on_pointer_move(&mut self, p: Point, modifiers: Modifiers) -> SceneResult<Vec<Action>> {
        if self.transform.is_active() {
            let page = self.transform.state().page().unwrap_or_default();
            return match self.transform.update(&mut self.draft, p, modifiers, &self.config)? {
                Step::Live(ids) => Ok(vec![Action::Changed { page, ids }, Action::RenderNeeded]),
                Step::Aborted { error, edit } => Ok(self.aborted(page, edit, Some(error))),
            };
        }
        if let Some(marquee) = self.marquee.as_mut() {
            if p.is_finite() {
                marquee.current = p;
                return Ok(vec![Action::RenderNeeded]);
            }
        }
        Ok(Vec::new())
    }

    /// Store the latest pointer move ("latest wins"). Returns `true` when the
    /// host has to schedule a frame, `false` when one is already pending.
    pub fn queue_pointer_move(&mut self, p: Point, modifiers: Modifiers) -> bool {
        self.pending_move.replace((p, modifiers)).is_none()
    }

    /// Process at most one queued pointer move.
    ///
    /// # Errors
    ///
    /// See [`EngineCore::on_pointer_move`].
    pub fn on_frame(&mut self) -> SceneResult<Vec<Action>> {
        match self.pending_move.take() {
            Some((p, modifiers)) => self.on_pointer_move(p, modifiers),
            None => Ok(Vec::new()),
        }
    }

    /// Pointer released at `p`. Flushes any queued move, then commits the
    /// transform (whose geometry is whatever the last move produced) or
    /// finishes the lasso at `p`.
    ///
    /// # Errors
    ///
    /// See [`EngineCore::on_pointer_move`].
    pub fn on_pointer_up(&mut self, p: Point) -> SceneResult<Vec<Action>> {
        let mut actions = self.on_frame()?;

        if self.transform.is_active() {
            let commit = self.transform.end(&mut self.draft)?;
            if !commit.edit.is_empty() {
                actions.push(Action::Committed { page: commit.page, ids: commit.ids, edit: commit.edit });
                actions.push(self.selection_changed());
            }
            actions.push(Action::RenderNeeded);
        } else if let Some(mut marquee) = self.marquee.take() {
            if p.is_finite() {
                marquee.current = p;
            }
            let blank = Page::default();
            let page = self.draft.pages.get(marquee.page).unwrap_or(&blank);
            if self.selection.select_rect(marquee.page, page, &marquee.rect(), marquee.additive) {
                actions.push(self.selection_changed());
            }
            actions.push(Action::RenderNeeded);
        }
        Ok(actions)
    }

    /// Pointer cancelled by the host: drop every gesture.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        self.pending_move = None;
        let had_marquee = self.marquee.take().is_some();
        let mut actions = self.abort_transform();
        if had_marquee && actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Stop the active transform without restoring anything.
    pub fn abort_transform(&mut self) -> Vec<Action> {
        let Some(page) = self.transform.state().page() else {
            return Vec::new();
        };
        let edit = self.transform.abort(&mut self.draft);
        self.aborted(page, edit, None)
    }

    /// Start resizing the selected object by `handle`, for hosts that render
    /// their own handles.
    ///
    /// # Errors
    ///
    /// `EmptySelection`, `ResizeNeedsSingleObject`, or any error from
    /// [`TransformEngine::begin_resize`].
    pub fn begin_resize(&mut self, handle: Handle, start: Point) -> SceneResult<()> {
        let (page, ids) = self.selected()?;
        let [id] = ids.as_slice() else {
            return Err(PreconditionError::ResizeNeedsSingleObject(ids.len()).into());
        };
        self.transform.begin_resize(&self.draft, page, id, handle, start)
    }

    // --- Selection operations ---

    /// Replace the selection with `ids` on `page` (group-expanded).
    ///
    /// # Errors
    ///
    /// `PageNotFound`.
    pub fn select_ids<S: AsRef<str>>(&mut self, page: usize, ids: &[S]) -> SceneResult<Vec<Action>> {
        let page_ref = self.draft.page(page)?;
        if self.selection.select_ids(page, page_ref, ids) {
            return Ok(vec![self.selection_changed(), Action::RenderNeeded]);
        }
        Ok(Vec::new())
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        if self.selection.clear() { vec![self.selection_changed(), Action::RenderNeeded] } else { Vec::new() }
    }

    /// Nudge the selection by `(dx, dy)` page pixels as one committed edit.
    ///
    /// # Errors
    ///
    /// `TransformInProgress`, `EmptySelection`, or `NonFinite`.
    pub fn move_selection(&mut self, dx: f64, dy: f64) -> SceneResult<Vec<Action>> {
        self.ensure_no_transform()?;
        let (page, ids) = self.selected()?;
        let edit = transform::translate_objects(&mut self.draft, page, &ids, dx, dy)?;
        Ok(self.committed(page, edit))
    }

    /// Delete every selected object and clear the selection.
    ///
    /// # Errors
    ///
    /// `TransformInProgress` or `EmptySelection`.
    pub fn delete_selection(&mut self) -> SceneResult<Vec<Action>> {
        self.ensure_no_transform()?;
        let (page, ids) = self.selected()?;
        let edit = self.draft.remove_many(page, &ids)?;
        Ok(self.committed(page, edit))
    }

    /// Group the selected objects. The new group becomes the selection.
    ///
    /// # Errors
    ///
    /// `TransformInProgress`, `EmptySelection`, or `GroupTooSmall`.
    pub fn group_selection(&mut self) -> SceneResult<(GroupId, Vec<Action>)> {
        self.ensure_no_transform()?;
        let (page, ids) = self.selected()?;
        let (gid, edit) = group::create_group(&mut self.draft, page, &ids)?;
        Ok((gid, self.committed(page, edit)))
    }

    /// Dissolve every group that has a selected member. The objects stay selected.
    ///
    /// # Errors
    ///
    /// `TransformInProgress`, `EmptySelection`, or `GroupMembership` when no
    /// selected object is grouped.
    pub fn ungroup_selection(&mut self) -> SceneResult<Vec<Action>> {
        self.ensure_no_transform()?;
        let (page, ids) = self.selected()?;
        let page_ref = self.draft.page(page)?;
        let mut groups: Vec<GroupId> = ids.iter().filter_map(|id| page_ref.object(id)?.group_id.clone()).collect();
        groups.sort();
        groups.dedup();
        if groups.is_empty() {
            return Err(PreconditionError::GroupMembership("no selected object is grouped".into()).into());
        }

        let mut actions = Vec::new();
        for gid in groups {
            let edit = group::ungroup(&mut self.draft, page, &gid)?;
            actions.push(Action::Committed { page, ids: edit.object_ids(), edit });
        }
        if let Some(page_ref) = self.draft.pages.get(page) {
            self.selection.refresh(page_ref);
        }
        actions.push(self.selection_changed());
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    // --- Clip shapes ---

    /// # Errors
    ///
    /// `NotAClipShape`, a missing page/object, or `NonFinite`.
    pub fn set_clip_scale(&mut self, page: usize, id: &str, scale: f64) -> SceneResult<Vec<Action>> {
        self.edit_clip(page, id, |img| img.set_scale(scale))
    }

    /// # Errors
    ///
    /// `NotAClipShape`, a missing page/object, or `NonFinite`.
    pub fn zoom_clip(&mut self, page: usize, id: &str, factor: f64) -> SceneResult<Vec<Action>> {
        self.edit_clip(page, id, |img| img.zoom_by(factor))
    }

    /// # Errors
    ///
    /// `NotAClipShape`, a missing page/object, or `NonFinite`.
    pub fn pan_clip(&mut self, page: usize, id: &str, dx: f64, dy: f64) -> SceneResult<Vec<Action>> {
        self.edit_clip(page, id, |img| img.pan_by(dx, dy))
    }

    /// # Errors
    ///
    /// `NotAClipShape` or a missing page/object.
    pub fn recenter_clip(&mut self, page: usize, id: &str) -> SceneResult<Vec<Action>> {
        self.edit_clip(page, id, |img| {
            img.recenter();
            Ok(())
        })
    }

    /// # Errors
    ///
    /// `NotAClipShape` or a missing page/object.
    pub fn set_clip_fit(&mut self, page: usize, id: &str, fit: ImageFit) -> SceneResult<Vec<Action>> {
        self.edit_clip(page, id, |img| {
            img.set_fit(fit);
            Ok(())
        })
    }

    fn edit_clip<F>(&mut self, page: usize, id: &str, f: F) -> SceneResult<Vec<Action>>
    where
        F: FnOnce(&mut ClipImage) -> Result<(), GeometryError>,
    {
        let edit = clip::edit_clip_image(&mut self.draft, page, id, f)?;
        Ok(self.committed(page, edit))
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Toolbar snapshot of the selection, `None` when nothing is selected.
    #[must_use]
    pub fn selection_info(&self) -> Option<SelectionInfo> {
        let page = self.draft.pages.get(self.selection.page()?)?;
        self.selection.info(page)
    }

    #[must_use]
    pub fn transform_state(&self) -> &TransformState {
        self.transform.state()
    }

    /// Distance guides to draw for the active drag.
    #[must_use]
    pub fn guides(&self) -> &Guides {
        self.transform.guides()
    }

    /// The lasso rectangle while one is being dragged.
    #[must_use]
    pub fn marquee(&self) -> Option<(usize, Rect)> {
        self.marquee.map(|m| (m.page, m.rect()))
    }

    // --- Helpers ---

    fn ensure_no_transform(&self) -> Result<(), PreconditionError> {
        if self.transform.is_active() { Err(PreconditionError::TransformInProgress) } else { Ok(()) }
    }

    fn selected(&self) -> Result<(usize, Vec<ObjectId>), PreconditionError> {
        match self.selection.page() {
            Some(page) if !self.selection.is_empty() => Ok((page, self.selection.id_list())),
            _ => Err(PreconditionError::EmptySelection),
        }
    }

    fn selection_changed(&self) -> Action {
        Action::SelectionChanged(self.selection_info())
    }

    /// Actions for a finished discrete edit. Keeps the selection in step with
    /// deletions and group changes.
    fn committed(&mut self, page: usize, edit: Edit) -> Vec<Action> {
        if edit.is_empty() {
            return Vec::new();
        }
        let mut actions = vec![Action::Committed { page, ids: edit.object_ids(), edit }];
        if self.selection.page() == Some(page) {
            if let Some(page_ref) = self.draft.pages.get(page) {
                self.selection.refresh(page_ref);
            }
            actions.push(self.selection_changed());
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    fn aborted(&mut self, page: usize, edit: Option<Edit>, error: Option<GeometryError>) -> Vec<Action> {
        let mut actions = vec![Action::TransformAborted { page, edit, error }];
        if self.selection.page() == Some(page) {
            actions.push(self.selection_changed());
        }
        actions.push(Action::RenderNeeded);
        actions
    }
}
