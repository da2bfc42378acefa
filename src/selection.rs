//! Selection controller.
//!
//! Selection is transient UI state owned by the host, one controller per open
//! document. It is scoped to a single page: selecting on another page starts
//! over. Clicking any member of a group selects the whole group, and the
//! selection counts as "the group" only when it matches a group's membership
//! exactly.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::{GroupId, ObjectId, Page};
use crate::geom::Rect;
use crate::hit;

/// Snapshot of the selection for contextual toolbars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionInfo {
    pub page_index: usize,
    pub ids: Vec<ObjectId>,
    pub anchor_id: Option<ObjectId>,
    pub bbox: Rect,
    pub group_id: Option<GroupId>,
    pub can_group: bool,
    pub can_ungroup: bool,
}

/// Union of the current absolute boxes of `ids`. Unknown ids are skipped;
/// an empty result is the zero rectangle.
#[must_use]
pub fn compute_bounding_box<S: AsRef<str>>(page: &Page, ids: &[S]) -> Rect {
    Rect::union_all(ids.iter().filter_map(|id| page.object(id.as_ref())).map(|o| o.rect())).unwrap_or_default()
}

/// `id` plus every other member of its group.
#[must_use]
pub fn expand_to_group(page: &Page, id: &str) -> Vec<ObjectId> {
    match page.group_of(id) {
        Some(group) => group.child_ids.clone(),
        None => vec![id.to_string()],
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    page: Option<usize>,
    ids: BTreeSet<ObjectId>,
    group_id: Option<GroupId>,
    anchor_id: Option<ObjectId>,
}

impl SelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Page the selection lives on, if anything is selected.
    #[must_use]
    pub fn page(&self) -> Option<usize> {
        self.page
    }

    #[must_use]
    pub fn ids(&self) -> &BTreeSet<ObjectId> {
        &self.ids
    }

    #[must_use]
    pub fn id_list(&self) -> Vec<ObjectId> {
        self.ids.iter().cloned().collect()
    }

    #[must_use]
    pub fn selected_group(&self) -> Option<&GroupId> {
        self.group_id.as_ref()
    }

    /// The most recently clicked object still in the selection.
    #[must_use]
    pub fn anchor_id(&self) -> Option<&ObjectId> {
        self.anchor_id.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Drop everything. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.page = None;
        self.ids.clear();
        self.group_id = None;
        self.anchor_id = None;
        changed
    }

    /// Handle a click on `hit` (or on empty space when `None`).
    ///
    /// A plain click on an object replaces the selection with its group-expanded
    /// membership, unless the object is already selected (so a multi-selection
    /// can be dragged). An additive click toggles the expanded membership.
    /// A plain click on empty space clears. Returns whether the selection changed.
    pub fn click(&mut self, page_index: usize, page: &Page, hit: Option<&str>, additive: bool) -> bool {
        let Some(id) = hit.filter(|id| page.object(id).is_some()) else {
            return if additive { false } else { self.clear() };
        };
        let before = self.ids.clone();
        let members = expand_to_group(page, id);

        if self.page != Some(page_index) {
            self.clear();
            self.page = Some(page_index);
        }

        if additive {
            if members.iter().all(|m| self.ids.contains(m)) {
                for m in &members {
                    self.ids.remove(m);
                }
            } else {
                self.ids.extend(members);
                self.anchor_id = Some(id.to_string());
            }
        } else {
            if !self.ids.contains(id) {
                self.ids = members.into_iter().collect();
            }
            self.anchor_id = Some(id.to_string());
        }

        self.settle(page);
        debug!(page = page_index, count = self.ids.len(), additive, "selection click");
        self.ids != before
    }

    /// Lasso selection: every object whose box intersects `lasso`, group-expanded.
    /// Replaces the selection, or unions into it when `additive`.
    pub fn select_rect(&mut self, page_index: usize, page: &Page, lasso: &Rect, additive: bool) -> bool {
        let before = self.ids.clone();
        if !additive || self.page != Some(page_index) {
            self.clear();
        }
        self.page = Some(page_index);
        for id in hit::hit_rect(page, lasso) {
            self.ids.extend(expand_to_group(page, &id));
        }
        self.settle(page);
        self.ids != before
    }

    /// Programmatically select `ids` (group-expanded). Unknown ids are ignored.
    pub fn select_ids<S: AsRef<str>>(&mut self, page_index: usize, page: &Page, ids: &[S]) -> bool {
        let before = self.ids.clone();
        self.clear();
        self.page = Some(page_index);
        for id in ids {
            if page.object(id.as_ref()).is_some() {
                self.ids.extend(expand_to_group(page, id.as_ref()));
            }
        }
        self.anchor_id = ids.last().map(|s| s.as_ref().to_string()).filter(|id| self.ids.contains(id));
        self.settle(page);
        self.ids != before
    }

    /// Forget ids that no longer exist on the page and recompute the group match.
    pub fn refresh(&mut self, page: &Page) {
        self.ids.retain(|id| page.object(id).is_some());
        self.settle(page);
    }

    /// Selection bounding box on `page`, the zero rectangle when empty.
    #[must_use]
    pub fn bounding_box(&self, page: &Page) -> Rect {
        let ids: Vec<&ObjectId> = self.ids.iter().collect();
        compute_bounding_box(page, &ids)
    }

    /// Toolbar snapshot, `None` when nothing is selected.
    #[must_use]
    pub fn info(&self, page: &Page) -> Option<SelectionInfo> {
        let page_index = self.page?;
        if self.ids.is_empty() {
            return None;
        }
        let can_ungroup = self.ids.iter().any(|id| page.object(id).is_some_and(|o| o.group_id.is_some()));
        Some(SelectionInfo {
            page_index,
            ids: self.id_list(),
            anchor_id: self.anchor_id.clone(),
            bbox: self.bounding_box(page),
            group_id: self.group_id.clone(),
            can_group: self.ids.len() >= 2 && self.group_id.is_none(),
            can_ungroup,
        })
    }

    fn settle(&mut self, page: &Page) {
        if self.ids.is_empty() {
            self.page = None;
            self.group_id = None;
            self.anchor_id = None;
            return;
        }
        if self.anchor_id.as_ref().is_none_or(|a| !self.ids.contains(a)) {
            self.anchor_id = self.ids.iter().next().cloned();
        }
        self.group_id = page
            .groups
            .values()
            .find(|g| g.child_ids.len() == self.ids.len() && g.child_ids.iter().all(|c| self.ids.contains(c)))
            .map(|g| g.id.clone());
    }
}
