//! Reversible edits.
//!
//! Every committed mutation returns an [`Edit`]: the before/after snapshot of
//! each object and group it touched on one page, with each object's array
//! index so z-order comes back exactly. The engine keeps no history itself; a
//! host that wants undo stores the edits and calls [`Edit::revert`] /
//! [`Edit::reapply`].

#[cfg(test)]
#[path = "edit_test.rs"]
mod edit_test;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::doc::{Draft, Group, GroupId, ObjectId, Page, SceneObject};
use crate::error::SceneResult;

/// An object at a specific array position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub index: usize,
    pub object: SceneObject,
}

/// One object's state on either side of an edit. `None` means absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectChange {
    pub id: ObjectId,
    pub before: Option<ObjectSnapshot>,
    pub after: Option<ObjectSnapshot>,
}

/// One group's state on either side of an edit. `None` means absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupChange {
    pub id: GroupId,
    pub before: Option<Group>,
    pub after: Option<Group>,
}

/// A reversible diff of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub page: usize,
    pub objects: Vec<ObjectChange>,
    pub groups: Vec<GroupChange>,
}

impl Edit {
    #[must_use]
    pub fn empty(page: usize) -> Self {
        Self { page, objects: Vec::new(), groups: Vec::new() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.groups.is_empty()
    }

    /// Ids of every object this edit touched.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|c| c.id.clone()).collect()
    }

    /// Restore the page to its state before the edit.
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` if the page no longer exists.
    pub fn revert(&self, draft: &mut Draft) -> SceneResult<()> {
        let page = draft.page_mut(self.page)?;
        restore(page, self, |c| c.before.as_ref(), |g| g.before.as_ref());
        draft.version += 1;
        Ok(())
    }

    /// Re-apply the edit after a [`revert`](Self::revert).
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` if the page no longer exists.
    pub fn reapply(&self, draft: &mut Draft) -> SceneResult<()> {
        let page = draft.page_mut(self.page)?;
        restore(page, self, |c| c.after.as_ref(), |g| g.after.as_ref());
        draft.version += 1;
        Ok(())
    }
}

fn restore<'a, F, G>(page: &mut Page, edit: &'a Edit, pick: F, pick_group: G)
where
    F: Fn(&'a ObjectChange) -> Option<&'a ObjectSnapshot>,
    G: Fn(&'a GroupChange) -> Option<&'a Group>,
{
    let touched: BTreeSet<&str> = edit.objects.iter().map(|c| c.id.as_str()).collect();
    page.objects.retain(|o| !touched.contains(o.id.as_str()));

    let mut targets: Vec<&ObjectSnapshot> = edit.objects.iter().filter_map(&pick).collect();
    targets.sort_by_key(|s| s.index);
    for snap in targets {
        let at = snap.index.min(page.objects.len());
        page.objects.insert(at, snap.object.clone());
    }

    for change in &edit.groups {
        match pick_group(change) {
            Some(group) => {
                page.groups.insert(change.id.clone(), group.clone());
            }
            None => {
                page.groups.remove(&change.id);
            }
        }
    }
}

/// Captures a page before a mutation so the mutation can be turned into an [`Edit`].
#[derive(Debug, Clone)]
pub struct EditRecorder {
    page: usize,
    objects: Vec<SceneObject>,
    groups: BTreeMap<GroupId, Group>,
}

impl EditRecorder {
    #[must_use]
    pub fn begin(page_index: usize, page: &Page) -> Self {
        Self { page: page_index, objects: page.objects.clone(), groups: page.groups.clone() }
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Diff the captured state against `page` as it is now.
    #[must_use]
    pub fn finish(self, page: &Page) -> Edit {
        let before: BTreeMap<&str, ObjectSnapshot> = self
            .objects
            .iter()
            .enumerate()
            .map(|(index, o)| (o.id.as_str(), ObjectSnapshot { index, object: o.clone() }))
            .collect();
        let after: BTreeMap<&str, ObjectSnapshot> = page
            .objects
            .iter()
            .enumerate()
            .map(|(index, o)| (o.id.as_str(), ObjectSnapshot { index, object: o.clone() }))
            .collect();

        let ids: BTreeSet<&str> = before.keys().chain(after.keys()).copied().collect();
        let mut objects = Vec::new();
        for id in ids {
            let b = before.get(id);
            let a = after.get(id);
            // Index shifts alone are not changes; untouched objects keep their relative order.
            if b.map(|s| &s.object) != a.map(|s| &s.object) {
                objects.push(ObjectChange { id: id.to_string(), before: b.cloned(), after: a.cloned() });
            }
        }

        let gids: BTreeSet<&GroupId> = self.groups.keys().chain(page.groups.keys()).collect();
        let mut groups = Vec::new();
        for gid in gids {
            let b = self.groups.get(gid);
            let a = page.groups.get(gid);
            if b != a {
                groups.push(GroupChange { id: gid.clone(), before: b.cloned(), after: a.cloned() });
            }
        }

        Edit { page: self.page, objects, groups }
    }
}
