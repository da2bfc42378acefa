//! Grouping controller.
//!
//! Groups are flat: creating a group over objects that already belong to
//! other groups dissolves those groups first. A group has no geometry of its
//! own; its box is always the union of its members' current boxes.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::doc::{Draft, Group, GroupId, ObjectId, Page, new_id};
use crate::edit::{Edit, EditRecorder};
use crate::error::{GeometryError, PreconditionError, SceneResult};
use crate::geom::{Point, Rect};

/// Group `ids` under a freshly generated id.
///
/// # Errors
///
/// See [`create_group_with_id`].
pub fn create_group(draft: &mut Draft, page_index: usize, ids: &[ObjectId]) -> SceneResult<(GroupId, Edit)> {
    let gid = new_id();
    let edit = create_group_with_id(draft, page_index, gid.clone(), ids)?;
    Ok((gid, edit))
}

/// Group `ids` under `gid`.
///
/// # Errors
///
/// Returns `PageNotFound`, `ObjectNotFound`, `GroupTooSmall` when fewer than 2
/// distinct ids are given, or `GroupIdCollision`. The page is unchanged on error.
pub fn create_group_with_id(draft: &mut Draft, page_index: usize, gid: GroupId, ids: &[ObjectId]) -> SceneResult<Edit> {
    let page = draft.page_mut(page_index)?;

    let mut seen = BTreeSet::new();
    let members: Vec<ObjectId> = ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect();
    if members.len() < 2 {
        return Err(PreconditionError::GroupTooSmall(members.len()).into());
    }
    if let Some(missing) = members.iter().find(|id| page.object(id).is_none()) {
        return Err(PreconditionError::ObjectNotFound { page: page_index, id: missing.clone() }.into());
    }
    if page.groups.contains_key(&gid) {
        return Err(PreconditionError::GroupIdCollision(gid).into());
    }

    let recorder = EditRecorder::begin(page_index, page);

    let touched: BTreeSet<GroupId> =
        members.iter().filter_map(|id| page.object(id).and_then(|o| o.group_id.clone())).collect();
    for old in &touched {
        dissolve(page, old);
    }

    for id in &members {
        if let Some(obj) = page.object_mut(id) {
            obj.group_id = Some(gid.clone());
        }
    }
    info!(page = page_index, group = %gid, count = members.len(), dissolved = touched.len(), "group created");
    page.groups.insert(gid.clone(), Group { id: gid, child_ids: members });

    Ok(draft.finish(recorder))
}

/// Dissolve group `gid`, leaving its members in place and ungrouped.
///
/// # Errors
///
/// Returns `PageNotFound` or `GroupNotFound`.
pub fn ungroup(draft: &mut Draft, page_index: usize, gid: &str) -> SceneResult<Edit> {
    let page = draft.page_mut(page_index)?;
    if !page.groups.contains_key(gid) {
        return Err(PreconditionError::GroupNotFound { page: page_index, id: gid.to_string() }.into());
    }
    let recorder = EditRecorder::begin(page_index, page);
    dissolve(page, gid);
    info!(page = page_index, group = gid, "group dissolved");
    Ok(draft.finish(recorder))
}

fn dissolve(page: &mut Page, gid: &str) {
    let Some(group) = page.groups.remove(gid) else {
        return;
    };
    for child in &group.child_ids {
        if let Some(obj) = page.object_mut(child) {
            obj.group_id = None;
        }
    }
}

/// Union of the members' current boxes, `None` for an unknown group.
#[must_use]
pub fn group_bbox(page: &Page, gid: &str) -> Option<Rect> {
    let group = page.group(gid)?;
    Rect::union_all(group.child_ids.iter().filter_map(|id| page.object(id)).map(|o| o.rect()))
}

/// Current top-left of every member of `gid`.
///
/// # Errors
///
/// Returns `GroupNotFound`.
pub fn member_origins(page: &Page, page_index: usize, gid: &str) -> Result<BTreeMap<ObjectId, Point>, PreconditionError> {
    let group = page.group(gid).ok_or_else(|| PreconditionError::GroupNotFound { page: page_index, id: gid.to_string() })?;
    Ok(group
        .child_ids
        .iter()
        .filter_map(|id| page.object(id).map(|o| (id.clone(), Point::new(o.x, o.y))))
        .collect())
}

/// Place every member of `gid` at its origin plus `delta`, all or nothing.
///
/// Used for live drags: the origins are the positions captured when the drag
/// started, so repeated calls never accumulate error. Relative boxes are not
/// touched here; they are refreshed when the drag commits.
///
/// # Errors
///
/// Returns `GroupNotFound`, `GroupMembership` when `origins` does not cover
/// every member, or `NonFinite` for a NaN/infinite delta.
pub fn move_group_from(
    page: &mut Page,
    page_index: usize,
    gid: &str,
    origins: &BTreeMap<ObjectId, Point>,
    delta: Point,
) -> SceneResult<()> {
    if !delta.is_finite() {
        return Err(GeometryError::NonFinite { what: "group delta", x: delta.x, y: delta.y }.into());
    }
    let group = page.group(gid).ok_or_else(|| PreconditionError::GroupNotFound { page: page_index, id: gid.to_string() })?;
    let mut targets = Vec::with_capacity(group.child_ids.len());
    for id in &group.child_ids {
        let origin = origins
            .get(id)
            .ok_or_else(|| PreconditionError::GroupMembership(format!("no drag origin for member {id} of {gid}")))?;
        targets.push((id.clone(), *origin + delta));
    }
    for (id, pos) in targets {
        if let Some(obj) = page.object_mut(&id) {
            obj.x = pos.x;
            obj.y = pos.y;
        }
    }
    Ok(())
}

/// Translate a whole group by `(dx, dy)` as one committed edit.
///
/// # Errors
///
/// Returns `PageNotFound`, `GroupNotFound`, or `NonFinite`.
pub fn move_group(draft: &mut Draft, page_index: usize, gid: &str, dx: f64, dy: f64) -> SceneResult<Edit> {
    let page = draft.page_mut(page_index)?;
    let origins = member_origins(page, page_index, gid)?;
    let recorder = EditRecorder::begin(page_index, page);
    move_group_from(page, page_index, gid, &origins, Point::new(dx, dy))?;
    if let Some(size) = page.size {
        for id in origins.keys() {
            if let Some(obj) = page.object_mut(id) {
                obj.refresh_relative(size);
            }
        }
    }
    Ok(draft.finish(recorder))
}
