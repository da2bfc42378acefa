//! Snapping: grid quantisation and nearest-neighbor distance guides.
//!
//! Both strategies are pure functions of the page and a proposed box, so a
//! host may call them every animation frame without drift. They compose in a
//! fixed order: grid first, then guides.

#[cfg(test)]
#[path = "snap_test.rs"]
mod snap_test;

use serde::{Deserialize, Serialize};

use crate::config::{GuideConfig, SnapConfig, SnapOp};
use crate::doc::{ObjectId, Page, SceneObject};
use crate::geom::{Rect, interval_overlap, quantize};

/// Which side of the moving box a neighbor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
}

/// The nearest neighbor in one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideHit {
    pub candidate_id: ObjectId,
    /// Gap between the facing edges in page pixels.
    ///
    /// Always positive from [`nearest_neighbors`]. [`snap_box`] reports `0.0`
    /// for a side it pulled flush, so the host keeps showing that neighbor
    /// as the snap target; a touching neighbor is never a candidate.
    pub distance: f64,
    /// Whether the orthogonal spans overlap enough to count as aligned.
    pub has_overlap: bool,
}

/// Nearest neighbor per direction; absent when nothing qualifies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<GuideHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<GuideHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<GuideHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<GuideHit>,
}

impl Guides {
    #[must_use]
    pub fn get(&self, dir: Direction) -> Option<&GuideHit> {
        match dir {
            Direction::Left => self.left.as_ref(),
            Direction::Right => self.right.as_ref(),
            Direction::Top => self.top.as_ref(),
            Direction::Bottom => self.bottom.as_ref(),
        }
    }

    fn slot(&mut self, dir: Direction) -> &mut Option<GuideHit> {
        match dir {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
            Direction::Top => &mut self.top,
            Direction::Bottom => &mut self.bottom,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

/// A proposed box after snapping, with the guides to draw for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub rect: Rect,
    pub guides: Guides,
}

// =============================================================
// Grid
// =============================================================

/// Quantize a box to the grid. A move snaps the position; a resize also
/// snaps the size (never below one step).
#[must_use]
pub fn snap_to_grid(rect: Rect, step: f64, op: SnapOp) -> Rect {
    if step <= 0.0 || !step.is_finite() {
        return rect;
    }
    let x = quantize(rect.x, step);
    let y = quantize(rect.y, step);
    match op {
        SnapOp::Move => Rect { x, y, ..rect },
        SnapOp::Resize => Rect::new(x, y, quantize(rect.w, step).max(step), quantize(rect.h, step).max(step)),
    }
}

// =============================================================
// Distance guides
// =============================================================

struct Candidate<'a> {
    id: &'a str,
    distance: f64,
    has_overlap: bool,
}

fn gap_and_overlap(moving: &Rect, other: &Rect, dir: Direction, config: &GuideConfig) -> (f64, bool) {
    let (gap, a0, a1, b0, b1) = match dir {
        Direction::Right => (other.x - moving.right(), moving.y, moving.bottom(), other.y, other.bottom()),
        Direction::Left => (moving.x - other.right(), moving.y, moving.bottom(), other.y, other.bottom()),
        Direction::Bottom => (other.y - moving.bottom(), moving.x, moving.right(), other.x, other.right()),
        Direction::Top => (moving.y - other.bottom(), moving.x, moving.right(), other.x, other.right()),
    };
    let overlap = interval_overlap(a0, a1, b0, b1);
    let need = config.min_overlap_px.max(config.min_overlap_ratio * (a1 - a0).min(b1 - b0));
    (gap, overlap > 0.0 && overlap >= need)
}

fn nearest_in<'a, I>(moving: &Rect, others: I, dir: Direction, config: &GuideConfig) -> Option<GuideHit>
where
    I: Iterator<Item = &'a SceneObject>,
{
    let mut aligned: Option<Candidate<'a>> = None;
    let mut any: Option<Candidate<'a>> = None;

    for obj in others {
        let (gap, has_overlap) = gap_and_overlap(moving, &obj.rect(), dir, config);
        if !(gap > 0.0 && gap <= config.max_distance) {
            continue;
        }
        let cand = Candidate { id: obj.id.as_str(), distance: gap, has_overlap };
        if has_overlap && aligned.as_ref().is_none_or(|c| gap < c.distance) {
            aligned = Some(Candidate { id: cand.id, distance: gap, has_overlap });
        }
        if any.as_ref().is_none_or(|c| gap < c.distance) {
            any = Some(cand);
        }
    }

    aligned.or(any).map(|c| GuideHit { candidate_id: c.id.to_string(), distance: c.distance, has_overlap: c.has_overlap })
}

/// Nearest neighbor of `moving` in each direction among the page's objects,
/// skipping any id in `exclude` (the objects being moved).
///
/// Only candidates with a strictly positive gap no larger than
/// `max_distance` count. Candidates whose orthogonal span overlaps enough are
/// preferred; otherwise the closest one wins.
#[must_use]
pub fn nearest_neighbors<S: AsRef<str>>(page: &Page, moving: &Rect, exclude: &[S], config: &GuideConfig) -> Guides {
    let mut guides = Guides::default();
    if !moving.is_finite() {
        return guides;
    }
    let skip = |o: &&SceneObject| !exclude.iter().any(|e| e.as_ref() == o.id);
    for dir in [Direction::Left, Direction::Right, Direction::Top, Direction::Bottom] {
        *guides.slot(dir) = nearest_in(moving, page.objects.iter().filter(skip), dir, config);
    }
    guides
}

/// Pull the moving box flush onto a neighbor when a gap is below `threshold`.
/// Each axis snaps to its closer side. Returns the adjusted box and the
/// directions that were snapped.
#[must_use]
pub fn hard_snap(rect: Rect, guides: &Guides, threshold: f64) -> (Rect, Vec<Direction>) {
    let mut out = rect;
    let mut snapped = Vec::new();
    let close = |hit: Option<&GuideHit>| hit.filter(|h| h.distance < threshold).map(|h| h.distance);

    let horizontal = [(Direction::Left, -1.0), (Direction::Right, 1.0)];
    let vertical = [(Direction::Top, -1.0), (Direction::Bottom, 1.0)];
    for (axis, is_x) in [(horizontal, true), (vertical, false)] {
        let best = axis
            .iter()
            .filter_map(|(dir, sign)| close(guides.get(*dir)).map(|d| (*dir, *sign, d)))
            .min_by(|a, b| a.2.total_cmp(&b.2));
        if let Some((dir, sign, d)) = best {
            if is_x {
                out.x += sign * d;
            } else {
                out.y += sign * d;
            }
            snapped.push(dir);
        }
    }
    (out, snapped)
}

/// Run the full snapping pipeline on a proposed box.
///
/// `grid_modifier` is whether the grid modifier key is held. Hard snapping
/// only applies to moves; a resize still reports guides. Guides are measured
/// on the final box, and a side that was pulled flush reports its neighbor at
/// distance zero.
#[must_use]
pub fn snap_box<S: AsRef<str>>(
    page: &Page,
    proposed: Rect,
    exclude: &[S],
    op: SnapOp,
    grid_modifier: bool,
    config: &SnapConfig,
) -> SnapResult {
    let mut rect = proposed;
    if config.grid.applies(op, grid_modifier) {
        rect = snap_to_grid(rect, config.grid.step, op);
    }
    if !config.guides.enabled {
        return SnapResult { rect, guides: Guides::default() };
    }

    let guides = nearest_neighbors(page, &rect, exclude, &config.guides);
    if op != SnapOp::Move || config.guides.snap_threshold <= 0.0 {
        return SnapResult { rect, guides };
    }

    let (snapped_rect, snapped) = hard_snap(rect, &guides, config.guides.snap_threshold);
    let mut final_guides = nearest_neighbors(page, &snapped_rect, exclude, &config.guides);
    for dir in snapped {
        if let Some(hit) = guides.get(dir) {
            *final_guides.slot(dir) = Some(GuideHit { distance: 0.0, ..hit.clone() });
        }
    }
    SnapResult { rect: snapped_rect, guides: final_guides }
}
