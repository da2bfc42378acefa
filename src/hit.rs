//! Hit-testing: which object, handle or lasso region is under the pointer.
//!
//! Point tests are rotation-aware (the pointer is mapped into the object's
//! local frame first). Lasso tests use the stored axis-aligned box and ignore
//! rotation.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use serde::{Deserialize, Serialize};

use crate::config::HitConfig;
use crate::doc::{Layer, ObjectId, Page, SceneObject};
use crate::geom::{Point, Rect, world_to_local};

/// One of the eight resize handles around an object's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl Handle {
    pub const ALL: [Handle; 8] =
        [Handle::N, Handle::Ne, Handle::E, Handle::Se, Handle::S, Handle::Sw, Handle::W, Handle::Nw];

    /// Direction of the handle from the box center: `-1`, `0` or `1` per axis.
    ///
    /// A zero component means the handle does not change that dimension.
    #[must_use]
    pub fn signs(self) -> (f64, f64) {
        match self {
            Self::N => (0.0, -1.0),
            Self::Ne => (1.0, -1.0),
            Self::E => (1.0, 0.0),
            Self::Se => (1.0, 1.0),
            Self::S => (0.0, 1.0),
            Self::Sw => (-1.0, 1.0),
            Self::W => (-1.0, 0.0),
            Self::Nw => (-1.0, -1.0),
        }
    }

    #[must_use]
    pub fn is_corner(self) -> bool {
        matches!(self, Self::Ne | Self::Se | Self::Sw | Self::Nw)
    }

    #[must_use]
    pub fn opposite(self) -> Handle {
        match self {
            Self::N => Self::S,
            Self::Ne => Self::Sw,
            Self::E => Self::W,
            Self::Se => Self::Nw,
            Self::S => Self::N,
            Self::Sw => Self::Ne,
            Self::W => Self::E,
            Self::Nw => Self::Se,
        }
    }

    /// Handle position in the object's local frame (origin at the unrotated top-left).
    #[must_use]
    pub fn local_position(self, w: f64, h: f64) -> Point {
        let (sx, sy) = self.signs();
        Point::new((sx + 1.0) * 0.5 * w, (sy + 1.0) * 0.5 * h)
    }
}

/// Which part of an object was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "handle", rename_all = "snake_case")]
pub enum HitPart {
    Body,
    ResizeHandle(Handle),
    RotateHandle,
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub object_id: ObjectId,
    pub part: HitPart,
}

/// Objects in paint order: the back bucket first, then the front bucket,
/// each in array order.
#[must_use]
pub fn draw_order(page: &Page) -> Vec<&SceneObject> {
    let back = page.objects.iter().filter(|o| o.layer == Layer::Back);
    let front = page.objects.iter().filter(|o| o.layer == Layer::Front);
    back.chain(front).collect()
}

/// Whether `p` lies inside the object's rotated box (edges inclusive).
#[must_use]
pub fn contains_point(obj: &SceneObject, p: Point) -> bool {
    let local = world_to_local(p, &obj.rect(), obj.rotation);
    local.x >= 0.0 && local.x <= obj.w && local.y >= 0.0 && local.y <= obj.h
}

/// The topmost object whose rotated box contains `p`.
#[must_use]
pub fn hit_object(page: &Page, p: Point) -> Option<&SceneObject> {
    if !p.is_finite() {
        return None;
    }
    draw_order(page).into_iter().rev().find(|o| contains_point(o, p))
}

/// Which handle of `obj`, if any, is within reach of `p`.
///
/// The rotate handle sits above the top edge along the object's local up axis.
/// When handles overlap on a small box the nearest one wins.
#[must_use]
pub fn hit_handle(obj: &SceneObject, p: Point, config: &HitConfig) -> Option<HitPart> {
    let local = world_to_local(p, &obj.rect(), obj.rotation);
    let reach = config.handle_radius;

    let rotate = Point::new(obj.w * 0.5, -config.rotate_handle_offset);
    let mut best: Option<(f64, HitPart)> = None;
    let rotate_dist = (local - rotate).length();
    if rotate_dist <= reach {
        best = Some((rotate_dist, HitPart::RotateHandle));
    }

    for handle in Handle::ALL {
        let d = (local - handle.local_position(obj.w, obj.h)).length();
        if d <= reach && best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, HitPart::ResizeHandle(handle)));
        }
    }
    best.map(|(_, part)| part)
}

/// Full pointer hit test. Handles of the `selected` object are checked before
/// any body so a handle poking outside the box still wins.
#[must_use]
pub fn hit_test(page: &Page, p: Point, selected: Option<&str>, config: &HitConfig) -> Option<Hit> {
    if !p.is_finite() {
        return None;
    }
    if let Some(obj) = selected.and_then(|id| page.object(id)) {
        if let Some(part) = hit_handle(obj, p, config) {
            return Some(Hit { object_id: obj.id.clone(), part });
        }
    }
    hit_object(page, p).map(|o| Hit { object_id: o.id.clone(), part: HitPart::Body })
}

/// Every object whose axis-aligned box intersects `lasso`, in paint order.
#[must_use]
pub fn hit_rect(page: &Page, lasso: &Rect) -> Vec<ObjectId> {
    if !lasso.is_finite() {
        return Vec::new();
    }
    draw_order(page)
        .into_iter()
        .filter(|o| o.rect().intersects(lasso))
        .map(|o| o.id.clone())
        .collect()
}
