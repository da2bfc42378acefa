//! Geometry utilities: points, rectangles, angles, and local/world frames.
//!
//! All coordinates are page pixels with a top-left origin and Y growing
//! downward. Rotations are clockwise in degrees around a box center, matching
//! how the renderer applies an object's `rotation`.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point (or vector) in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn scale(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Both coordinates are finite (neither NaN nor infinite).
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// An axis-aligned rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Normalized rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self { x, y, w: (a.x - b.x).abs(), h: (a.y - b.y).abs() }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect { x: self.x + dx, y: self.y + dy, ..*self }
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Closed-interval intersection test; touching edges count.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right() && other.x <= self.right() && self.y <= other.bottom() && other.y <= self.bottom()
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let r = self.right().max(other.right());
        let b = self.bottom().max(other.bottom());
        Rect { x, y, w: r - x, h: b - y }
    }

    /// Union of every rectangle in `rects`, or `None` when empty.
    pub fn union_all<I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Rect>,
    {
        rects.into_iter().reduce(|acc, r| acc.union(&r))
    }

    /// True when every field differs from `other` by at most `tol`.
    #[must_use]
    pub fn within(&self, other: &Rect, tol: f64) -> bool {
        (self.x - other.x).abs() <= tol
            && (self.y - other.y).abs() <= tol
            && (self.w - other.w).abs() <= tol
            && (self.h - other.h).abs() <= tol
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}

// =============================================================
// Angles and rotation
// =============================================================

#[must_use]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

#[must_use]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Normalize an angle into `[0, 360)`. Display-only; the model keeps raw values.
#[must_use]
pub fn normalize_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r >= 360.0 { 0.0 } else { r }
}

/// Rotate a vector clockwise (in screen space) by `deg` degrees.
#[must_use]
pub fn rotate_vector(v: Point, deg: f64) -> Point {
    let (sin, cos) = deg_to_rad(deg).sin_cos();
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotate `p` around `pivot` by `deg` degrees.
#[must_use]
pub fn rotate_point(p: Point, pivot: Point, deg: f64) -> Point {
    pivot + rotate_vector(p - pivot, deg)
}

/// Angle in degrees of the vector from `from` to `to`, in `(-180, 180]`.
#[must_use]
pub fn angle_deg(from: Point, to: Point) -> f64 {
    rad_to_deg((to.y - from.y).atan2(to.x - from.x))
}

/// Convert a world point into the local frame of a rotated box.
///
/// The local frame has its origin at the box's top-left corner in unrotated
/// space, so a point inside the box maps into `[0, w] x [0, h]`.
#[must_use]
pub fn world_to_local(p: Point, rect: &Rect, rotation_deg: f64) -> Point {
    let c = rect.center();
    let v = rotate_vector(p - c, -rotation_deg);
    Point::new(v.x + rect.w * 0.5, v.y + rect.h * 0.5)
}

/// Inverse of [`world_to_local`].
#[must_use]
pub fn local_to_world(p: Point, rect: &Rect, rotation_deg: f64) -> Point {
    let c = rect.center();
    let v = Point::new(p.x - rect.w * 0.5, p.y - rect.h * 0.5);
    c + rotate_vector(v, rotation_deg)
}

// =============================================================
// Intervals
// =============================================================

/// Length of the overlap between `[a0, a1]` and `[b0, b1]`, or 0 when disjoint.
#[must_use]
pub fn interval_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

/// Round `v` to the nearest multiple of `step`. A non-positive step is a no-op.
#[must_use]
pub fn quantize(v: f64, step: f64) -> f64 {
    if step <= 0.0 || !step.is_finite() {
        return v;
    }
    (v / step).round() * step
}
