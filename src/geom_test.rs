#![allow(clippy::float_cmp)]

use float_cmp::approx_eq;
use proptest::prelude::*;

use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn close(a: Point, b: Point) -> bool {
    approx_eq!(f64, a.x, b.x, epsilon = 1e-9) && approx_eq!(f64, a.y, b.y, epsilon = 1e-9)
}

// =============================================================
// Point
// =============================================================

#[test]
fn point_add_sub() {
    assert_eq!(pt(1.0, 2.0) + pt(3.0, 4.0), pt(4.0, 6.0));
    assert_eq!(pt(1.0, 2.0) - pt(3.0, 5.0), pt(-2.0, -3.0));
}

#[test]
fn point_scale_and_length() {
    assert_eq!(pt(3.0, 4.0).length(), 5.0);
    assert_eq!(pt(1.0, -2.0).scale(2.0), pt(2.0, -4.0));
}

#[test]
fn point_is_finite() {
    assert!(pt(0.0, 1.0).is_finite());
    assert!(!pt(f64::NAN, 1.0).is_finite());
    assert!(!pt(0.0, f64::INFINITY).is_finite());
}

// =============================================================
// Rect
// =============================================================

#[test]
fn rect_from_corners_normalizes() {
    let r = Rect::from_corners(pt(10.0, 20.0), pt(0.0, 5.0));
    assert_eq!(r, Rect::new(0.0, 5.0, 10.0, 15.0));
}

#[test]
fn rect_edges_and_center() {
    let r = Rect::new(10.0, 20.0, 30.0, 40.0);
    assert_eq!(r.right(), 40.0);
    assert_eq!(r.bottom(), 60.0);
    assert_eq!(r.center(), pt(25.0, 40.0));
}

#[test]
fn rect_contains_is_inclusive() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(r.contains(pt(0.0, 0.0)));
    assert!(r.contains(pt(10.0, 10.0)));
    assert!(!r.contains(pt(10.1, 5.0)));
}

#[test]
fn rect_intersects_touching_edges() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
    assert!(!a.intersects(&Rect::new(10.5, 0.0, 5.0, 5.0)));
}

#[test]
fn rect_within_tolerance() {
    let r = Rect::new(10.0, 10.0, 50.0, 50.0);
    assert!(r.within(&Rect::new(10.6, 9.4, 51.0, 50.0), 1.0));
    assert!(!r.within(&Rect::new(10.0, 10.0, 52.0, 50.0), 1.0));
}

#[test]
fn rect_union_all_empty_is_none() {
    assert!(Rect::union_all(Vec::new()).is_none());
}

#[test]
fn rect_union_all_spans_inputs() {
    let u = Rect::union_all([Rect::new(0.0, 0.0, 40.0, 40.0), Rect::new(100.0, 0.0, 40.0, 40.0)]);
    assert_eq!(u, Some(Rect::new(0.0, 0.0, 140.0, 40.0)));
}

// =============================================================
// Angles
// =============================================================

#[test]
fn normalize_deg_wraps() {
    assert_eq!(normalize_deg(370.0), 10.0);
    assert_eq!(normalize_deg(-90.0), 270.0);
    assert_eq!(normalize_deg(720.0), 0.0);
}

#[test]
fn rotate_vector_quarter_turn_is_clockwise_on_screen() {
    // +X rotated 90 degrees points down (+Y) in screen space.
    assert!(close(rotate_vector(pt(1.0, 0.0), 90.0), pt(0.0, 1.0)));
}

#[test]
fn rotate_point_around_pivot() {
    assert!(close(rotate_point(pt(20.0, 10.0), pt(10.0, 10.0), 180.0), pt(0.0, 10.0)));
}

#[test]
fn angle_deg_cardinal_directions() {
    let c = pt(0.0, 0.0);
    assert_eq!(angle_deg(c, pt(1.0, 0.0)), 0.0);
    assert_eq!(angle_deg(c, pt(0.0, 1.0)), 90.0);
    assert_eq!(angle_deg(c, pt(-1.0, 0.0)), 180.0);
}

#[test]
fn world_to_local_unrotated_is_offset() {
    let r = Rect::new(10.0, 20.0, 100.0, 50.0);
    assert!(close(world_to_local(pt(15.0, 25.0), &r, 0.0), pt(5.0, 5.0)));
}

#[test]
fn world_to_local_rotated_maps_corner() {
    let r = Rect::new(0.0, 0.0, 100.0, 50.0);
    let corner = local_to_world(pt(100.0, 0.0), &r, 90.0);
    // Top-right of a box rotated 90 degrees lands below the center.
    assert!(close(corner, pt(75.0, 75.0)));
    assert!(close(world_to_local(corner, &r, 90.0), pt(100.0, 0.0)));
}

// =============================================================
// Intervals and quantize
// =============================================================

#[test]
fn interval_overlap_cases() {
    assert_eq!(interval_overlap(0.0, 10.0, 5.0, 20.0), 5.0);
    assert_eq!(interval_overlap(0.0, 10.0, 10.0, 20.0), 0.0);
    assert_eq!(interval_overlap(0.0, 10.0, 15.0, 20.0), 0.0);
    assert_eq!(interval_overlap(0.0, 10.0, 2.0, 3.0), 1.0);
}

#[test]
fn quantize_rounds_to_step() {
    assert_eq!(quantize(14.0, 10.0), 10.0);
    assert_eq!(quantize(15.0, 10.0), 20.0);
    assert_eq!(quantize(-4.0, 10.0), 0.0);
    assert_eq!(quantize(7.3, 0.0), 7.3);
}

// =============================================================
// Properties
// =============================================================

fn point_strategy() -> impl Strategy<Value = Point> {
    (-2000.0f64..2000.0, -2000.0f64..2000.0).prop_map(|(x, y)| Point::new(x, y))
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-1000.0f64..1000.0, -1000.0f64..1000.0, 1.0f64..800.0, 1.0f64..800.0)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn check_local_world_roundtrip(p: Point, r: Rect, deg: f64) -> Result<(), TestCaseError> {
    let back = local_to_world(world_to_local(p, &r, deg), &r, deg);
    prop_assert!(approx_eq!(f64, back.x, p.x, epsilon = 1e-6));
    prop_assert!(approx_eq!(f64, back.y, p.y, epsilon = 1e-6));
    Ok(())
}

fn check_rotation_preserves_length(p: Point, deg: f64) -> Result<(), TestCaseError> {
    let r = rotate_vector(p, deg);
    prop_assert!(approx_eq!(f64, r.length(), p.length(), epsilon = 1e-6));
    Ok(())
}

fn check_quantize_idempotent(v: f64, step: f64) -> Result<(), TestCaseError> {
    let once = quantize(v, step);
    prop_assert_eq!(quantize(once, step), once);
    Ok(())
}

proptest! {
    #[test]
    fn local_world_roundtrip(p in point_strategy(), r in rect_strategy(), deg in -720.0f64..720.0) {
        check_local_world_roundtrip(p, r, deg)?;
    }

    #[test]
    fn rotation_preserves_length(p in point_strategy(), deg in -720.0f64..720.0) {
        check_rotation_preserves_length(p, deg)?;
    }

    #[test]
    fn quantize_idempotent(v in -5000.0f64..5000.0, step in 0.5f64..50.0) {
        check_quantize_idempotent(v, step)?;
    }
}
