#![allow(clippy::float_cmp)]

use float_cmp::approx_eq;
use proptest::prelude::*;

use super::*;

fn page(w: f64, h: f64) -> PageSize {
    PageSize { width: w, height: h }
}

// =============================================================
// PageSize
// =============================================================

#[test]
fn page_size_rejects_non_positive() {
    assert!(PageSize::new(0.0, 10.0).is_err());
    assert!(PageSize::new(10.0, -1.0).is_err());
    assert!(PageSize::new(f64::NAN, 10.0).is_err());
    assert!(PageSize::new(800.0, 600.0).is_ok());
}

// =============================================================
// to_relative / to_absolute
// =============================================================

#[test]
fn to_relative_divides_by_page() {
    let rel = to_relative(&Rect::new(100.0, 150.0, 200.0, 75.0), page(1000.0, 750.0));
    assert_eq!(rel, RelBox { x: 0.1, y: 0.2, w: 0.2, h: 0.1 });
}

#[test]
fn to_relative_clamps_outside_page() {
    let rel = to_relative(&Rect::new(-50.0, 900.0, 2000.0, 10.0), page(1000.0, 800.0));
    assert_eq!(rel.x, 0.0);
    assert_eq!(rel.y, 1.0);
    assert_eq!(rel.w, 1.0);
}

#[test]
fn to_absolute_floors_size() {
    let abs = to_absolute(&RelBox { x: 0.5, y: 0.5, w: 0.0, h: 0.0001 }, page(1000.0, 1000.0));
    assert_eq!(abs.x, 500.0);
    assert_eq!(abs.w, 2.0);
    assert_eq!(abs.h, 2.0);
}

#[test]
fn rescale_to_bigger_page_scales_box() {
    let rel = to_relative(&Rect::new(10.0, 20.0, 30.0, 40.0), page(100.0, 200.0));
    let abs = to_absolute(&rel, page(200.0, 400.0));
    assert!(approx_eq!(f64, abs.x, 20.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, abs.y, 40.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, abs.w, 60.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, abs.h, 80.0, epsilon = 1e-9));
}

#[test]
fn try_to_relative_without_page_is_unavailable() {
    let err = try_to_relative(&Rect::new(0.0, 0.0, 10.0, 10.0), 3, None).unwrap_err();
    assert_eq!(err, ProjectionError::Unavailable { page: 3 });
}

// =============================================================
// Properties
// =============================================================

fn page_and_box() -> impl Strategy<Value = (PageSize, Rect)> {
    (10.0f64..4000.0, 10.0f64..4000.0).prop_flat_map(|(pw, ph)| {
        (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0).prop_map(move |(fx, fy, fw, fh)| {
            // Keep the box fully inside the page with at least the 2px floor.
            let w = (2.0 + fw * (pw - 2.0)).min(pw);
            let h = (2.0 + fh * (ph - 2.0)).min(ph);
            let x = fx * (pw - w);
            let y = fy * (ph - h);
            (page(pw, ph), Rect::new(x, y, w, h))
        })
    })
}

fn check_projection_roundtrip(p: PageSize, b: Rect) -> Result<(), TestCaseError> {
    let back = to_absolute(&to_relative(&b, p), p);
    prop_assert!((back.x - b.x).abs() <= 1.0);
    prop_assert!((back.y - b.y).abs() <= 1.0);
    prop_assert!((back.w - b.w).abs() <= 1.0);
    prop_assert!((back.h - b.h).abs() <= 1.0);
    Ok(())
}

proptest! {
    #[test]
    fn projection_roundtrip_within_one_pixel((p, b) in page_and_box()) {
        check_projection_roundtrip(p, b)?;
    }
}
