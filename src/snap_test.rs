#![allow(clippy::float_cmp)]

use proptest::prelude::*;

use super::*;
use crate::config::GridSnapConfig;
use crate::doc::{ObjectBody, ShapeBody};

fn make_object_at(id: &str, x: f64, y: f64, w: f64, h: f64) -> SceneObject {
    SceneObject::new(id, Rect::new(x, y, w, h), ObjectBody::Shape(ShapeBody::default()))
}

fn page_of(objects: Vec<SceneObject>) -> Page {
    Page { objects, ..Page::default() }
}

fn guides_cfg(max_distance: f64) -> GuideConfig {
    GuideConfig { max_distance, ..GuideConfig::default() }
}

fn rect_of(page: &Page, id: &str) -> Rect {
    page.object(id).map(SceneObject::rect).unwrap_or_default()
}

const NONE: [&str; 0] = [];

// =============================================================
// Grid
// =============================================================

#[test]
fn grid_move_rounds_position_only() {
    let r = snap_to_grid(Rect::new(14.0, 26.0, 33.0, 47.0), 10.0, SnapOp::Move);
    assert_eq!(r, Rect::new(10.0, 30.0, 33.0, 47.0));
}

#[test]
fn grid_resize_rounds_size_with_floor() {
    let r = snap_to_grid(Rect::new(14.0, 26.0, 33.0, 3.0), 10.0, SnapOp::Resize);
    assert_eq!(r, Rect::new(10.0, 30.0, 30.0, 10.0));
}

#[test]
fn grid_ignores_bad_step() {
    let r = Rect::new(1.5, 2.5, 3.0, 4.0);
    assert_eq!(snap_to_grid(r, 0.0, SnapOp::Move), r);
    assert_eq!(snap_to_grid(r, f64::NAN, SnapOp::Resize), r);
}

// =============================================================
// Nearest neighbors
// =============================================================

#[test]
fn right_neighbor_at_fifty() {
    let page = page_of(vec![make_object_at("A", 100.0, 100.0, 50.0, 50.0), make_object_at("B", 200.0, 100.0, 50.0, 50.0)]);
    let guides = nearest_neighbors(&page, &rect_of(&page, "A"), &["A"], &guides_cfg(200.0));
    assert_eq!(guides.right, Some(GuideHit { candidate_id: "B".into(), distance: 50.0, has_overlap: true }));
    assert!(guides.left.is_none());
    assert!(guides.top.is_none());
    assert!(guides.bottom.is_none());
}

#[test]
fn neighbors_are_symmetric() {
    let page = page_of(vec![make_object_at("A", 100.0, 100.0, 50.0, 50.0), make_object_at("B", 200.0, 120.0, 30.0, 80.0)]);
    let from_a = nearest_neighbors(&page, &rect_of(&page, "A"), &["A"], &guides_cfg(200.0));
    let from_b = nearest_neighbors(&page, &rect_of(&page, "B"), &["B"], &guides_cfg(200.0));
    let right = from_a.right.unwrap();
    let left = from_b.left.unwrap();
    assert_eq!(right.candidate_id, "B");
    assert_eq!(left.candidate_id, "A");
    assert_eq!(right.distance, left.distance);
}

#[test]
fn touching_and_overlapping_are_excluded() {
    let page = page_of(vec![
        make_object_at("m", 0.0, 0.0, 50.0, 50.0),
        make_object_at("touch", 50.0, 0.0, 20.0, 20.0),
        make_object_at("over", 40.0, 40.0, 20.0, 20.0),
    ]);
    let guides = nearest_neighbors(&page, &rect_of(&page, "m"), &["m"], &guides_cfg(200.0));
    assert!(guides.is_empty());
}

#[test]
fn beyond_max_distance_is_ignored() {
    let page = page_of(vec![make_object_at("m", 0.0, 0.0, 10.0, 10.0), make_object_at("far", 300.0, 0.0, 10.0, 10.0)]);
    let guides = nearest_neighbors(&page, &rect_of(&page, "m"), &["m"], &guides_cfg(200.0));
    assert!(guides.right.is_none());
    let guides = nearest_neighbors(&page, &rect_of(&page, "m"), &["m"], &guides_cfg(290.0));
    assert_eq!(guides.right.map(|g| g.distance), Some(290.0));
}

#[test]
fn aligned_candidate_beats_closer_unaligned_one() {
    let page = page_of(vec![
        make_object_at("m", 0.0, 100.0, 50.0, 50.0),
        make_object_at("offaxis", 60.0, 400.0, 20.0, 20.0),
        make_object_at("aligned", 90.0, 110.0, 20.0, 20.0),
    ]);
    let guides = nearest_neighbors(&page, &rect_of(&page, "m"), &["m"], &guides_cfg(500.0));
    let right = guides.right.unwrap();
    assert_eq!(right.candidate_id, "aligned");
    assert_eq!(right.distance, 40.0);
    assert!(right.has_overlap);
}

#[test]
fn falls_back_to_closest_when_nothing_aligns() {
    let page = page_of(vec![
        make_object_at("m", 0.0, 100.0, 50.0, 50.0),
        make_object_at("near", 60.0, 400.0, 20.0, 20.0),
        make_object_at("farther", 90.0, 0.0, 20.0, 20.0),
    ]);
    let guides = nearest_neighbors(&page, &rect_of(&page, "m"), &["m"], &guides_cfg(500.0));
    let right = guides.right.unwrap();
    assert_eq!(right.candidate_id, "near");
    assert!(!right.has_overlap);
}

#[test]
fn sliver_overlap_does_not_count_as_aligned() {
    // 2px overlap is below the 4px floor.
    let page = page_of(vec![make_object_at("m", 0.0, 0.0, 50.0, 50.0), make_object_at("b", 80.0, 48.0, 50.0, 50.0)]);
    let guides = nearest_neighbors(&page, &rect_of(&page, "m"), &["m"], &guides_cfg(200.0));
    assert_eq!(guides.right.map(|g| g.has_overlap), Some(false));
}

#[test]
fn excluded_ids_are_skipped() {
    let page = page_of(vec![make_object_at("m", 0.0, 0.0, 10.0, 10.0), make_object_at("mate", 20.0, 0.0, 10.0, 10.0)]);
    let guides = nearest_neighbors(&page, &Rect::new(0.0, 0.0, 10.0, 10.0), &["m", "mate"], &guides_cfg(200.0));
    assert!(guides.is_empty());
}

// =============================================================
// Hard snap and pipeline
// =============================================================

#[test]
fn hard_snap_pulls_edge_flush() {
    let page = page_of(vec![make_object_at("b", 100.0, 0.0, 50.0, 50.0)]);
    let proposed = Rect::new(46.0, 0.0, 50.0, 50.0);
    let result = snap_box(&page, proposed, &NONE, SnapOp::Move, false, &SnapConfig::default());
    assert_eq!(result.rect, Rect::new(50.0, 0.0, 50.0, 50.0));
    assert_eq!(result.guides.right.as_ref().map(|g| (g.candidate_id.as_str(), g.distance)), Some(("b", 0.0)));
}

#[test]
fn flush_side_is_only_reported_by_snap_box() {
    let page = page_of(vec![make_object_at("b", 100.0, 0.0, 50.0, 50.0)]);
    let result = snap_box(&page, Rect::new(46.0, 0.0, 50.0, 50.0), &NONE, SnapOp::Move, false, &SnapConfig::default());
    let plain = nearest_neighbors(&page, &result.rect, &NONE, &SnapConfig::default().guides);
    assert!(plain.right.is_none());
    assert_eq!(result.guides.right.map(|g| g.distance), Some(0.0));
}

#[test]
fn hard_snap_picks_closer_side() {
    let guides = Guides {
        left: Some(GuideHit { candidate_id: "l".into(), distance: 3.0, has_overlap: true }),
        right: Some(GuideHit { candidate_id: "r".into(), distance: 2.0, has_overlap: true }),
        top: Some(GuideHit { candidate_id: "t".into(), distance: 9.0, has_overlap: true }),
        bottom: None,
    };
    let (rect, dirs) = hard_snap(Rect::new(0.0, 0.0, 10.0, 10.0), &guides, 6.0);
    assert_eq!(rect, Rect::new(2.0, 0.0, 10.0, 10.0));
    assert_eq!(dirs, vec![Direction::Right]);
}

#[test]
fn resize_reports_guides_without_moving() {
    let page = page_of(vec![make_object_at("b", 100.0, 0.0, 50.0, 50.0)]);
    let proposed = Rect::new(46.0, 0.0, 50.0, 50.0);
    let result = snap_box(&page, proposed, &NONE, SnapOp::Resize, false, &SnapConfig::default());
    assert_eq!(result.rect, proposed);
    assert_eq!(result.guides.right.map(|g| g.distance), Some(4.0));
}

#[test]
fn grid_runs_before_guides() {
    let page = page_of(vec![make_object_at("b", 100.0, 0.0, 50.0, 50.0)]);
    let config = SnapConfig { grid: GridSnapConfig { enabled: true, ..GridSnapConfig::default() }, ..SnapConfig::default() };
    // 43 -> 40 on the grid leaves a 10px gap, above the hard-snap threshold.
    let result = snap_box(&page, Rect::new(43.0, 0.0, 50.0, 50.0), &NONE, SnapOp::Move, false, &config);
    assert_eq!(result.rect, Rect::new(40.0, 0.0, 50.0, 50.0));
    assert_eq!(result.guides.right.map(|g| g.distance), Some(10.0));
}

#[test]
fn disabled_guides_return_nothing() {
    let page = page_of(vec![make_object_at("b", 100.0, 0.0, 50.0, 50.0)]);
    let mut config = SnapConfig::default();
    config.guides.enabled = false;
    let result = snap_box(&page, Rect::new(46.0, 0.0, 50.0, 50.0), &NONE, SnapOp::Move, false, &config);
    assert!(result.guides.is_empty());
    assert_eq!(result.rect.x, 46.0);
}

#[test]
fn guides_serialize_camel_case_and_skip_absent() {
    let guides = Guides {
        right: Some(GuideHit { candidate_id: "B".into(), distance: 50.0, has_overlap: true }),
        ..Guides::default()
    };
    let v = serde_json::to_value(&guides).unwrap();
    assert_eq!(v["right"]["candidateId"], "B");
    assert!(v.get("left").is_none());
}

proptest! {
    #[test]
    fn grid_snap_is_idempotent(x in -1e4f64..1e4, y in -1e4f64..1e4, w in 1f64..500.0, h in 1f64..500.0, step in 1f64..50.0) {
        for op in [SnapOp::Move, SnapOp::Resize] {
            let once = snap_to_grid(Rect::new(x, y, w, h), step, op);
            let twice = snap_to_grid(once, step, op);
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn snap_box_is_stateless(x in -100f64..300.0, y in -100f64..300.0) {
        let page = page_of(vec![make_object_at("b", 100.0, 0.0, 50.0, 50.0), make_object_at("c", 0.0, 120.0, 40.0, 40.0)]);
        let config = SnapConfig::default();
        let proposed = Rect::new(x, y, 30.0, 30.0);
        let first = snap_box(&page, proposed, &NONE, SnapOp::Move, false, &config);
        let second = snap_box(&page, proposed, &NONE, SnapOp::Move, false, &config);
        prop_assert_eq!(first, second);
    }
}
