#![allow(clippy::float_cmp)]

use float_cmp::approx_eq;
use serde_json::json;

use super::*;
use crate::doc::{ClipShapeBody, ObjectBody, SceneObject, ShapeBody};
use crate::error::SceneError;

fn clip_draft() -> Draft {
    let mut image = ClipImage::new("img://cat.png");
    image.natural_width = Some(400.0);
    image.natural_height = Some(200.0);
    let clip = SceneObject::new(
        "clip",
        Rect::new(10.0, 10.0, 100.0, 100.0),
        ObjectBody::ClipShape(ClipShapeBody { shape: ShapeBody::default(), image }),
    );
    let plain = SceneObject::new("plain", Rect::new(0.0, 0.0, 5.0, 5.0), ObjectBody::Shape(ShapeBody::default()));
    let mut draft = Draft::new();
    draft.page_or_create(0).objects = vec![clip, plain];
    draft
}

// =============================================================
// Scale / pan
// =============================================================

#[test]
fn scale_is_clamped() {
    let mut img = ClipImage::new("a");
    img.set_scale(10.0).unwrap();
    assert_eq!(img.scale, 6.0);
    img.set_scale(0.01).unwrap();
    assert_eq!(img.scale, 0.25);
    img.zoom_by(2.0).unwrap();
    assert_eq!(img.scale, 0.5);
}

#[test]
fn non_finite_scale_is_rejected() {
    let mut img = ClipImage::new("a");
    assert!(img.set_scale(f64::NAN).is_err());
    assert!(img.pan_by(f64::INFINITY, 0.0).is_err());
    assert_eq!(img.scale, 1.0);
    assert_eq!(img.offset_x, 0.0);
}

#[test]
fn recenter_keeps_scale() {
    let mut img = ClipImage::new("a");
    img.set_scale(2.0).unwrap();
    img.pan_by(12.0, -4.0).unwrap();
    img.recenter();
    assert_eq!((img.offset_x, img.offset_y, img.scale), (0.0, 0.0, 2.0));
}

// =============================================================
// Placement
// =============================================================

#[test]
fn cover_fills_the_short_side() {
    let mut img = ClipImage::new("a");
    img.natural_width = Some(400.0);
    img.natural_height = Some(200.0);
    let r = img.placement(100.0, 100.0);
    assert_eq!(r, Rect::new(-50.0, 0.0, 200.0, 100.0));
}

#[test]
fn contain_fits_the_long_side() {
    let mut img = ClipImage::new("a");
    img.natural_width = Some(400.0);
    img.natural_height = Some(200.0);
    img.set_fit(ImageFit::Contain);
    let r = img.placement(100.0, 100.0);
    assert_eq!(r, Rect::new(0.0, 25.0, 100.0, 50.0));
}

#[test]
fn fill_stretches_then_zooms_about_center_and_pans() {
    let mut img = ClipImage::new("a");
    img.set_fit(ImageFit::Fill);
    img.set_scale(2.0).unwrap();
    img.pan_by(5.0, 0.0).unwrap();
    let r = img.placement(80.0, 40.0);
    assert!(approx_eq!(f64, r.x, -35.0, ulps = 2));
    assert!(approx_eq!(f64, r.y, -20.0, ulps = 2));
    assert_eq!((r.w, r.h), (160.0, 80.0));
}

#[test]
fn unknown_natural_size_uses_shape_box() {
    let img = ClipImage::new("a");
    assert_eq!(img.placement(30.0, 60.0), Rect::new(0.0, 0.0, 30.0, 60.0));
}

// =============================================================
// Serde
// =============================================================

#[test]
fn json_uses_camel_offsets_and_default_scale() {
    let img: ClipImage = serde_json::from_value(json!({"src": "x", "offsetX": 3, "fit": "contain"})).unwrap();
    assert_eq!(img.scale, 1.0);
    assert_eq!(img.offset_x, 3.0);
    assert_eq!(img.fit, ImageFit::Contain);
    let v = serde_json::to_value(&img).unwrap();
    assert_eq!(v["offsetY"], 0.0);
}

#[test]
fn clip_shape_object_nests_image() {
    let draft = clip_draft();
    let v = serde_json::to_value(&draft.pages[0].objects[0]).unwrap();
    assert_eq!(v["type"], "clip_shape");
    assert_eq!(v["image"]["src"], "img://cat.png");
    assert_eq!(v["fill"]["type"], "solid");
}

// =============================================================
// Draft edits
// =============================================================

#[test]
fn edit_clip_image_leaves_box_alone() {
    let mut draft = clip_draft();
    let edit = edit_clip_image(&mut draft, 0, "clip", |img| img.zoom_by(1.5)).unwrap();
    let obj = draft.find_object(0, "clip").unwrap();
    assert_eq!(obj.clip_image().unwrap().scale, 1.5);
    assert_eq!(obj.rect(), Rect::new(10.0, 10.0, 100.0, 100.0));
    assert_eq!(edit.object_ids(), vec!["clip".to_string()]);
    assert_eq!(draft.version, 1);
}

#[test]
fn edit_clip_image_rejects_plain_shape() {
    let mut draft = clip_draft();
    let err = edit_clip_image(&mut draft, 0, "plain", |img| {
        img.recenter();
        Ok(())
    })
    .unwrap_err();
    assert_eq!(err, SceneError::from(PreconditionError::NotAClipShape("plain".into())));
}

#[test]
fn failed_closure_leaves_image_unchanged() {
    let mut draft = clip_draft();
    let before = draft.clone();
    assert!(edit_clip_image(&mut draft, 0, "clip", |img| {
        img.recenter();
        img.pan_by(f64::NAN, 1.0)
    })
    .is_err());
    assert_eq!(draft, before);
}
