//! Clip-shape image transform.
//!
//! A `clip_shape` hosts one image clipped to the shape outline. The image's
//! scale, pan offset and fit mode live on [`ClipImage`] and are independent
//! of the shape's box: resizing or rotating the shape never touches them, and
//! editing them never touches the box.

#[cfg(test)]
#[path = "clip_test.rs"]
mod clip_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{CLIP_SCALE_MAX, CLIP_SCALE_MIN};
use crate::doc::{Draft, ImageFit};
use crate::edit::{Edit, EditRecorder};
use crate::error::{GeometryError, PreconditionError, SceneResult};
use crate::geom::Rect;

fn default_scale() -> f64 {
    1.0
}

/// The image inside a clip shape, in the shape's local unscaled units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipImage {
    pub src: String,
    #[serde(default)]
    pub fit: ImageFit,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(rename = "offsetX", default)]
    pub offset_x: f64,
    #[serde(rename = "offsetY", default)]
    pub offset_y: f64,
    #[serde(rename = "naturalWidth", default, skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<f64>,
    #[serde(rename = "naturalHeight", default, skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<f64>,
}

impl ClipImage {
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            fit: ImageFit::Cover,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            natural_width: None,
            natural_height: None,
        }
    }

    /// Set the zoom factor, clamped to the supported range.
    ///
    /// # Errors
    ///
    /// Returns `NonFinite` for NaN or infinite input; the scale is unchanged.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), GeometryError> {
        if !scale.is_finite() {
            return Err(GeometryError::NonFinite { what: "clip scale", x: scale, y: scale });
        }
        self.scale = scale.clamp(CLIP_SCALE_MIN, CLIP_SCALE_MAX);
        Ok(())
    }

    /// Multiply the current scale by `factor`, with the same clamp as [`set_scale`](Self::set_scale).
    ///
    /// # Errors
    ///
    /// Returns `NonFinite` for NaN or infinite input.
    pub fn zoom_by(&mut self, factor: f64) -> Result<(), GeometryError> {
        self.set_scale(self.scale * factor)
    }

    /// Pan the image by `(dx, dy)` local units.
    ///
    /// # Errors
    ///
    /// Returns `NonFinite` for NaN or infinite deltas.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Result<(), GeometryError> {
        if !(dx.is_finite() && dy.is_finite()) {
            return Err(GeometryError::NonFinite { what: "clip pan", x: dx, y: dy });
        }
        self.offset_x += dx;
        self.offset_y += dy;
        Ok(())
    }

    /// Reset the pan offset. Scale is kept.
    pub fn recenter(&mut self) {
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    pub fn set_fit(&mut self, fit: ImageFit) {
        self.fit = fit;
    }

    /// Where the image is drawn inside a `w` x `h` shape, in shape-local units
    /// (origin at the shape's top-left).
    ///
    /// The fit mode gives the base size; `scale` zooms about the shape center
    /// and the offset pans. Without a known natural size the image is assumed
    /// to share the shape's aspect ratio.
    #[must_use]
    pub fn placement(&self, w: f64, h: f64) -> Rect {
        let iw = self.natural_width.filter(|v| *v > 0.0).unwrap_or(w);
        let ih = self.natural_height.filter(|v| *v > 0.0).unwrap_or(h);

        let (base_w, base_h) = if iw <= 0.0 || ih <= 0.0 {
            (w, h)
        } else {
            match self.fit {
                ImageFit::Cover => {
                    let k = (w / iw).max(h / ih);
                    (iw * k, ih * k)
                }
                ImageFit::Contain => {
                    let k = (w / iw).min(h / ih);
                    (iw * k, ih * k)
                }
                ImageFit::Fill => (w, h),
            }
        };

        let dw = base_w * self.scale;
        let dh = base_h * self.scale;
        Rect::new((w - dw) * 0.5 + self.offset_x, (h - dh) * 0.5 + self.offset_y, dw, dh)
    }
}

/// Apply `f` to the image of clip shape `id` and record the change.
///
/// # Errors
///
/// Returns `PageNotFound`, `ObjectNotFound`, `NotAClipShape`, or whatever `f`
/// returns. On error the draft is unchanged.
pub fn edit_clip_image<F>(draft: &mut Draft, page_index: usize, id: &str, f: F) -> SceneResult<Edit>
where
    F: FnOnce(&mut ClipImage) -> Result<(), GeometryError>,
{
    let page = draft.page_mut(page_index)?;
    let recorder = EditRecorder::begin(page_index, page);
    let obj = page
        .object_mut(id)
        .ok_or_else(|| PreconditionError::ObjectNotFound { page: page_index, id: id.to_string() })?;
    let image = obj.clip_image_mut().ok_or_else(|| PreconditionError::NotAClipShape(id.to_string()))?;

    let mut next = image.clone();
    f(&mut next)?;
    *image = next;
    debug!(page = page_index, %id, scale = image.scale, "clip image updated");

    Ok(draft.finish(recorder))
}
