//! Relative-coordinate projector.
//!
//! Object boxes are stored twice: in absolute page pixels (authoritative while
//! editing) and as fractions of the page's pixel size (authoritative when the
//! page is re-rendered at a different size). This module converts between the
//! two. It needs the page's current pixel size, which only the external page
//! renderer knows; until then conversion reports
//! [`ProjectionError::Unavailable`](crate::error::ProjectionError::Unavailable).

#[cfg(test)]
#[path = "project_test.rs"]
mod project_test;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_BOX_PX;
use crate::error::ProjectionError;
use crate::geom::Rect;

/// Pixel dimensions of a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// Validate and build a page size. Both dimensions must be finite and positive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPageSize` for non-positive or non-finite dimensions.
    pub fn new(width: f64, height: f64) -> Result<Self, ProjectionError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ProjectionError::InvalidPageSize { width, height });
        }
        Ok(Self { width, height })
    }
}

/// A box expressed as fractions of the page size, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Project an absolute box onto the page, clamping each fraction to `[0, 1]`.
#[must_use]
pub fn to_relative(rect: &Rect, page: PageSize) -> RelBox {
    RelBox {
        x: (rect.x / page.width).clamp(0.0, 1.0),
        y: (rect.y / page.height).clamp(0.0, 1.0),
        w: (rect.w / page.width).clamp(0.0, 1.0),
        h: (rect.h / page.height).clamp(0.0, 1.0),
    }
}

/// Expand a relative box back to page pixels, flooring width/height at
/// [`MIN_BOX_PX`].
#[must_use]
pub fn to_absolute(rel: &RelBox, page: PageSize) -> Rect {
    Rect {
        x: rel.x * page.width,
        y: rel.y * page.height,
        w: (rel.w * page.width).max(MIN_BOX_PX),
        h: (rel.h * page.height).max(MIN_BOX_PX),
    }
}

/// Like [`to_relative`] but for a page whose size may not be known yet.
///
/// # Errors
///
/// Returns `Unavailable` when `page` is `None`.
pub fn try_to_relative(rect: &Rect, page_index: usize, page: Option<PageSize>) -> Result<RelBox, ProjectionError> {
    let page = page.ok_or(ProjectionError::Unavailable { page: page_index })?;
    Ok(to_relative(rect, page))
}
