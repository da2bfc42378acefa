//! Shared numeric constants for the scene engine.

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height an object box may hold after projection, in page pixels.
pub const MIN_BOX_PX: f64 = 2.0;

/// Default floor applied by the transform engine while resizing, in page pixels.
pub const MIN_RESIZE_PX: f64 = 10.0;

/// Tolerance used when comparing derived coordinates.
pub const EPSILON: f64 = 1e-9;

// ── Hit-testing ─────────────────────────────────────────────────

/// Hit slop around resize and rotate handles, in page pixels.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the top edge to the rotate handle, in page pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;

// ── Snapping ────────────────────────────────────────────────────

/// Default grid step in page pixels.
pub const GRID_STEP_PX: f64 = 10.0;

/// Neighbors farther than this are ignored by the distance guides.
pub const GUIDE_MAX_DISTANCE_PX: f64 = 200.0;

/// Absolute orthogonal overlap required for a guide candidate to count as aligned.
pub const GUIDE_MIN_OVERLAP_PX: f64 = 4.0;

/// Relative orthogonal overlap (fraction of the shorter span) required for alignment.
pub const GUIDE_MIN_OVERLAP_RATIO: f64 = 0.2;

/// Gap below which a moving edge is pulled flush onto its neighbor.
pub const GUIDE_SNAP_THRESHOLD_PX: f64 = 6.0;

/// Rotation quantisation step while the constrain modifier is held, in degrees.
pub const ROTATION_STEP_DEG: f64 = 15.0;

// ── Clip shapes ─────────────────────────────────────────────────

/// Lower bound for a clip-shape image zoom.
pub const CLIP_SCALE_MIN: f64 = 0.25;

/// Upper bound for a clip-shape image zoom.
pub const CLIP_SCALE_MAX: f64 = 6.0;
