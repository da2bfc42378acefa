//! Engine tunables.
//!
//! Hosts usually pass partial JSON (every field has a default) or rely on
//! `SCENE_*` environment variables when the engine runs natively.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::{
    GRID_STEP_PX, GUIDE_MAX_DISTANCE_PX, GUIDE_MIN_OVERLAP_PX, GUIDE_MIN_OVERLAP_RATIO, GUIDE_SNAP_THRESHOLD_PX,
    HANDLE_RADIUS_PX, MIN_RESIZE_PX, ROTATE_HANDLE_OFFSET_PX, ROTATION_STEP_DEG,
};

/// Which transforms the grid applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapScope {
    Move,
    Resize,
    #[default]
    Both,
}

/// Whether the grid is always on or only while the grid modifier is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapActivation {
    #[default]
    Always,
    WhileModifier,
}

/// The transform a snap request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapOp {
    Move,
    Resize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSnapConfig {
    pub enabled: bool,
    pub step: f64,
    pub scope: SnapScope,
    pub activation: SnapActivation,
}

impl Default for GridSnapConfig {
    fn default() -> Self {
        Self { enabled: false, step: GRID_STEP_PX, scope: SnapScope::Both, activation: SnapActivation::Always }
    }
}

impl GridSnapConfig {
    /// Whether the grid should quantize a box produced by `op` right now.
    #[must_use]
    pub fn applies(&self, op: SnapOp, modifier_held: bool) -> bool {
        if !self.enabled || self.step <= 0.0 {
            return false;
        }
        let in_scope = match self.scope {
            SnapScope::Both => true,
            SnapScope::Move => op == SnapOp::Move,
            SnapScope::Resize => op == SnapOp::Resize,
        };
        in_scope && (self.activation == SnapActivation::Always || modifier_held)
    }
}

/// Nearest-neighbor distance guides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    pub enabled: bool,
    /// Neighbors farther than this are ignored.
    pub max_distance: f64,
    pub min_overlap_px: f64,
    pub min_overlap_ratio: f64,
    /// Gaps strictly below this pull the moving edge flush. Zero disables hard snapping.
    pub snap_threshold: f64,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_distance: GUIDE_MAX_DISTANCE_PX,
            min_overlap_px: GUIDE_MIN_OVERLAP_PX,
            min_overlap_ratio: GUIDE_MIN_OVERLAP_RATIO,
            snap_threshold: GUIDE_SNAP_THRESHOLD_PX,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub grid: GridSnapConfig,
    pub guides: GuideConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Resize floor for either dimension, in page pixels.
    pub min_size: f64,
    /// Rotation quantisation step while the constrain modifier is held.
    pub rotation_step_deg: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self { min_size: MIN_RESIZE_PX, rotation_step_deg: ROTATION_STEP_DEG }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitConfig {
    pub handle_radius: f64,
    pub rotate_handle_offset: f64,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self { handle_radius: HANDLE_RADIUS_PX, rotate_handle_offset: ROTATE_HANDLE_OFFSET_PX }
    }
}

/// Everything the engine can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub snap: SnapConfig,
    pub transform: TransformConfig,
    pub hit: HitConfig,
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed JSON or mistyped fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load overrides from `SCENE_*` environment variables. Unset or
    /// unparsable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let grid = &mut config.snap.grid;
        grid.enabled = env_parse("SCENE_GRID_ENABLED", grid.enabled);
        grid.step = env_parse("SCENE_GRID_STEP", grid.step);

        let guides = &mut config.snap.guides;
        guides.max_distance = env_parse("SCENE_GUIDE_MAX_DISTANCE", guides.max_distance);
        guides.min_overlap_px = env_parse("SCENE_GUIDE_MIN_OVERLAP_PX", guides.min_overlap_px);
        guides.min_overlap_ratio = env_parse("SCENE_GUIDE_MIN_OVERLAP_RATIO", guides.min_overlap_ratio);
        guides.snap_threshold = env_parse("SCENE_GUIDE_SNAP_THRESHOLD", guides.snap_threshold);

        let transform = &mut config.transform;
        transform.min_size = env_parse("SCENE_MIN_RESIZE_PX", transform.min_size);
        transform.rotation_step_deg = env_parse("SCENE_ROTATION_STEP_DEG", transform.rotation_step_deg);

        info!(
            grid_enabled = config.snap.grid.enabled,
            grid_step = config.snap.grid.step,
            guide_max_distance = config.snap.guides.max_distance,
            min_size = config.transform.min_size,
            "scene engine config loaded"
        );
        config
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key).map_or(default, |v| v.trim().parse::<T>().unwrap_or(default))
}
