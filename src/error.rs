//! Error taxonomy for the scene engine.
//!
//! Every error here is local to one operation: the call is rejected and the
//! scene stays in its last valid state. Hosts map errors to a transient status
//! message through [`ErrorCode`].

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::doc::{GroupId, ObjectId};

// =============================================================================
// CODES
// =============================================================================

/// Stable, machine-readable error codes for host status reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    /// Whether the host may retry the same call later and expect success.
    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// An operation targets something missing or would break a group invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreconditionError {
    #[error("page not found: {0}")]
    PageNotFound(usize),
    #[error("object not found on page {page}: {id}")]
    ObjectNotFound { page: usize, id: ObjectId },
    #[error("group not found on page {page}: {id}")]
    GroupNotFound { page: usize, id: GroupId },
    #[error("a group needs at least 2 distinct objects, got {0}")]
    GroupTooSmall(usize),
    #[error("group id already exists: {0}")]
    GroupIdCollision(GroupId),
    #[error("object id already exists: {0}")]
    DuplicateObjectId(ObjectId),
    #[error("group membership inconsistent: {0}")]
    GroupMembership(String),
    #[error("malformed draft: {0}")]
    MalformedDraft(String),
    #[error("a transform is already in progress")]
    TransformInProgress,
    #[error("no transform in progress")]
    NoTransform,
    #[error("selection is empty")]
    EmptySelection,
    #[error("object is not a clip shape: {0}")]
    NotAClipShape(ObjectId),
    #[error("resize needs exactly one selected object, got {0}")]
    ResizeNeedsSingleObject(usize),
}

/// A transform received input that cannot produce a valid box.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("non-finite {what}: ({x}, {y})")]
    NonFinite { what: &'static str, x: f64, y: f64 },
    #[error("degenerate box: {w} x {h}")]
    Degenerate { w: f64, h: f64 },
}

/// Relative-coordinate conversion is not possible yet.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("page {page} has no pixel dimensions yet")]
    Unavailable { page: usize },
    #[error("invalid page size: {width} x {height}")]
    InvalidPageSize { width: f64, height: f64 },
}

/// Any error produced by the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl ErrorCode for PreconditionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::PageNotFound(_) => "E_PAGE_NOT_FOUND",
            Self::ObjectNotFound { .. } => "E_OBJECT_NOT_FOUND",
            Self::GroupNotFound { .. } => "E_GROUP_NOT_FOUND",
            Self::GroupTooSmall(_) => "E_GROUP_TOO_SMALL",
            Self::GroupIdCollision(_) => "E_GROUP_ID_COLLISION",
            Self::DuplicateObjectId(_) => "E_DUPLICATE_OBJECT_ID",
            Self::GroupMembership(_) => "E_GROUP_MEMBERSHIP",
            Self::MalformedDraft(_) => "E_MALFORMED_DRAFT",
            Self::TransformInProgress => "E_TRANSFORM_IN_PROGRESS",
            Self::NoTransform => "E_NO_TRANSFORM",
            Self::EmptySelection => "E_EMPTY_SELECTION",
            Self::NotAClipShape(_) => "E_NOT_A_CLIP_SHAPE",
            Self::ResizeNeedsSingleObject(_) => "E_RESIZE_NEEDS_SINGLE_OBJECT",
        }
    }
}

impl ErrorCode for GeometryError {
    fn error_code(&self) -> &'static str {
        "E_GEOMETRY"
    }
}

impl ErrorCode for ProjectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "E_PROJECTION_UNAVAILABLE",
            Self::InvalidPageSize { .. } => "E_INVALID_PAGE_SIZE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl ErrorCode for SceneError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Precondition(e) => e.error_code(),
            Self::Geometry(e) => e.error_code(),
            Self::Projection(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Precondition(e) => e.retryable(),
            Self::Geometry(e) => e.retryable(),
            Self::Projection(e) => e.retryable(),
        }
    }
}

/// Convenience alias used across the crate.
pub type SceneResult<T> = Result<T, SceneError>;
