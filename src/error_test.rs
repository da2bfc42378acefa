use super::*;

// =============================================================
// Codes
// =============================================================

#[test]
fn precondition_codes_are_distinct() {
    let errors = [
        PreconditionError::PageNotFound(0),
        PreconditionError::ObjectNotFound { page: 0, id: "a".into() },
        PreconditionError::GroupNotFound { page: 0, id: "g".into() },
        PreconditionError::GroupTooSmall(1),
        PreconditionError::GroupIdCollision("g".into()),
        PreconditionError::DuplicateObjectId("a".into()),
        PreconditionError::GroupMembership("x".into()),
        PreconditionError::MalformedDraft("x".into()),
        PreconditionError::TransformInProgress,
        PreconditionError::NoTransform,
        PreconditionError::EmptySelection,
        PreconditionError::NotAClipShape("a".into()),
        PreconditionError::ResizeNeedsSingleObject(2),
    ];
    let mut codes: Vec<&str> = errors.iter().map(ErrorCode::error_code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn scene_error_delegates_code() {
    let err: SceneError = PreconditionError::PageNotFound(3).into();
    assert_eq!(err.error_code(), "E_PAGE_NOT_FOUND");
    let err: SceneError = GeometryError::NonFinite { what: "delta", x: f64::NAN, y: 0.0 }.into();
    assert_eq!(err.error_code(), "E_GEOMETRY");
}

#[test]
fn only_unavailable_projection_is_retryable() {
    let err: SceneError = ProjectionError::Unavailable { page: 1 }.into();
    assert!(err.retryable());
    let err: SceneError = ProjectionError::InvalidPageSize { width: 0.0, height: 10.0 }.into();
    assert!(!err.retryable());
    let err: SceneError = PreconditionError::NoTransform.into();
    assert!(!err.retryable());
}

// =============================================================
// Display
// =============================================================

#[test]
fn display_is_transparent() {
    let err: SceneError = PreconditionError::GroupTooSmall(1).into();
    assert_eq!(err.to_string(), "a group needs at least 2 distinct objects, got 1");
    let err: SceneError = ProjectionError::Unavailable { page: 2 }.into();
    assert_eq!(err.to_string(), "page 2 has no pixel dimensions yet");
}
