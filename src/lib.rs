//! Scene and interaction engine for composing marketing drafts on top of a
//! paginated source document.
//!
//! The crate owns the in-memory draft (pages, objects, groups), turns host
//! pointer input into selection changes and move/resize/rotate transforms,
//! snaps proposed geometry to a grid and to neighboring objects, and keeps
//! each object's resolution-independent box in step with its pixel box. It is
//! compiled for the browser as well as natively; the host translates DOM
//! events into page pixels, renders, and persists the [`engine::Action`]s and
//! [`edit::Edit`]s it gets back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Host-facing [`engine::EngineCore`] and its [`engine::Action`]s |
//! | [`doc`] | Draft, page, object and group types with their primitives |
//! | [`edit`] | Reversible diffs returned by every committed mutation |
//! | [`selection`] | Click, additive and lasso selection with group expansion |
//! | [`hit`] | Point, handle and lasso hit-testing |
//! | [`transform`] | Move/resize/rotate state machine and resize math |
//! | [`group`] | Group create, dissolve, bounding box and move |
//! | [`snap`] | Grid snap and nearest-neighbor distance guides |
//! | [`clip`] | Pan/zoom/fit of the image inside a clip shape |
//! | [`project`] | Absolute to relative box projection and back |
//! | [`dynamic`] | Data-bound text placeholders |
//! | [`geom`] | Points, rectangles, angles and local/world frames |
//! | [`input`] | Buttons, modifier keys and what they mean |
//! | [`config`] | Engine tunables from JSON or the environment |
//! | [`error`] | Error taxonomy with stable codes |
//! | [`consts`] | Shared numeric constants (handle radius, snap thresholds, etc.) |

pub mod clip;
pub mod config;
pub mod consts;
pub mod doc;
pub mod dynamic;
pub mod edit;
pub mod engine;
pub mod error;
pub mod geom;
pub mod group;
pub mod hit;
pub mod input;
pub mod project;
pub mod selection;
pub mod snap;
pub mod transform;
