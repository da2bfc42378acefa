//! Input model: pointer buttons, modifier keys, and what each modifier means.
//!
//! The host translates DOM events into these types (pointer positions are
//! already in page pixels). The mapping from keys to behaviour lives here so
//! the transform engine and selection controller never look at raw keys.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }

    /// Resize keeps the original width/height ratio; rotation snaps to steps.
    #[must_use]
    pub fn constrain(self) -> bool {
        self.shift
    }

    /// Resize grows and shrinks symmetrically about the center.
    #[must_use]
    pub fn symmetric(self) -> bool {
        self.alt
    }

    /// Holds the grid on when the grid is configured for modifier activation.
    #[must_use]
    pub fn grid(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Whether a click should add to or toggle within the current selection
/// instead of replacing it.
#[must_use]
pub fn is_additive(button: Button, modifiers: Modifiers) -> bool {
    button == Button::Secondary || modifiers.shift
}
