//! Click arming.
//!
//! The VIS-NIR view only reacts to a click while the modifier (Shift) is
//! held, and each armed click fires once. The state lives in an explicit
//! [`InputMode`] owned by the caller and advanced by [`step`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    AwaitingModifier,
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ModifierDown,
    ModifierUp,
    Click {
        button: MouseButton,
        double: bool,
        /// Image-space position, `None` when the click missed the image.
        position: Option<(f64, f64)>,
    },
}

/// Whether clicks need the modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickPolicy {
    RequireModifier,
    Always,
}

/// A click accepted for inspection, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPick {
    pub x: f64,
    pub y: f64,
}

/// Advance the arming state machine by one event.
pub fn step(mode: InputMode, event: InputEvent, policy: ClickPolicy) -> (InputMode, Option<PixelPick>) {
    match event {
        InputEvent::ModifierDown => (InputMode::Armed, None),
        InputEvent::ModifierUp => (InputMode::AwaitingModifier, None),
        InputEvent::Click {
            button,
            double,
            position,
        } => {
            let Some((x, y)) = position else {
                return (mode, None);
            };
            match policy {
                ClickPolicy::Always => (mode, Some(PixelPick { x, y })),
                ClickPolicy::RequireModifier => {
                    if mode == InputMode::Armed && button == MouseButton::Primary && !double {
                        (InputMode::AwaitingModifier, Some(PixelPick { x, y }))
                    } else {
                        (mode, None)
                    }
                }
            }
        }
    }
}
