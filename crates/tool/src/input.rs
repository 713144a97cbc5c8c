//! Local input translation: trigger presses into replicated events.
//!
//! Input is detected on the holder's replica only. The result is a list of
//! events to broadcast; nothing here touches the mode directly.

use std::time::Duration;

use inkwell_ipc::ToolEvent;

use crate::error::ToolError;
use crate::mode::Mode;

/// Kind of press-down after double-click detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Single,
    Double,
}

/// Detects a second press-down within `interval` of the previous one.
///
/// After a double-press the timer is cleared, so a third rapid press starts a
/// new sequence instead of firing again.
#[derive(Debug, Clone)]
pub struct ClickDetector {
    interval: Duration,
    prev_press: Option<Duration>,
}

impl ClickDetector {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            prev_press: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register a press-down at local time `now`.
    ///
    /// With `double_click` disabled every press is single, but the press time
    /// is still remembered.
    pub fn press(&mut self, now: Duration, double_click: bool) -> Press {
        let within = self
            .prev_press
            .is_some_and(|prev| now.saturating_sub(prev) < self.interval);

        if double_click && within {
            self.prev_press = None;
            Press::Double
        } else {
            self.prev_press = Some(now);
            Press::Single
        }
    }

    pub fn reset(&mut self) {
        self.prev_press = None;
    }
}

/// Events a press-down emits from `mode`
pub fn translate_press(mode: Mode, press: Press) -> Result<&'static [ToolEvent], ToolError> {
    match (press, mode) {
        (Press::Single, Mode::PenIdle) => Ok(&[ToolEvent::ToPenUsing]),
        (Press::Single, Mode::EraserIdle) => Ok(&[ToolEvent::ToEraseUsing]),
        (Press::Double, Mode::PenIdle) => Ok(&[ToolEvent::DestroyLastInk, ToolEvent::ToEraseIdle]),
        (Press::Double, Mode::EraserIdle) => Ok(&[ToolEvent::ToPenIdle]),
        (Press::Single, _) => Err(ToolError::UnexpectedState {
            input: "use-down",
            mode,
        }),
        (Press::Double, _) => Err(ToolError::UnexpectedState {
            input: "use-down (double-click)",
            mode,
        }),
    }
}

/// Events a release emits from `mode`
pub fn translate_release(mode: Mode) -> Result<&'static [ToolEvent], ToolError> {
    match mode {
        Mode::PenUsing => Ok(&[ToolEvent::ToPenIdle]),
        Mode::EraserUsing => Ok(&[ToolEvent::ToEraseIdle]),
        _ => Err(ToolError::UnexpectedState {
            input: "use-up",
            mode,
        }),
    }
}
