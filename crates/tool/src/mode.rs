//! Pen/eraser mode and the transition table every replica replays.
//!
//! [`plan`] is a pure function of the current mode and the requested target.
//! Each replica runs it on every delivered event, so a mode is fully
//! determined by the initial mode and the ordered events applied to it.

use inkwell_ipc::ToolEvent;

/// Logical mode shared by a pen and its paired eraser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    PenIdle,
    PenUsing,
    EraserIdle,
    EraserUsing,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::PenIdle,
        Mode::PenUsing,
        Mode::EraserIdle,
        Mode::EraserUsing,
    ];

    /// True while the trigger is held
    pub fn is_using(self) -> bool {
        matches!(self, Mode::PenUsing | Mode::EraserUsing)
    }

    /// True when the pen (not the eraser) is the active half of the pair
    pub fn is_pen(self) -> bool {
        matches!(self, Mode::PenIdle | Mode::PenUsing)
    }

    /// Mode a transition event drives toward, if it is one
    pub fn target_of(event: ToolEvent) -> Option<Mode> {
        match event {
            ToolEvent::ToPenIdle => Some(Mode::PenIdle),
            ToolEvent::ToPenUsing => Some(Mode::PenUsing),
            ToolEvent::ToEraseIdle => Some(Mode::EraserIdle),
            ToolEvent::ToEraseUsing => Some(Mode::EraserUsing),
            _ => None,
        }
    }

    /// Event that drives toward this mode
    pub fn event(self) -> ToolEvent {
        match self {
            Mode::PenIdle => ToolEvent::ToPenIdle,
            Mode::PenUsing => ToolEvent::ToPenUsing,
            Mode::EraserIdle => ToolEvent::ToEraseIdle,
            Mode::EraserUsing => ToolEvent::ToEraseUsing,
        }
    }
}

/// Work performed on the way from one mode to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideEffect {
    /// Spawn ink under the spawn target and start recording
    StartDrawing,
    /// Finish the in-progress ink, mesh it and move it to the pool
    FinishDrawing,
    /// Show the eraser
    ToEraser,
    /// Stop erasing and hide the eraser
    ToPen,
    StartErasing,
    FinishErasing,
}

/// One edge of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
    /// Side effects in execution order
    pub effects: &'static [SideEffect],
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Look up the edge from `from` to `to`. Defined for every pair.
///
/// Re-requesting the current mode is always a no-op, including
/// `PenUsing -> PenUsing` (no stroke restart).
pub fn plan(from: Mode, to: Mode) -> Transition {
    use Mode::*;
    use SideEffect::*;

    let effects: &'static [SideEffect] = match (from, to) {
        (PenIdle, PenIdle) => &[],
        (PenIdle, PenUsing) => &[StartDrawing],
        (PenIdle, EraserIdle) => &[ToEraser],
        (PenIdle, EraserUsing) => &[ToEraser, StartErasing],

        (PenUsing, PenIdle) => &[FinishDrawing],
        (PenUsing, PenUsing) => &[],
        (PenUsing, EraserIdle) => &[FinishDrawing, ToEraser],
        (PenUsing, EraserUsing) => &[FinishDrawing, ToEraser, StartErasing],

        (EraserIdle, PenIdle) => &[ToPen],
        (EraserIdle, PenUsing) => &[ToPen, StartDrawing],
        (EraserIdle, EraserIdle) => &[],
        (EraserIdle, EraserUsing) => &[StartErasing],

        (EraserUsing, PenIdle) => &[FinishErasing, ToPen],
        (EraserUsing, PenUsing) => &[FinishErasing, ToPen, StartDrawing],
        (EraserUsing, EraserIdle) => &[FinishErasing],
        (EraserUsing, EraserUsing) => &[],
    };

    Transition { from, to, effects }
}

/// Mode reached by applying `events` in order from `initial`.
///
/// Non-transition events leave the mode alone.
pub fn replay<I>(initial: Mode, events: I) -> Mode
where
    I: IntoIterator<Item = ToolEvent>,
{
    events
        .into_iter()
        .filter_map(Mode::target_of)
        .fold(initial, |mode, target| plan(mode, target).to)
}
