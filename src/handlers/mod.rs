//! Command handlers for Kairu
//!
//! Each command family lives in its own file. A handler validates raw input,
//! mutates the model through `TodoData`, saves explicitly, and returns the
//! rendered text for the terminal.

pub mod add;
pub mod change_status;
pub mod list;
pub mod pomodoro;
pub mod routines;
pub mod store;
pub mod update;

pub use list::ViewOptions;
pub use pomodoro::{PhaseOutcome, PomodoroReport, TimerCommand};
