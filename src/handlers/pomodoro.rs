//! Pomodoro focus timer
//!
//! A work phase followed by a break phase, counted down on `tokio::time`.
//! Commands arrive on a channel fed by a stdin reader thread: `p` pauses,
//! `c` continues, `s` stops. Stopping the work phase skips the break.

use crate::KairuApp;
use crate::error::{KairuError, KairuResult};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// Longest accepted session, one day
const MAX_SESSION_MINUTES: u64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Pause,
    Continue,
    Stop,
}

impl TimerCommand {
    /// Parse one line of user input
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "p" | "pause" => Some(TimerCommand::Pause),
            "c" | "continue" => Some(TimerCommand::Continue),
            "s" | "stop" => Some(TimerCommand::Stop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Finished,
    Stopped,
}

/// How a pomodoro ended. `rest` is `None` when the break never started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroReport {
    pub work: PhaseOutcome,
    pub rest: Option<PhaseOutcome>,
}

fn render<W: Write>(out: &mut W, label: &str, remaining: Duration) -> Result<()> {
    let secs = remaining.as_secs();
    write!(out, "\r{} session: {:02}:{:02}", label, secs / 60, secs % 60)?;
    out.flush()?;
    Ok(())
}

/// Count one phase down, reacting to commands between ticks
///
/// A closed command channel is ignored while running; if the timer is paused
/// at that point nobody can resume it, so the phase stops.
pub async fn run_phase<W: Write>(
    label: &str,
    duration: Duration,
    tick: Duration,
    commands: &mut UnboundedReceiver<TimerCommand>,
    out: &mut W,
) -> Result<PhaseOutcome> {
    let mut remaining = duration;
    let mut paused = false;
    let mut closed = false;
    let mut ticker = time::interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    render(out, label, remaining)?;
    while !remaining.is_zero() {
        tokio::select! {
            _ = ticker.tick(), if !paused => {
                remaining = remaining.saturating_sub(tick);
                render(out, label, remaining)?;
            }
            command = commands.recv(), if !closed => match command {
                Some(TimerCommand::Pause) if !paused => {
                    paused = true;
                    writeln!(out, "\nTimer paused. Enter 'c' to continue or 's' to stop.")?;
                }
                Some(TimerCommand::Continue) if paused => {
                    paused = false;
                    ticker.reset();
                    writeln!(out, "\nTimer resumed.")?;
                }
                Some(TimerCommand::Stop) => {
                    writeln!(out, "\nTimer stopped.")?;
                    return Ok(PhaseOutcome::Stopped);
                }
                Some(_) => {}
                None => {
                    closed = true;
                    if paused {
                        writeln!(out, "\nInput closed while paused. Timer stopped.")?;
                        return Ok(PhaseOutcome::Stopped);
                    }
                }
            },
        }
    }
    writeln!(out)?;
    Ok(PhaseOutcome::Finished)
}

/// Run a work phase and, unless it was stopped, a break phase
pub async fn run_pomodoro<W: Write>(
    work: Duration,
    rest: Duration,
    tick: Duration,
    commands: &mut UnboundedReceiver<TimerCommand>,
    out: &mut W,
) -> Result<PomodoroReport> {
    writeln!(
        out,
        "Pomodoro started! Enter 'p' to pause, 'c' to continue, 's' to stop."
    )?;
    let work = run_phase("Work", work, tick, commands, out).await?;
    if work == PhaseOutcome::Stopped {
        return Ok(PomodoroReport { work, rest: None });
    }

    writeln!(out, "Work session over! Time for a short break.")?;
    let rest = run_phase("Break", rest, tick, commands, out).await?;
    writeln!(out, "Pomodoro complete! Ready for the next session.")?;
    Ok(PomodoroReport {
        work,
        rest: Some(rest),
    })
}

/// Check the requested minutes and turn them into durations
fn session_lengths(work_minutes: u64, break_minutes: u64) -> KairuResult<(Duration, Duration)> {
    if work_minutes == 0 {
        return Err(KairuError::validation("Work session must be at least 1 minute"));
    }
    if work_minutes > MAX_SESSION_MINUTES || break_minutes > MAX_SESSION_MINUTES {
        return Err(KairuError::validation(format!(
            "Sessions can last at most {} minutes",
            MAX_SESSION_MINUTES
        )));
    }
    Ok((
        Duration::from_secs(work_minutes * 60),
        Duration::from_secs(break_minutes * 60),
    ))
}

/// Forward parsed stdin lines to the timer until input ends
///
/// Runs on a plain thread: a blocking stdin read must not keep the runtime
/// from shutting down when the timer is done.
fn spawn_stdin_reader(tx: UnboundedSender<TimerCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match TimerCommand::parse(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => debug!("Ignoring timer input '{}'", line.trim()),
            }
        }
    });
}

impl KairuApp {
    /// Run a pomodoro on the terminal
    pub async fn handle_pomodoro(&self, work_minutes: u64, break_minutes: u64) -> Result<String> {
        let (work, rest) = session_lengths(work_minutes, break_minutes)?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_stdin_reader(tx);

        let mut out = std::io::stdout();
        let report = run_pomodoro(work, rest, TICK, &mut rx, &mut out).await?;

        Ok(match report.work {
            PhaseOutcome::Stopped => "Pomodoro stopped during the work session.".to_string(),
            PhaseOutcome::Finished => format!("Focused for {} minute(s). Nice work!", work_minutes),
        })
    }
}
