//! Debug data types.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::stack::StackSnapshot;

/// Engine run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    /// The script executes; only breakpoint edits are accepted.
    Running,
    /// The interpreter thread is parked in the rendezvous.
    SuspendedAtBreakpoint,
    /// Terminal: stopped by the controller or the script finished.
    Stopped,
}

/// Receiver of run-state changes, owned by the scheduling side.
///
/// Called with the engine lock held, once per transition and in transition
/// order. Implementations must not call back into the engine.
pub trait RunStateSink: Send + Sync {
    fn set_debugger_state(&self, state: RunState);
}

/// Simple [`RunStateSink`] that remembers the last state written.
#[derive(Debug, Clone)]
pub struct SharedRunState(Arc<Mutex<RunState>>);

impl SharedRunState {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(RunState::Running)))
    }

    #[must_use]
    pub fn get(&self) -> RunState {
        *self.0.lock().expect("run state poisoned")
    }
}

impl Default for SharedRunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateSink for SharedRunState {
    fn set_debugger_state(&self, state: RunState) {
        *self.0.lock().expect("run state poisoned") = state;
    }
}

/// Step behavior requested while suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    /// Stop at the next line, regardless of call depth.
    Into,
    /// Stop at the next line at the same or a lower call depth.
    Over,
    /// Stop at the next line after returning to the caller.
    Out,
}

/// Debugging command submitted by a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    Continue,
    StepInto,
    StepOver,
    StepOut,
    Exit,
    SetBreakpoint { line: u32, enabled: bool },
    ToggleMuteBreakpoints { muted: bool },
    GetVariables,
    Stop,
}

impl Command {
    /// Whether the command only makes sense while the interpreter is suspended.
    #[must_use]
    pub fn requires_suspension(&self) -> bool {
        !matches!(
            self,
            Command::SetBreakpoint { .. } | Command::ToggleMuteBreakpoints { .. } | Command::Stop
        )
    }

    pub(crate) fn step_kind(&self) -> Option<StepKind> {
        match self {
            Command::StepInto => Some(StepKind::Into),
            Command::StepOver => Some(StepKind::Over),
            Command::StepOut => Some(StepKind::Out),
            _ => None,
        }
    }
}

/// Successful command result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CommandOutput {
    /// Textual acknowledgement.
    Ack(String),
    /// Variables of the paused call stack.
    Snapshot(StackSnapshot),
}

impl CommandOutput {
    pub(crate) fn ack(text: impl Into<String>) -> Self {
        CommandOutput::Ack(text.into())
    }

    #[must_use]
    pub fn as_snapshot(&self) -> Option<&StackSnapshot> {
        match self {
            CommandOutput::Snapshot(snapshot) => Some(snapshot),
            CommandOutput::Ack(_) => None,
        }
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Ack(text) => f.write_str(text),
            CommandOutput::Snapshot(snapshot) => f.write_str(&snapshot.to_text()),
        }
    }
}

/// Why the interpreter was suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    Breakpoint,
    Step,
}

/// Notification emitted when the interpreter suspends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopEvent {
    pub reason: StopReason,
    pub source: SmolStr,
    pub line: u32,
    pub call_depth: u32,
}

/// The single source unit an engine is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    name: SmolStr,
    line_count: u32,
    breakable: Option<BTreeSet<u32>>,
}

impl SourceUnit {
    /// Source unit whose lines `1..=line_count` all accept breakpoints.
    #[must_use]
    pub fn new(name: impl Into<SmolStr>, line_count: u32) -> Self {
        Self {
            name: name.into(),
            line_count,
            breakable: None,
        }
    }

    #[must_use]
    pub fn from_text(name: impl Into<SmolStr>, text: &str) -> Self {
        let line_count = u32::try_from(text.lines().count()).unwrap_or(u32::MAX);
        Self::new(name, line_count)
    }

    /// Restrict breakpoints to the given lines (lines the compiler emitted code for).
    #[must_use]
    pub fn with_breakable_lines(mut self, lines: impl IntoIterator<Item = u32>) -> Self {
        self.breakable = Some(lines.into_iter().collect());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    #[must_use]
    pub fn is_breakable(&self, line: u32) -> bool {
        if line == 0 || line > self.line_count {
            return false;
        }
        self.breakable
            .as_ref()
            .map_or(true, |lines| lines.contains(&line))
    }
}
