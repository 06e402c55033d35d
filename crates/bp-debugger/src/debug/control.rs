//! Debugger engine: run state, stepping and the suspension rendezvous.

#![allow(missing_docs)]

use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::config::DebuggerConfig;
use crate::error::DebuggerError;

use super::rendezvous::{CommandSlot, PendingCommand};
use super::{
    BreakpointTable, Command, CommandFuture, CommandOutput, CommandResult, DebugHook,
    ExecutionContext, Resume, RunState, RunStateSink, SourceUnit, StackAssembler, StepKind,
    StopEvent, StopReason,
};

#[derive(Debug, Clone, Copy)]
struct StepState {
    kind: StepKind,
    origin_depth: u32,
}

impl StepState {
    fn reached(self, call_depth: u32) -> bool {
        match self.kind {
            StepKind::Into => true,
            StepKind::Over => call_depth <= self.origin_depth,
            StepKind::Out => call_depth < self.origin_depth,
        }
    }
}

struct EngineState {
    run_state: RunState,
    muted: bool,
    slot: CommandSlot,
    step: Option<StepState>,
    last_stop: Option<StopEvent>,
    stop_tx: Option<Sender<StopEvent>>,
    sink: Option<Arc<dyn RunStateSink>>,
}

impl EngineState {
    fn transition(&mut self, next: RunState) {
        if self.run_state == next {
            return;
        }
        debug!(from = ?self.run_state, to = ?next, "run state");
        self.run_state = next;
        if let Some(sink) = &self.sink {
            sink.set_debugger_state(next);
        }
    }

    fn shut_down(&mut self) {
        self.transition(RunState::Stopped);
        self.step = None;
        self.slot.cancel(DebuggerError::NotRunning);
    }
}

struct Shared {
    state: Mutex<EngineState>,
    command_ready: Condvar,
    breakpoints: BreakpointTable,
    assembler: StackAssembler,
}

/// Shared debugger handle.
///
/// Clones refer to the same engine: controllers keep one to submit commands,
/// the interpreter thread installs one as its [`DebugHook`].
#[derive(Clone)]
pub struct DebuggerEngine {
    shared: Arc<Shared>,
}

impl DebuggerEngine {
    /// Create an engine bound to `source`, in the running state.
    #[must_use]
    pub fn new(source: SourceUnit, config: &DebuggerConfig) -> Self {
        let engine = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    run_state: RunState::Running,
                    muted: config.mute_breakpoints,
                    slot: CommandSlot::default(),
                    step: None,
                    last_stop: None,
                    stop_tx: None,
                    sink: None,
                }),
                command_ready: Condvar::new(),
                breakpoints: BreakpointTable::new(source),
                assembler: StackAssembler::from_config(config),
            }),
        };
        let configured = config.breakpoints.iter().map(|(line, enabled)| (*line, *enabled));
        for result in engine.setup_breakpoints(configured) {
            if let Err(err) = result {
                warn!(error = %err, "configured breakpoint ignored");
            }
        }
        engine
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.shared.state.lock().expect("debugger state poisoned")
    }

    /// Submit a command. Never blocks on the interpreter.
    ///
    /// Commands that need a suspended interpreter are placed in the
    /// rendezvous slot; everything else resolves before this returns.
    pub fn submit(&self, command: Command) -> CommandFuture {
        if matches!(command, Command::Stop) {
            return CommandFuture::ready(Ok(self.stop()));
        }
        let mut state = self.lock();
        let run_state = state.run_state;
        match run_state {
            RunState::Stopped => {
                debug!(?command, "rejected: not running");
                CommandFuture::ready(Err(DebuggerError::NotRunning))
            }
            RunState::Running if command.requires_suspension() => {
                debug!(?command, "rejected: not suspended");
                CommandFuture::ready(Err(DebuggerError::NotSuspended))
            }
            RunState::Running => CommandFuture::ready(self.apply_edit(&mut state, &command)),
            RunState::SuspendedAtBreakpoint => {
                let (reply, future) = CommandFuture::pending();
                match state.slot.offer(PendingCommand { command, reply }) {
                    Ok(()) => self.shared.command_ready.notify_all(),
                    Err(rejected) => {
                        warn!(command = ?rejected.command, "rejected: command already pending");
                        rejected
                            .reply
                            .fulfill(Err(DebuggerError::CommandContention));
                    }
                }
                future
            }
        }
    }

    /// Apply several breakpoint flags, one result per line.
    pub fn setup_breakpoints(
        &self,
        breakpoints: impl IntoIterator<Item = (u32, bool)>,
    ) -> Vec<Result<CommandOutput, DebuggerError>> {
        breakpoints
            .into_iter()
            .map(|(line, enabled)| self.set_breakpoint(line, enabled))
            .collect()
    }

    /// Set one breakpoint flag. Safe from any thread in any run state.
    pub fn set_breakpoint(&self, line: u32, enabled: bool) -> Result<CommandOutput, DebuggerError> {
        self.shared.breakpoints.set(line, enabled)?;
        Ok(CommandOutput::ack(format!(
            "after set breakpoint - line {line} changed to {enabled}"
        )))
    }

    /// Tear the engine down. Idempotent; wakes a suspended interpreter and
    /// fails any command still waiting in the slot.
    pub fn stop(&self) -> CommandOutput {
        let mut state = self.lock();
        if state.run_state != RunState::Stopped {
            info!(source = %self.shared.breakpoints.source().name(), "debugger stopped");
        }
        state.shut_down();
        self.shared.command_ready.notify_all();
        CommandOutput::ack("stopped")
    }

    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.lock().run_state
    }

    #[must_use]
    pub fn is_breakpoint_enabled(&self, line: u32) -> bool {
        self.shared.breakpoints.is_enabled(line)
    }

    #[must_use]
    pub fn enabled_breakpoints(&self) -> Vec<u32> {
        self.shared.breakpoints.enabled_lines()
    }

    #[must_use]
    pub fn breakpoints_muted(&self) -> bool {
        self.lock().muted
    }

    #[must_use]
    pub fn source(&self) -> &SourceUnit {
        self.shared.breakpoints.source()
    }

    /// Most recent suspension, if any.
    #[must_use]
    pub fn last_stop(&self) -> Option<StopEvent> {
        self.lock().last_stop.clone()
    }

    /// Stream stop events to a sender.
    pub fn set_stop_sender(&self, sender: Sender<StopEvent>) {
        self.lock().stop_tx = Some(sender);
    }

    /// Report run-state changes to an external holder. The current state is
    /// written immediately. See [`RunStateSink`] for the re-entry rule.
    pub fn set_run_state_sink(&self, sink: Arc<dyn RunStateSink>) {
        let mut state = self.lock();
        sink.set_debugger_state(state.run_state);
        state.sink = Some(sink);
    }

    fn suspend_reason(
        &self,
        state: &mut EngineState,
        line: u32,
        call_depth: u32,
    ) -> Option<StopReason> {
        if let Some(step) = state.step {
            if step.reached(call_depth) {
                state.step = None;
                return Some(StopReason::Step);
            }
        }
        if !self.shared.breakpoints.is_enabled(line) {
            return None;
        }
        if state.muted {
            debug!(line, "breakpoint muted");
            return None;
        }
        state.step = None;
        Some(StopReason::Breakpoint)
    }

    fn suspend(&self, state: &mut EngineState, reason: StopReason, line: u32, call_depth: u32) {
        let event = StopEvent {
            reason,
            source: self.shared.breakpoints.source().name().into(),
            line,
            call_depth,
        };
        info!(source = %event.source, line, ?reason, "breakpoint reached");
        state.transition(RunState::SuspendedAtBreakpoint);
        if let Some(sender) = &state.stop_tx {
            let _ = sender.send(event.clone());
        }
        state.last_stop = Some(event);
    }

    /// Apply a command that never touches the interpreter.
    fn apply_edit(&self, state: &mut EngineState, command: &Command) -> CommandResult {
        match *command {
            Command::SetBreakpoint { line, enabled } => self.set_breakpoint(line, enabled),
            Command::ToggleMuteBreakpoints { muted } => Ok(toggle_mute(state, muted)),
            Command::Stop => {
                state.shut_down();
                self.shared.command_ready.notify_all();
                Ok(CommandOutput::ack("stopped"))
            }
            _ => Err(DebuggerError::NotSuspended),
        }
    }

    /// Serve commands until one resumes the interpreter. This is the only
    /// place the interpreter thread blocks.
    fn serve<'a>(
        &'a self,
        mut state: MutexGuard<'a, EngineState>,
        call_depth: u32,
        ctx: ExecutionContext<'_>,
    ) -> Resume {
        loop {
            while !state.slot.is_occupied()
                && state.run_state == RunState::SuspendedAtBreakpoint
            {
                state = self
                    .shared
                    .command_ready
                    .wait(state)
                    .expect("debugger state poisoned");
            }
            if state.run_state != RunState::SuspendedAtBreakpoint {
                debug!("released by stop");
                return Resume::Go;
            }
            let Some(PendingCommand { command, reply }) = state.slot.take() else {
                continue;
            };
            debug!(?command, "serving command");
            match command {
                Command::Continue => {
                    state.transition(RunState::Running);
                    reply.fulfill(Ok(CommandOutput::ack("continue run")));
                    return Resume::Go;
                }
                Command::StepInto | Command::StepOver | Command::StepOut => {
                    let Some(kind) = command.step_kind() else {
                        continue;
                    };
                    state.step = Some(StepState {
                        kind,
                        origin_depth: call_depth,
                    });
                    state.transition(RunState::Running);
                    reply.fulfill(Ok(CommandOutput::ack(step_ack(kind))));
                    return Resume::Step(kind);
                }
                Command::Exit => {
                    state.shut_down();
                    reply.fulfill(Ok(CommandOutput::ack("exit")));
                    return Resume::Exit;
                }
                Command::GetVariables => {
                    drop(state);
                    let snapshot = self.shared.assembler.assemble(ctx);
                    reply.fulfill(Ok(CommandOutput::Snapshot(snapshot)));
                    state = self.lock();
                }
                Command::SetBreakpoint { .. }
                | Command::ToggleMuteBreakpoints { .. }
                | Command::Stop => {
                    reply.fulfill(self.apply_edit(&mut state, &command));
                }
            }
        }
    }
}

impl DebugHook for DebuggerEngine {
    fn on_line(&mut self, line: u32, call_depth: u32, ctx: ExecutionContext<'_>) -> Resume {
        let mut state = self.lock();
        if state.run_state != RunState::Running {
            return Resume::Go;
        }
        let Some(reason) = self.suspend_reason(&mut state, line, call_depth) else {
            return Resume::Go;
        };
        self.suspend(&mut state, reason, line, call_depth);
        self.serve(state, call_depth, ctx)
    }

    fn on_finished(&mut self) {
        let mut state = self.lock();
        if state.run_state != RunState::Stopped {
            debug!("script finished");
        }
        state.shut_down();
        self.shared.command_ready.notify_all();
    }
}

impl std::fmt::Debug for DebuggerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebuggerEngine")
            .field("source", &self.source().name())
            .field("run_state", &self.run_state())
            .finish_non_exhaustive()
    }
}

fn toggle_mute(state: &mut EngineState, muted: bool) -> CommandOutput {
    state.muted = muted;
    debug!(muted, "breakpoints muted");
    CommandOutput::ack(format!("breakpoints muted toggled to {muted}"))
}

fn step_ack(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Into => "step into",
        StepKind::Over => "step over",
        StepKind::Out => "step out",
    }
}
