//! Debug hook trait.

#![allow(missing_docs)]

use super::{ExecutionContext, StepKind};

/// Directive handed back to the interpreter when the hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Keep executing.
    Go,
    /// Keep executing; the debugger stops again at the step target.
    Step(StepKind),
    /// Terminate the script.
    Exit,
}

/// Debug hooks for line-level instrumentation, called on the interpreter thread.
pub trait DebugHook {
    /// Called before the statement on `line` executes. May block while the
    /// debugger holds the interpreter suspended.
    fn on_line(&mut self, line: u32, call_depth: u32, ctx: ExecutionContext<'_>) -> Resume;

    /// Called once after the script finished or exited.
    fn on_finished(&mut self) {}
}
