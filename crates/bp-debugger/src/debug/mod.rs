//! Suspension engine, command rendezvous and stack assembly.

#![allow(missing_docs)]

mod breakpoints;
mod control;
mod frames;
mod hook;
mod render;
mod rendezvous;
mod stack;
mod types;

pub use breakpoints::BreakpointTable;
pub use control::DebuggerEngine;
pub use frames::{ExecutionContext, FrameAnchor, FrameTable, SavedFrame, ScopeSource};
pub use hook::{DebugHook, Resume};
pub use render::{
    RenderedValue, ValueRenderer, CYCLE_MARKER, DEPTH_MARKER, UNAVAILABLE_MARKER,
};
pub use rendezvous::{CommandFuture, CommandResult};
pub use stack::{ScopeFrame, StackAssembler, StackSnapshot};
pub use types::{
    Command, CommandOutput, RunState, RunStateSink, SharedRunState, SourceUnit, StepKind,
    StopEvent, StopReason,
};
