//! Debugger errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

/// Errors reported to controllers as command results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebuggerError {
    /// The command needs a suspended interpreter.
    #[error("must be suspended at a breakpoint in order to execute this command")]
    NotSuspended,

    /// The engine was stopped or the script has finished.
    #[error("not running")]
    NotRunning,

    /// Another command is already waiting in the rendezvous slot.
    #[error("another command is already pending")]
    CommandContention,

    /// Breakpoint line is outside the source unit.
    #[error("cannot assign breakpoint on line {line} of '{source_name}'")]
    LineResolution { line: u32, source_name: SmolStr },

    /// Invalid debugger configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(SmolStr),
}

/// Failures raised by interpreter capability implementations while the
/// debugger reads frames and bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectionError {
    /// Frame index past the end of the live frame table.
    #[error("frame {index} out of range (table has {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    /// A binding enumerated by the scope could not be read back.
    #[error("binding '{0}' is not readable")]
    UnreadableBinding(SmolStr),

    /// An interpreter-internal field is missing.
    #[error("missing interpreter field '{0}'")]
    MissingField(SmolStr),

    /// Any other interpreter-specific failure.
    #[error("{0}")]
    Other(String),
}
