//! `bp-debugger` - in-process suspension debugger for embedded script interpreters.
//!
//! The interpreter thread reports every candidate suspension point through
//! [`debug::DebugHook`]; controller threads drive the paused interpreter by
//! submitting [`debug::Command`]s to a [`debug::DebuggerEngine`] and reading the
//! returned [`debug::CommandFuture`]s.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Debugger configuration loading.
pub mod config;
/// Suspension engine, command rendezvous and stack assembly.
pub mod debug;
/// Debugger errors.
pub mod error;
/// Script values observed by the debugger.
pub mod value;

pub use config::DebuggerConfig;
pub use error::{DebuggerError, IntrospectionError};
