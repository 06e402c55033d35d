//! Capability traits an interpreter implements so the debugger can read its
//! paused call stack.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::IntrospectionError;
use crate::value::Value;

/// Visible bindings of one activation record.
pub trait ScopeSource {
    /// Name of the enclosing function, `None` for top-level code.
    fn function_name(&self) -> Result<Option<SmolStr>, IntrospectionError>;

    /// Identifiers visible in this scope, in enumeration order.
    fn identifiers(&self) -> Result<Vec<SmolStr>, IntrospectionError>;

    /// Current value bound to `name`.
    fn binding(&self, name: &str) -> Result<Value, IntrospectionError>;
}

/// Live, indexed frame table. Frame 0 is the innermost frame.
pub trait FrameTable {
    fn frame_count(&self) -> usize;

    fn frame(&self, index: usize) -> Result<&dyn ScopeSource, IntrospectionError>;
}

/// Position at which a saved frame re-enters a live frame table.
#[derive(Clone, Copy)]
pub struct FrameAnchor<'a> {
    pub table: &'a dyn FrameTable,
    /// Index of the first table frame not yet covered by the saved chain.
    pub start: usize,
}

/// Saved frame of a captured continuation, linked to its caller.
pub trait SavedFrame {
    fn scope(&self) -> Result<&dyn ScopeSource, IntrospectionError>;

    fn parent(&self) -> Option<&dyn SavedFrame>;

    /// Set when this frame is backed by a live frame table; the chain is not
    /// walked past an anchored frame.
    fn anchor(&self) -> Option<FrameAnchor<'_>> {
        None
    }
}

/// Stack representation active at a suspension, decided once by the
/// interpreter and passed to the debugger explicitly.
#[derive(Clone, Copy)]
pub enum ExecutionContext<'a> {
    /// Paused inside a live call.
    Direct(&'a dyn FrameTable),
    /// Resumed from a captured continuation; the innermost saved frame.
    Resumed(&'a dyn SavedFrame),
}
