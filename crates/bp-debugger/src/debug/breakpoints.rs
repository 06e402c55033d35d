//! Per-line breakpoint flags.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::DebuggerError;

use super::SourceUnit;

/// Enabled/disabled flag per source line.
///
/// Written by controller threads and read by the interpreter thread before
/// each candidate suspension point. A line with no entry is disabled.
#[derive(Debug)]
pub struct BreakpointTable {
    source: SourceUnit,
    lines: Mutex<HashMap<u32, bool>>,
}

impl BreakpointTable {
    #[must_use]
    pub fn new(source: SourceUnit) -> Self {
        Self {
            source,
            lines: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn source(&self) -> &SourceUnit {
        &self.source
    }

    /// Set the flag for one line; last write wins.
    pub fn set(&self, line: u32, enabled: bool) -> Result<(), DebuggerError> {
        if !self.source.is_breakable(line) {
            warn!(source = %self.source.name(), line, "cannot assign breakpoint");
            return Err(DebuggerError::LineResolution {
                line,
                source_name: self.source.name().into(),
            });
        }
        let mut lines = self.lines.lock().expect("breakpoints poisoned");
        lines.insert(line, enabled);
        debug!(line, enabled, "breakpoint updated");
        Ok(())
    }

    #[must_use]
    pub fn is_enabled(&self, line: u32) -> bool {
        let lines = self.lines.lock().expect("breakpoints poisoned");
        lines.get(&line).copied().unwrap_or(false)
    }

    /// Enabled lines in ascending order.
    #[must_use]
    pub fn enabled_lines(&self) -> Vec<u32> {
        let lines = self.lines.lock().expect("breakpoints poisoned");
        let mut enabled: Vec<u32> = lines
            .iter()
            .filter_map(|(line, enabled)| enabled.then_some(*line))
            .collect();
        enabled.sort_unstable();
        enabled
    }
}
