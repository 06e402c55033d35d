//! Stack snapshot assembly.
//!
//! Flattens the paused call stack into index-ordered scope frames. In direct
//! mode the live frame table is read front to back. In continuation mode the
//! saved-frame chain is walked outward until a frame anchored in a live table
//! is reached; from there the table's remaining frames are drained instead of
//! walking further, so no frame is produced twice.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;
use tracing::warn;

use crate::config::DebuggerConfig;
use crate::error::IntrospectionError;

use super::render::{ValueRenderer, UNAVAILABLE_MARKER};
use super::{ExecutionContext, FrameAnchor, SavedFrame, ScopeSource};

/// One frame of the paused call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeFrame {
    pub index: usize,
    pub function_name: SmolStr,
    pub bindings: IndexMap<SmolStr, String>,
    /// Set when the frame itself could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Flattened view of the paused call stack; index 0 is the innermost frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackSnapshot {
    frames: Vec<ScopeFrame>,
}

impl StackSnapshot {
    #[must_use]
    pub fn frames(&self) -> &[ScopeFrame] {
        &self.frames
    }

    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&ScopeFrame> {
        self.frames.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Binding of `name` in frame `index`, if present.
    #[must_use]
    pub fn binding(&self, index: usize, name: &str) -> Option<&str> {
        self.frame(index)?.bindings.get(name).map(String::as_str)
    }

    /// Plain-text listing, one `Scope no:` block per frame.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::from("Vars:\n");
        for frame in &self.frames {
            let _ = writeln!(out, "Scope no: {}", frame.index);
            let _ = writeln!(out, "FUNCNAME {}", frame.function_name);
            if let Some(error) = &frame.error {
                let _ = writeln!(out, "{UNAVAILABLE_MARKER} {error}");
            }
            for (name, value) in &frame.bindings {
                let _ = writeln!(out, "{name} {value}");
            }
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Builds [`StackSnapshot`]s on the interpreter thread.
#[derive(Debug, Clone)]
pub struct StackAssembler {
    renderer: ValueRenderer,
    top_level_name: SmolStr,
}

impl Default for StackAssembler {
    fn default() -> Self {
        Self::from_config(&DebuggerConfig::default())
    }
}

impl StackAssembler {
    #[must_use]
    pub fn from_config(config: &DebuggerConfig) -> Self {
        Self {
            renderer: ValueRenderer::from_config(&config.render),
            top_level_name: config.top_level_name.clone(),
        }
    }

    #[must_use]
    pub fn assemble(&self, ctx: ExecutionContext<'_>) -> StackSnapshot {
        let mut frames = Vec::new();
        match ctx {
            ExecutionContext::Direct(table) => {
                self.drain_table(FrameAnchor { table, start: 0 }, &mut frames);
            }
            ExecutionContext::Resumed(head) => self.walk_chain(head, &mut frames),
        }
        StackSnapshot { frames }
    }

    fn walk_chain(&self, head: &dyn SavedFrame, frames: &mut Vec<ScopeFrame>) {
        let mut visited = HashSet::new();
        let mut current = Some(head);
        while let Some(saved) = current {
            let address = std::ptr::from_ref(saved).cast::<()>() as usize;
            if !visited.insert(address) {
                warn!(frames = frames.len(), "saved frame chain loops back on itself");
                break;
            }
            if let Some(anchor) = saved.anchor() {
                self.drain_table(anchor, frames);
                break;
            }
            let index = frames.len();
            frames.push(self.scope_frame(index, saved.scope()));
            current = saved.parent();
        }
    }

    fn drain_table(&self, anchor: FrameAnchor<'_>, frames: &mut Vec<ScopeFrame>) {
        let count = anchor.table.frame_count();
        for position in anchor.start..count {
            let index = frames.len();
            frames.push(self.scope_frame(index, anchor.table.frame(position)));
        }
    }

    fn scope_frame(
        &self,
        index: usize,
        scope: Result<&dyn ScopeSource, IntrospectionError>,
    ) -> ScopeFrame {
        let scope = match scope {
            Ok(scope) => scope,
            Err(err) => {
                warn!(index, error = %err, "frame unavailable");
                return unavailable_frame(index, &err);
            }
        };
        let function_name = match scope.function_name() {
            Ok(Some(name)) => name,
            Ok(None) => self.top_level_name.clone(),
            Err(err) => {
                warn!(index, error = %err, "function name unavailable");
                SmolStr::new(UNAVAILABLE_MARKER)
            }
        };
        let identifiers = match scope.identifiers() {
            Ok(identifiers) => identifiers,
            Err(err) => {
                warn!(index, error = %err, "scope identifiers unavailable");
                return ScopeFrame {
                    index,
                    function_name,
                    bindings: IndexMap::new(),
                    error: Some(err.to_string()),
                };
            }
        };
        let mut bindings = IndexMap::with_capacity(identifiers.len());
        for name in identifiers {
            match scope.binding(&name) {
                Ok(value) if value.is_undefined() => {}
                Ok(value) => {
                    bindings.insert(name, self.renderer.render_to_string(&value));
                }
                Err(err) => {
                    warn!(index, binding = %name, error = %err, "binding unavailable");
                    bindings.insert(name, UNAVAILABLE_MARKER.to_string());
                }
            }
        }
        ScopeFrame {
            index,
            function_name,
            bindings,
            error: None,
        }
    }
}

fn unavailable_frame(index: usize, err: &IntrospectionError) -> ScopeFrame {
    ScopeFrame {
        index,
        function_name: SmolStr::new(UNAVAILABLE_MARKER),
        bindings: IndexMap::new(),
        error: Some(err.to_string()),
    }
}
