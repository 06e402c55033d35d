//! Debugger configuration loading.

#![allow(missing_docs)]

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::DebuggerError;

pub const DEFAULT_TOP_LEVEL_NAME: &str = "BTMain";
pub const DEFAULT_MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerConfig {
    /// Function name reported for frames without an enclosing function.
    pub top_level_name: SmolStr,
    /// Initial breakpoint mute flag.
    pub mute_breakpoints: bool,
    pub render: RenderConfig,
    /// Initial breakpoint table, applied line by line at engine construction.
    pub breakpoints: IndexMap<u32, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub max_depth: usize,
    pub max_string_len: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_string_len: None,
        }
    }
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            top_level_name: SmolStr::new(DEFAULT_TOP_LEVEL_NAME),
            mute_breakpoints: false,
            render: RenderConfig::default(),
            breakpoints: IndexMap::new(),
        }
    }
}

impl DebuggerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DebuggerError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|err| DebuggerError::InvalidConfig(format!("debugger.toml: {err}").into()))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, DebuggerError> {
        let raw: DebuggerToml = toml::from_str(text)
            .map_err(|err| DebuggerError::InvalidConfig(format!("debugger.toml: {err}").into()))?;
        raw.into_config()
    }
}

#[derive(Debug, Default, Deserialize)]
struct DebuggerToml {
    engine: Option<EngineSection>,
    render: Option<RenderSection>,
    breakpoints: Option<BreakpointsSection>,
}

#[derive(Debug, Deserialize)]
struct EngineSection {
    top_level_name: Option<String>,
    mute_breakpoints: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RenderSection {
    max_depth: Option<usize>,
    max_string_len: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct BreakpointsSection {
    lines: Option<Vec<u32>>,
    disabled: Option<Vec<u32>>,
}

impl DebuggerToml {
    fn into_config(self) -> Result<DebuggerConfig, DebuggerError> {
        let mut config = DebuggerConfig::default();
        if let Some(engine) = self.engine {
            if let Some(name) = engine.top_level_name {
                if name.trim().is_empty() {
                    return Err(DebuggerError::InvalidConfig(
                        "engine.top_level_name must not be empty".into(),
                    ));
                }
                config.top_level_name = name.into();
            }
            if let Some(muted) = engine.mute_breakpoints {
                config.mute_breakpoints = muted;
            }
        }
        if let Some(render) = self.render {
            if let Some(max_depth) = render.max_depth {
                if max_depth == 0 {
                    return Err(DebuggerError::InvalidConfig(
                        "render.max_depth must be at least 1".into(),
                    ));
                }
                config.render.max_depth = max_depth;
            }
            if let Some(limit) = render.max_string_len {
                if limit == 0 {
                    return Err(DebuggerError::InvalidConfig(
                        "render.max_string_len must be at least 1".into(),
                    ));
                }
                config.render.max_string_len = Some(limit);
            }
        }
        if let Some(breakpoints) = self.breakpoints {
            let enabled = breakpoints.lines.unwrap_or_default();
            let disabled = breakpoints.disabled.unwrap_or_default();
            for line in enabled.iter().chain(disabled.iter()) {
                if *line == 0 {
                    return Err(DebuggerError::InvalidConfig(
                        "breakpoint lines start at 1".into(),
                    ));
                }
            }
            for line in enabled {
                config.breakpoints.insert(line, true);
            }
            for line in disabled {
                config.breakpoints.insert(line, false);
            }
        }
        Ok(config)
    }
}
