//! Display rendering of script values.

#![allow(missing_docs)]

use std::fmt;

use crate::config::RenderConfig;
use crate::value::{format_number, Value};

pub const CYCLE_MARKER: &str = "<cyclic reference>";
pub const DEPTH_MARKER: &str = "<max depth>";
pub const UNAVAILABLE_MARKER: &str = "<unavailable>";

/// Rendered form of a value, before it is flattened to a display string.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedValue {
    Null,
    Undefined,
    Text(String),
    List(Vec<RenderedValue>),
    Map(Vec<(String, RenderedValue)>),
    /// Back-reference to a composite already on the rendering path.
    Cyclic,
    /// Nesting exceeded the configured depth.
    DepthLimit,
}

impl fmt::Display for RenderedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderedValue::Null => f.write_str("null"),
            RenderedValue::Undefined => f.write_str("undefined"),
            RenderedValue::Text(text) => f.write_str(text),
            RenderedValue::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            RenderedValue::Map(members) => {
                f.write_str("{")?;
                for (idx, (key, value)) in members.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            RenderedValue::Cyclic => f.write_str(CYCLE_MARKER),
            RenderedValue::DepthLimit => f.write_str(DEPTH_MARKER),
        }
    }
}

/// Renders values recursively, tracking the composites on the current path
/// so self-referencing graphs terminate.
#[derive(Debug, Clone, Copy)]
pub struct ValueRenderer {
    max_depth: usize,
    max_string_len: Option<usize>,
}

impl Default for ValueRenderer {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl ValueRenderer {
    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_string_len: config.max_string_len,
        }
    }

    #[must_use]
    pub fn render(&self, value: &Value) -> RenderedValue {
        let mut path = Vec::new();
        self.render_at(value, 0, &mut path)
    }

    /// Render and flatten to the display string stored in a binding map.
    #[must_use]
    pub fn render_to_string(&self, value: &Value) -> String {
        let text = self.render(value).to_string();
        match self.max_string_len {
            Some(limit) => truncate(text, limit),
            None => text,
        }
    }

    fn render_at(&self, value: &Value, depth: usize, path: &mut Vec<usize>) -> RenderedValue {
        match value {
            Value::Undefined => RenderedValue::Undefined,
            Value::Null => RenderedValue::Null,
            Value::Bool(value) => RenderedValue::Text(value.to_string()),
            Value::Number(value) => RenderedValue::Text(format_number(*value)),
            Value::String(value) => RenderedValue::Text(value.to_string()),
            Value::Function(function) => RenderedValue::Text(function.display_text()),
            Value::Array(array) => {
                self.nested(array.identity(), depth, path, |renderer, depth, path| {
                    let items = array
                        .elements()
                        .iter()
                        .map(|element| renderer.render_at(element, depth, path))
                        .collect();
                    RenderedValue::List(items)
                })
            }
            Value::Object(object) => {
                self.nested(object.identity(), depth, path, |renderer, depth, path| {
                    let members = object
                        .members()
                        .iter()
                        .map(|(key, member)| {
                            (key.to_string(), renderer.render_at(member, depth, path))
                        })
                        .collect();
                    RenderedValue::Map(members)
                })
            }
            Value::Host(handle) => {
                if depth >= self.max_depth {
                    return RenderedValue::DepthLimit;
                }
                self.render_at(&handle.unwrap_value(), depth + 1, path)
            }
        }
    }

    fn nested(
        &self,
        identity: usize,
        depth: usize,
        path: &mut Vec<usize>,
        render: impl FnOnce(&Self, usize, &mut Vec<usize>) -> RenderedValue,
    ) -> RenderedValue {
        if path.contains(&identity) {
            return RenderedValue::Cyclic;
        }
        if depth >= self.max_depth {
            return RenderedValue::DepthLimit;
        }
        path.push(identity);
        let rendered = render(self, depth + 1, path);
        path.pop();
        rendered
    }
}

fn truncate(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}
