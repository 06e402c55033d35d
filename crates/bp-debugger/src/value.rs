//! Script values observed by the debugger.
//!
//! Arrays and objects are shared, interior-mutable handles so that an
//! interpreter can hand the debugger the same graph it executes against,
//! including graphs that reference themselves.

#![allow(missing_docs)]

use std::fmt;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use smol_str::SmolStr;

/// A value bound to an identifier in a paused frame.
#[derive(Debug, Clone)]
pub enum Value {
    /// The interpreter's "no binding" sentinel.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(SmolStr),
    Function(FunctionValue),
    Array(ArrayRef),
    Object(ObjectRef),
    /// Opaque handle supplied by the embedding host.
    Host(HostHandle),
}

impl Value {
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[must_use]
    pub fn array(elements: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(ArrayRef::new(elements.into_iter().collect()))
    }

    #[must_use]
    pub fn object<K: Into<SmolStr>>(members: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(ObjectRef::from_members(members))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}

/// Script function value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionValue {
    pub name: Option<SmolStr>,
    /// Source text of the function body, when the interpreter keeps it.
    pub source: Option<String>,
}

impl FunctionValue {
    #[must_use]
    pub fn new(name: Option<&str>, source: Option<&str>) -> Self {
        Self {
            name: name.map(SmolStr::from),
            source: source.map(str::to_string),
        }
    }

    /// Source text if known, otherwise a stable `function <name>` label.
    #[must_use]
    pub fn display_text(&self) -> String {
        if let Some(source) = &self.source {
            return source.clone();
        }
        match &self.name {
            Some(name) => format!("function {name}"),
            None => "function <anonymous>".to_string(),
        }
    }
}

/// Shared array handle.
#[derive(Clone, Default)]
pub struct ArrayRef(Arc<Mutex<Vec<Value>>>);

impl ArrayRef {
    #[must_use]
    pub fn new(elements: Vec<Value>) -> Self {
        Self(Arc::new(Mutex::new(elements)))
    }

    pub fn push(&self, value: Value) {
        self.0.lock().expect("array poisoned").push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().expect("array poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone the current elements out of the handle.
    #[must_use]
    pub fn elements(&self) -> Vec<Value> {
        self.0.lock().expect("array poisoned").clone()
    }

    /// Address-based identity used for cycle detection.
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayRef({:#x}, len={})", self.identity(), self.len())
    }
}

/// Shared object handle with ordered members.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<Mutex<IndexMap<SmolStr, Value>>>);

impl ObjectRef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_members<K: Into<SmolStr>>(members: impl IntoIterator<Item = (K, Value)>) -> Self {
        let members = members
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        Self(Arc::new(Mutex::new(members)))
    }

    pub fn insert(&self, name: impl Into<SmolStr>, value: Value) {
        self.0
            .lock()
            .expect("object poisoned")
            .insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.lock().expect("object poisoned").get(name).cloned()
    }

    /// Clone the current members out of the handle.
    #[must_use]
    pub fn members(&self) -> Vec<(SmolStr, Value)> {
        self.0
            .lock()
            .expect("object poisoned")
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Address-based identity used for cycle detection.
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.0.lock().map(|members| members.len()).unwrap_or(0);
        write!(f, "ObjectRef({:#x}, members={len})", self.identity())
    }
}

/// Object owned by the embedding host and exposed to scripts.
pub trait HostObject: Send + Sync {
    /// Underlying representation shown by the debugger.
    fn unwrap_value(&self) -> Value;

    fn type_name(&self) -> &str {
        "host"
    }
}

/// Shared handle to a [`HostObject`].
#[derive(Clone)]
pub struct HostHandle(Arc<dyn HostObject>);

impl HostHandle {
    pub fn new(object: impl HostObject + 'static) -> Self {
        Self(Arc::new(object))
    }

    #[must_use]
    pub fn unwrap_value(&self) -> Value {
        self.0.unwrap_value()
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostHandle({})", self.type_name())
    }
}

/// Format a number the way script engines print them (`1` rather than `1.0`).
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e21 {
        return format!("{value:.0}");
    }
    format!("{value}")
}
