//! Parameter storage keyed by position or by name.

use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// Key of a bound parameter: a zero-based position or a `:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Index(usize),
    Name(String),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Index(i) => write!(f, "{i}"),
            ParamKey::Name(n) => write!(f, ":{n}"),
        }
    }
}

impl From<usize> for ParamKey {
    fn from(i: usize) -> Self {
        ParamKey::Index(i)
    }
}

impl From<i32> for ParamKey {
    /// Negative indices can never be referenced by a `?`; they are clamped to
    /// `usize::MAX` so they stay unresolvable instead of aliasing index 0.
    fn from(i: i32) -> Self {
        ParamKey::Index(usize::try_from(i).unwrap_or(usize::MAX))
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.trim_start_matches(':').to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::from(name.as_str())
    }
}

/// Parameter map. The first value set for a key wins; later sets are no-ops.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<ParamKey, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `key` unless the key is already bound.
    ///
    /// Returns `true` when the value was stored.
    pub fn set(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, value.into());
        true
    }

    pub fn get(&self, key: &ParamKey) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn index(&self, i: usize) -> Option<&Value> {
        self.values.get(&ParamKey::Index(i))
    }

    pub fn name(&self, name: &str) -> Option<&Value> {
        self.values.get(&ParamKey::Name(name.to_string()))
    }

    pub fn contains(&self, key: &ParamKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
