//! Metadata for stages and nodes.
//!
//! Metadata is stored as ordered key-value pairs and is used for things
//! like the default node, model kind and activation state.

use crate::core::NodePath;
use smallvec::SmallVec;
use std::fmt;

/// A single metadata value.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    Bool(bool),
    Number(f64),
    String(String),
    Token(String),
    Path(NodePath),
}

impl MetaValue {
    /// String payload for string and token values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Token(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric payload.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) | Self::Token(s) => write!(f, "{s:?}"),
            Self::Path(p) => write!(f, "<{p}>"),
        }
    }
}

/// Metadata storage - ordered key-value pairs.
///
/// Uses SmallVec optimization for common case of few entries.
#[derive(Clone, Default, PartialEq)]
pub struct MetaData {
    entries: SmallVec<[(String, MetaValue); 4]>,
}

impl MetaData {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metadata value, keeping the original position of an existing key.
    pub fn set(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        for (k, v) in &mut self.entries {
            if k == &key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Get a metadata value by key.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    // === Common metadata keys ===

    /// Stage default node name key.
    pub const DEFAULT_PRIM_KEY: &'static str = "defaultPrim";

    /// Model kind key (e.g. "component", "assembly").
    pub const KIND_KEY: &'static str = "kind";

    /// Activation key; inactive nodes are skipped by traversal.
    pub const ACTIVE_KEY: &'static str = "active";

    /// Instanceable flag key.
    pub const INSTANCEABLE_KEY: &'static str = "instanceable";

    /// Get model kind.
    pub fn kind(&self) -> Option<&str> {
        self.get(Self::KIND_KEY).and_then(MetaValue::as_str)
    }

    /// Active unless explicitly authored false.
    pub fn is_active(&self) -> bool {
        self.get(Self::ACTIVE_KEY)
            .and_then(MetaValue::as_bool)
            .unwrap_or(true)
    }

    /// Instanceable flag, false when unauthored.
    pub fn is_instanceable(&self) -> bool {
        self.get(Self::INSTANCEABLE_KEY)
            .and_then(MetaValue::as_bool)
            .unwrap_or(false)
    }
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl FromIterator<(String, MetaValue)> for MetaData {
    fn from_iter<T: IntoIterator<Item = (String, MetaValue)>>(iter: T) -> Self {
        let mut meta = Self::new();
        for (k, v) in iter {
            meta.set(k, v);
        }
        meta
    }
}
