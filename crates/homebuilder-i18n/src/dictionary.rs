//! Translation dictionaries and key-path resolution

use crate::error::{DictionaryError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Nested mapping of translation keys to string leaves.
///
/// Nodes are JSON objects or arrays; array elements are addressed by numeric
/// segments in a dot-separated key path (`models.items.0.name`).
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    root: Value,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::empty()
    }
}

impl Dictionary {
    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Wrap a parsed resource. The root must be an object.
    pub fn from_value(root: Value) -> Result<Self> {
        match root {
            Value::Object(_) => Ok(Self { root }),
            other => Err(DictionaryError::Malformed(format!(
                "expected an object at the root, found {}",
                kind(&other)
            ))),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    pub fn is_empty(&self) -> bool {
        match &self.root {
            Value::Object(map) => map.is_empty(),
            _ => true,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Resolve `key` to a string leaf.
    ///
    /// Returns `None` when a segment does not match the shape of the tree, an
    /// index is out of bounds, or the path ends on something other than a
    /// string.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        let mut node = &self.root;
        for segment in key.split('.') {
            node = match node {
                Value::Array(items) => items.get(parse_index(segment)?)?,
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        node.as_str()
    }

    /// Every key path that resolves to a string
    pub fn leaf_paths(&self) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        collect_leaves(&self.root, &mut String::new(), &mut paths);
        paths
    }
}

/// Key paths present in one dictionary but not the other
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySetDiff {
    /// In the reference, absent from the other dictionary
    pub missing: Vec<String>,
    /// In the other dictionary, absent from the reference
    pub extra: Vec<String>,
}

impl KeySetDiff {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compare the resolvable key sets of two dictionaries
pub fn diff_key_sets(reference: &Dictionary, other: &Dictionary) -> KeySetDiff {
    let ours = reference.leaf_paths();
    let theirs = other.leaf_paths();
    KeySetDiff {
        missing: ours.difference(&theirs).cloned().collect(),
        extra: theirs.difference(&ours).cloned().collect(),
    }
}

// Digits only: "+1" and "-0" are not indices
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn collect_leaves(node: &Value, prefix: &mut String, out: &mut BTreeSet<String>) {
    match node {
        Value::String(_) => {
            out.insert(prefix.clone());
        }
        Value::Object(map) => {
            for (key, child) in map {
                descend(prefix, key, child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                descend(prefix, &index.to_string(), child, out);
            }
        }
        _ => {}
    }
}

fn descend(prefix: &mut String, segment: &str, child: &Value, out: &mut BTreeSet<String>) {
    let len = prefix.len();
    if !prefix.is_empty() {
        prefix.push('.');
    }
    prefix.push_str(segment);
    collect_leaves(child, prefix, out);
    prefix.truncate(len);
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
