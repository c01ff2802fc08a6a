//! # Metadata Context
//!
//! Shared key/value store attached to a flow. Matchers publish facts here and
//! later pipeline stages read them back, either directly or through
//! `{placeholder}` expansion.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Connection identifier key (`u32`)
pub const KEY_CONN_ID: &str = "l4.easytier.conn_id";

/// Message type key (`"syn"` or `"sack"`)
pub const KEY_MSG_TYPE: &str = "l4.easytier.msg_type";

/// Protocol magic key (`u64`)
pub const KEY_MAGIC: &str = "l4.easytier.magic";

/// Typed metadata value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    U32(u32),
    U64(u64),
    Str(Cow<'static, str>),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::U32(v) => write!(f, "{v}"),
            MetaValue::U64(v) => write!(f, "{v}"),
            MetaValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<u32> for MetaValue {
    fn from(v: u32) -> Self {
        MetaValue::U32(v)
    }
}

impl From<u64> for MetaValue {
    fn from(v: u64) -> Self {
        MetaValue::U64(v)
    }
}

impl From<&'static str> for MetaValue {
    fn from(s: &'static str) -> Self {
        MetaValue::Str(Cow::Borrowed(s))
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Str(Cow::Owned(s))
    }
}

/// Thread-safe metadata map shared across pipeline stages.
///
/// Writes never fail: a poisoned lock is recovered rather than dropping the
/// value, since publication is best-effort.
#[derive(Debug, Default)]
pub struct MetadataContext {
    entries: RwLock<HashMap<Cow<'static, str>, MetaValue>>,
}

impl MetadataContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous one under the same key
    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<Cow<'static, str>>,
        V: Into<MetaValue>,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<MetaValue> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        match self.get(key)? {
            MetaValue::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            MetaValue::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            MetaValue::Str(s) => Some(s.into_owned()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted copy of every entry, suitable for logging or serialisation
    pub fn snapshot(&self) -> BTreeMap<String, MetaValue> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Render the snapshot as a JSON object
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }

    /// Expand `{key}` placeholders in `template`.
    ///
    /// Unknown keys expand to the empty string. A `{` with no closing brace is
    /// copied through unchanged.
    pub fn replace_all(&self, template: &str) -> String {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    if let Some(value) = entries.get(&after[..close]) {
                        out.push_str(&value.to_string());
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
