use {
    super::error::AuditError,
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
    std::fmt,
};

/// Bounds on metadata and diff payloads. Enforced both at construction and
/// again by the hash engine before any record is persisted.
pub const MAX_KEYS: usize = 64;
pub const MAX_KEY_LEN: usize = 128;
pub const MAX_TEXT_LEN: usize = 1024;

/// Restricted value type for metadata and diffs: closed over null, bool,
/// 64-bit integer, and bounded text, so canonicalization is total and
/// unambiguous. No floats, no nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl MetaValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    fn check_bounds(&self) -> Result<(), AuditError> {
        if let Self::Text(s) = self {
            if s.len() > MAX_TEXT_LEN {
                return Err(AuditError::Encoding(format!(
                    "text value exceeds {MAX_TEXT_LEN} bytes"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

fn check_key(key: &str) -> Result<(), AuditError> {
    if key.is_empty() {
        return Err(AuditError::Encoding("metadata key must not be empty".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(AuditError::Encoding(format!(
            "metadata key exceeds {MAX_KEY_LEN} bytes: {key}"
        )));
    }
    Ok(())
}

/// Free-form key/value context for a record. BTreeMap keeps iteration in
/// sorted key order, which the canonical encoding relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetaValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetaValue>,
    ) -> Result<(), AuditError> {
        let key = key.into();
        let value = value.into();
        check_key(&key)?;
        value.check_bounds()?;
        if self.0.len() >= MAX_KEYS && !self.0.contains_key(&key) {
            return Err(AuditError::Encoding(format!(
                "metadata exceeds {MAX_KEYS} keys"
            )));
        }
        self.0.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetaValue)> {
        self.0.iter()
    }

    /// Re-check bounds on a map that may have arrived through deserialization,
    /// which bypasses `insert`. Called by the hash engine before hashing.
    pub(crate) fn check_bounds(&self) -> Result<(), AuditError> {
        if self.0.len() > MAX_KEYS {
            return Err(AuditError::Encoding(format!(
                "metadata exceeds {MAX_KEYS} keys"
            )));
        }
        for (key, value) in &self.0 {
            check_key(key)?;
            value.check_bounds()?;
        }
        Ok(())
    }
}

/// One field's before/after delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: MetaValue,
    pub after: MetaValue,
}

/// Structured before/after delta for a record. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeDiff(BTreeMap<String, FieldChange>);

impl ChangeDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        field: impl Into<String>,
        before: impl Into<MetaValue>,
        after: impl Into<MetaValue>,
    ) -> Result<(), AuditError> {
        let field = field.into();
        let before = before.into();
        let after = after.into();
        check_key(&field)?;
        before.check_bounds()?;
        after.check_bounds()?;
        if self.0.len() >= MAX_KEYS && !self.0.contains_key(&field) {
            return Err(AuditError::Encoding(format!(
                "diff exceeds {MAX_KEYS} fields"
            )));
        }
        self.0.insert(field, FieldChange { before, after });
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn check_bounds(&self) -> Result<(), AuditError> {
        if self.0.len() > MAX_KEYS {
            return Err(AuditError::Encoding(format!(
                "diff exceeds {MAX_KEYS} fields"
            )));
        }
        for (field, change) in &self.0 {
            check_key(field)?;
            change.before.check_bounds()?;
            change.after.check_bounds()?;
        }
        Ok(())
    }
}
