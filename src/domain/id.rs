use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::AuditError;

const MAX_TENANT_ID_LEN: usize = 64;
const MAX_ACTION_LEN: usize = 128;

/// Owning tenant of a chain. Every tenant has its own independent chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Result<Self, AuditError> {
        let id = id.into();
        if id.is_empty() {
            return Err(AuditError::Validation("TenantId must not be empty".into()));
        }
        if id.len() > MAX_TENANT_ID_LEN {
            return Err(AuditError::Validation(format!(
                "TenantId exceeds {MAX_TENANT_ID_LEN} chars: {id}"
            )));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(AuditError::Validation(format!(
                "TenantId must not contain whitespace: {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Namespaced action verb (`hotlist.campaign.created`, `settings.bulk_update`).
/// Lowercase dot-separated segments of `[a-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionName(String);

impl ActionName {
    pub fn new(action: impl Into<String>) -> Result<Self, AuditError> {
        let action = action.into();
        if action.len() > MAX_ACTION_LEN {
            return Err(AuditError::Validation(format!(
                "ActionName exceeds {MAX_ACTION_LEN} chars: {action}"
            )));
        }
        let segments: Vec<&str> = action.split('.').collect();
        if segments.len() < 2 {
            return Err(AuditError::Validation(format!(
                "ActionName must be namespaced (at least `domain.verb`), got: {action}"
            )));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err(AuditError::Validation(format!(
                    "ActionName has an empty segment: {action}"
                )));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(AuditError::Validation(format!(
                    "ActionName segments must match [a-z0-9_]+, got: {action}"
                )));
            }
        }
        Ok(Self(action))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
