use {
    super::error::AuditError,
    super::hash::{CanonicalFields, RecordDigest, compute_digest},
    super::id::{ActionName, TenantId},
    super::value::{ChangeDiff, Metadata},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

const MAX_ENTITY_LEN: usize = 128;
const MAX_ENTITY_ID_LEN: usize = 128;
const MAX_USER_ID_LEN: usize = 128;

/// One link in a tenant's chain. Created exactly once by the writer,
/// never mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub user_id: Option<String>,
    pub action: ActionName,
    pub entity: String,
    pub entity_id: String,
    pub metadata: Metadata,
    pub diff: ChangeDiff,
    pub created_at: DateTime<Utc>,
    pub prev_hash: RecordDigest,
    pub hash: RecordDigest,
}

impl AuditRecord {
    /// Build a record linked to `prev_hash` and compute its digest.
    /// `created_at` must already be clamped and truncated by the writer.
    pub fn seal(
        event: NewAuditEvent,
        prev_hash: RecordDigest,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AuditError> {
        let hash = compute_digest(&CanonicalFields {
            tenant_id: &event.tenant_id,
            user_id: event.user_id.as_deref(),
            action: &event.action,
            entity: &event.entity,
            entity_id: &event.entity_id,
            metadata: &event.metadata,
            diff: &event.diff,
            created_at,
            prev_hash: &prev_hash,
        })?;

        Ok(Self {
            id: Uuid::now_v7(),
            tenant_id: event.tenant_id,
            user_id: event.user_id,
            action: event.action,
            entity: event.entity,
            entity_id: event.entity_id,
            metadata: event.metadata,
            diff: event.diff,
            created_at,
            prev_hash,
            hash,
        })
    }

    /// Recompute the digest from the stored fields. Used by the verifier;
    /// a mutated record produces a different digest than the stored one.
    pub fn recompute_digest(&self) -> Result<RecordDigest, AuditError> {
        compute_digest(&CanonicalFields {
            tenant_id: &self.tenant_id,
            user_id: self.user_id.as_deref(),
            action: &self.action,
            entity: &self.entity,
            entity_id: &self.entity_id,
            metadata: &self.metadata,
            diff: &self.diff,
            created_at: self.created_at,
            prev_hash: &self.prev_hash,
        })
    }
}

/// Constructor params for `NewAuditEvent`.
pub struct NewAuditEventParams {
    pub tenant_id: TenantId,
    pub user_id: Option<String>,
    pub action: ActionName,
    pub entity: String,
    pub entity_id: String,
    pub metadata: Metadata,
    pub diff: ChangeDiff,
}

/// A structured action event accepted by the writer: everything the caller
/// supplies. Id, timestamp, and hashes are assigned at write time.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    tenant_id: TenantId,
    user_id: Option<String>,
    action: ActionName,
    entity: String,
    entity_id: String,
    metadata: Metadata,
    diff: ChangeDiff,
}

impl NewAuditEvent {
    pub fn new(params: NewAuditEventParams) -> Result<Self, AuditError> {
        if params.entity.is_empty() {
            return Err(AuditError::Validation("entity must not be empty".into()));
        }
        if params.entity.len() > MAX_ENTITY_LEN {
            return Err(AuditError::Validation(format!(
                "entity exceeds {MAX_ENTITY_LEN} chars"
            )));
        }
        if params.entity_id.is_empty() {
            return Err(AuditError::Validation("entity_id must not be empty".into()));
        }
        if params.entity_id.len() > MAX_ENTITY_ID_LEN {
            return Err(AuditError::Validation(format!(
                "entity_id exceeds {MAX_ENTITY_ID_LEN} chars"
            )));
        }
        if let Some(user_id) = &params.user_id {
            if user_id.is_empty() {
                return Err(AuditError::Validation(
                    "user_id must be absent for system actions, not empty".into(),
                ));
            }
            if user_id.len() > MAX_USER_ID_LEN {
                return Err(AuditError::Validation(format!(
                    "user_id exceeds {MAX_USER_ID_LEN} chars"
                )));
            }
        }

        Ok(Self {
            tenant_id: params.tenant_id,
            user_id: params.user_id,
            action: params.action,
            entity: params.entity,
            entity_id: params.entity_id,
            metadata: params.metadata,
            diff: params.diff,
        })
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn action(&self) -> &ActionName {
        &self.action
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }
}
