use {
    super::error::AuditError,
    super::id::{ActionName, TenantId},
    super::value::{ChangeDiff, Metadata},
    chrono::{DateTime, Utc},
    derive_more::Display,
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha256},
};

/// `prev_hash` of the first record in a tenant's chain, which has no real
/// predecessor.
pub const GENESIS_SENTINEL: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// SHA-256 digest of a record's canonical encoding, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordDigest(String);

impl RecordDigest {
    pub fn genesis() -> Self {
        Self(GENESIS_SENTINEL.to_string())
    }

    /// Wrap a digest read back from storage. Not validated: verification
    /// recomputes and compares, so a corrupted value simply fails to match.
    pub fn from_stored(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_genesis(&self) -> bool {
        self.0 == GENESIS_SENTINEL
    }
}

/// The chain-relevant fields of a record: everything in §3 except `id` and
/// the `hash` itself.
pub struct CanonicalFields<'a> {
    pub tenant_id: &'a TenantId,
    pub user_id: Option<&'a str>,
    pub action: &'a ActionName,
    pub entity: &'a str,
    pub entity_id: &'a str,
    pub metadata: &'a Metadata,
    pub diff: &'a ChangeDiff,
    pub created_at: DateTime<Utc>,
    pub prev_hash: &'a RecordDigest,
}

/// Serialized form fed to the hasher. Struct fields serialize in declaration
/// order; metadata and diff maps iterate in sorted key order; the timestamp
/// renders at fixed microsecond width. Two logically identical records
/// therefore always produce identical bytes.
#[derive(Serialize)]
struct CanonicalEncoding<'a> {
    tenant_id: &'a str,
    user_id: Option<&'a str>,
    action: &'a str,
    entity: &'a str,
    entity_id: &'a str,
    metadata: &'a Metadata,
    diff: &'a ChangeDiff,
    created_at: String,
    prev_hash: &'a str,
}

/// Canonical timestamp rendering. Fixed width: microsecond precision, UTC.
pub fn canonical_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Compute the digest for a record. Pure: all inputs are explicit, no I/O,
/// no clock. Fails with `Encoding` when metadata or diff violate the
/// canonicalization bounds; the caller must not persist the record.
pub fn compute_digest(fields: &CanonicalFields<'_>) -> Result<RecordDigest, AuditError> {
    fields.metadata.check_bounds()?;
    fields.diff.check_bounds()?;

    let encoding = CanonicalEncoding {
        tenant_id: fields.tenant_id.as_str(),
        user_id: fields.user_id,
        action: fields.action.as_str(),
        entity: fields.entity,
        entity_id: fields.entity_id,
        metadata: fields.metadata,
        diff: fields.diff,
        created_at: canonical_timestamp(fields.created_at),
        prev_hash: fields.prev_hash.as_str(),
    };

    let bytes = serde_json::to_vec(&encoding)
        .map_err(|e| AuditError::Encoding(format!("canonical serialization failed: {e}")))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(RecordDigest(hex::encode(hasher.finalize())))
}
