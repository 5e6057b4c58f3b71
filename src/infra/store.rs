use {
    crate::domain::error::AuditError,
    crate::domain::hash::RecordDigest,
    crate::domain::id::TenantId,
    crate::domain::record::AuditRecord,
    async_trait::async_trait,
    chrono::{DateTime, Utc},
};

/// The most recently appended record for a tenant: the anchor point new
/// appends must link to.
#[derive(Debug, Clone)]
pub struct ChainHead {
    pub hash: RecordDigest,
    pub created_at: DateTime<Utc>,
}

/// Exact-match and range filters pushed down to the store. Free-text search
/// is a display concern layered on top by the query service, not here.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub entity: Option<String>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Append-only storage for audit records.
///
/// The trait deliberately exposes no update or delete operation; record
/// immutability is part of the public contract, not a storage permission.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Current chain head for a tenant, or `None` for an empty chain.
    async fn chain_head(&self, tenant: &TenantId) -> Result<Option<ChainHead>, AuditError>;

    /// Append `record`, conditional on its `prev_hash` still matching the
    /// store's current head for that tenant. Fails with
    /// `ConcurrentChainWrite` when another writer got there first: the two
    /// outcomes of a race are exactly one success and one conflict, never
    /// two records claiming the same predecessor.
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;

    /// All of a tenant's records ordered by `(created_at, id)` ascending.
    /// Source material for the verifier's link walk; the walk itself treats
    /// chain linkage, not this ordering, as authoritative.
    async fn records_for_tenant(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<AuditRecord>, AuditError>;

    /// One page of committed records matching `query`, ordered by creation
    /// descending, plus the total match count.
    async fn list(
        &self,
        tenant: &TenantId,
        query: &ListQuery,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<AuditRecord>, u64), AuditError>;

    /// Every tenant that has at least one record. Drives the integrity sweep.
    async fn tenant_ids(&self) -> Result<Vec<TenantId>, AuditError>;
}
