use {
    super::store::{AuditStore, ChainHead, ListQuery},
    crate::domain::error::AuditError,
    crate::domain::id::TenantId,
    crate::domain::record::AuditRecord,
    async_trait::async_trait,
    std::collections::HashMap,
    tokio::sync::RwLock,
};

/// In-memory backend. Used by the test suite and as a development store.
///
/// Records live in per-tenant vectors in append order. The conditional
/// append compares against the in-memory head under the write lock, which
/// gives the same one-winner semantics the Postgres backend gets from its
/// unique constraint.
#[derive(Default)]
pub struct MemoryStore {
    chains: RwLock<HashMap<String, Vec<AuditRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a tenant's raw storage, append order.
    pub async fn raw_snapshot(&self, tenant: &TenantId) -> Vec<AuditRecord> {
        let chains = self.chains.read().await;
        chains.get(tenant.as_str()).cloned().unwrap_or_default()
    }

    /// Overwrite a stored record in place, bypassing the append-only
    /// contract. This is the in-memory equivalent of a direct `UPDATE`
    /// against the database: the tampering the verifier exists to detect.
    /// Not part of `AuditStore`.
    pub async fn raw_replace(&self, tenant: &TenantId, index: usize, record: AuditRecord) {
        let mut chains = self.chains.write().await;
        if let Some(chain) = chains.get_mut(tenant.as_str()) {
            if index < chain.len() {
                chain[index] = record;
            }
        }
    }

    /// Remove a stored record, bypassing the append-only contract. The
    /// in-memory equivalent of a direct `DELETE`.
    pub async fn raw_remove(&self, tenant: &TenantId, index: usize) {
        let mut chains = self.chains.write().await;
        if let Some(chain) = chains.get_mut(tenant.as_str()) {
            if index < chain.len() {
                chain.remove(index);
            }
        }
    }

    fn matches(record: &AuditRecord, query: &ListQuery) -> bool {
        if let Some(entity) = &query.entity {
            if record.entity != *entity {
                return false;
            }
        }
        if let Some(action) = &query.action {
            if record.action.as_str() != action {
                return false;
            }
        }
        if let Some(from) = query.from {
            if record.created_at < from {
                return false;
            }
        }
        if let Some(to) = query.to {
            if record.created_at > to {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn chain_head(&self, tenant: &TenantId) -> Result<Option<ChainHead>, AuditError> {
        let chains = self.chains.read().await;
        Ok(chains
            .get(tenant.as_str())
            .and_then(|chain| chain.last())
            .map(|record| ChainHead {
                hash: record.hash.clone(),
                created_at: record.created_at,
            }))
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut chains = self.chains.write().await;
        let chain = chains
            .entry(record.tenant_id.as_str().to_string())
            .or_default();

        let head_matches = match chain.last() {
            Some(head) => record.prev_hash == head.hash,
            None => record.prev_hash.is_genesis(),
        };
        if !head_matches {
            return Err(AuditError::ConcurrentChainWrite {
                tenant: record.tenant_id.as_str().to_string(),
            });
        }

        chain.push(record.clone());
        Ok(())
    }

    async fn records_for_tenant(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let chains = self.chains.read().await;
        let mut records = chains.get(tenant.as_str()).cloned().unwrap_or_default();
        records.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(records)
    }

    async fn list(
        &self,
        tenant: &TenantId,
        query: &ListQuery,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<AuditRecord>, u64), AuditError> {
        let chains = self.chains.read().await;
        let mut matching: Vec<AuditRecord> = chains
            .get(tenant.as_str())
            .map(|chain| {
                chain
                    .iter()
                    .filter(|record| Self::matches(record, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let total = matching.len() as u64;
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn tenant_ids(&self) -> Result<Vec<TenantId>, AuditError> {
        let chains = self.chains.read().await;
        let mut ids: Vec<&String> = chains
            .iter()
            .filter(|(_, chain)| !chain.is_empty())
            .map(|(tenant, _)| tenant)
            .collect();
        ids.sort();
        ids.into_iter().map(|id| TenantId::new(id.as_str())).collect()
    }
}
