use {
    crate::domain::error::AuditError,
    crate::domain::hash::RecordDigest,
    crate::domain::record::{AuditRecord, NewAuditEvent},
    crate::infra::store::AuditStore,
    chrono::{DateTime, Utc},
};

/// Storage keeps timestamps at microsecond precision; the digest must be
/// computed over exactly what a read-back returns.
fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at)
}

/// Append one record to a tenant's chain: resolve the head, clamp the
/// timestamp, seal, and write conditionally.
///
/// On `ConcurrentChainWrite` the head is re-resolved and the append retried
/// exactly once; a second conflict propagates. Encoding failures are never
/// retried. Exactly one immutable record is persisted on success. A failure
/// is logged at error severity before returning; a silently dropped record
/// would be a gap in the chain.
pub async fn append_record(
    store: &dyn AuditStore,
    event: NewAuditEvent,
) -> Result<AuditRecord, AuditError> {
    match try_append(store, event).await {
        Ok(record) => {
            tracing::debug!(
                tenant = %record.tenant_id,
                action = %record.action,
                record_id = %record.id,
                "audit record appended"
            );
            Ok(record)
        }
        Err(e) => {
            tracing::error!(error = %e, "audit append failed, chain has no record of the action");
            Err(e)
        }
    }
}

async fn try_append(
    store: &dyn AuditStore,
    event: NewAuditEvent,
) -> Result<AuditRecord, AuditError> {
    let mut attempts = 0;
    loop {
        let head = store.chain_head(event.tenant_id()).await?;

        // Server-assigned timestamp, clamped so it never regresses below the
        // head's: monotonicity wins over wall-clock skew.
        let now = truncate_to_micros(Utc::now());
        let (prev_hash, created_at) = match &head {
            Some(head) => (head.hash.clone(), now.max(head.created_at)),
            None => (RecordDigest::genesis(), now),
        };

        let record = AuditRecord::seal(event.clone(), prev_hash, created_at)?;

        match store.append(&record).await {
            Ok(()) => return Ok(record),
            Err(AuditError::ConcurrentChainWrite { tenant }) if attempts == 0 => {
                attempts += 1;
                tracing::warn!(%tenant, "lost chain head race, retrying with fresh head");
            }
            Err(e) => return Err(e),
        }
    }
}
