use {
    crate::domain::error::AuditError,
    crate::domain::hash::RecordDigest,
    crate::domain::id::TenantId,
    crate::domain::record::AuditRecord,
    crate::infra::store::AuditStore,
    serde::Serialize,
    std::collections::{HashMap, HashSet},
    uuid::Uuid,
};

/// Outcome of a chain verification. A failed verification is a normal
/// result describing a security condition, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub valid: bool,
    pub total_records: u64,
    pub first_invalid_record_id: Option<Uuid>,
}

impl VerificationReport {
    fn valid(total_records: u64) -> Self {
        Self {
            valid: true,
            total_records,
            first_invalid_record_id: None,
        }
    }

    fn invalid(total_records: u64, record_id: Uuid) -> Self {
        Self {
            valid: false,
            total_records,
            first_invalid_record_id: Some(record_id),
        }
    }
}

/// Walk a tenant's chain from the genesis sentinel forward and recompute
/// every digest.
///
/// Chain linkage is authoritative: the walk follows `prev_hash` links, not
/// `created_at` order. It stops at the first divergence, since everything
/// after an undetected tamper point is trivially re-derivable by an attacker
/// with write access. The total record count is always reported. Read-only;
/// a chain that gains a tail record mid-walk is simply seen without it.
pub async fn verify_chain(
    store: &dyn AuditStore,
    tenant: &TenantId,
) -> Result<VerificationReport, AuditError> {
    let records = store.records_for_tenant(tenant).await?;
    let total = records.len() as u64;

    if records.is_empty() {
        return Ok(VerificationReport::valid(0));
    }

    // Records indexed by the predecessor they claim. Claimants keep the
    // store's (created_at, id) ordering, so the earlier of two forks is
    // walked and the later reported.
    let mut by_prev: HashMap<&str, Vec<&AuditRecord>> = HashMap::new();
    for record in &records {
        by_prev
            .entry(record.prev_hash.as_str())
            .or_default()
            .push(record);
    }

    let mut cursor = RecordDigest::genesis();
    let mut visited: HashSet<Uuid> = HashSet::new();

    loop {
        let claimants = match by_prev.get(cursor.as_str()) {
            Some(claimants) => claimants,
            None => break,
        };

        // Two records claiming the same predecessor is a fork.
        if claimants.len() > 1 {
            return Ok(VerificationReport::invalid(total, claimants[1].id));
        }
        let record = claimants[0];

        // A link back into the walked prefix is a cycle, not a chain.
        if !visited.insert(record.id) {
            return Ok(VerificationReport::invalid(total, record.id));
        }

        // Any field mutation after the fact changes the recomputed digest.
        // A record whose stored fields no longer canonicalize is equally
        // tampered: report it, don't error.
        match record.recompute_digest() {
            Ok(digest) if digest == record.hash => {}
            Ok(_) | Err(AuditError::Encoding(_)) => {
                return Ok(VerificationReport::invalid(total, record.id));
            }
            Err(e) => return Err(e),
        }

        cursor = record.hash.clone();
    }

    // Records the walk never reached: the chain was broken before them by
    // a spliced-out predecessor, or a first record that does not link to
    // the genesis sentinel. The earliest by creation order is the break.
    if visited.len() < records.len() {
        let first_unreached = records
            .iter()
            .find(|record| !visited.contains(&record.id))
            .map(|record| record.id);
        if let Some(record_id) = first_unreached {
            return Ok(VerificationReport::invalid(total, record_id));
        }
    }

    Ok(VerificationReport::valid(total))
}
