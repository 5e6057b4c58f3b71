#![allow(dead_code)]

use audit_chain::domain::id::{ActionName, TenantId};
use audit_chain::domain::record::{AuditRecord, NewAuditEvent, NewAuditEventParams};
use audit_chain::domain::value::{ChangeDiff, Metadata, MetaValue};
use audit_chain::infra::memory::MemoryStore;
use audit_chain::services::writer::append_record;

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

/// Build an event with sensible defaults: a user actor and a small
/// metadata payload.
pub fn make_event(tenant_id: &str, action: &str, entity: &str, entity_id: &str) -> NewAuditEvent {
    let mut metadata = Metadata::new();
    metadata.insert("source", "test").unwrap();

    NewAuditEvent::new(NewAuditEventParams {
        tenant_id: tenant(tenant_id),
        user_id: Some("user-1".to_string()),
        action: ActionName::new(action).unwrap(),
        entity: entity.to_string(),
        entity_id: entity_id.to_string(),
        metadata,
        diff: ChangeDiff::new(),
    })
    .unwrap()
}

/// Event with an explicit before/after diff, system-initiated (no user).
pub fn make_system_event(
    tenant_id: &str,
    action: &str,
    entity: &str,
    entity_id: &str,
    field: &str,
    before: &str,
    after: &str,
) -> NewAuditEvent {
    let mut diff = ChangeDiff::new();
    diff.record(field, MetaValue::text(before), MetaValue::text(after))
        .unwrap();

    NewAuditEvent::new(NewAuditEventParams {
        tenant_id: tenant(tenant_id),
        user_id: None,
        action: ActionName::new(action).unwrap(),
        entity: entity.to_string(),
        entity_id: entity_id.to_string(),
        metadata: Metadata::new(),
        diff,
    })
    .unwrap()
}

/// Append `n` numbered records to a tenant's chain through the writer.
/// The short sleep keeps `created_at` values distinct at microsecond
/// precision, so creation order is unambiguous in assertions.
pub async fn seed_chain(store: &MemoryStore, tenant_id: &str, n: usize) -> Vec<AuditRecord> {
    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let event = make_event(
            tenant_id,
            "hotlist.campaign.created",
            "campaign",
            &format!("campaign-{i}"),
        );
        records.push(append_record(store, event).await.unwrap());
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    records
}
