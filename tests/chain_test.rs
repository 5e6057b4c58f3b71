mod common;

use common::*;

use audit_chain::domain::hash::{GENESIS_SENTINEL, RecordDigest};
use audit_chain::domain::id::ActionName;
use audit_chain::domain::record::AuditRecord;
use audit_chain::domain::value::MetaValue;
use audit_chain::infra::memory::MemoryStore;
use audit_chain::services::verifier::verify_chain;
use audit_chain::services::writer::append_record;

// ── empty chain ────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_chain_is_trivially_valid() {
    let store = MemoryStore::new();

    let report = verify_chain(&store, &tenant("t1")).await.unwrap();
    assert!(report.valid);
    assert_eq!(report.total_records, 0);
    assert!(report.first_invalid_record_id.is_none());
}

// ── append + verify round trip ─────────────────────────────────────────────

#[tokio::test]
async fn appended_chain_verifies_clean() {
    let store = MemoryStore::new();
    let records = seed_chain(&store, "t1", 5).await;

    // First record links to the genesis sentinel, the rest to their
    // predecessor's stored hash.
    assert!(records[0].prev_hash.is_genesis());
    for i in 1..records.len() {
        assert_eq!(records[i].prev_hash, records[i - 1].hash);
        assert!(records[i].created_at >= records[i - 1].created_at);
    }

    let report = verify_chain(&store, &tenant("t1")).await.unwrap();
    assert!(report.valid);
    assert_eq!(report.total_records, 5);
}

#[tokio::test]
async fn genesis_sentinel_is_zero_digest() {
    assert_eq!(GENESIS_SENTINEL.len(), 64);
    assert!(GENESIS_SENTINEL.chars().all(|c| c == '0'));
    assert!(RecordDigest::genesis().is_genesis());
}

// ── the two-record scenario ────────────────────────────────────────────────
// role.changed then role.reverted on user:42; overwrite R1's metadata
// directly in storage; verification pinpoints R1.

#[tokio::test]
async fn overwritten_metadata_is_detected_at_the_mutated_record() {
    let store = MemoryStore::new();
    let t = tenant("t1");

    let r1 = append_record(&store, make_event("t1", "role.changed", "user", "user:42"))
        .await
        .unwrap();
    let r2 = append_record(&store, make_event("t1", "role.reverted", "user", "user:42"))
        .await
        .unwrap();

    assert!(r1.prev_hash.is_genesis());
    assert_eq!(r2.prev_hash, r1.hash);

    let report = verify_chain(&store, &t).await.unwrap();
    assert!(report.valid);
    assert_eq!(report.total_records, 2);

    let mut tampered = r1.clone();
    tampered
        .metadata
        .insert("injected", MetaValue::text("after the fact"))
        .unwrap();
    store.raw_replace(&t, 0, tampered).await;

    let report = verify_chain(&store, &t).await.unwrap();
    assert!(!report.valid);
    assert_eq!(report.total_records, 2);
    assert_eq!(report.first_invalid_record_id, Some(r1.id));
}

// ── tamper detection, field by field ───────────────────────────────────────

#[tokio::test]
async fn mutating_any_field_is_detected_at_that_record() {
    let store = MemoryStore::new();
    let t = tenant("t1");
    let records = seed_chain(&store, "t1", 3).await;
    let target = records[1].clone();

    let mutations: Vec<(&str, Box<dyn Fn(&mut AuditRecord)>)> = vec![
        (
            "action",
            Box::new(|r: &mut AuditRecord| {
                r.action = ActionName::new("settings.bulk_update").unwrap()
            }),
        ),
        (
            "entity",
            Box::new(|r: &mut AuditRecord| r.entity = "vendor".to_string()),
        ),
        (
            "entity_id",
            Box::new(|r: &mut AuditRecord| r.entity_id = "campaign-999".to_string()),
        ),
        (
            "user_id",
            Box::new(|r: &mut AuditRecord| r.user_id = Some("intruder".to_string())),
        ),
        (
            "created_at",
            Box::new(|r: &mut AuditRecord| {
                r.created_at = r.created_at + chrono::Duration::seconds(60)
            }),
        ),
        (
            "diff",
            Box::new(|r: &mut AuditRecord| {
                r.diff
                    .record("status", MetaValue::text("active"), MetaValue::text("deleted"))
                    .unwrap()
            }),
        ),
    ];

    for (field, mutate) in mutations {
        let mut tampered = target.clone();
        mutate(&mut tampered);
        store.raw_replace(&t, 1, tampered).await;

        let report = verify_chain(&store, &t).await.unwrap();
        assert!(!report.valid, "mutation of {field} went undetected");
        assert_eq!(
            report.first_invalid_record_id,
            Some(target.id),
            "mutation of {field} blamed the wrong record"
        );
        assert_eq!(report.total_records, 3);

        store.raw_replace(&t, 1, target.clone()).await;
        assert!(verify_chain(&store, &t).await.unwrap().valid);
    }
}

// ── splice detection ───────────────────────────────────────────────────────

#[tokio::test]
async fn removed_record_breaks_the_link_at_its_successor() {
    let store = MemoryStore::new();
    let t = tenant("t1");
    let records = seed_chain(&store, "t1", 4).await;

    // Drop the second record; the third still claims its hash.
    store.raw_remove(&t, 1).await;

    let report = verify_chain(&store, &t).await.unwrap();
    assert!(!report.valid);
    assert_eq!(report.total_records, 3);
    assert_eq!(report.first_invalid_record_id, Some(records[2].id));
}

#[tokio::test]
async fn first_record_must_link_to_genesis() {
    let store = MemoryStore::new();
    let t = tenant("t1");
    let records = seed_chain(&store, "t1", 2).await;

    let mut tampered = records[0].clone();
    tampered.prev_hash = RecordDigest::from_stored("f".repeat(64));
    store.raw_replace(&t, 0, tampered).await;

    let report = verify_chain(&store, &t).await.unwrap();
    assert!(!report.valid);
    assert_eq!(report.total_records, 2);
    assert_eq!(report.first_invalid_record_id, Some(records[0].id));
}

// ── reporting stops at the first break ─────────────────────────────────────

#[tokio::test]
async fn first_divergence_wins_when_several_records_are_tampered() {
    let store = MemoryStore::new();
    let t = tenant("t1");
    let records = seed_chain(&store, "t1", 4).await;

    for index in [1, 3] {
        let mut tampered = records[index].clone();
        tampered.entity = "tampered".to_string();
        store.raw_replace(&t, index, tampered).await;
    }

    let report = verify_chain(&store, &t).await.unwrap();
    assert!(!report.valid);
    assert_eq!(report.first_invalid_record_id, Some(records[1].id));
}
