use audit_chain::domain::hash::{CanonicalFields, RecordDigest, compute_digest};
use audit_chain::domain::id::{ActionName, TenantId};
use audit_chain::domain::value::{ChangeDiff, MetaValue, Metadata};
use chrono::{DateTime, Utc};
use proptest::prelude::*;

fn arb_segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn arb_action() -> impl Strategy<Value = String> {
    (arb_segment(), arb_segment(), arb_segment())
        .prop_map(|(a, b, c)| format!("{a}.{b}.{c}"))
}

fn arb_meta_value() -> impl Strategy<Value = MetaValue> {
    prop_oneof![
        Just(MetaValue::Null),
        any::<bool>().prop_map(MetaValue::Bool),
        any::<i64>().prop_map(MetaValue::Int),
        "[ -~]{0,40}".prop_map(MetaValue::Text),
    ]
}

fn arb_metadata() -> impl Strategy<Value = Metadata> {
    prop::collection::vec(("[a-z]{1,8}", arb_meta_value()), 0..5).prop_map(|entries| {
        let mut metadata = Metadata::new();
        for (key, value) in entries {
            metadata.insert(key, value).unwrap();
        }
        metadata
    })
}

fn fields_digest(
    action: &str,
    entity: &str,
    entity_id: &str,
    metadata: &Metadata,
    created_at: DateTime<Utc>,
    prev_hash: &RecordDigest,
) -> RecordDigest {
    let tenant = TenantId::new("t1").unwrap();
    let action = ActionName::new(action).unwrap();
    compute_digest(&CanonicalFields {
        tenant_id: &tenant,
        user_id: Some("user-1"),
        action: &action,
        entity,
        entity_id,
        metadata,
        diff: &ChangeDiff::new(),
        created_at,
        prev_hash,
    })
    .unwrap()
}

fn timestamp(offset: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + offset, 0).unwrap()
}

proptest! {
    /// Same fields, same digest, across repeated calls and regardless of
    /// the order metadata was built in.
    #[test]
    fn digest_is_deterministic(
        action in arb_action(),
        metadata in arb_metadata(),
        offset in 0i64..1_000_000,
    ) {
        let prev = RecordDigest::genesis();
        let at = timestamp(offset);
        let first = fields_digest(&action, "campaign", "c-1", &metadata, at, &prev);
        let second = fields_digest(&action, "campaign", "c-1", &metadata, at, &prev);
        prop_assert_eq!(first, second);
    }

    /// The digest is 64 lowercase hex chars and never the genesis sentinel.
    #[test]
    fn digest_shape_is_stable(action in arb_action(), metadata in arb_metadata()) {
        let digest = fields_digest(
            &action, "campaign", "c-1", &metadata, timestamp(0), &RecordDigest::genesis(),
        );
        prop_assert_eq!(digest.as_str().len(), 64);
        prop_assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        prop_assert!(!digest.is_genesis());
    }

    /// Changing any single chain-relevant input changes the digest.
    #[test]
    fn digest_reflects_every_field(action in arb_action(), offset in 0i64..1_000_000) {
        let metadata = Metadata::new();
        let prev = RecordDigest::genesis();
        let at = timestamp(offset);
        let base = fields_digest(&action, "campaign", "c-1", &metadata, at, &prev);

        let other_entity = fields_digest(&action, "vendor", "c-1", &metadata, at, &prev);
        prop_assert_ne!(base.clone(), other_entity);

        let other_entity_id = fields_digest(&action, "campaign", "c-2", &metadata, at, &prev);
        prop_assert_ne!(base.clone(), other_entity_id);

        let other_time = fields_digest(&action, "campaign", "c-1", &metadata, timestamp(offset + 1), &prev);
        prop_assert_ne!(base.clone(), other_time);

        let other_prev = fields_digest(&action, "campaign", "c-1", &metadata, at, &base);
        prop_assert_ne!(base, other_prev);
    }

    /// Well-formed namespaced actions are accepted verbatim.
    #[test]
    fn action_name_roundtrip(action in arb_action()) {
        let parsed = ActionName::new(action.clone()).unwrap();
        prop_assert_eq!(parsed.as_str(), action.as_str());
    }

    /// A bare verb with no namespace is rejected.
    #[test]
    fn action_name_requires_a_namespace(verb in "[a-z]{1,12}") {
        prop_assert!(ActionName::new(verb).is_err());
    }

    /// Uppercase anywhere in an action is rejected.
    #[test]
    fn action_name_rejects_uppercase(a in "[a-z]{1,6}", b in "[A-Z][a-z]{0,5}") {
        let name = format!("{}.{}", a, b);
        prop_assert!(ActionName::new(name).is_err());
    }

    /// Tenant ids never contain whitespace.
    #[test]
    fn tenant_id_rejects_whitespace(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        let tid = format!("{} {}", a, b);
        prop_assert!(TenantId::new(tid).is_err());
    }

    /// Restricted values survive a JSON round trip unchanged, so what the
    /// store persists is what the hash engine saw.
    #[test]
    fn meta_value_json_roundtrip(value in arb_meta_value()) {
        let json = serde_json::to_value(&value).unwrap();
        let back: MetaValue = serde_json::from_value(json).unwrap();
        prop_assert_eq!(back, value);
    }

    /// Metadata maps canonicalize identically regardless of insertion order.
    #[test]
    fn metadata_order_is_irrelevant(
        entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 1..6),
    ) {
        let mut forward = Metadata::new();
        for (key, value) in &entries {
            forward.insert(key.clone(), *value).unwrap();
        }
        let mut backward = Metadata::new();
        for (key, value) in entries.iter().rev() {
            backward.insert(key.clone(), *value).unwrap();
        }

        let prev = RecordDigest::genesis();
        let first = fields_digest("a.b", "campaign", "c-1", &forward, timestamp(0), &prev);
        let second = fields_digest("a.b", "campaign", "c-1", &backward, timestamp(0), &prev);
        prop_assert_eq!(first, second);
    }
}
