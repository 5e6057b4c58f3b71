use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{
            error::AuditError,
            id::{ActionName, TenantId},
            record::{AuditRecord, NewAuditEvent, NewAuditEventParams},
            value::{ChangeDiff, Metadata},
        },
        services::{
            query::{PageRequest, RecordFilter, list_records},
            verifier::verify_chain,
            writer::append_record,
        },
    },
    axum::{
        Json,
        extract::{Path, Query, State},
        http::StatusCode,
    },
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Hex chars of a digest shown in list views. Full hashes stay available to
/// verification tooling; the viewer only needs a recognizable prefix.
const HASH_DISPLAY_LEN: usize = 16;

#[derive(Debug, Deserialize)]
pub struct LogAuditRequest {
    pub user_id: Option<String>,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub diff: ChangeDiff,
}

/// The inbound `logAudit` call: durable once this returns 201.
pub async fn log_audit(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(request): Json<LogAuditRequest>,
) -> Result<(StatusCode, Json<AuditRecord>), ApiError> {
    let event = NewAuditEvent::new(NewAuditEventParams {
        tenant_id: TenantId::new(tenant_id)?,
        user_id: request.user_id,
        action: ActionName::new(request.action)?,
        entity: request.entity,
        entity_id: request.entity_id,
        metadata: request.metadata,
        diff: request.diff,
    })?;

    let record = append_record(state.store.as_ref(), event).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub entity: Option<String>,
    pub action: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Record as rendered in the viewer: digests truncated for display.
#[derive(Debug, Serialize)]
pub struct RecordView {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub metadata: Metadata,
    pub diff: ChangeDiff,
    pub created_at: DateTime<Utc>,
    pub prev_hash: String,
    pub hash: String,
}

impl From<AuditRecord> for RecordView {
    fn from(record: AuditRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            action: record.action.into_inner(),
            entity: record.entity,
            entity_id: record.entity_id,
            metadata: record.metadata,
            diff: record.diff,
            created_at: record.created_at,
            prev_hash: truncate_digest(record.prev_hash.as_str()),
            hash: truncate_digest(record.hash.as_str()),
        }
    }
}

fn truncate_digest(hex: &str) -> String {
    hex.chars().take(HASH_DISPLAY_LEN).collect()
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub records: Vec<RecordView>,
    pub page: u32,
    pub page_size: u32,
    pub total_records: u64,
    pub total_pages: u64,
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, AuditError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| AuditError::InvalidFilter(format!("{field} is not RFC 3339: {e}")))
}

pub async fn list_audit(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let tenant = TenantId::new(tenant_id)?;

    let filter = RecordFilter {
        entity: params.entity,
        action: params.action,
        from: params
            .from
            .as_deref()
            .map(|v| parse_timestamp("from", v))
            .transpose()?,
        to: params
            .to
            .as_deref()
            .map(|v| parse_timestamp("to", v))
            .transpose()?,
        search: params.search,
    };
    let page_request = PageRequest {
        page: params.page.unwrap_or(1),
        page_size: params.page_size,
    };

    let page = list_records(
        state.store.as_ref(),
        &tenant,
        &filter,
        &page_request,
        &state.query_config,
    )
    .await?;

    Ok(Json(ListResponse {
        records: page.records.into_iter().map(RecordView::from).collect(),
        page: page.page,
        page_size: page.page_size,
        total_records: page.total_records,
        total_pages: page.total_pages,
    }))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub total_records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_record_id: Option<Uuid>,
}

/// Human-triggered "Verify Chain" action; automation hits the same route.
/// The in-process sweep calls the verifier directly.
pub async fn verify_audit(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let tenant = TenantId::new(tenant_id)?;
    let report = verify_chain(state.store.as_ref(), &tenant).await?;

    if !report.valid {
        tracing::error!(
            tenant = %tenant,
            first_invalid_record_id = ?report.first_invalid_record_id,
            "chain verification FAILED, possible tampering"
        );
    }

    Ok(Json(VerifyResponse {
        valid: report.valid,
        total_records: report.total_records,
        first_invalid_record_id: report.first_invalid_record_id,
    }))
}
