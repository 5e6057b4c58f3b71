use {
    crate::domain::error::AuditError,
    crate::domain::id::TenantId,
    crate::domain::record::AuditRecord,
    crate::infra::store::{AuditStore, ListQuery},
    chrono::{DateTime, Utc},
};

/// Filters accepted by the query service. `entity` and `action` are exact
/// matches, `from`/`to` bound `created_at`, and `search` is a free-text
/// pass over the fetched page (action, entity, actor identity).
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub entity: Option<String>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Requested page size; the config default applies when absent, the
    /// config cap always applies.
    pub page_size: Option<u32>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<AuditRecord>,
    pub page: u32,
    pub page_size: u32,
    pub total_records: u64,
    pub total_pages: u64,
}

fn matches_search(record: &AuditRecord, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    record.action.as_str().to_lowercase().contains(&needle)
        || record.entity.to_lowercase().contains(&needle)
        || record
            .user_id
            .as_deref()
            .is_some_and(|user| user.to_lowercase().contains(&needle))
}

/// Paginated, filterable read access over committed records, ordered by
/// creation descending. A tenant with no records yields an empty page, not
/// an error.
///
/// `total_pages` reflects the store-side filters; the free-text search is a
/// secondary display filter applied to the fetched page only.
pub async fn list_records(
    store: &dyn AuditStore,
    tenant: &TenantId,
    filter: &RecordFilter,
    page_request: &PageRequest,
    config: &QueryConfig,
) -> Result<RecordPage, AuditError> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(AuditError::InvalidFilter(format!(
                "from ({from}) is after to ({to})"
            )));
        }
    }
    if page_request.page == 0 {
        return Err(AuditError::InvalidFilter("page is 1-based".into()));
    }
    if let Some(size) = page_request.page_size {
        if size == 0 {
            return Err(AuditError::InvalidFilter("page_size must be positive".into()));
        }
    }

    let page_size = page_request
        .page_size
        .unwrap_or(config.default_page_size)
        .min(config.max_page_size);

    let offset = u64::from(page_request.page - 1) * u64::from(page_size);
    let query = ListQuery {
        entity: filter.entity.clone(),
        action: filter.action.clone(),
        from: filter.from,
        to: filter.to,
    };

    let (mut records, total_records) = store
        .list(tenant, &query, offset, u64::from(page_size))
        .await?;

    if let Some(search) = filter.search.as_deref() {
        if !search.is_empty() {
            records.retain(|record| matches_search(record, search));
        }
    }

    Ok(RecordPage {
        records,
        page: page_request.page,
        page_size,
        total_records,
        total_pages: total_records.div_ceil(u64::from(page_size)),
    })
}
