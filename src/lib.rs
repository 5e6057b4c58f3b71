pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

use {crate::infra::store::AuditStore, crate::services::query::QueryConfig, std::sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuditStore>,
    pub query_config: QueryConfig,
}
