use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("validation: {0}")]
    Validation(String),

    /// A field could not be canonicalized for hashing. Permanent; the
    /// record must not be persisted.
    #[error("encoding: {0}")]
    Encoding(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Transient storage failure while resolving a tenant's chain head.
    /// The whole append is safe to retry.
    #[error("chain head resolution: {0}")]
    ChainHeadResolution(String),

    /// Another writer claimed the same chain head first. Retry with a
    /// freshly resolved head.
    #[error("concurrent chain write for tenant {tenant}")]
    ConcurrentChainWrite { tenant: String },

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuditError {
    /// Whether the caller may retry the failed operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ChainHeadResolution(_) | Self::ConcurrentChainWrite { .. }
        )
    }
}
