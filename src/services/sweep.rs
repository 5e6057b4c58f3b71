use {
    crate::domain::error::AuditError,
    crate::infra::store::AuditStore,
    crate::services::verifier::verify_chain,
    std::sync::Arc,
    std::time::Duration,
    tokio::sync::watch,
};

/// Periodic integrity sweep: verify every tenant's chain on an interval.
///
/// The core does not require this for correctness; periodic verification is
/// an external caller's responsibility, and the sweep is simply the usual
/// such caller shipped in-process. Findings are reported at error severity
/// for operator investigation. A detected tamper is never retried or
/// repaired in code.
pub async fn run_sweep(
    store: Arc<dyn AuditStore>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "integrity sweep started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("integrity sweep shutting down");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        if let Err(e) = sweep_once(store.as_ref()).await {
            tracing::error!(error = %e, "integrity sweep pass failed");
        }
    }
}

async fn sweep_once(store: &dyn AuditStore) -> Result<(), AuditError> {
    let tenants = store.tenant_ids().await?;

    for tenant in tenants {
        match verify_chain(store, &tenant).await {
            Ok(report) if report.valid => {
                tracing::info!(
                    tenant = %tenant,
                    total_records = report.total_records,
                    "chain verified"
                );
            }
            Ok(report) => {
                tracing::error!(
                    tenant = %tenant,
                    total_records = report.total_records,
                    first_invalid_record_id = ?report.first_invalid_record_id,
                    "chain verification FAILED, possible tampering"
                );
            }
            Err(e) => {
                tracing::error!(tenant = %tenant, error = %e, "chain verification errored");
            }
        }
    }

    Ok(())
}
