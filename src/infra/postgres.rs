use {
    super::store::{AuditStore, ChainHead, ListQuery},
    crate::domain::error::AuditError,
    crate::domain::hash::RecordDigest,
    crate::domain::id::{ActionName, TenantId},
    crate::domain::record::AuditRecord,
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::{PgPool, Row, postgres::PgRow},
    uuid::Uuid,
};

/// PostgreSQL backend. Fork prevention is the storage layer's job here:
/// `audit_records` carries `UNIQUE (tenant_id, prev_hash)` and the append is
/// an `INSERT ... ON CONFLICT DO NOTHING`, so the insert itself is the
/// conditional write of the concurrency contract. Whoever inserts second for
/// the same head affects zero rows and gets `ConcurrentChainWrite`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn record_from_row(row: &PgRow) -> Result<AuditRecord, AuditError> {
        Ok(AuditRecord {
            id: row.try_get::<Uuid, _>("id")?,
            tenant_id: TenantId::new(row.try_get::<String, _>("tenant_id")?)?,
            user_id: row.try_get::<Option<String>, _>("user_id")?,
            action: ActionName::new(row.try_get::<String, _>("action")?)?,
            entity: row.try_get::<String, _>("entity")?,
            entity_id: row.try_get::<String, _>("entity_id")?,
            metadata: serde_json::from_value(row.try_get::<serde_json::Value, _>("metadata")?)?,
            diff: serde_json::from_value(row.try_get::<serde_json::Value, _>("diff")?)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            prev_hash: RecordDigest::from_stored(row.try_get::<String, _>("prev_hash")?),
            hash: RecordDigest::from_stored(row.try_get::<String, _>("hash")?),
        })
    }

    fn push_filters(builder: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, query: &ListQuery) {
        if let Some(entity) = &query.entity {
            builder.push(" AND entity = ");
            builder.push_bind(entity.clone());
        }
        if let Some(action) = &query.action {
            builder.push(" AND action = ");
            builder.push_bind(action.clone());
        }
        if let Some(from) = query.from {
            builder.push(" AND created_at >= ");
            builder.push_bind(from);
        }
        if let Some(to) = query.to {
            builder.push(" AND created_at <= ");
            builder.push_bind(to);
        }
    }
}

#[async_trait]
impl AuditStore for PgStore {
    async fn chain_head(&self, tenant: &TenantId) -> Result<Option<ChainHead>, AuditError> {
        // Ties on created_at are broken by id; v7 ids are time-ordered and
        // assigned in append order under the serialized writer.
        let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            r#"
            SELECT hash, created_at FROM audit_records
            WHERE tenant_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(tenant.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuditError::ChainHeadResolution(e.to_string()))?;

        Ok(row.map(|(hash, created_at)| ChainHead {
            hash: RecordDigest::from_stored(hash),
            created_at,
        }))
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_records
                (id, tenant_id, user_id, action, entity, entity_id,
                 metadata, diff, created_at, prev_hash, hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (tenant_id, prev_hash) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(record.tenant_id.as_str())
        .bind(record.user_id.as_deref())
        .bind(record.action.as_str())
        .bind(&record.entity)
        .bind(&record.entity_id)
        .bind(serde_json::to_value(&record.metadata)?)
        .bind(serde_json::to_value(&record.diff)?)
        .bind(record.created_at)
        .bind(record.prev_hash.as_str())
        .bind(record.hash.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuditError::ConcurrentChainWrite {
                tenant: record.tenant_id.as_str().to_string(),
            });
        }
        Ok(())
    }

    async fn records_for_tenant(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, user_id, action, entity, entity_id,
                   metadata, diff, created_at, prev_hash, hash
            FROM audit_records
            WHERE tenant_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(tenant.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn list(
        &self,
        tenant: &TenantId,
        query: &ListQuery,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<AuditRecord>, u64), AuditError> {
        let mut count_builder =
            sqlx::QueryBuilder::new("SELECT COUNT(*) FROM audit_records WHERE tenant_id = ");
        count_builder.push_bind(tenant.as_str());
        Self::push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = sqlx::QueryBuilder::new(
            "SELECT id, tenant_id, user_id, action, entity, entity_id, \
             metadata, diff, created_at, prev_hash, hash \
             FROM audit_records WHERE tenant_id = ",
        );
        builder.push_bind(tenant.as_str());
        Self::push_filters(&mut builder, query);
        builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        builder.push_bind(limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let records = rows
            .iter()
            .map(Self::record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, total as u64))
    }

    async fn tenant_ids(&self) -> Result<Vec<TenantId>, AuditError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT DISTINCT tenant_id FROM audit_records ORDER BY tenant_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|(id,)| TenantId::new(id)).collect()
    }
}
