//! Diesel-backed audit log.
//!
//! Append-only: this adapter exposes no update or delete path. The stats
//! query groups by `(api_name, success)` in SQL and folds the counts in
//! Rust, matching the admin log view.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::audit::{ApiCallRecord, ApiCallStat, AuditStats};
use crate::domain::ports::{AuditLog, AuditLogError};

use super::diesel_helpers::{diesel_error_message, pool_error_message};
use super::models::ApiLogRow;
use super::pool::DbPool;
use super::schema::api_call_logs;

/// Diesel-backed `AuditLog` over the shared pool.
#[derive(Clone)]
pub struct DieselAuditLog {
    pool: DbPool,
}

impl DieselAuditLog {
    /// Create an audit log over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_pool_error(error: super::pool::PoolError) -> AuditLogError {
        AuditLogError::connection(pool_error_message(error))
    }

    fn map_diesel_error(error: diesel::result::Error, operation: &str) -> AuditLogError {
        AuditLogError::query(diesel_error_message(error, operation))
    }
}

/// Fold grouped `(api_name, success, count)` rows into aggregate stats.
fn fold_stats(rows: Vec<(String, bool, i64)>) -> AuditStats {
    let mut stats = AuditStats::default();
    for (api_name, success, count) in rows {
        let count = u64::try_from(count).unwrap_or_default();
        stats.total_calls += count;
        if success {
            stats.successful_calls += count;
        } else {
            stats.failed_calls += count;
        }

        if let Some(stat) = stats.by_api.iter_mut().find(|stat| stat.api_name == api_name) {
            stat.total += count;
            if success {
                stat.successful += count;
            } else {
                stat.failed += count;
            }
        } else {
            stats.by_api.push(ApiCallStat {
                api_name,
                total: count,
                successful: if success { count } else { 0 },
                failed: if success { 0 } else { count },
            });
        }
    }
    stats.by_api.sort_by(|a, b| a.api_name.cmp(&b.api_name));
    stats
}

#[async_trait]
impl AuditLog for DieselAuditLog {
    async fn record(&self, entry: &ApiCallRecord) -> Result<(), AuditLogError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;
        let row = ApiLogRow::from_record(entry);

        diesel::insert_into(api_call_logs::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| Self::map_diesel_error(error, "append audit record"))
    }

    async fn recent(&self, limit: u32) -> Result<Vec<ApiCallRecord>, AuditLogError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let rows: Vec<ApiLogRow> = api_call_logs::table
            .order_by(api_call_logs::timestamp.desc())
            .limit(i64::from(limit))
            .select(ApiLogRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| Self::map_diesel_error(error, "recent audit records"))?;

        Ok(rows.into_iter().map(ApiLogRow::into_domain).collect())
    }

    async fn stats(&self) -> Result<AuditStats, AuditLogError> {
        let mut conn = self.pool.get().await.map_err(Self::map_pool_error)?;

        let rows: Vec<(String, bool, i64)> = api_call_logs::table
            .group_by((api_call_logs::api_name, api_call_logs::success))
            .select((
                api_call_logs::api_name,
                api_call_logs::success,
                diesel::dsl::count_star(),
            ))
            .load(&mut conn)
            .await
            .map_err(|error| Self::map_diesel_error(error, "audit stats"))?;

        Ok(fold_stats(rows))
    }
}
