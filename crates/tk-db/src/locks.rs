//! Lease locks stored in the `entity_locks` table.
//!
//! A lock is a row keyed by `(entity_id, entity_kind)` with a holder token and
//! an absolute expiry in epoch milliseconds. Acquisition first reaps an expired
//! row for the key, then tries to insert its own; the primary key makes the
//! insert the single point of contention. Every process sharing the database
//! file shares the locks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tk_config::LockConfig;
use tk_core::errors::LockError;
use tk_core::store::{LockKey, LockLease, LockService};
use uuid::Uuid;

use crate::TraceDb;

pub struct LeaseLockService {
    db: Arc<TraceDb>,
    lease: Duration,
    wait_timeout: Duration,
    retry_delay: Duration,
}

enum Attempt {
    Acquired(LockLease),
    Held,
}

fn backend(err: libsql::Error) -> LockError {
    LockError::Backend(err.to_string())
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

impl LeaseLockService {
    #[must_use]
    pub const fn new(
        db: Arc<TraceDb>,
        lease: Duration,
        wait_timeout: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self {
            db,
            lease,
            wait_timeout,
            retry_delay,
        }
    }

    #[must_use]
    pub const fn from_config(db: Arc<TraceDb>, config: &LockConfig) -> Self {
        Self::new(db, config.lease(), config.wait_timeout(), config.retry_delay())
    }

    async fn try_acquire(&self, key: &LockKey) -> Result<Attempt, LockError> {
        let entity_id = key.entity_id.to_string();
        let conn = self.db.conn();

        let acquired_at = Instant::now();
        let now_ms = Utc::now().timestamp_millis();
        conn.execute(
            "DELETE FROM entity_locks WHERE entity_id = ?1 AND entity_kind = ?2 AND expires_at <= ?3",
            libsql::params![entity_id.as_str(), key.entity_kind, now_ms],
        )
        .await
        .map_err(backend)?;

        let holder = Uuid::new_v4().to_string();
        let mut rows = conn
            .query(
                "INSERT INTO entity_locks (entity_id, entity_kind, holder, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(entity_id, entity_kind) DO NOTHING
                 RETURNING holder",
                libsql::params![
                    entity_id.as_str(),
                    key.entity_kind,
                    holder.as_str(),
                    now_ms.saturating_add(millis(self.lease))
                ],
            )
            .await
            .map_err(backend)?;

        if rows.next().await.map_err(backend)?.is_none() {
            return Ok(Attempt::Held);
        }
        Ok(Attempt::Acquired(LockLease {
            key: key.clone(),
            holder,
            lease: self.lease,
            acquired_at,
        }))
    }
}

#[async_trait]
impl LockService for LeaseLockService {
    async fn acquire(&self, key: &LockKey) -> Result<LockLease, LockError> {
        let started = Instant::now();
        loop {
            match self.try_acquire(key).await? {
                Attempt::Acquired(lease) => {
                    tracing::debug!(%key, waited_ms = started.elapsed().as_millis(), "lock acquired");
                    return Ok(lease);
                }
                Attempt::Held => {
                    let waited = started.elapsed();
                    if waited >= self.wait_timeout {
                        return Err(LockError::WaitTimeout {
                            key: key.to_string(),
                            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                        });
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn release(&self, lease: LockLease) -> Result<(), LockError> {
        let mut rows = self
            .db
            .conn()
            .query(
                "DELETE FROM entity_locks
                 WHERE entity_id = ?1 AND entity_kind = ?2 AND holder = ?3
                 RETURNING 1",
                libsql::params![
                    lease.key.entity_id.to_string(),
                    lease.key.entity_kind,
                    lease.holder.as_str()
                ],
            )
            .await
            .map_err(backend)?;
        if rows.next().await.map_err(backend)?.is_none() {
            return Err(LockError::LeaseLost {
                key: lease.key.to_string(),
            });
        }
        tracing::debug!(key = %lease.key, "lock released");
        Ok(())
    }
}
