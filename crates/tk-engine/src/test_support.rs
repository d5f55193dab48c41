//! Shared test utilities for tk-engine unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use tk_core::errors::LockError;
    use tk_core::identity::RequestContext;
    use tk_core::store::{LockKey, LockLease, LockService};
    use tk_db::TraceDb;

    pub async fn test_db() -> Arc<TraceDb> {
        Arc::new(TraceDb::open_local(":memory:").await.unwrap())
    }

    pub fn ctx(workspace_id: &str) -> RequestContext {
        RequestContext::new(workspace_id, workspace_id, "tester")
    }

    /// Lock double that grants every request and counts calls.
    ///
    /// Provides no exclusion; use `LeaseLockService` where that matters.
    pub struct RecordingLocks {
        lease: Duration,
        refuse: bool,
        lose: bool,
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    impl RecordingLocks {
        pub fn new(lease: Duration) -> Self {
            Self {
                lease,
                refuse: false,
                lose: false,
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }
        }

        /// Every acquire times out.
        pub fn refusing(mut self) -> Self {
            self.refuse = true;
            self
        }

        /// Every release reports the lease as lost.
        pub fn losing_leases(mut self) -> Self {
            self.lose = true;
            self
        }

        pub fn acquired(&self) -> usize {
            self.acquired.load(Ordering::SeqCst)
        }

        pub fn released(&self) -> usize {
            self.released.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LockService for RecordingLocks {
        async fn acquire(&self, key: &LockKey) -> Result<LockLease, LockError> {
            if self.refuse {
                return Err(LockError::WaitTimeout {
                    key: key.to_string(),
                    waited_ms: 0,
                });
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(LockLease {
                key: key.clone(),
                holder: "recording".to_string(),
                lease: self.lease,
                acquired_at: Instant::now(),
            })
        }

        async fn release(&self, lease: LockLease) -> Result<(), LockError> {
            self.released.fetch_add(1, Ordering::SeqCst);
            if self.lose {
                return Err(LockError::LeaseLost {
                    key: lease.key.to_string(),
                });
            }
            Ok(())
        }
    }
}
