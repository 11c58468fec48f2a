//! Per-container serialization
//!
//! Only one reorder may touch a container at a time. A cross-container move needs both of
//! its containers, so locks are always taken in sorted id order to rule out two moves in
//! opposite directions deadlocking on each other.

use crate::error::{OrderingError, Result};
use crate::types::ContainerId;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Default time to wait for a container lock before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry of one async mutex per container
#[derive(Debug, Default)]
pub struct ContainerLocks {
    locks: DashMap<ContainerId, Arc<Mutex<()>>>,
}

impl ContainerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutex_for(&self, id: &ContainerId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock every container in `ids`, waiting at most `timeout` in total
    ///
    /// Duplicate ids are locked once. The returned guard releases all locks on drop.
    pub async fn acquire(&self, ids: &[ContainerId], timeout: Duration) -> Result<ContainerGuard> {
        let mut ordered: Vec<ContainerId> = ids.to_vec();
        ordered.sort();
        ordered.dedup();

        let start = Instant::now();
        let mut guards = Vec::with_capacity(ordered.len());

        for id in &ordered {
            let remaining = timeout.saturating_sub(start.elapsed());
            let mutex = self.mutex_for(id);

            match tokio::time::timeout(remaining, mutex.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    tracing::warn!(container = %id, elapsed_ms, "container lock timed out");
                    return Err(OrderingError::LockTimeout { elapsed_ms });
                }
            }
        }

        tracing::debug!(containers = ?ordered, "container locks acquired");
        Ok(ContainerGuard {
            containers: ordered,
            _guards: guards,
        })
    }

    /// Number of containers that have ever been locked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// RAII guard over one or more container locks - releases on drop
#[derive(Debug)]
pub struct ContainerGuard {
    containers: Vec<ContainerId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ContainerGuard {
    /// The containers held, in lock order
    pub fn containers(&self) -> &[ContainerId] {
        &self.containers
    }
}
