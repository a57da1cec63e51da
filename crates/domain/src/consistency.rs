use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::BoxFuture;
use crate::ports::interactions::{InteractionStore, TargetTransaction};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry of per-wish exclusive locks.
///
/// Waiters queue in arrival order. Entries are dropped once nobody holds or
/// waits on them, so the map only tracks wishes with in-flight work.
#[derive(Clone, Default)]
pub struct TargetLocks {
    slots: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl TargetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, target_id: &str, wait: Duration) -> DomainResult<TargetLockGuard> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(target_id.to_string()).or_default().clone()
        };

        match tokio::time::timeout(wait, slot.lock_owned()).await {
            Ok(guard) => Ok(TargetLockGuard {
                target_id: target_id.to_string(),
                guard: Some(guard),
                locks: self.clone(),
            }),
            Err(_) => {
                self.prune(target_id);
                tracing::warn!(
                    wish_id = %target_id,
                    wait_ms = wait.as_millis() as u64,
                    "timed out waiting for wish lock"
                );
                Err(DomainError::Conflict)
            }
        }
    }

    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn prune(&self, target_id: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(target_id)
            && Arc::strong_count(slot) == 1
        {
            slots.remove(target_id);
        }
    }
}

/// Held for the whole lifetime of a [`TargetTransaction`].
pub struct TargetLockGuard {
    target_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: TargetLocks,
}

impl TargetLockGuard {
    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

impl Drop for TargetLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.prune(&self.target_id);
    }
}

/// Unit-of-work boundary for every write on a wish.
///
/// The work closure runs on its own task: once started it reaches commit or
/// rollback even if the caller goes away.
#[derive(Clone)]
pub struct ConsistencyCoordinator {
    store: Arc<dyn InteractionStore>,
}

impl ConsistencyCoordinator {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn InteractionStore> {
        &self.store
    }

    pub async fn run<T, F>(&self, wish_id: &str, work: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut dyn TargetTransaction) -> BoxFuture<'t, DomainResult<T>>
            + Send
            + 'static,
    {
        let store = self.store.clone();
        let wish_id = wish_id.to_string();
        let task = tokio::spawn(async move {
            let Some(mut tx) = store.begin(&wish_id).await? else {
                return Err(DomainError::WishNotFound);
            };
            match work(tx.as_mut()).await {
                Ok(value) => {
                    tx.commit().await.inspect_err(|err| {
                        tracing::warn!(wish_id = %wish_id, error = %err, "commit failed");
                    })?;
                    Ok(value)
                }
                Err(err) => {
                    drop(tx);
                    tracing::debug!(wish_id = %wish_id, error = %err, "unit of work rolled back");
                    Err(err)
                }
            }
        });

        task.await
            .map_err(|err| DomainError::Transient(format!("unit of work aborted: {err}")))?
    }
}
