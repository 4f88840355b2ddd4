use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::DiscoveryError;

/// Counting gate bounding how many operations run at once.
///
/// A permit is held for the lifetime of the returned guard, so it is given
/// back on every exit path, including errors and cancellation.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Creates a gate admitting `capacity` holders at a time. A capacity of
    /// zero is raised to one so the gate can never deadlock.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::GateClosed`] if the semaphore was closed.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, DiscoveryError> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| DiscoveryError::GateClosed)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
