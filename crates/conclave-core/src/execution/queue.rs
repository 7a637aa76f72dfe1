use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Bounded queue of execution ids plus the concurrency gate for workers
pub struct ExecutionQueue {
    sender: mpsc::Sender<Uuid>,
    receiver: Mutex<Option<mpsc::Receiver<Uuid>>>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ExecutionQueue {
    /// Create a queue holding `capacity` ids, running `max_concurrent` at once
    pub fn new(capacity: usize, max_concurrent: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Claim a queue slot without waiting; fails with `InvalidState` when full
    pub fn try_reserve(&self) -> Result<QueueSlot<'_>> {
        match self.sender.try_reserve() {
            Ok(permit) => Ok(QueueSlot { permit }),
            Err(TrySendError::Full(())) => {
                Err(Error::InvalidState("execution queue is full".to_string()))
            }
            Err(TrySendError::Closed(())) => Err(closed()),
        }
    }

    /// Claim a queue slot, waiting for the dispatcher to make room
    pub async fn reserve(&self) -> Result<QueueSlot<'_>> {
        let permit = self.sender.reserve().await.map_err(|_| closed())?;
        Ok(QueueSlot { permit })
    }

    /// Whether the dispatcher has taken the receiving end
    pub fn is_dispatching(&self) -> bool {
        self.receiver.lock().map(|slot| slot.is_none()).unwrap_or(false)
    }

    /// Hand the receiving end to the dispatcher; `None` once taken
    pub(crate) fn take_receiver(&self) -> Option<mpsc::Receiver<Uuid>> {
        self.receiver.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Wait for a free worker slot
    pub async fn acquire(&self) -> Result<QueuePermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Internal("execution semaphore closed".to_string()))?;
        Ok(QueuePermit { _permit: permit })
    }

    /// Ids waiting in the channel
    pub fn depth(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Free worker slots
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Configured worker count
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

/// Releases the worker slot when dropped
pub struct QueuePermit {
    _permit: OwnedSemaphorePermit,
}

/// A claimed place in the queue; dropping it unused gives the place back
pub struct QueueSlot<'a> {
    permit: mpsc::Permit<'a, Uuid>,
}

impl QueueSlot<'_> {
    /// Put the id in the claimed place
    pub fn send(self, id: Uuid) {
        self.permit.send(id);
        debug!(execution_id = %id, "Execution queued");
    }
}

fn closed() -> Error {
    Error::Internal("execution queue is closed".to_string())
}
