//! Sequential release queue
//!
//! Device handles and notification handles are given back to the PLC one
//! request at a time. The queue hands out the next handle only after the
//! caller finished with the previous one, so at most one release is ever
//! outstanding.

use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Progress of a release drain
///
/// # State Transitions
/// ```text
/// Idle -> Draining (first handle taken)
/// Draining -> Done (queue found empty)
/// Done -> Idle (new handle queued)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Idle,
    Draining,
    Done,
}

#[derive(Debug)]
struct Inner {
    queue: VecDeque<u32>,
    state: DrainState,
}

/// FIFO of handles awaiting release
#[derive(Debug)]
pub struct ReleaseQueue {
    inner: Mutex<Inner>,
}

impl ReleaseQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                state: DrainState::Idle,
            }),
        }
    }

    /// Queue a handle, re-arming a finished drain
    pub async fn push(&self, handle: u32) {
        let mut inner = self.inner.lock().await;
        inner.queue.push_back(handle);
        if inner.state == DrainState::Done {
            inner.state = DrainState::Idle;
        }
    }

    /// Drop a handle that was released out of band
    pub async fn remove(&self, handle: u32) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.queue.iter().position(|&h| h == handle) {
            Some(index) => {
                inner.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Take the next handle to release
    ///
    /// Returns `None` and moves to `Done` once the queue is empty.
    pub async fn next(&self) -> Option<u32> {
        let mut inner = self.inner.lock().await;
        match inner.queue.pop_front() {
            Some(handle) => {
                inner.state = DrainState::Draining;
                Some(handle)
            }
            None => {
                inner.state = DrainState::Done;
                None
            }
        }
    }

    pub async fn state(&self) -> DrainState {
        self.inner.lock().await.state
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ReleaseQueue {
    fn default() -> Self {
        Self::new()
    }
}
