//! Invoke id correlation
//!
//! Every request carries an invoke id chosen by the client; the device echoes
//! it in the response. The correlator hands out ids and remembers, per id,
//! which command was sent and who is waiting for the answer.

use ads_ams::{AmsFrame, CommandId};
use ads_core::{AdsError, AdsResult};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Continuation of a request: the waiting command receives its response here
pub type ResponseSender = oneshot::Sender<AmsFrame>;

#[derive(Debug)]
struct PendingRequest {
    command: CommandId,
    sender: ResponseSender,
}

/// Table of requests waiting for a response
///
/// Ids start at 1 and increase by one per request. After `u32::MAX` the
/// counter wraps to 1; 0 is never issued.
#[derive(Debug)]
pub struct InvokeCorrelator {
    next_invoke_id: u32,
    pending: HashMap<u32, PendingRequest>,
}

impl InvokeCorrelator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start issuing ids at `first` (0 is mapped to 1)
    pub fn starting_at(first: u32) -> Self {
        Self {
            next_invoke_id: first.max(1),
            pending: HashMap::new(),
        }
    }

    /// Reserve the next invoke id for `command`
    ///
    /// Must be called before the request frame is written.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::InvokeIdCollision` if the id that came up is still
    /// waiting for its response. The counter does not advance in that case.
    pub fn register(&mut self, command: CommandId, sender: ResponseSender) -> AdsResult<u32> {
        let invoke_id = self.next_invoke_id;
        if self.pending.contains_key(&invoke_id) {
            return Err(AdsError::InvokeIdCollision(invoke_id));
        }

        self.pending.insert(invoke_id, PendingRequest { command, sender });
        self.next_invoke_id = match invoke_id.checked_add(1) {
            Some(next) => next,
            None => 1,
        };
        Ok(invoke_id)
    }

    /// Remove and return the continuation waiting for `invoke_id`
    ///
    /// # Errors
    ///
    /// - `AdsError::UnmatchedResponse` if nothing waits for the id
    /// - `AdsError::MalformedFrame` if the response answers another command;
    ///   the pending entry is dropped
    pub fn complete(&mut self, invoke_id: u32, command: CommandId) -> AdsResult<ResponseSender> {
        let pending = self
            .pending
            .remove(&invoke_id)
            .ok_or(AdsError::UnmatchedResponse(invoke_id))?;

        if pending.command != command {
            return Err(AdsError::MalformedFrame(format!(
                "Response to invoke id {} is {}, request was {}",
                invoke_id, command, pending.command
            )));
        }
        Ok(pending.sender)
    }

    /// Forget a request whose frame never made it onto the wire
    pub fn withdraw(&mut self, invoke_id: u32) -> bool {
        self.pending.remove(&invoke_id).is_some()
    }

    /// Drop every pending request; waiters observe a closed channel
    pub fn clear(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, invoke_id: u32) -> bool {
        self.pending.contains_key(&invoke_id)
    }
}

impl Default for InvokeCorrelator {
    fn default() -> Self {
        Self::new()
    }
}
