//! Hand-written requester double for manager tests

use crate::requester::AdsRequester;
use ads_ams::{AmsFrame, AmsHeader, CommandId, StateFlags};
use ads_core::{AdsResult, AmsAddress, AmsNetId};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Responder = Box<dyn Fn(CommandId, &Bytes) -> Bytes + Send + Sync>;

/// Answers every request through a closure and records what was sent
pub(crate) struct MockRequester {
    responder: Responder,
    requests: Mutex<Vec<(CommandId, Bytes)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockRequester {
    pub(crate) fn new(responder: impl Fn(CommandId, &Bytes) -> Bytes + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn requests(&self) -> Vec<(CommandId, Bytes)> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, command: CommandId) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == command)
            .count()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdsRequester for MockRequester {
    async fn request(&self, command: CommandId, payload: Bytes) -> AdsResult<AmsFrame> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().unwrap().push((command, payload.clone()));
        tokio::task::yield_now().await;

        let body = (self.responder)(command, &payload);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(response(command, 1, body))
    }
}

/// Response frame as a device would send it
pub(crate) fn response(command: CommandId, invoke_id: u32, payload: Bytes) -> AmsFrame {
    let mut header = AmsHeader::request(
        AmsAddress::new(AmsNetId::new(10, 0, 0, 9, 1, 1), 32905),
        AmsAddress::new(AmsNetId::new(10, 0, 0, 2, 1, 1), 851),
        command,
        0,
        invoke_id,
    );
    header.state_flags = StateFlags::response();
    AmsFrame::new(header, payload)
}

/// Payload of a successful Read/ReadWrite response
pub(crate) fn data_response(data: &[u8]) -> Bytes {
    let mut out = vec![0, 0, 0, 0];
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    Bytes::from(out)
}

/// Payload holding only an ADS result
pub(crate) fn result_response(code: u32) -> Bytes {
    Bytes::copy_from_slice(&code.to_le_bytes())
}
