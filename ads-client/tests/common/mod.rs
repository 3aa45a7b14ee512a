//! In-memory PLC for session tests

#![allow(dead_code)]

use ads_ams::{AmsFrame, AmsHeader, CommandId, FrameDecoder, StateFlags};
use ads_client::{AdsClient, ConnectionBuilder, SessionEvent};
use ads_transport::split_stream;
use bytes::{BufMut, Bytes};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;

pub const TARGET: &str = "10.0.0.2.1.1";
pub const SOURCE: &str = "10.0.0.9.1.1";

/// Device end of an in-memory connection
pub struct FakePlc {
    reader: ReadHalf<DuplexStream>,
    writer: WriteHalf<DuplexStream>,
    decoder: FrameDecoder,
}

/// A client wired to a fake PLC
pub fn connect() -> (AdsClient, mpsc::UnboundedReceiver<SessionEvent>, FakePlc) {
    connect_with_idle_timeout(None)
}

pub fn connect_with_idle_timeout(
    idle_timeout: Option<Duration>,
) -> (AdsClient, mpsc::UnboundedReceiver<SessionEvent>, FakePlc) {
    let (client_end, plc_end) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = split_stream(client_end, idle_timeout);
    let config = ConnectionBuilder::new()
        .host("127.0.0.1")
        .target(TARGET, 851)
        .source(SOURCE, 32905)
        .verbose(2)
        .build()
        .unwrap();
    let (client, events) = AdsClient::with_transport(config, reader, writer);

    let (reader, writer) = tokio::io::split(plc_end);
    (
        client,
        events,
        FakePlc {
            reader,
            writer,
            decoder: FrameDecoder::new(),
        },
    )
}

impl FakePlc {
    /// Next request frame; `None` once the client closed the stream
    pub async fn next_request(&mut self) -> Option<AmsFrame> {
        let mut buf = [0u8; 4096];
        loop {
            if let Some(frame) = self.decoder.next_frame().unwrap() {
                return Some(frame);
            }
            let n = self.reader.read(&mut buf).await.unwrap();
            if n == 0 {
                return None;
            }
            self.decoder.extend(&buf[..n]);
        }
    }

    /// Bytes received but not yet cut into a frame
    pub fn buffered(&self) -> usize {
        self.decoder.buffered_len()
    }

    pub async fn reply(&mut self, request: &AmsFrame, payload: Bytes) {
        let frame = response_to(request, payload);
        self.send_raw(&frame.encode()).await;
    }

    pub async fn send(&mut self, frame: &AmsFrame) {
        self.send_raw(&frame.encode()).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Answer requests with success until the client hangs up
    ///
    /// Returns the commands seen, in order.
    pub async fn serve_until_closed(&mut self) -> Vec<(CommandId, Bytes)> {
        let mut seen = Vec::new();
        while let Some(request) = self.next_request().await {
            assert_eq!(self.buffered(), 0, "client sent ahead of a response");
            seen.push((request.command(), request.payload().clone()));
            let payload = success_payload(request.command(), 0x1000 + seen.len() as u32);
            self.reply(&request, payload).await;
        }
        seen
    }
}

/// Response frame for `request`, addressed back to the client
pub fn response_to(request: &AmsFrame, payload: Bytes) -> AmsFrame {
    let mut header = AmsHeader::request(
        request.header().source,
        request.header().target,
        request.command(),
        0,
        request.invoke_id(),
    );
    header.state_flags = StateFlags::response();
    AmsFrame::new(header, payload)
}

/// A plausible successful response payload for `command`
pub fn success_payload(command: CommandId, handle: u32) -> Bytes {
    match command {
        CommandId::ReadWrite => data_payload(&handle.to_le_bytes()),
        CommandId::AddNotification => {
            let mut out = vec![0, 0, 0, 0];
            out.extend_from_slice(&handle.to_le_bytes());
            Bytes::from(out)
        }
        _ => result_payload(0),
    }
}

pub fn data_payload(data: &[u8]) -> Bytes {
    let mut out = vec![0, 0, 0, 0];
    out.put_u32_le(data.len() as u32);
    out.extend_from_slice(data);
    Bytes::from(out)
}

pub fn result_payload(code: u32) -> Bytes {
    Bytes::copy_from_slice(&code.to_le_bytes())
}

/// Notification frame with one stamp holding `samples`
pub fn notification_frame(samples: &[(u32, Vec<u8>)]) -> AmsFrame {
    let mut body = Vec::new();
    body.put_u32_le(1);
    body.put_u64_le(132_223_104_000_000_000);
    body.put_u32_le(samples.len() as u32);
    for (handle, data) in samples {
        body.put_u32_le(*handle);
        body.put_u32_le(data.len() as u32);
        body.put_slice(data);
    }
    let mut payload = Vec::new();
    payload.put_u32_le(body.len() as u32);
    payload.extend_from_slice(&body);

    let mut header = AmsHeader::request(
        ads_core::AmsAddress::new(SOURCE.parse().unwrap(), 32905),
        ads_core::AmsAddress::new(TARGET.parse().unwrap(), 851),
        CommandId::Notification,
        0,
        0,
    );
    header.state_flags = StateFlags::request();
    AmsFrame::new(header, Bytes::from(payload))
}
