//! ADS session
//!
//! A session owns one transport connection. Commands are written by the
//! callers through [`AdsRequester::request`]; a single reader task cuts the
//! inbound stream into frames and processes them one at a time:
//!
//! - Notification frames go to the [`NotificationManager`]
//! - every other frame completes the request registered under its invoke id
//!
//! A frame nobody waits for, or a frame that does not parse, is fatal: the
//! session reports the error and closes the transport. Pending commands then
//! fail with `AdsError::SessionClosed`.

use crate::config::SessionConfig;
use crate::correlator::InvokeCorrelator;
use crate::event::SessionEvent;
use crate::notifications::NotificationManager;
use crate::requester::AdsRequester;
use crate::symbols::SymbolHandleManager;
use ads_ams::{AmsFrame, CommandId, FrameDecoder, FrameStatistics};
use ads_core::{AdsError, AdsErrorCode, AdsResult};
use ads_transport::{TransportReader, TransportWriter};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

const READ_BUFFER_SIZE: usize = 8192;

/// Per-connection protocol state
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    writer: Mutex<TransportWriter>,
    correlator: Mutex<InvokeCorrelator>,
    statistics: Mutex<FrameStatistics>,
    symbols: SymbolHandleManager,
    notifications: NotificationManager,
    events: mpsc::UnboundedSender<SessionEvent>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
}

impl Session {
    /// Start a session over an open transport
    ///
    /// Spawns the inbound reader task, so this must run inside a tokio
    /// runtime. Returns the session, the receiving end of its event channel
    /// and the reader task.
    pub fn start(
        config: SessionConfig,
        reader: TransportReader,
        writer: TransportWriter,
    ) -> (
        Arc<Self>,
        mpsc::UnboundedReceiver<SessionEvent>,
        JoinHandle<()>,
    ) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let session = Arc::new(Self {
            config,
            writer: Mutex::new(writer),
            correlator: Mutex::new(InvokeCorrelator::new()),
            statistics: Mutex::new(FrameStatistics::new()),
            symbols: SymbolHandleManager::new(),
            notifications: NotificationManager::new(),
            events,
            shutdown,
            closed: AtomicBool::new(false),
        });

        log::info!(
            "ADS session {} -> {} started",
            session.config.source,
            session.config.target
        );
        let task = tokio::spawn(read_loop(session.clone(), reader, shutdown_rx));
        (session, receiver, task)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolHandleManager {
        &self.symbols
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    /// Snapshot of the frame counters
    pub async fn statistics(&self) -> FrameStatistics {
        self.statistics.lock().await.clone()
    }

    /// Number of requests waiting for a response
    pub async fn pending_requests(&self) -> usize {
        self.correlator.lock().await.pending_count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the transport
    ///
    /// Pending requests fail with `AdsError::SessionClosed` and a
    /// [`SessionEvent::Closed`] is raised. Closing twice is a no-op.
    pub async fn close(&self) -> AdsResult<()> {
        self.shutdown(None).await
    }

    async fn shutdown(&self, error: Option<AdsError>) -> AdsResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(error) = error {
            log::error!("ADS session {} failed: {}", self.config.target, error);
            if matches!(error, AdsError::MalformedFrame(_)) {
                self.statistics.lock().await.increment_malformed_frames();
            }
            self.emit(SessionEvent::Error(error));
        }

        let abandoned = self.correlator.lock().await.clear();
        if abandoned > 0 {
            log::warn!("Abandoning {} pending requests", abandoned);
        }
        let _ = self.shutdown.send(true);
        let result = self.writer.lock().await.close().await;

        log::info!("ADS session {} closed", self.config.target);
        self.emit(SessionEvent::Closed);
        result
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            log::trace!("Event receiver dropped");
        }
    }

    fn log_frame(&self, direction: &str, frame: &AmsFrame) {
        if self.config.verbose >= 1 {
            log::info!(
                "{} {} invoke_id={} length={} error={}",
                direction,
                frame.command(),
                frame.invoke_id(),
                frame.payload().len(),
                frame.header().error_code
            );
        }
        if self.config.verbose >= 2 {
            log::info!("{} {:02x?}", direction, &frame.encode()[..]);
        }
    }

    /// Process every complete frame in the decoder
    async fn drain_frames(&self, decoder: &mut FrameDecoder) -> AdsResult<()> {
        while let Some(frame) = decoder.next_frame()? {
            self.handle_frame(frame).await?;
        }
        Ok(())
    }

    async fn handle_frame(&self, frame: AmsFrame) -> AdsResult<()> {
        self.statistics.lock().await.increment_frames_received();
        self.log_frame("<-", &frame);

        let code = frame.result_code();
        if code != 0 {
            self.statistics.lock().await.increment_device_errors();
            let error = AdsError::Device(AdsErrorCode::new(code));
            log::warn!(
                "{} (invoke id {}) returned {}",
                frame.command(),
                frame.invoke_id(),
                error
            );
            self.emit(SessionEvent::Error(error));
        }

        if frame.command().is_notification() {
            let dispatched = self.notifications.dispatch(frame.payload()).await?;
            {
                let mut statistics = self.statistics.lock().await;
                statistics.notifications_dispatched += dispatched.delivered as u64;
                statistics.notifications_dropped += dispatched.dropped as u64;
            }
            for event in dispatched.events {
                self.emit(event);
            }
            return Ok(());
        }

        let invoke_id = frame.invoke_id();
        let sender = self
            .correlator
            .lock()
            .await
            .complete(invoke_id, frame.command())?;
        if sender.send(frame).is_err() {
            log::debug!("Caller of invoke id {} is gone", invoke_id);
        }
        Ok(())
    }
}

#[async_trait]
impl AdsRequester for Session {
    async fn request(&self, command: CommandId, payload: Bytes) -> AdsResult<AmsFrame> {
        if self.is_closed() {
            return Err(AdsError::SessionClosed);
        }

        let (sender, receiver) = oneshot::channel();
        let registered = self.correlator.lock().await.register(command, sender);
        let invoke_id = match registered {
            Ok(invoke_id) => invoke_id,
            Err(AdsError::InvokeIdCollision(invoke_id)) => {
                self.shutdown(Some(AdsError::InvokeIdCollision(invoke_id)))
                    .await
                    .ok();
                return Err(AdsError::InvokeIdCollision(invoke_id));
            }
            Err(e) => return Err(e),
        };
        if self.is_closed() {
            self.correlator.lock().await.withdraw(invoke_id);
            return Err(AdsError::SessionClosed);
        }

        let frame = AmsFrame::request(
            self.config.target,
            self.config.source,
            command,
            invoke_id,
            payload,
        );
        self.log_frame("->", &frame);

        let written = self.writer.lock().await.write_all(&frame.encode()).await;
        if let Err(e) = written {
            self.correlator.lock().await.withdraw(invoke_id);
            log::error!("Writing {} (invoke id {}) failed: {}", command, invoke_id, e);
            self.shutdown(None).await.ok();
            return Err(e);
        }
        self.statistics.lock().await.increment_frames_sent();

        receiver.await.map_err(|_| AdsError::SessionClosed)
    }
}

async fn read_loop(
    session: Arc<Session>,
    mut reader: TransportReader,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut decoder = FrameDecoder::with_max_frame_size(session.config.max_frame_size);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = tokio::select! {
            read = reader.read(&mut buf) => read,
            _ = shutdown.changed() => break,
        };

        let failure = match read {
            Ok(0) => {
                log::info!("ADS peer {} closed the connection", session.config.target);
                None
            }
            Ok(n) => {
                decoder.extend(&buf[..n]);
                match session.drain_frames(&mut decoder).await {
                    Ok(()) => continue,
                    Err(e) => Some(e),
                }
            }
            Err(AdsError::Timeout) => {
                log::warn!("ADS session {} timed out", session.config.target);
                session.emit(SessionEvent::Timeout);
                None
            }
            Err(e) => Some(e),
        };

        if let Err(e) = session.shutdown(failure).await {
            log::debug!("Closing transport failed: {}", e);
        }
        break;
    }
    log::debug!("ADS reader task for {} finished", session.config.target);
}
