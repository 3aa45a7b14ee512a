//! Device notification subscriptions
//!
//! A subscription ties a device notification handle to a copy of the
//! subscribed [`Handle`]. Pushed samples are decoded into that copy and
//! raised as [`SessionEvent::Notification`].

use crate::drain::{DrainState, ReleaseQueue};
use crate::event::{Notification, SessionEvent};
use crate::requester::{check_result, AdsRequester};
use crate::symbols::SymbolHandleManager;
use ads_ams::CommandId;
use ads_application::index_group::RW_SYMVAL_BYHANDLE;
use ads_application::marshal;
use ads_application::pdu::{AddNotificationRequest, AddNotificationResponse, DeleteNotificationRequest};
use ads_application::{Handle, NotificationStream};
use ads_core::AdsResult;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Outcome of dispatching one Notification frame
#[derive(Debug, Default)]
pub struct Dispatched {
    /// Events to raise, in sample order
    pub events: Vec<SessionEvent>,
    /// Samples delivered to a subscription
    pub delivered: usize,
    /// Samples for notification handles with no subscription
    pub dropped: usize,
}

/// Subscribes, demultiplexes and unsubscribes device notifications
#[derive(Debug, Default)]
pub struct NotificationManager {
    subscriptions: Mutex<HashMap<u32, Handle>>,
    releases: ReleaseQueue,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to changes of the handle's symbol
    ///
    /// Resolves the handle first if needed, then registers a notification
    /// with the handle's [`NotificationParams`](ads_application::NotificationParams).
    /// Returns the device notification handle.
    ///
    /// # Errors
    ///
    /// - `AdsError::InvalidData` if the length or timing does not fit the
    ///   request, before anything is sent
    /// - errors of [`SymbolHandleManager::resolve`]
    /// - `AdsError::Device` if the device refuses the subscription
    /// - `AdsError::MalformedFrame` if a success response carries no handle
    pub async fn subscribe<R>(
        &self,
        requester: &R,
        symbols: &SymbolHandleManager,
        handle: &mut Handle,
    ) -> AdsResult<u32>
    where
        R: AdsRequester + ?Sized,
    {
        let params = *handle.notification();
        let length = handle.request_length()?;
        let max_delay_ticks = params.max_delay_ticks()?;
        let cycle_time_ticks = params.cycle_time_ticks()?;

        let device_handle = symbols.resolve(requester, handle).await?;
        let request = AddNotificationRequest {
            index_group: RW_SYMVAL_BYHANDLE,
            index_offset: device_handle,
            length,
            mode: params.mode,
            max_delay_ticks,
            cycle_time_ticks,
        };

        let frame = requester
            .request(CommandId::AddNotification, request.encode())
            .await?;
        check_result(frame.result_code())?;
        let response = AddNotificationResponse::decode(frame.payload())?;
        let notification_handle = response.notification_handle;

        self.subscriptions
            .lock()
            .await
            .insert(notification_handle, handle.clone());
        self.releases.push(notification_handle).await;
        log::debug!(
            "Subscribed to {} as notification {}",
            handle.symbol(),
            notification_handle
        );
        Ok(notification_handle)
    }

    /// Demultiplex a Notification payload into events
    ///
    /// Samples for unknown notification handles are counted and dropped; a
    /// push may legitimately overtake the acknowledgement of its subscribe.
    /// A sample that does not decode into its handle becomes an error event.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::MalformedFrame` if the payload is truncated.
    pub async fn dispatch(&self, payload: &Bytes) -> AdsResult<Dispatched> {
        let stream = NotificationStream::decode(payload)?;
        let mut dispatched = Dispatched::default();
        let mut subscriptions = self.subscriptions.lock().await;

        for stamp in &stream.stamps {
            let timestamp = stamp.timestamp();
            for sample in &stamp.samples {
                let Some(handle) = subscriptions.get_mut(&sample.notification_handle) else {
                    log::debug!(
                        "Dropping sample for unknown notification {}",
                        sample.notification_handle
                    );
                    dispatched.dropped += 1;
                    continue;
                };

                match marshal::decode(handle, &sample.data) {
                    Ok(()) => {
                        dispatched.delivered += 1;
                        dispatched.events.push(SessionEvent::Notification(Notification {
                            notification_handle: sample.notification_handle,
                            timestamp,
                            handle: handle.clone(),
                        }));
                    }
                    Err(e) => {
                        log::warn!(
                            "Sample for notification {} does not fit {}: {}",
                            sample.notification_handle,
                            handle.symbol(),
                            e
                        );
                        dispatched.events.push(SessionEvent::Error(e));
                    }
                }
            }
        }

        Ok(dispatched)
    }

    /// Delete a single subscription
    ///
    /// # Errors
    ///
    /// Returns `AdsError::Device` if the device refuses the delete.
    pub async fn unsubscribe<R>(&self, requester: &R, notification_handle: u32) -> AdsResult<()>
    where
        R: AdsRequester + ?Sized,
    {
        if self
            .subscriptions
            .lock()
            .await
            .remove(&notification_handle)
            .is_none()
        {
            log::debug!("Notification {} is not subscribed here", notification_handle);
        }
        self.releases.remove(notification_handle).await;
        self.delete(requester, notification_handle).await
    }

    /// Delete every queued subscription, one request at a time
    ///
    /// Returns the number of subscriptions the device deleted.
    ///
    /// # Errors
    ///
    /// A transport error stops the drain.
    pub async fn unsubscribe_all<R>(&self, requester: &R) -> AdsResult<usize>
    where
        R: AdsRequester + ?Sized,
    {
        let mut deleted = 0;
        while let Some(notification_handle) = self.releases.next().await {
            self.subscriptions.lock().await.remove(&notification_handle);
            match self.delete(requester, notification_handle).await {
                Ok(()) => deleted += 1,
                Err(e) if !e.is_fatal() => {
                    log::warn!("Deleting notification {} failed: {}", notification_handle, e)
                }
                Err(e) => return Err(e),
            }
        }
        log::debug!("Deleted {} notifications", deleted);
        Ok(deleted)
    }

    async fn delete<R>(&self, requester: &R, notification_handle: u32) -> AdsResult<()>
    where
        R: AdsRequester + ?Sized,
    {
        let request = DeleteNotificationRequest::new(notification_handle);
        let frame = requester
            .request(CommandId::DeleteNotification, request.encode())
            .await?;
        check_result(frame.result_code())
    }

    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    pub async fn is_subscribed(&self, notification_handle: u32) -> bool {
        self.subscriptions
            .lock()
            .await
            .contains_key(&notification_handle)
    }

    pub async fn drain_state(&self) -> DrainState {
        self.releases.state().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{data_response, result_response, MockRequester};
    use ads_application::{FieldSpec, NotificationParams, TransmissionMode};
    use ads_core::{AdsError, PlcType, PlcValue};
    use bytes::{Buf, BufMut};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn device() -> MockRequester {
        let next = Arc::new(AtomicU32::new(1));
        MockRequester::new(move |command, _| match command {
            CommandId::ReadWrite => data_response(&0x200u32.to_le_bytes()),
            CommandId::AddNotification => {
                let mut out = vec![0, 0, 0, 0];
                out.extend_from_slice(&next.fetch_add(1, Ordering::SeqCst).to_le_bytes());
                Bytes::from(out)
            }
            _ => result_response(0),
        })
    }

    fn push(samples: &[(u32, Vec<u8>)]) -> Bytes {
        let mut body = Vec::new();
        body.put_u32_le(1);
        body.put_u64_le(132_223_104_000_000_000);
        body.put_u32_le(samples.len() as u32);
        for (handle, data) in samples {
            body.put_u32_le(*handle);
            body.put_u32_le(data.len() as u32);
            body.put_slice(data);
        }
        let mut out = Vec::new();
        out.put_u32_le(body.len() as u32);
        out.extend_from_slice(&body);
        Bytes::from(out)
    }

    #[tokio::test]
    async fn test_subscribe_request() {
        let requester = device();
        let symbols = SymbolHandleManager::new();
        let manager = NotificationManager::new();
        let mut handle = Handle::scalar("MAIN.speed", PlcType::Uint)
            .with_notification(NotificationParams::new(TransmissionMode::Cyclic, 20, 100));

        let notification = manager.subscribe(&requester, &symbols, &mut handle).await.unwrap();
        assert_eq!(notification, 1);
        assert!(manager.is_subscribed(1).await);

        let requests = requester.requests();
        assert_eq!(requests[0].0, CommandId::ReadWrite);
        let (command, payload) = &requests[1];
        assert_eq!(*command, CommandId::AddNotification);
        let mut payload = payload.clone();
        assert_eq!(payload.get_u32_le(), RW_SYMVAL_BYHANDLE);
        assert_eq!(payload.get_u32_le(), 0x200);
        assert_eq!(payload.get_u32_le(), 2);
        assert_eq!(payload.get_u32_le(), 3);
        assert_eq!(payload.get_u32_le(), 200_000);
        assert_eq!(payload.get_u32_le(), 1_000_000);
        assert_eq!(payload.remaining(), 16);
    }

    #[tokio::test]
    async fn test_subscribe_without_handle_in_response() {
        let requester = MockRequester::new(|command, _| match command {
            CommandId::ReadWrite => data_response(&0x200u32.to_le_bytes()),
            _ => result_response(0),
        });
        let symbols = SymbolHandleManager::new();
        let manager = NotificationManager::new();
        let mut handle = Handle::scalar("MAIN.speed", PlcType::Uint);

        assert!(matches!(
            manager.subscribe(&requester, &symbols, &mut handle).await,
            Err(AdsError::MalformedFrame(_))
        ));
        assert_eq!(manager.subscription_count().await, 0);
        assert_eq!(manager.unsubscribe_all(&requester).await.unwrap(), 0);
        assert_eq!(requester.count(CommandId::DeleteNotification), 0);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_oversized_timing() {
        let requester = device();
        let symbols = SymbolHandleManager::new();
        let manager = NotificationManager::new();
        let mut handle = Handle::scalar("MAIN.speed", PlcType::Uint)
            .with_notification(NotificationParams::new(TransmissionMode::Cyclic, 0, u32::MAX));

        assert!(matches!(
            manager.subscribe(&requester, &symbols, &mut handle).await,
            Err(AdsError::InvalidData(_))
        ));
        assert!(requester.requests().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_to_subscription() {
        let requester = device();
        let symbols = SymbolHandleManager::new();
        let manager = NotificationManager::new();
        let mut handle = Handle::new(
            "MAIN.pair",
            vec![
                FieldSpec::typed(PlcType::Uint, "a"),
                FieldSpec::typed(PlcType::Int, "b"),
            ],
        );
        let id = manager.subscribe(&requester, &symbols, &mut handle).await.unwrap();

        let dispatched = manager
            .dispatch(&push(&[(id, vec![0x01, 0x00, 0xFE, 0xFF])]))
            .await
            .unwrap();
        assert_eq!(dispatched.delivered, 1);
        match &dispatched.events[0] {
            SessionEvent::Notification(n) => {
                assert_eq!(n.notification_handle, id);
                assert_eq!(n.handle.get("a"), Some(&PlcValue::UInt16(1)));
                assert_eq!(n.handle.get("b"), Some(&PlcValue::Int16(-2)));
                assert_eq!(n.timestamp.timestamp(), 1_577_836_800);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(handle.get("a").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_unknown_handles_dropped() {
        let manager = NotificationManager::new();
        let dispatched = manager
            .dispatch(&push(&[(41, vec![1, 0]), (42, vec![2, 0])]))
            .await
            .unwrap();
        assert!(dispatched.events.is_empty());
        assert_eq!(dispatched.dropped, 2);
    }

    #[tokio::test]
    async fn test_dispatch_undecodable_sample() {
        let requester = device();
        let symbols = SymbolHandleManager::new();
        let manager = NotificationManager::new();
        let mut handle = Handle::scalar("MAIN.big", PlcType::Lreal);
        let id = manager.subscribe(&requester, &symbols, &mut handle).await.unwrap();

        let dispatched = manager.dispatch(&push(&[(id, vec![1, 2])])).await.unwrap();
        assert!(matches!(
            dispatched.events[0],
            SessionEvent::Error(AdsError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_truncated() {
        let manager = NotificationManager::new();
        let payload = push(&[(1, vec![1, 2, 3, 4])]);
        let truncated = payload.slice(..payload.len() - 1);
        assert!(matches!(
            manager.dispatch(&truncated).await,
            Err(AdsError::MalformedFrame(_))
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_all_sequential() {
        let requester = device();
        let symbols = SymbolHandleManager::new();
        let manager = NotificationManager::new();
        for name in ["MAIN.a", "MAIN.b", "MAIN.c"] {
            let mut handle = Handle::scalar(name, PlcType::Int);
            manager.subscribe(&requester, &symbols, &mut handle).await.unwrap();
        }

        assert_eq!(manager.unsubscribe_all(&requester).await.unwrap(), 3);
        assert_eq!(requester.count(CommandId::DeleteNotification), 3);
        assert_eq!(requester.max_in_flight(), 1);
        assert_eq!(manager.subscription_count().await, 0);
        assert_eq!(manager.drain_state().await, DrainState::Done);
    }

    #[tokio::test]
    async fn test_unsubscribe_single() {
        let requester = device();
        let symbols = SymbolHandleManager::new();
        let manager = NotificationManager::new();
        let mut a = Handle::scalar("MAIN.a", PlcType::Int);
        let mut b = Handle::scalar("MAIN.b", PlcType::Int);
        let first = manager.subscribe(&requester, &symbols, &mut a).await.unwrap();
        manager.subscribe(&requester, &symbols, &mut b).await.unwrap();

        manager.unsubscribe(&requester, first).await.unwrap();
        assert!(!manager.is_subscribed(first).await);
        assert_eq!(manager.unsubscribe_all(&requester).await.unwrap(), 1);
        assert_eq!(requester.count(CommandId::DeleteNotification), 2);
    }
}
