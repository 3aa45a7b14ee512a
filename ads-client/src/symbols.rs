//! Symbol handle management
//!
//! A symbolic name such as `MAIN.counter` is turned into a device handle once
//! per session through the GET_SYMHANDLE_BYNAME index group. The resolution
//! is cached here, keyed by symbol name, so a [`Handle`] carried over from an
//! earlier session is looked up again. Every handle obtained that way is
//! queued and handed back through RELEASE_SYMHANDLE when the session ends.

use crate::drain::{DrainState, ReleaseQueue};
use crate::requester::{check_result, AdsRequester};
use ads_ams::CommandId;
use ads_application::index_group::{GET_SYMHANDLE_BYNAME, RELEASE_SYMHANDLE};
use ads_application::pdu::{DataResponse, ReadWriteRequest, WriteRequest};
use ads_application::Handle;
use ads_core::{AdsError, AdsErrorCode, AdsResult};
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Resolves symbol names and tracks the device handles to release
#[derive(Debug, Default)]
pub struct SymbolHandleManager {
    resolved: Mutex<HashMap<String, u32>>,
    releases: ReleaseQueue,
}

impl SymbolHandleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the handle's symbol to a device handle
    ///
    /// A symbol already resolved by this manager is answered from the cache
    /// without touching the wire.
    ///
    /// # Errors
    ///
    /// Returns `AdsError::HandleResolution` if the device rejects the name or
    /// answers without a handle. Transport errors are passed through.
    pub async fn resolve<R>(&self, requester: &R, handle: &mut Handle) -> AdsResult<u32>
    where
        R: AdsRequester + ?Sized,
    {
        if let Some(&device_handle) = self.resolved.lock().await.get(handle.symbol()) {
            handle.set_device_handle(device_handle);
            return Ok(device_handle);
        }

        let mut name = handle.symbol().as_bytes().to_vec();
        name.push(0);
        let request = ReadWriteRequest::new(GET_SYMHANDLE_BYNAME, 0, 4, Bytes::from(name));
        let frame = requester.request(CommandId::ReadWrite, request.encode()).await?;

        let code = frame.result_code();
        if code != 0 {
            return Err(AdsError::HandleResolution {
                symbol: handle.symbol().to_string(),
                reason: AdsErrorCode::new(code).to_string(),
            });
        }

        let data = match DataResponse::decode(frame.payload()) {
            Ok(response) if response.data.len() >= 4 => response.data,
            _ => {
                return Err(AdsError::HandleResolution {
                    symbol: handle.symbol().to_string(),
                    reason: "device returned no handle".to_string(),
                })
            }
        };

        let device_handle = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        self.resolved
            .lock()
            .await
            .insert(handle.symbol().to_string(), device_handle);
        handle.set_device_handle(device_handle);
        self.releases.push(device_handle).await;
        log::debug!(
            "Resolved symbol {} to handle {:#010x}",
            handle.symbol(),
            device_handle
        );
        Ok(device_handle)
    }

    /// Release every queued device handle, one request at a time
    ///
    /// Returns the number of handles the device accepted. A handle the device
    /// refuses is logged and skipped. Released symbols leave the cache and
    /// resolve again on next use.
    ///
    /// # Errors
    ///
    /// A transport error stops the drain; handles not yet sent stay queued.
    pub async fn release_all<R>(&self, requester: &R) -> AdsResult<usize>
    where
        R: AdsRequester + ?Sized,
    {
        let mut released = 0;
        while let Some(device_handle) = self.releases.next().await {
            self.resolved
                .lock()
                .await
                .retain(|_, cached| *cached != device_handle);
            let request = WriteRequest::new(
                RELEASE_SYMHANDLE,
                0,
                Bytes::copy_from_slice(&device_handle.to_le_bytes()),
            );
            let frame = requester.request(CommandId::Write, request.encode()).await?;
            match check_result(frame.result_code()) {
                Ok(()) => released += 1,
                Err(e) => log::warn!("Releasing symbol handle {:#010x} failed: {}", device_handle, e),
            }
        }
        log::debug!("Released {} symbol handles", released);
        Ok(released)
    }

    pub async fn is_cached(&self, symbol: &str) -> bool {
        self.resolved.lock().await.contains_key(symbol)
    }

    pub async fn pending_releases(&self) -> usize {
        self.releases.len().await
    }

    pub async fn drain_state(&self) -> DrainState {
        self.releases.state().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{data_response, result_response, MockRequester};
    use ads_core::PlcType;
    use bytes::Buf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn handing_out_handles() -> MockRequester {
        let next = Arc::new(AtomicU32::new(0x100));
        MockRequester::new(move |command, _| match command {
            CommandId::ReadWrite => {
                let handle = next.fetch_add(1, Ordering::SeqCst);
                data_response(&handle.to_le_bytes())
            }
            _ => result_response(0),
        })
    }

    #[tokio::test]
    async fn test_resolve_once() {
        let requester = handing_out_handles();
        let manager = SymbolHandleManager::new();
        let mut handle = Handle::scalar("MAIN.counter", PlcType::Dint);

        assert_eq!(manager.resolve(&requester, &mut handle).await.unwrap(), 0x100);
        assert_eq!(manager.resolve(&requester, &mut handle).await.unwrap(), 0x100);
        assert_eq!(requester.count(CommandId::ReadWrite), 1);
        assert_eq!(manager.pending_releases().await, 1);

        let (_, payload) = &requester.requests()[0];
        let mut payload = payload.clone();
        assert_eq!(payload.get_u32_le(), GET_SYMHANDLE_BYNAME);
        assert_eq!(payload.get_u32_le(), 0);
        assert_eq!(payload.get_u32_le(), 4);
        assert_eq!(payload.get_u32_le(), 13);
        assert_eq!(&payload[..], b"MAIN.counter\0");
    }

    #[tokio::test]
    async fn test_resolve_device_error() {
        let requester = MockRequester::new(|_, _| result_response(1808));
        let manager = SymbolHandleManager::new();
        let mut handle = Handle::scalar("MAIN.missing", PlcType::Int);

        match manager.resolve(&requester, &mut handle).await {
            Err(AdsError::HandleResolution { symbol, .. }) => assert_eq!(symbol, "MAIN.missing"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!handle.is_resolved());
        assert_eq!(manager.pending_releases().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_result_only_success() {
        let requester = MockRequester::new(|_, _| result_response(0));
        let manager = SymbolHandleManager::new();
        let mut handle = Handle::scalar("MAIN.x", PlcType::Int);

        match manager.resolve(&requester, &mut handle).await {
            Err(AdsError::HandleResolution { symbol, reason }) => {
                assert_eq!(symbol, "MAIN.x");
                assert_eq!(reason, "device returned no handle");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!manager.is_cached("MAIN.x").await);
    }

    #[tokio::test]
    async fn test_handle_from_other_session_resolves_again() {
        let first_session = handing_out_handles();
        let first = SymbolHandleManager::new();
        let mut handle = Handle::scalar("MAIN.counter", PlcType::Dint);
        assert_eq!(first.resolve(&first_session, &mut handle).await.unwrap(), 0x100);
        first.release_all(&first_session).await.unwrap();
        assert!(!first.is_cached("MAIN.counter").await);

        let second_session = MockRequester::new(|command, _| match command {
            CommandId::ReadWrite => data_response(&0x300u32.to_le_bytes()),
            _ => result_response(0),
        });
        let second = SymbolHandleManager::new();
        assert_eq!(second.resolve(&second_session, &mut handle).await.unwrap(), 0x300);
        assert_eq!(second_session.count(CommandId::ReadWrite), 1);
        assert_eq!(handle.device_handle(), Some(0x300));
    }

    #[tokio::test]
    async fn test_resolve_after_release_looks_up_again() {
        let requester = handing_out_handles();
        let manager = SymbolHandleManager::new();
        let mut handle = Handle::scalar("MAIN.counter", PlcType::Dint);
        manager.resolve(&requester, &mut handle).await.unwrap();
        manager.release_all(&requester).await.unwrap();

        assert_eq!(manager.resolve(&requester, &mut handle).await.unwrap(), 0x101);
        assert_eq!(requester.count(CommandId::ReadWrite), 2);
        assert_eq!(manager.drain_state().await, DrainState::Idle);
    }

    #[tokio::test]
    async fn test_resolve_empty_result() {
        let requester = MockRequester::new(|_, _| data_response(&[]));
        let manager = SymbolHandleManager::new();
        let mut handle = Handle::scalar("MAIN.x", PlcType::Int);
        assert!(matches!(
            manager.resolve(&requester, &mut handle).await,
            Err(AdsError::HandleResolution { .. })
        ));
    }

    #[tokio::test]
    async fn test_release_all_sequential() {
        let requester = handing_out_handles();
        let manager = SymbolHandleManager::new();
        for name in ["MAIN.a", "MAIN.b", "MAIN.c"] {
            let mut handle = Handle::scalar(name, PlcType::Int);
            manager.resolve(&requester, &mut handle).await.unwrap();
        }

        assert_eq!(manager.release_all(&requester).await.unwrap(), 3);
        assert_eq!(requester.count(CommandId::Write), 3);
        assert_eq!(requester.max_in_flight(), 1);
        assert_eq!(manager.drain_state().await, DrainState::Done);

        let released: Vec<u32> = requester
            .requests()
            .into_iter()
            .filter(|(c, _)| *c == CommandId::Write)
            .map(|(_, p)| {
                let mut p = p;
                assert_eq!(p.get_u32_le(), RELEASE_SYMHANDLE);
                assert_eq!(p.get_u32_le(), 0);
                assert_eq!(p.get_u32_le(), 4);
                p.get_u32_le()
            })
            .collect();
        assert_eq!(released, vec![0x100, 0x101, 0x102]);
    }

    #[tokio::test]
    async fn test_release_all_empty() {
        let requester = handing_out_handles();
        let manager = SymbolHandleManager::new();
        assert_eq!(manager.release_all(&requester).await.unwrap(), 0);
        assert!(requester.requests().is_empty());
    }

    #[tokio::test]
    async fn test_release_continues_after_device_error() {
        let requester = MockRequester::new(|command, _| match command {
            CommandId::ReadWrite => data_response(&7u32.to_le_bytes()),
            _ => result_response(1809),
        });
        let manager = SymbolHandleManager::new();
        let mut a = Handle::scalar("MAIN.a", PlcType::Int);
        let mut b = Handle::scalar("MAIN.b", PlcType::Int);
        manager.resolve(&requester, &mut a).await.unwrap();
        manager.resolve(&requester, &mut b).await.unwrap();

        assert_eq!(manager.release_all(&requester).await.unwrap(), 0);
        assert_eq!(requester.count(CommandId::Write), 2);
    }
}
