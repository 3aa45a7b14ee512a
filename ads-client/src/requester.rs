//! Request seam between the managers and the session

use ads_ams::{AmsFrame, CommandId};
use ads_core::{AdsError, AdsErrorCode, AdsResult};
use async_trait::async_trait;
use bytes::Bytes;

/// Sends one ADS request and waits for its correlated response
///
/// The session implements this over the wire; the symbol and notification
/// managers only ever talk to this trait.
#[async_trait]
pub trait AdsRequester: Send + Sync {
    async fn request(&self, command: CommandId, payload: Bytes) -> AdsResult<AmsFrame>;
}

/// Turn a non-zero ADS result into `AdsError::Device`
pub fn check_result(code: u32) -> AdsResult<()> {
    match AdsErrorCode::from_code(code) {
        None => Ok(()),
        Some(code) => Err(AdsError::Device(code)),
    }
}
