//! Session events
//!
//! Everything the device or the connection reports outside a command's own
//! result arrives on the session's event channel.

use ads_application::Handle;
use ads_core::AdsError;
use chrono::{DateTime, Utc};

/// A notification sample decoded into its subscription's handle
#[derive(Debug, Clone)]
pub struct Notification {
    pub notification_handle: u32,
    /// Device timestamp of the sample
    pub timestamp: DateTime<Utc>,
    /// Snapshot of the subscribed handle holding the new values
    pub handle: Handle,
}

/// Event raised by a running session
#[derive(Debug)]
pub enum SessionEvent {
    /// A subscribed value changed or its cycle elapsed
    Notification(Notification),
    /// A device error, or the fatal error that is about to close the session
    Error(AdsError),
    /// The transport saw no data for the configured idle time
    Timeout,
    /// The transport is closed; no further events follow
    Closed,
}

impl SessionEvent {
    pub fn is_closed(&self) -> bool {
        matches!(self, SessionEvent::Closed)
    }
}
