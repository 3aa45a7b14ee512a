//! ADS client implementation
//!
//! This crate ties the lower layers together into a running session:
//!
//! - [`config`]: connection options and their validation
//! - [`correlator`]: invoke id assignment and request/response pairing
//! - [`symbols`]: symbol name resolution and handle release
//! - [`notifications`]: device notification subscriptions and dispatch
//! - [`session`]: the per-connection state and its inbound reader task
//! - [`client`]: the command API on top of a session
//!
//! Device errors never end a session: they are raised as
//! [`SessionEvent::Error`] and returned from the command that caused them.
//! Protocol violations (a response nobody asked for, a frame that does not
//! parse) close the transport.

pub mod client;
pub mod config;
pub mod correlator;
pub mod drain;
pub mod event;
pub mod notifications;
pub mod requester;
pub mod session;
pub mod symbols;

#[cfg(test)]
mod testing;

pub use ads_core::{AdsError, AdsResult};
pub use client::AdsClient;
pub use config::{AdsConfig, ConnectionBuilder, SessionConfig};
pub use correlator::InvokeCorrelator;
pub use drain::{DrainState, ReleaseQueue};
pub use event::{Notification, SessionEvent};
pub use notifications::{Dispatched, NotificationManager};
pub use requester::AdsRequester;
pub use session::Session;
pub use symbols::SymbolHandleManager;
