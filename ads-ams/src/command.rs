//! ADS command ids and AMS state flags

use ads_core::{AdsError, AdsResult};
use std::fmt;

/// ADS command id carried in the AMS header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CommandId {
    ReadDeviceInfo = 1,
    Read = 2,
    Write = 3,
    ReadState = 4,
    WriteControl = 5,
    AddNotification = 6,
    DeleteNotification = 7,
    /// Unsolicited push from the device
    Notification = 8,
    ReadWrite = 9,
}

impl CommandId {
    pub fn from_u16(value: u16) -> AdsResult<Self> {
        let command = match value {
            1 => CommandId::ReadDeviceInfo,
            2 => CommandId::Read,
            3 => CommandId::Write,
            4 => CommandId::ReadState,
            5 => CommandId::WriteControl,
            6 => CommandId::AddNotification,
            7 => CommandId::DeleteNotification,
            8 => CommandId::Notification,
            9 => CommandId::ReadWrite,
            other => {
                return Err(AdsError::MalformedFrame(format!(
                    "Unknown ADS command id {}",
                    other
                )));
            }
        };
        Ok(command)
    }

    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Whether the frame is a device push rather than a response
    pub fn is_notification(&self) -> bool {
        matches!(self, CommandId::Notification)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandId::ReadDeviceInfo => "ReadDeviceInfo",
            CommandId::Read => "Read",
            CommandId::Write => "Write",
            CommandId::ReadState => "ReadState",
            CommandId::WriteControl => "WriteControl",
            CommandId::AddNotification => "AddNotification",
            CommandId::DeleteNotification => "DeleteNotification",
            CommandId::Notification => "Notification",
            CommandId::ReadWrite => "ReadWrite",
        };
        f.write_str(name)
    }
}

/// AMS state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateFlags(u16);

impl StateFlags {
    /// Response bit
    pub const RESPONSE: u16 = 0x0001;
    /// ADS command bit
    pub const ADS_COMMAND: u16 = 0x0004;

    /// ADS request over TCP
    pub fn request() -> Self {
        Self(Self::ADS_COMMAND)
    }

    /// ADS response over TCP
    pub fn response() -> Self {
        Self(Self::ADS_COMMAND | Self::RESPONSE)
    }

    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn is_response(&self) -> bool {
        self.0 & Self::RESPONSE != 0
    }
}
