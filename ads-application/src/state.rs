//! ADS device states

use serde::{Deserialize, Serialize};
use std::fmt;

/// ADS state of a device, as reported by ReadState and set by WriteControl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdsState {
    Invalid,
    Idle,
    Reset,
    Init,
    Start,
    Run,
    Stop,
    SaveConfig,
    LoadConfig,
    PowerFailure,
    PowerGood,
    Error,
    Shutdown,
    Suspend,
    Resume,
    Config,
    Reconfig,
    Stopping,
    Incompatible,
    Exception,
    Other(u16),
}

impl AdsState {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => AdsState::Invalid,
            1 => AdsState::Idle,
            2 => AdsState::Reset,
            3 => AdsState::Init,
            4 => AdsState::Start,
            5 => AdsState::Run,
            6 => AdsState::Stop,
            7 => AdsState::SaveConfig,
            8 => AdsState::LoadConfig,
            9 => AdsState::PowerFailure,
            10 => AdsState::PowerGood,
            11 => AdsState::Error,
            12 => AdsState::Shutdown,
            13 => AdsState::Suspend,
            14 => AdsState::Resume,
            15 => AdsState::Config,
            16 => AdsState::Reconfig,
            17 => AdsState::Stopping,
            18 => AdsState::Incompatible,
            19 => AdsState::Exception,
            other => AdsState::Other(other),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            AdsState::Invalid => 0,
            AdsState::Idle => 1,
            AdsState::Reset => 2,
            AdsState::Init => 3,
            AdsState::Start => 4,
            AdsState::Run => 5,
            AdsState::Stop => 6,
            AdsState::SaveConfig => 7,
            AdsState::LoadConfig => 8,
            AdsState::PowerFailure => 9,
            AdsState::PowerGood => 10,
            AdsState::Error => 11,
            AdsState::Shutdown => 12,
            AdsState::Suspend => 13,
            AdsState::Resume => 14,
            AdsState::Config => 15,
            AdsState::Reconfig => 16,
            AdsState::Stopping => 17,
            AdsState::Incompatible => 18,
            AdsState::Exception => 19,
            AdsState::Other(value) => *value,
        }
    }
}

impl fmt::Display for AdsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdsState::Other(value) => write!(f, "Other({})", value),
            other => write!(f, "{:?}", other),
        }
    }
}

/// ADS state plus the device-specific state word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub ads_state: AdsState,
    pub device_state: u16,
}
