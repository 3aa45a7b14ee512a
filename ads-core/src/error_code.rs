//! ADS return code translation
//!
//! Every ADS response and notification carries a 4-byte return code.
//! Zero means success; everything else maps onto a fixed table of general
//! router errors (1-27), router errors (1280-1290) and device/client errors
//! (1792-1877).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad family an ADS return code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Code 0
    Success,
    /// General AMS router errors (1-27)
    General,
    /// Router errors (1280-1290)
    Router,
    /// Device errors reported by the target (1792-1855)
    Device,
    /// Client-side ADS errors (1856-1877)
    Client,
    /// Anything outside the known table
    Unknown,
}

/// A non-zero (or zero) ADS return code with its stable description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdsErrorCode(u32);

impl AdsErrorCode {
    pub const NO_ERROR: u32 = 0;
    pub const SYMBOL_NOT_FOUND: u32 = 1808;
    pub const ACCESS_DENIED: u32 = 1827;

    pub fn new(code: u32) -> Self {
        Self(code)
    }

    /// `None` for success, the wrapped code otherwise
    pub fn from_code(code: u32) -> Option<Self> {
        if code == Self::NO_ERROR {
            None
        } else {
            Some(Self(code))
        }
    }

    pub fn code(&self) -> u32 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        self.0 == Self::NO_ERROR
    }

    pub fn category(&self) -> ErrorCategory {
        match self.0 {
            0 => ErrorCategory::Success,
            1..=27 => ErrorCategory::General,
            1280..=1290 => ErrorCategory::Router,
            1792..=1855 => ErrorCategory::Device,
            1856..=1877 => ErrorCategory::Client,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Stable human-readable description of the code
    pub fn message(&self) -> &'static str {
        match self.0 {
            0 => "No error",
            1 => "Internal error",
            2 => "No Rtime",
            3 => "Allocation locked memory error",
            4 => "Insert mailbox error",
            5 => "Wrong receive HMSG",
            6 => "Target port not found",
            7 => "Target machine not found",
            8 => "Unknown command ID",
            9 => "Bad task ID",
            10 => "No IO",
            11 => "Unknown ADS command",
            12 => "Win 32 error",
            13 => "Port not connected",
            14 => "Invalid ADS length",
            15 => "Invalid ADS Net ID",
            16 => "Low installation level",
            17 => "No debug available",
            18 => "Port disabled",
            19 => "Port already connected",
            20 => "ADS Sync Win32 error",
            21 => "ADS Sync timeout",
            22 => "ADS Sync AMS error",
            23 => "ADS Sync no index map",
            24 => "Invalid ADS port",
            25 => "No memory",
            26 => "TCP send error",
            27 => "Host unreachable",

            1280 => "Router: no locked memory",
            1281 => "Router: memory size could not be changed",
            1282 => "Router: mailbox full",
            1283 => "Router: debug mailbox full",
            1284 => "Router: port type is unknown",
            1285 => "Router is not initialized",
            1286 => "Router: desired port number is already assigned",
            1287 => "Router: port not registered",
            1288 => "Router: maximum number of ports reached",
            1289 => "Router: port is invalid",
            1290 => "Router is not active",

            1792 => "General device error",
            1793 => "Service is not supported by server",
            1794 => "Invalid index group",
            1795 => "Invalid index offset",
            1796 => "Reading/writing not permitted",
            1797 => "Parameter size not correct",
            1798 => "Invalid parameter value(s)",
            1799 => "Device is not in a ready state",
            1800 => "Device is busy",
            1801 => "Invalid context (must be in Windows)",
            1802 => "Out of memory",
            1803 => "Invalid parameter value(s)",
            1804 => "Not found (files, ...)",
            1805 => "Syntax error in command or file",
            1806 => "Objects do not match",
            1807 => "Object already exists",
            1808 => "Symbol not found",
            1809 => "Symbol version invalid",
            1810 => "Server is in invalid state",
            1811 => "AdsTransMode not supported",
            1812 => "Notification handle is invalid",
            1813 => "Notification client not registered",
            1814 => "No more notification handles",
            1815 => "Size for watch too big",
            1816 => "Device not initialized",
            1817 => "Device has a timeout",
            1818 => "Query interface failed",
            1819 => "Wrong interface required",
            1820 => "Class ID is invalid",
            1821 => "Object ID is invalid",
            1822 => "Request is pending",
            1823 => "Request is aborted",
            1824 => "Signal warning",
            1825 => "Invalid array index",
            1826 => "Symbol not active",
            1827 => "Access denied",
            1828 => "Missing license",
            1829 => "License expired",
            1830 => "License exceeded",
            1831 => "License invalid",
            1832 => "License system ID invalid",
            1833 => "License not limited in time",
            1834 => "Licensing issue time in the future",
            1835 => "License time period too long",
            1836 => "Exception occurred during system start",
            1837 => "License file read twice",
            1838 => "Invalid signature",
            1839 => "Public key certificate invalid",

            1856 => "General client error",
            1857 => "Invalid parameter at service",
            1858 => "Polling list is empty",
            1859 => "Var connection already in use",
            1860 => "Invoke ID in use",
            1861 => "Timeout elapsed",
            1862 => "Error in Win32 subsystem",
            1863 => "Invalid client timeout value",
            1864 => "ADS port not opened",
            1872 => "Internal error in ADS sync",
            1873 => "Hash table overflow",
            1874 => "Key not found in hash",
            1875 => "No more symbols in cache",
            1876 => "Invalid response received",
            1877 => "Sync port is locked",

            _ => "Unknown ADS error",
        }
    }
}

impl fmt::Display for AdsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ADS error {})", self.message(), self.0)
    }
}
