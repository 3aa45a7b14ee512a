//! AMS frame statistics collection

/// Per-session frame counters
///
/// Updated by the session as frames go out and come in; callers can take a
/// snapshot at any time to monitor connection health.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStatistics {
    /// Request frames written to the transport
    pub frames_sent: u64,
    /// Frames cut from the inbound stream
    pub frames_received: u64,
    /// Notification samples delivered to a subscription
    pub notifications_dispatched: u64,
    /// Notification samples without a known subscription
    pub notifications_dropped: u64,
    /// Responses or notifications carrying a non-zero ADS return code
    pub device_errors: u64,
    /// Frames rejected by the codec
    pub malformed_frames: u64,
}

impl FrameStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn increment_frames_sent(&mut self) {
        self.frames_sent += 1;
    }

    pub fn increment_frames_received(&mut self) {
        self.frames_received += 1;
    }

    pub fn increment_notifications_dispatched(&mut self) {
        self.notifications_dispatched += 1;
    }

    pub fn increment_notifications_dropped(&mut self) {
        self.notifications_dropped += 1;
    }

    pub fn increment_device_errors(&mut self) {
        self.device_errors += 1;
    }

    pub fn increment_malformed_frames(&mut self) {
        self.malformed_frames += 1;
    }

    /// Percentage of received frames that carried an error
    ///
    /// Returns 0.0 if no frames have been received.
    pub fn error_rate(&self) -> f64 {
        if self.frames_received == 0 {
            0.0
        } else {
            ((self.device_errors + self.malformed_frames) as f64 / self.frames_received as f64) * 100.0
        }
    }
}
