//! Read-only per-media-type playback metrics supplied by the host.

use std::time::Duration;

use web_time::Instant;

/// Buffer health reported by the host's buffer controller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BufferState {
    /// Enough media is buffered to keep playing.
    Loaded,
    /// The buffer ran dry (playback stalled or about to).
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferStateSample {
    pub state: BufferState,
    /// Buffer level the host is aiming for.
    pub target: Duration,
}

/// Switch history for one quality index.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SwitchTally {
    /// Times the quality was left downward.
    pub drops: u32,
    /// Times it was held or left upward.
    pub no_drops: u32,
}

/// Rendered/dropped frame counts for one quality index.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FrameTally {
    pub dropped: u32,
    pub total: u32,
}

/// Progress of the fragment fetch currently in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentProgress {
    /// Fragment sequence index.
    pub index: u64,
    /// Quality the fragment was requested at.
    pub quality: usize,
    pub bytes_loaded: u64,
    pub bytes_total: u64,
    pub requested_at: Instant,
    pub first_byte_at: Option<Instant>,
}

impl FragmentProgress {
    pub fn is_complete(&self) -> bool {
        self.bytes_loaded >= self.bytes_total
    }

    /// Time between request and first byte.
    pub fn latency(&self) -> Duration {
        match self.first_byte_at {
            Some(at) => at.saturating_duration_since(self.requested_at),
            None => Duration::ZERO,
        }
    }

    /// Time spent receiving bytes so far.
    pub fn transfer_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.first_byte_at.unwrap_or(self.requested_at))
    }

    /// Measured transfer throughput in bits per second.
    ///
    /// `None` until some bytes have arrived over a non-zero interval.
    pub fn throughput_bps(&self, now: Instant) -> Option<f64> {
        let secs = self.transfer_time(now).as_secs_f64();
        if self.bytes_loaded == 0 || secs <= 0.0 {
            return None;
        }
        #[expect(clippy::cast_precision_loss)] // byte counts far below 2^52
        let bits = self.bytes_loaded as f64 * 8.0;
        Some(bits / secs)
    }
}

/// Metrics collected for one media type.
///
/// Collections are ordered oldest first; `switch_history` and
/// `dropped_frames` are indexed by quality.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaMetrics {
    pub buffer_states: Vec<BufferStateSample>,
    pub buffer_level: Option<Duration>,
    /// Quality of the last fragment the host requested.
    pub current_quality: Option<usize>,
    pub switch_history: Vec<SwitchTally>,
    pub dropped_frames: Vec<FrameTally>,
    pub in_flight: Option<FragmentProgress>,
}

impl MediaMetrics {
    pub fn latest_buffer_state(&self) -> Option<&BufferStateSample> {
        self.buffer_states.last()
    }
}
