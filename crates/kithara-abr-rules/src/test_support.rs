//! Shared fixtures for unit tests.

use std::time::Duration;

use crate::{
    context::{AbrSupport, ScheduleControl, ThroughputHistory},
    ladder,
    metrics::{BufferState, BufferStateSample, MediaMetrics},
    types::{AbandonmentState, MediaInfo, MediaType},
};

pub(crate) fn media_info() -> MediaInfo {
    MediaInfo::new(
        MediaType::Video,
        vec![500_000, 1_000_000, 2_000_000, 4_000_000],
        Duration::from_secs(4),
    )
}

pub(crate) fn metrics_with(state: BufferState) -> MediaMetrics {
    MediaMetrics {
        buffer_states: vec![BufferStateSample {
            state,
            target: Duration::from_secs(12),
        }],
        ..MediaMetrics::default()
    }
}

/// ABR support with a fixed throughput/latency history.
pub(crate) struct StubAbr {
    pub throughput_kbps: Option<f64>,
    pub latency_ms: Option<f64>,
    pub abandonment: AbandonmentState,
}

impl StubAbr {
    pub(crate) fn new(throughput_kbps: Option<f64>) -> Self {
        Self {
            throughput_kbps,
            latency_ms: None,
            abandonment: AbandonmentState::Allowed,
        }
    }
}

impl ThroughputHistory for StubAbr {
    fn safe_average_throughput(&self, _media_type: MediaType, _is_dynamic: bool) -> Option<f64> {
        self.throughput_kbps
    }

    fn average_latency(&self, _media_type: MediaType) -> Option<f64> {
        self.latency_ms
    }
}

impl AbrSupport for StubAbr {
    fn throughput_history(&self) -> &dyn ThroughputHistory {
        self
    }

    fn abandonment_state(&self, _media_type: MediaType) -> AbandonmentState {
        self.abandonment
    }

    fn quality_for_bitrate(
        &self,
        media_info: &MediaInfo,
        throughput_kbps: f64,
        latency_ms: f64,
    ) -> usize {
        ladder::quality_for_bitrate(media_info, throughput_kbps, latency_ms)
    }
}

/// ABR support delegating history queries to another implementation
/// (typically a unimock mock).
pub(crate) struct DelegatingAbr<H> {
    pub history: H,
    pub abandonment: AbandonmentState,
}

impl<H: ThroughputHistory> AbrSupport for DelegatingAbr<H> {
    fn throughput_history(&self) -> &dyn ThroughputHistory {
        &self.history
    }

    fn abandonment_state(&self, _media_type: MediaType) -> AbandonmentState {
        self.abandonment
    }

    fn quality_for_bitrate(
        &self,
        media_info: &MediaInfo,
        throughput_kbps: f64,
        latency_ms: f64,
    ) -> usize {
        ladder::quality_for_bitrate(media_info, throughput_kbps, latency_ms)
    }
}

pub(crate) struct NoopSchedule;

impl ScheduleControl for NoopSchedule {
    fn clear_load_delay(&self) {}
}
