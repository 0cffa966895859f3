//! Per-decision snapshot handed to every rule.

#[cfg(test)]
use unimock::unimock;
use web_time::Instant;

use crate::{
    metrics::{BufferStateSample, MediaMetrics},
    types::{AbandonmentState, MediaInfo, MediaType, StreamInfo},
};

/// Throughput and latency history maintained by the host.
#[cfg_attr(test, unimock(api = ThroughputHistoryMock))]
pub trait ThroughputHistory {
    /// Smoothed, conservative average throughput in kbit/s.
    ///
    /// Returns `None` until a measurement exists for `media_type`.
    fn safe_average_throughput(&self, media_type: MediaType, is_dynamic: bool) -> Option<f64>;

    /// Average request latency in milliseconds.
    fn average_latency(&self, media_type: MediaType) -> Option<f64>;
}

/// ABR support services of the host player.
pub trait AbrSupport {
    fn throughput_history(&self) -> &dyn ThroughputHistory;

    fn abandonment_state(&self, media_type: MediaType) -> AbandonmentState;

    /// Map a throughput (kbit/s) and latency (ms) onto the bitrate ladder.
    ///
    /// See [`ladder::quality_for_bitrate`](crate::ladder::quality_for_bitrate)
    /// for the standard mapping.
    fn quality_for_bitrate(
        &self,
        media_info: &MediaInfo,
        throughput_kbps: f64,
        latency_ms: f64,
    ) -> usize;
}

/// Fragment scheduling handle of the host.
#[cfg_attr(test, unimock(api = ScheduleControlMock))]
pub trait ScheduleControl {
    /// Drop any pending artificial delay before the next fragment request.
    ///
    /// Idempotent: safe to call repeatedly.
    fn clear_load_delay(&self);
}

/// Read-only view of player state at one decision point.
///
/// Built by the host for each call and never retained by the engine.
#[derive(Clone, Copy)]
pub struct RulesContext<'a> {
    pub media_info: &'a MediaInfo,
    pub stream_info: Option<&'a StreamInfo>,
    /// `None` until the host has collected metrics for this media type.
    pub metrics: Option<&'a MediaMetrics>,
    pub abr: &'a dyn AbrSupport,
    pub schedule: &'a dyn ScheduleControl,
    /// Buffered-ahead media already exceeds the host's safety threshold.
    pub rich_buffer: bool,
    pub now: Instant,
}

impl<'a> RulesContext<'a> {
    /// Context with no stream descriptor, no metrics and a lean buffer.
    pub fn new(
        media_info: &'a MediaInfo,
        abr: &'a dyn AbrSupport,
        schedule: &'a dyn ScheduleControl,
        now: Instant,
    ) -> Self {
        Self {
            media_info,
            stream_info: None,
            metrics: None,
            abr,
            schedule,
            rich_buffer: false,
            now,
        }
    }

    #[must_use]
    pub fn with_stream_info(mut self, stream_info: &'a StreamInfo) -> Self {
        self.stream_info = Some(stream_info);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: &'a MediaMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn with_rich_buffer(mut self, rich_buffer: bool) -> Self {
        self.rich_buffer = rich_buffer;
        self
    }

    pub fn media_info(&self) -> &'a MediaInfo {
        self.media_info
    }

    pub fn media_type(&self) -> MediaType {
        self.media_info.media_type
    }

    /// Live stream. A missing stream descriptor counts as static.
    pub fn is_dynamic(&self) -> bool {
        self.stream_info.is_some_and(|info| info.is_dynamic)
    }

    pub fn metrics(&self) -> Option<&'a MediaMetrics> {
        self.metrics
    }

    pub fn latest_buffer_state(&self) -> Option<&'a BufferStateSample> {
        self.metrics.and_then(MediaMetrics::latest_buffer_state)
    }

    pub fn has_rich_buffer(&self) -> bool {
        self.rich_buffer
    }

    pub fn abr(&self) -> &'a dyn AbrSupport {
        self.abr
    }

    pub fn schedule(&self) -> &'a dyn ScheduleControl {
        self.schedule
    }
}

impl std::fmt::Debug for RulesContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesContext")
            .field("media_info", &self.media_info)
            .field("stream_info", &self.stream_info)
            .field("metrics", &self.metrics.is_some())
            .field("rich_buffer", &self.rich_buffer)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}
