use std::collections::VecDeque;

use tracing::debug;

use crate::{
    context::RulesContext,
    metrics::BufferState,
    request::{Priority, SwitchReason, SwitchRequest},
    rule::QualitySwitchRule,
    types::AbandonmentState,
};

/// Throughput/latency figures the rule voted on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThroughputObservation {
    pub throughput_kbps: f64,
    pub latency_ms: f64,
}

/// Primary default heuristic: votes for the highest quality the measured
/// throughput can sustain.
///
/// Abstains when metrics or a buffer-state sample are missing, when the
/// buffer is already rich, while the media type is abandoning a fragment, and
/// for a starved buffer of a static stream. Live streams switch on throughput
/// regardless of buffer state.
#[derive(Debug, Default)]
pub struct ThroughputRule {
    observed: VecDeque<ThroughputObservation>,
}

impl ThroughputRule {
    const WINDOW: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Recent observations, oldest first.
    pub fn observed(&self) -> impl Iterator<Item = &ThroughputObservation> {
        self.observed.iter()
    }

    fn record(&mut self, observation: ThroughputObservation) {
        if self.observed.len() == Self::WINDOW {
            self.observed.pop_front();
        }
        self.observed.push_back(observation);
    }
}

impl QualitySwitchRule for ThroughputRule {
    fn name(&self) -> &'static str {
        "ThroughputRule"
    }

    fn evaluate_quality(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let media_type = ctx.media_type();

        let Some(buffer_state) = ctx.latest_buffer_state() else {
            return SwitchRequest::no_change();
        };
        if ctx.has_rich_buffer() {
            return SwitchRequest::no_change();
        }

        let abr = ctx.abr();
        if abr.abandonment_state(media_type) == AbandonmentState::Abandoning {
            return SwitchRequest::no_change();
        }

        let is_dynamic = ctx.is_dynamic();
        if buffer_state.state != BufferState::Loaded && !is_dynamic {
            return SwitchRequest::no_change();
        }

        let history = abr.throughput_history();
        let Some(throughput_kbps) = history.safe_average_throughput(media_type, is_dynamic) else {
            return SwitchRequest::no_change();
        };
        let latency_ms = history.average_latency(media_type).unwrap_or(0.0);

        let quality = abr.quality_for_bitrate(ctx.media_info(), throughput_kbps, latency_ms);
        ctx.schedule().clear_load_delay();

        self.record(ThroughputObservation {
            throughput_kbps,
            latency_ms,
        });

        debug!(
            %media_type,
            quality,
            throughput_kbps,
            latency_ms,
            is_dynamic,
            "ThroughputRule: requesting switch"
        );

        SwitchRequest::new(quality, Priority::Default).with_reason(
            SwitchReason::default()
                .with_value("throughput", throughput_kbps)
                .with_value("latency", latency_ms),
        )
    }

    fn reset(&mut self) {
        self.observed.clear();
    }
}
