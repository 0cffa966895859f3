use std::{collections::VecDeque, time::Duration};

use tracing::{debug, trace};

use crate::{
    context::RulesContext,
    request::{Priority, SwitchReason, SwitchRequest},
    rule::AbandonRule,
};

/// Stall-based abandonment: aborts a fragment whose projected download time
/// is far beyond its playback duration.
///
/// Throughput of the in-flight fragment is sampled on every evaluation past
/// the grace period; once [`AbandonRequestsRule::MIN_SAMPLES`] samples exist
/// their average drives the projection. A fragment is abandoned at most once.
#[derive(Debug, Default)]
pub struct AbandonRequestsRule {
    state: FragmentWindow,
}

#[derive(Debug, Default)]
struct FragmentWindow {
    fragment: Option<u64>,
    samples_bps: VecDeque<f64>,
    abandoned: bool,
}

impl FragmentWindow {
    fn track(&mut self, fragment: u64) {
        if self.fragment != Some(fragment) {
            self.fragment = Some(fragment);
            self.samples_bps.clear();
            self.abandoned = false;
        }
    }

    fn push(&mut self, bps: f64) {
        if self.samples_bps.len() == AbandonRequestsRule::MIN_SAMPLES {
            self.samples_bps.pop_front();
        }
        self.samples_bps.push_back(bps);
    }

    fn average_bps(&self) -> Option<f64> {
        if self.samples_bps.len() < AbandonRequestsRule::MIN_SAMPLES {
            return None;
        }
        #[expect(clippy::cast_precision_loss)] // at most MIN_SAMPLES entries
        let count = self.samples_bps.len() as f64;
        Some(self.samples_bps.iter().sum::<f64>() / count)
    }
}

impl AbandonRequestsRule {
    pub const GRACE_TIME: Duration = Duration::from_millis(500);
    pub const MIN_SAMPLES: usize = 5;
    /// Projected download time, in fragment durations, that triggers abandonment.
    pub const ABANDON_MULTIPLIER: f64 = 1.8;

    pub fn new() -> Self {
        Self::default()
    }
}

impl AbandonRule for AbandonRequestsRule {
    fn name(&self) -> &'static str {
        "AbandonRequestsRule"
    }

    fn evaluate_abandonment(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let Some(progress) = ctx.metrics().and_then(|m| m.in_flight) else {
            return SwitchRequest::no_change();
        };

        self.state.track(progress.index);
        if self.state.abandoned || progress.is_complete() || progress.quality == 0 {
            return SwitchRequest::no_change();
        }
        if ctx.now.saturating_duration_since(progress.requested_at) <= Self::GRACE_TIME {
            return SwitchRequest::no_change();
        }
        let Some(bps) = progress.throughput_bps(ctx.now) else {
            return SwitchRequest::no_change();
        };

        self.state.push(bps);
        let Some(average_bps) = self.state.average_bps() else {
            return SwitchRequest::no_change();
        };

        #[expect(clippy::cast_precision_loss)] // byte counts far below 2^52
        let total_bits = progress.bytes_total as f64 * 8.0;
        let estimated_secs = total_bits / average_bps;
        let fragment_secs = ctx.media_info().fragment_duration.as_secs_f64();
        trace!(
            fragment = progress.index,
            average_bps,
            estimated_secs,
            fragment_secs,
            "AbandonRequestsRule: projection"
        );
        if estimated_secs <= fragment_secs * Self::ABANDON_MULTIPLIER {
            return SwitchRequest::no_change();
        }

        let latency_ms = progress.latency().as_secs_f64() * 1000.0;
        let abr = ctx.abr();
        let target = abr.quality_for_bitrate(ctx.media_info(), average_bps / 1000.0, latency_ms);
        if target >= progress.quality {
            return SwitchRequest::no_change();
        }

        self.state.abandoned = true;
        debug!(
            media_type = %ctx.media_type(),
            fragment = progress.index,
            from = progress.quality,
            to = target,
            estimated_secs,
            "AbandonRequestsRule: abandoning fragment"
        );
        SwitchRequest::new(target, Priority::Strong).with_reason(
            SwitchReason::new("fragment download too slow")
                .with_value("throughput", average_bps / 1000.0)
                .with_value("estimated_secs", estimated_secs),
        )
    }

    fn reset(&mut self) {
        self.state = FragmentWindow::default();
    }
}
