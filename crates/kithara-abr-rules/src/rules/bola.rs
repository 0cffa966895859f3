//! Buffer-occupancy (BOLA) policy.
//!
//! BOLA picks the quality maximising `(V * (u + gp) - buffer) / bitrate`,
//! where `u` is the log utility of a level. `V` and `gp` are derived from the
//! buffer target so that the lowest level is chosen on an empty buffer and the
//! highest once the buffer reaches the target. Paper: <https://arxiv.org/abs/1601.06748>

use std::time::Duration;

use tracing::debug;

use crate::{
    context::RulesContext,
    request::{Priority, SwitchReason, SwitchRequest},
    rule::{AbandonRule, QualitySwitchRule},
    types::MediaInfo,
};

const MINIMUM_BUFFER_SECS: f64 = 10.0;
const MINIMUM_BUFFER_PER_LEVEL_SECS: f64 = 2.0;
const DEFAULT_BUFFER_TARGET: Duration = Duration::from_secs(12);

/// Control parameters for one ladder and buffer target.
#[derive(Clone, Debug, PartialEq)]
struct BolaParams {
    utilities: Vec<f64>,
    gp: f64,
    vp: f64,
}

impl BolaParams {
    /// `None` for ladders BOLA cannot rank (empty, single or flat).
    #[expect(clippy::cast_precision_loss)] // ladder lengths and bitrates are small
    fn new(media_info: &MediaInfo, buffer_target: Duration) -> Option<Self> {
        let lowest = *media_info.bitrates_bps.first()? as f64;
        if lowest <= 0.0 {
            return None;
        }
        let utilities: Vec<f64> = media_info
            .bitrates_bps
            .iter()
            .map(|&bw| (bw as f64 / lowest).ln() + 1.0)
            .collect();
        let top_utility = utilities.iter().copied().fold(f64::MIN, f64::max);
        if top_utility <= 1.0 {
            return None;
        }

        let levels = utilities.len() as f64;
        let floor_secs = MINIMUM_BUFFER_SECS + MINIMUM_BUFFER_PER_LEVEL_SECS * levels;
        let buffer_secs = buffer_target.as_secs_f64().max(floor_secs);
        let gp = (top_utility - 1.0) / (buffer_secs / MINIMUM_BUFFER_SECS - 1.0);
        let vp = MINIMUM_BUFFER_SECS / gp;
        Some(Self { utilities, gp, vp })
    }

    /// Quality maximising the BOLA objective; ties go to the higher level.
    #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
    fn quality_for_buffer(&self, media_info: &MediaInfo, buffer_secs: f64) -> usize {
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (idx, (&utility, &bw)) in self
            .utilities
            .iter()
            .zip(&media_info.bitrates_bps)
            .enumerate()
        {
            let score = (self.vp * (utility + self.gp) - buffer_secs) / bw as f64;
            if score >= best_score {
                best_score = score;
                best = idx;
            }
        }
        best
    }
}

/// Buffer-occupancy quality rule, a self-sufficient alternative to the
/// throughput-driven set.
///
/// Up-switches are additionally limited to what the measured throughput
/// sustains, never dropping below the previously chosen level. Before its
/// first vote the rule takes that level from
/// [`MediaMetrics::current_quality`](crate::MediaMetrics::current_quality).
#[derive(Debug, Default)]
pub struct BolaRule {
    last_quality: Option<usize>,
}

impl BolaRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QualitySwitchRule for BolaRule {
    fn name(&self) -> &'static str {
        "BolaRule"
    }

    fn evaluate_quality(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let Some(metrics) = ctx.metrics() else {
            return SwitchRequest::no_change();
        };
        let Some(buffer_level) = metrics.buffer_level else {
            return SwitchRequest::no_change();
        };
        let media_info = ctx.media_info();
        if media_info.bitrates_bps.is_empty() {
            return SwitchRequest::no_change();
        }

        let target = metrics
            .latest_buffer_state()
            .map_or(DEFAULT_BUFFER_TARGET, |s| s.target);
        let buffer_secs = buffer_level.as_secs_f64();
        let params = BolaParams::new(media_info, target);
        let mut quality = params.map_or(0, |p| p.quality_for_buffer(media_info, buffer_secs));

        let last_quality = self.last_quality.or(metrics.current_quality);
        if let Some(last) = last_quality.filter(|&last| quality > last) {
            let history = ctx.abr().throughput_history();
            let media_type = ctx.media_type();
            if let Some(kbps) = history.safe_average_throughput(media_type, ctx.is_dynamic()) {
                let latency_ms = history.average_latency(media_type).unwrap_or(0.0);
                let sustainable = ctx.abr().quality_for_bitrate(media_info, kbps, latency_ms);
                if quality > sustainable {
                    quality = sustainable.max(last);
                }
            }
        }

        debug!(
            media_type = %ctx.media_type(),
            quality,
            last = ?last_quality,
            buffer_secs,
            "BolaRule: requesting switch"
        );
        self.last_quality = Some(quality);

        SwitchRequest::new(quality, Priority::Default)
            .with_reason(SwitchReason::default().with_value("buffer_level", buffer_secs))
    }

    fn reset(&mut self) {
        self.last_quality = None;
    }
}

/// Abandonment counterpart of [`BolaRule`]: aborts an in-flight fragment that
/// cannot finish before the buffer drains.
#[derive(Debug, Default)]
pub struct BolaAbandonRule;

impl BolaAbandonRule {
    pub const GRACE_TIME: Duration = Duration::from_millis(500);

    pub fn new() -> Self {
        Self
    }
}

impl AbandonRule for BolaAbandonRule {
    fn name(&self) -> &'static str {
        "BolaAbandonRule"
    }

    fn evaluate_abandonment(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let Some(metrics) = ctx.metrics() else {
            return SwitchRequest::no_change();
        };
        let (Some(progress), Some(buffer_level)) = (metrics.in_flight, metrics.buffer_level) else {
            return SwitchRequest::no_change();
        };
        if progress.quality == 0 || progress.is_complete() {
            return SwitchRequest::no_change();
        }
        if ctx.now.saturating_duration_since(progress.requested_at) <= Self::GRACE_TIME {
            return SwitchRequest::no_change();
        }
        let Some(bps) = progress.throughput_bps(ctx.now) else {
            return SwitchRequest::no_change();
        };

        let buffer_secs = buffer_level.as_secs_f64();
        #[expect(clippy::cast_precision_loss)] // byte counts far below 2^52
        let remaining_secs = (progress.bytes_total - progress.bytes_loaded) as f64 * 8.0 / bps;
        if remaining_secs <= buffer_secs {
            return SwitchRequest::no_change();
        }

        let media_info = ctx.media_info();
        let fragment_secs = media_info.fragment_duration.as_secs_f64();
        #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
        let fits = |bw: u64| bw as f64 * fragment_secs / bps <= buffer_secs;
        let ladder = &media_info.bitrates_bps;
        let below = &ladder[..progress.quality.min(ladder.len())];
        let target = below.iter().rposition(|&bw| fits(bw)).unwrap_or(0);

        debug!(
            media_type = %ctx.media_type(),
            fragment = progress.index,
            from = progress.quality,
            to = target,
            remaining_secs,
            buffer_secs,
            "BolaAbandonRule: abandoning fragment"
        );
        SwitchRequest::new(target, Priority::Strong).with_reason(
            SwitchReason::new("fragment cannot finish before buffer drains")
                .with_value("remaining_secs", remaining_secs)
                .with_value("buffer_level", buffer_secs),
        )
    }
}
