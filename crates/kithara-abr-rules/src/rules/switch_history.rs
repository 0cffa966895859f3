use tracing::debug;

use crate::{
    context::RulesContext,
    request::{Priority, SwitchReason, SwitchRequest},
    rule::QualitySwitchRule,
};

/// Hysteresis on past switches: caps quality below the first level that has
/// been dropped from too often.
///
/// Tallies are accumulated from the lowest quality upward; once enough
/// samples exist and drops exceed [`SwitchHistoryRule::SWITCH_PERCENT_THRESHOLD`]
/// of holds, the vote is one level below (or the level itself when it never
/// dropped).
#[derive(Debug, Default)]
pub struct SwitchHistoryRule;

impl SwitchHistoryRule {
    pub const SAMPLE_SIZE: u32 = 6;
    pub const SWITCH_PERCENT_THRESHOLD: f64 = 0.075;

    pub fn new() -> Self {
        Self
    }
}

impl QualitySwitchRule for SwitchHistoryRule {
    fn name(&self) -> &'static str {
        "SwitchHistoryRule"
    }

    fn evaluate_quality(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let Some(metrics) = ctx.metrics() else {
            return SwitchRequest::no_change();
        };

        let mut drops = 0_u32;
        let mut no_drops = 0_u32;
        for (quality, tally) in metrics.switch_history.iter().enumerate() {
            drops = drops.saturating_add(tally.drops);
            no_drops = no_drops.saturating_add(tally.no_drops);

            let enough = drops.saturating_add(no_drops) >= Self::SAMPLE_SIZE;
            if enough && f64::from(drops) > f64::from(no_drops) * Self::SWITCH_PERCENT_THRESHOLD {
                let target = if quality > 0 && tally.drops > 0 {
                    quality - 1
                } else {
                    quality
                };
                debug!(
                    media_type = %ctx.media_type(),
                    target,
                    drops,
                    no_drops,
                    "SwitchHistoryRule: capping quality"
                );
                return SwitchRequest::new(target, Priority::Default).with_reason(
                    SwitchReason::new("too many drops")
                        .with_value("drops", f64::from(drops))
                        .with_value("no_drops", f64::from(no_drops)),
                );
            }
        }

        SwitchRequest::no_change()
    }
}
