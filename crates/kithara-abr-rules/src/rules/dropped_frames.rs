use tracing::debug;

use crate::{
    context::RulesContext,
    request::{Priority, SwitchReason, SwitchRequest},
    rule::QualitySwitchRule,
};

/// Caps quality below the first level the device renders poorly.
#[derive(Debug, Default)]
pub struct DroppedFramesRule;

impl DroppedFramesRule {
    /// Frames needed before a level's drop ratio is trusted.
    pub const GOOD_SAMPLE_SIZE: u32 = 375;
    pub const DROPPED_PERCENTAGE_FORBID: f64 = 0.15;

    pub fn new() -> Self {
        Self
    }
}

impl QualitySwitchRule for DroppedFramesRule {
    fn name(&self) -> &'static str {
        "DroppedFramesRule"
    }

    fn evaluate_quality(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let Some(metrics) = ctx.metrics() else {
            return SwitchRequest::no_change();
        };

        // level 0 is never forbidden
        let forbidden = metrics
            .dropped_frames
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, frames)| {
                frames.total > Self::GOOD_SAMPLE_SIZE
                    && f64::from(frames.dropped) / f64::from(frames.total)
                        > Self::DROPPED_PERCENTAGE_FORBID
            });

        let Some((quality, frames)) = forbidden else {
            return SwitchRequest::no_change();
        };

        debug!(
            media_type = %ctx.media_type(),
            forbidden = quality,
            dropped = frames.dropped,
            total = frames.total,
            "DroppedFramesRule: capping quality"
        );
        SwitchRequest::new(quality - 1, Priority::Default).with_reason(
            SwitchReason::new("dropped frames").with_value("dropped", f64::from(frames.dropped)),
        )
    }
}
