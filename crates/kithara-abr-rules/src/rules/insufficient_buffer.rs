use tracing::debug;

use crate::{
    context::RulesContext,
    metrics::BufferState,
    request::{Priority, SwitchReason, SwitchRequest},
    rule::QualitySwitchRule,
};

/// Drops to the lowest quality once a previously loaded buffer runs dry.
///
/// The initial fill (empty before the first `Loaded` sample) is not a stall
/// and is left to the other rules.
#[derive(Debug, Default)]
pub struct InsufficientBufferRule {
    seen_loaded: bool,
}

impl InsufficientBufferRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QualitySwitchRule for InsufficientBufferRule {
    fn name(&self) -> &'static str {
        "InsufficientBufferRule"
    }

    fn evaluate_quality(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let Some(sample) = ctx.latest_buffer_state() else {
            return SwitchRequest::no_change();
        };

        match sample.state {
            BufferState::Loaded => {
                self.seen_loaded = true;
                SwitchRequest::no_change()
            }
            BufferState::Empty if self.seen_loaded => {
                debug!(media_type = %ctx.media_type(), "InsufficientBufferRule: buffer ran dry");
                SwitchRequest::new(0, Priority::Default)
                    .with_reason(SwitchReason::new("buffer ran dry"))
            }
            BufferState::Empty => SwitchRequest::no_change(),
        }
    }

    fn reset(&mut self) {
        self.seen_loaded = false;
    }
}
