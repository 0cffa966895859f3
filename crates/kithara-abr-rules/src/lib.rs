//! Rule-based Adaptive Bitrate (ABR) decisions.
//!
//! A [`RulesCollection`] owns the ABR rules of one media-type pipeline. On
//! each decision point every rule votes a [`SwitchRequest`] and the collection
//! arbitrates the votes by priority tier into one decision. Two decision
//! points exist: which quality to fetch next, and whether to abandon the
//! fragment that is currently downloading.
//!
//! ## Features
//!
//! - **Tiered arbitration**: `Strong` votes override `Default`, which override `Weak`;
//!   within a tier the lowest quality wins
//! - **Two built-in sets**: multi-heuristic (throughput, buffer, history, dropped frames)
//!   or buffer-occupancy (BOLA)
//! - **Custom rules**: caller factories appended after the built-ins
//! - **Host seams**: throughput history, abandonment state and load scheduling are traits
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use kithara_abr_rules::{
//!     AbandonmentState, AbrSupport, CustomRule, MediaInfo, MediaType, Priority,
//!     QualitySwitchRule, RulesCollection, RulesContext, RulesOptions, ScheduleControl,
//!     SwitchRequest, ThroughputHistory, ladder,
//! };
//! use web_time::Instant;
//!
//! struct Host;
//!
//! impl ThroughputHistory for Host {
//!     fn safe_average_throughput(&self, _: MediaType, _: bool) -> Option<f64> {
//!         Some(1_500.0)
//!     }
//!
//!     fn average_latency(&self, _: MediaType) -> Option<f64> {
//!         Some(50.0)
//!     }
//! }
//!
//! impl AbrSupport for Host {
//!     fn throughput_history(&self) -> &dyn ThroughputHistory {
//!         self
//!     }
//!
//!     fn abandonment_state(&self, _: MediaType) -> AbandonmentState {
//!         AbandonmentState::Allowed
//!     }
//!
//!     fn quality_for_bitrate(&self, info: &MediaInfo, kbps: f64, latency_ms: f64) -> usize {
//!         ladder::quality_for_bitrate(info, kbps, latency_ms)
//!     }
//! }
//!
//! impl ScheduleControl for Host {
//!     fn clear_load_delay(&self) {}
//! }
//!
//! struct CapAtOne;
//!
//! impl QualitySwitchRule for CapAtOne {
//!     fn name(&self) -> &'static str {
//!         "CapAtOne"
//!     }
//!
//!     fn evaluate_quality(&mut self, _ctx: &RulesContext<'_>) -> SwitchRequest {
//!         SwitchRequest::new(1, Priority::Weak)
//!     }
//! }
//!
//! let options = RulesOptions::default()
//!     .with_custom_rule(CustomRule::quality_switch(|_| Box::new(CapAtOne)));
//! let mut rules = RulesCollection::new(MediaType::Video);
//! rules.initialize(&options);
//!
//! let info = MediaInfo::new(
//!     MediaType::Video,
//!     vec![500_000, 1_000_000, 2_000_000],
//!     Duration::from_secs(4),
//! );
//! let ctx = RulesContext::new(&info, &Host, &Host, Instant::now());
//!
//! // built-ins abstain without metrics, so the custom vote decides
//! assert_eq!(rules.evaluate_quality(&ctx).quality, Some(1));
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::ignored_unit_patterns, clippy::allow_attributes))]

mod collection;
mod context;
mod error;
mod history;
pub mod ladder;
mod metrics;
mod options;
mod request;
mod rule;
pub mod rules;
mod types;

#[cfg(test)]
mod test_support;

pub use collection::{RulesCollection, RulesState, arbitrate};
pub use context::{AbrSupport, RulesContext, ScheduleControl, ThroughputHistory};
pub use error::{RulesError, RulesResult};
pub use history::{EwmaThroughputHistory, ThroughputSample, ThroughputSampleSource};
pub use metrics::{
    BufferState, BufferStateSample, FragmentProgress, FrameTally, MediaMetrics, SwitchTally,
};
pub use options::{
    AbandonFactory, CustomRule, QualitySwitchFactory, RuleFactory, RuleRole, RulesOptions,
};
pub use request::{Priority, SwitchReason, SwitchRequest};
pub use rule::{AbandonRule, QualitySwitchRule};
pub use types::{AbandonmentState, MediaInfo, MediaType, StreamInfo, VariantSource};
