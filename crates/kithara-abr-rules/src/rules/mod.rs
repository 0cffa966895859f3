//! Built-in rules.
//!
//! The multi-heuristic set ([`ThroughputRule`], [`InsufficientBufferRule`],
//! [`SwitchHistoryRule`], [`DroppedFramesRule`] with [`AbandonRequestsRule`])
//! and the buffer-occupancy pair ([`BolaRule`] with [`BolaAbandonRule`]) are
//! mutually exclusive; see [`RulesCollection::initialize`](crate::RulesCollection::initialize).

mod abandon_requests;
mod bola;
mod dropped_frames;
mod insufficient_buffer;
mod switch_history;
mod throughput;

pub use abandon_requests::AbandonRequestsRule;
pub use bola::{BolaAbandonRule, BolaRule};
pub use dropped_frames::DroppedFramesRule;
pub use insufficient_buffer::InsufficientBufferRule;
pub use switch_history::SwitchHistoryRule;
pub use throughput::{ThroughputObservation, ThroughputRule};
