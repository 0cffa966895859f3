//! Strategy contract.
//!
//! A rule is long-lived for the life of its [`RulesCollection`](crate::RulesCollection)
//! and may keep private rolling state. Returning [`SwitchRequest::no_change`]
//! is an abstention; any quality is an active vote at the attached priority.

use crate::{context::RulesContext, request::SwitchRequest};

/// Rule voting for the quality of the next fragment.
pub trait QualitySwitchRule: Send {
    /// Name used in logs and for composition inspection.
    fn name(&self) -> &str;

    fn evaluate_quality(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest;

    /// Clear private rolling state. Stateless rules keep the default.
    fn reset(&mut self) {}
}

/// Rule voting to abandon the in-flight fragment.
///
/// An active vote means "abort the current fetch and request this lower
/// quality instead".
pub trait AbandonRule: Send {
    /// Name used in logs and for composition inspection.
    fn name(&self) -> &str;

    fn evaluate_abandonment(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest;

    /// Clear private rolling state. Stateless rules keep the default.
    fn reset(&mut self) {}
}
