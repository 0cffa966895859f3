use tracing::{debug, info, trace};

use crate::{
    context::RulesContext,
    options::{RuleFactory, RulesOptions},
    request::{Priority, SwitchRequest},
    rule::{AbandonRule, QualitySwitchRule},
    rules::{
        AbandonRequestsRule, BolaAbandonRule, BolaRule, DroppedFramesRule, InsufficientBufferRule,
        SwitchHistoryRule, ThroughputRule,
    },
    types::MediaType,
};

/// Lifecycle of a [`RulesCollection`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RulesState {
    /// No rules installed; every evaluation is `NO_CHANGE`.
    #[default]
    Empty,
    Ready,
}

/// Combine votes into one decision.
///
/// Abstentions are dropped. Each priority tier resolves to its lowest
/// quality; the highest non-empty tier wins outright (`Strong`, else
/// `Default`, else `Weak`). No votes at all yields `NO_CHANGE`.
///
/// The result keeps the winning tier's priority and the reason of the vote
/// that supplied the minimum (the first such vote on ties).
pub fn arbitrate<I>(votes: I) -> SwitchRequest
where
    I: IntoIterator<Item = SwitchRequest>,
{
    let mut tiers: [Option<SwitchRequest>; Priority::TIERS.len()] = Default::default();

    for vote in votes {
        let Some(quality) = vote.quality else {
            continue;
        };
        let slot = &mut tiers[vote.priority.tier()];
        if slot
            .as_ref()
            .and_then(|best| best.quality)
            .is_none_or(|best| quality < best)
        {
            *slot = Some(vote);
        }
    }

    let [strong, default, weak] = tiers;
    strong.or(default).or(weak).unwrap_or_default()
}

/// Rules aggregator for one media-type pipeline.
///
/// Owns the installed rules, fans each decision point out to them and
/// arbitrates their votes with [`arbitrate`]. Rules run sequentially on the
/// caller's thread; nothing here blocks or performs I/O.
pub struct RulesCollection {
    media_type: MediaType,
    quality_rules: Vec<Box<dyn QualitySwitchRule>>,
    abandon_rules: Vec<Box<dyn AbandonRule>>,
    state: RulesState,
}

impl RulesCollection {
    /// Empty collection; call [`RulesCollection::initialize`] before use.
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            quality_rules: Vec::new(),
            abandon_rules: Vec::new(),
            state: RulesState::Empty,
        }
    }

    /// Install rules according to `options`.
    ///
    /// Built-ins come first: none when default rules are disabled, the
    /// buffer-occupancy pair when enabled, otherwise the multi-heuristic set.
    /// Custom rules follow in registration order. A ready collection is
    /// reset first.
    pub fn initialize(&mut self, options: &RulesOptions) {
        if self.state == RulesState::Ready {
            self.reset();
        }

        if options.use_default_rules {
            let quality = &mut self.quality_rules;
            let abandon = &mut self.abandon_rules;
            if options.buffer_occupancy_enabled {
                quality.push(Box::new(BolaRule::new()));
                abandon.push(Box::new(BolaAbandonRule::new()));
            } else {
                quality.push(Box::new(ThroughputRule::new()));
                quality.push(Box::new(InsufficientBufferRule::new()));
                quality.push(Box::new(SwitchHistoryRule::new()));
                quality.push(Box::new(DroppedFramesRule::new()));
                abandon.push(Box::new(AbandonRequestsRule::new()));
            }
        }

        for custom in &options.custom_rules {
            match custom.factory() {
                RuleFactory::QualitySwitch(factory) => {
                    self.quality_rules.push(factory(self.media_type));
                }
                RuleFactory::AbandonFragment(factory) => {
                    self.abandon_rules.push(factory(self.media_type));
                }
            }
        }

        self.state = RulesState::Ready;
        info!(
            media_type = %self.media_type,
            quality_rules = ?self.quality_rule_names(),
            abandon_rules = ?self.abandon_rule_names(),
            "ABR rules initialized"
        );
    }

    /// Quality the next fragment should be requested at.
    pub fn evaluate_quality(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let votes: Vec<SwitchRequest> = self
            .quality_rules
            .iter_mut()
            .map(|rule| {
                let vote = rule.evaluate_quality(ctx);
                trace!(
                    rule = rule.name(),
                    quality = ?vote.quality,
                    priority = ?vote.priority,
                    "quality vote"
                );
                vote
            })
            .collect();

        let decision = arbitrate(votes);
        debug!(
            media_type = %self.media_type,
            quality = ?decision.quality,
            priority = ?decision.priority,
            "ABR quality decision"
        );
        decision
    }

    /// Whether to abort the in-flight fragment, and the quality to refetch at.
    pub fn evaluate_abandonment(&mut self, ctx: &RulesContext<'_>) -> SwitchRequest {
        let votes: Vec<SwitchRequest> = self
            .abandon_rules
            .iter_mut()
            .map(|rule| {
                let vote = rule.evaluate_abandonment(ctx);
                trace!(
                    rule = rule.name(),
                    quality = ?vote.quality,
                    priority = ?vote.priority,
                    "abandon vote"
                );
                vote
            })
            .collect();

        let decision = arbitrate(votes);
        if decision.is_active() {
            debug!(
                media_type = %self.media_type,
                quality = ?decision.quality,
                priority = ?decision.priority,
                "ABR abandonment decision"
            );
        }
        decision
    }

    /// Reset every rule's rolling state, then uninstall all rules.
    pub fn reset(&mut self) {
        for rule in &mut self.quality_rules {
            rule.reset();
        }
        for rule in &mut self.abandon_rules {
            rule.reset();
        }
        self.quality_rules.clear();
        self.abandon_rules.clear();
        self.state = RulesState::Empty;
        info!(media_type = %self.media_type, "ABR rules reset");
    }

    pub fn state(&self) -> RulesState {
        self.state
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Installed quality-switch rules, in evaluation order.
    pub fn quality_rule_names(&self) -> Vec<&str> {
        self.quality_rules.iter().map(|r| r.name()).collect()
    }

    /// Installed abandonment rules, in evaluation order.
    pub fn abandon_rule_names(&self) -> Vec<&str> {
        self.abandon_rules.iter().map(|r| r.name()).collect()
    }
}

impl std::fmt::Debug for RulesCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesCollection")
            .field("media_type", &self.media_type)
            .field("state", &self.state)
            .field("quality_rules", &self.quality_rule_names())
            .field("abandon_rules", &self.abandon_rule_names())
            .finish()
    }
}
