use std::{fmt, str::FromStr, sync::Arc};

use derive_setters::Setters;

use crate::{
    error::{RulesError, RulesResult},
    rule::{AbandonRule, QualitySwitchRule},
    types::MediaType,
};

/// Builds a fresh quality-switch rule for one pipeline.
pub type QualitySwitchFactory = Arc<dyn Fn(MediaType) -> Box<dyn QualitySwitchRule> + Send + Sync>;

/// Builds a fresh abandonment rule for one pipeline.
pub type AbandonFactory = Arc<dyn Fn(MediaType) -> Box<dyn AbandonRule> + Send + Sync>;

/// Role a custom rule plays in the collection.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RuleRole {
    QualitySwitch,
    AbandonFragment,
}

impl RuleRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QualitySwitch => "quality-switch",
            Self::AbandonFragment => "abandon-fragment",
        }
    }
}

impl fmt::Display for RuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleRole {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quality-switch" | "qualitySwitchRules" => Ok(Self::QualitySwitch),
            "abandon-fragment" | "abandonFragmentRules" => Ok(Self::AbandonFragment),
            other => Err(RulesError::UnknownRole(other.to_owned())),
        }
    }
}

/// Constructor of a custom rule, tagged by the contract it implements.
#[derive(Clone)]
pub enum RuleFactory {
    QualitySwitch(QualitySwitchFactory),
    AbandonFragment(AbandonFactory),
}

impl RuleFactory {
    pub fn role(&self) -> RuleRole {
        match self {
            Self::QualitySwitch(_) => RuleRole::QualitySwitch,
            Self::AbandonFragment(_) => RuleRole::AbandonFragment,
        }
    }
}

impl fmt::Debug for RuleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuleFactory").field(&self.role()).finish()
    }
}

/// Caller-registered rule appended after the built-in set.
#[derive(Clone, Debug)]
pub struct CustomRule {
    factory: RuleFactory,
}

impl CustomRule {
    /// Register a rule under an explicit role.
    ///
    /// # Errors
    ///
    /// [`RulesError::RoleMismatch`] when `factory` does not build rules for `role`.
    pub fn new(role: RuleRole, factory: RuleFactory) -> RulesResult<Self> {
        let built = factory.role();
        if built != role {
            return Err(RulesError::RoleMismatch {
                role,
                factory: built,
            });
        }
        Ok(Self { factory })
    }

    /// Register a rule under a textual role tag
    /// (`quality-switch` / `abandon-fragment`).
    ///
    /// # Errors
    ///
    /// [`RulesError::UnknownRole`] for an unrecognised tag,
    /// [`RulesError::RoleMismatch`] as for [`CustomRule::new`].
    pub fn from_tag(tag: &str, factory: RuleFactory) -> RulesResult<Self> {
        Self::new(tag.parse()?, factory)
    }

    pub fn quality_switch<F>(factory: F) -> Self
    where
        F: Fn(MediaType) -> Box<dyn QualitySwitchRule> + Send + Sync + 'static,
    {
        Self {
            factory: RuleFactory::QualitySwitch(Arc::new(factory)),
        }
    }

    pub fn abandon_fragment<F>(factory: F) -> Self
    where
        F: Fn(MediaType) -> Box<dyn AbandonRule> + Send + Sync + 'static,
    {
        Self {
            factory: RuleFactory::AbandonFragment(Arc::new(factory)),
        }
    }

    pub fn role(&self) -> RuleRole {
        self.factory.role()
    }

    pub fn factory(&self) -> &RuleFactory {
        &self.factory
    }
}

/// Configuration consumed by [`RulesCollection::initialize`](crate::RulesCollection::initialize).
///
/// Cheap to clone; one value may be shared read-only by every pipeline.
#[derive(Clone, Debug, Setters)]
#[setters(prefix = "with_")]
pub struct RulesOptions {
    /// Install the built-in rule set.
    pub use_default_rules: bool,
    /// Use the buffer-occupancy (BOLA) pair instead of the multi-heuristic set.
    pub buffer_occupancy_enabled: bool,
    /// Custom rules in registration order.
    #[setters(skip)]
    pub custom_rules: Vec<CustomRule>,
}

impl Default for RulesOptions {
    fn default() -> Self {
        Self {
            use_default_rules: true,
            buffer_occupancy_enabled: false,
            custom_rules: Vec::new(),
        }
    }
}

impl RulesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a custom rule after those already registered.
    #[must_use]
    pub fn with_custom_rule(mut self, rule: CustomRule) -> Self {
        self.custom_rules.push(rule);
        self
    }
}
