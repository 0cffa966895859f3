use std::collections::BTreeMap;

/// Authority of a rule's vote.
///
/// Arbitration resolves strictly `Strong > Default > Weak`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Priority {
    Strong,
    #[default]
    Default,
    Weak,
}

impl Priority {
    /// All priorities, highest first.
    pub const TIERS: [Self; 3] = [Self::Strong, Self::Default, Self::Weak];

    /// Position in [`Priority::TIERS`].
    pub(crate) const fn tier(self) -> usize {
        match self {
            Self::Strong => 0,
            Self::Default => 1,
            Self::Weak => 2,
        }
    }
}

/// Diagnostic data attached to a vote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwitchReason {
    pub message: Option<&'static str>,
    pub values: BTreeMap<&'static str, f64>,
}

impl SwitchReason {
    pub fn new(message: &'static str) -> Self {
        Self {
            message: Some(message),
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, key: &'static str, value: f64) -> Self {
        self.values.insert(key, value);
        self
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}

/// A quality vote produced by a rule, and the aggregated decision.
///
/// `quality == None` is `NO_CHANGE`: the rule abstains and the host keeps
/// its current quality. Equality ignores `reason`.
#[derive(Clone, Debug, Default)]
pub struct SwitchRequest {
    pub quality: Option<usize>,
    pub priority: Priority,
    pub reason: Option<SwitchReason>,
}

impl SwitchRequest {
    /// `NO_CHANGE` at `Default` priority.
    pub fn no_change() -> Self {
        Self::default()
    }

    pub fn new(quality: usize, priority: Priority) -> Self {
        Self {
            quality: Some(quality),
            priority,
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: SwitchReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Whether this is an actual vote rather than an abstention.
    pub fn is_active(&self) -> bool {
        self.quality.is_some()
    }
}

impl PartialEq for SwitchRequest {
    fn eq(&self, other: &Self) -> bool {
        self.quality == other.quality && self.priority == other.priority
    }
}

impl Eq for SwitchRequest {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_no_change_at_default_priority() {
        let request = SwitchRequest::default();
        assert_eq!(request.quality, None);
        assert_eq!(request.priority, Priority::Default);
        assert!(!request.is_active());
        assert_eq!(request, SwitchRequest::no_change());
    }

    #[test]
    fn equality_ignores_reason() {
        let plain = SwitchRequest::new(2, Priority::Weak);
        let annotated = SwitchRequest::new(2, Priority::Weak)
            .with_reason(SwitchReason::new("buffer ran dry").with_value("level", 0.0));
        assert_eq!(plain, annotated);
    }

    #[test]
    fn equality_respects_priority() {
        assert_ne!(
            SwitchRequest::new(1, Priority::Strong),
            SwitchRequest::new(1, Priority::Default)
        );
    }

    #[test]
    fn tiers_are_ordered_highest_first() {
        for (idx, priority) in Priority::TIERS.iter().enumerate() {
            assert_eq!(priority.tier(), idx);
        }
    }

    #[test]
    fn reason_values_lookup() {
        let reason = SwitchReason::default()
            .with_value("throughput", 1_500.0)
            .with_value("latency", 40.0);
        assert_eq!(reason.value("throughput"), Some(1_500.0));
        assert_eq!(reason.value("latency"), Some(40.0));
        assert_eq!(reason.value("missing"), None);
        assert_eq!(reason.message, None);
    }
}
