use thiserror::Error;

use crate::options::RuleRole;

/// Result type used by `kithara-abr-rules`.
pub type RulesResult<T> = Result<T, RulesError>;

/// Errors produced while registering rules.
///
/// Decision paths never fail: a rule without enough data abstains instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RulesError {
    #[error("unknown rule role: {0:?}")]
    UnknownRole(String),

    #[error("rule registered as {role} but its factory builds {factory} rules")]
    RoleMismatch { role: RuleRole, factory: RuleRole },
}
