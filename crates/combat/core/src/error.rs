//! Common error infrastructure for combat-core.
//!
//! Expected failures of rule operations are values, not panics: every
//! operation that can be refused returns `Result<T, FailureReason>` and
//! callers branch on the reason (the AI falls back to melee on
//! `out-of-range` or `cannot-cast`, for example).
//!
//! # Design Principles
//!
//! - **Stable codes**: every reason has a kebab-case code shared with
//!   observability tooling and request notices
//! - **Severity Classification**: errors are categorized for recovery strategies
//! - **Forward-only**: a refused operation never leaves partial effects behind

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry later or with an alternative action.
    ///
    /// Examples: target out of range, ability on cooldown
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown combatant, catalog entry not found
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait RuleError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Structured reason an operation was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureReason {
    /// No valid target could be resolved.
    #[error("no target")]
    NoTarget,

    /// Caster cannot pay the mana cost.
    #[error("insufficient mana")]
    InsufficientMana,

    /// Target is farther than the ability's range and no step can close it.
    #[error("out of range")]
    OutOfRange,

    /// A declared prerequisite of the operation is not met.
    #[error("prerequisite not met")]
    PrereqNotMet,

    /// Ability or shared group is still cooling down.
    #[error("cooldown active")]
    CooldownActive,

    /// Actor is mesmerized.
    #[error("cannot act")]
    CannotAct,

    /// Actor is mesmerized, stunned or muted.
    #[error("cannot cast")]
    CannotCast,

    /// Actor is mesmerized or immobilized.
    #[error("cannot move")]
    CannotMove,

    /// Ability is already at its maximum rank.
    #[error("max rank reached")]
    MaxRank,

    /// Catalog does not contain the referenced record.
    #[error("catalog entry not found")]
    CatalogNotFound,

    /// Requester has no ownership relation to the combatant.
    #[error("no permission")]
    NoPermission,

    /// A maintained effect was started fewer than `cadence_rounds` ago.
    #[error("performance cadence not elapsed")]
    Cadence,

    /// No free grid cell near the anchor.
    #[error("no free placement")]
    NoPlacement,

    /// Referenced combatant does not exist.
    #[error("combatant not found")]
    NotFound,

    /// Two-phase step was cancelled before commit.
    #[error("cancelled before commit")]
    Cancelled,
}

impl FailureReason {
    /// Kebab-case reason code, stable across releases.
    pub const fn code(&self) -> &'static str {
        use FailureReason::*;
        match self {
            NoTarget => "no-target",
            InsufficientMana => "insufficient-mana",
            OutOfRange => "out-of-range",
            PrereqNotMet => "prereq-not-met",
            CooldownActive => "cooldown-active",
            CannotAct => "cannot-act",
            CannotCast => "cannot-cast",
            CannotMove => "cannot-move",
            MaxRank => "max-rank",
            CatalogNotFound => "catalog-not-found",
            NoPermission => "no-permission",
            Cadence => "cadence",
            NoPlacement => "no-placement",
            NotFound => "not-found",
            Cancelled => "cancelled",
        }
    }

    /// Whether the AI should fall back to a melee swing after this failure.
    pub const fn falls_back_to_melee(&self) -> bool {
        use FailureReason::*;
        matches!(
            self,
            OutOfRange | CannotCast | InsufficientMana | CooldownActive | Cancelled | NoTarget
        )
    }
}

impl RuleError for FailureReason {
    fn severity(&self) -> ErrorSeverity {
        use FailureReason::*;
        match self {
            NoTarget | OutOfRange | CooldownActive | InsufficientMana => {
                ErrorSeverity::Recoverable
            }
            CannotAct | CannotCast | CannotMove | Cadence | NoPlacement | Cancelled => {
                ErrorSeverity::Recoverable
            }
            PrereqNotMet | MaxRank | CatalogNotFound | NoPermission | NotFound => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        self.code()
    }
}

/// Shorthand for rule operations.
pub type RuleResult<T> = Result<T, FailureReason>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_kebab_case() {
        assert_eq!(FailureReason::NoTarget.code(), "no-target");
        assert_eq!(FailureReason::InsufficientMana.code(), "insufficient-mana");
        assert_eq!(FailureReason::CatalogNotFound.error_code(), "catalog-not-found");
    }

    #[test]
    fn melee_fallback_reasons() {
        assert!(FailureReason::OutOfRange.falls_back_to_melee());
        assert!(FailureReason::CannotCast.falls_back_to_melee());
        assert!(!FailureReason::NoPermission.falls_back_to_melee());
    }
}
