//! Chart of accounts error types.

use thiserror::Error;

/// A chart-of-accounts invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartRule {
    /// An account cannot be its own parent.
    SelfParent,
    /// The parent chain must not loop back to the account.
    ParentCycle,
    /// A child must have the same type as its parent.
    TypeMismatch,
    /// An account with children cannot be postable.
    PostableWithChildren,
    /// The referenced parent must exist.
    ParentNotFound,
}

impl ChartRule {
    /// Returns the stable rule identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SelfParent => "self_parent",
            Self::ParentCycle => "parent_cycle",
            Self::TypeMismatch => "type_mismatch",
            Self::PostableWithChildren => "postable_with_children",
            Self::ParentNotFound => "parent_not_found",
        }
    }

    /// Returns the human-readable description of the violation.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::SelfParent => "Account cannot be its own parent",
            Self::ParentCycle => "Invalid parent: parent-child cycle detected",
            Self::TypeMismatch => "Account type must match parent account type",
            Self::PostableWithChildren => {
                "This account has child accounts, so it cannot be postable; make it a group account"
            }
            Self::ParentNotFound => "Parent account does not exist",
        }
    }
}

impl std::fmt::Display for ChartRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors raised by chart-of-accounts validation.
#[derive(Debug, Error)]
pub enum ChartError {
    /// A tree invariant would be broken.
    #[error("Invariant violation ({}): {}", .0.as_str(), .0.message())]
    InvariantViolation(ChartRule),

    /// Stored account type is not one of the known types.
    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    /// A field exceeds its maximum length.
    #[error("{field} must be at most {max} characters")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length.
        max: usize,
    },

    /// A required field is blank.
    #[error("{0} is required")]
    FieldRequired(&'static str),
}

impl ChartError {
    /// Returns the broken rule, if this is an invariant violation.
    #[must_use]
    pub const fn rule(&self) -> Option<ChartRule> {
        match self {
            Self::InvariantViolation(rule) => Some(*rule),
            _ => None,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Self::UnknownAccountType(_) => "UNKNOWN_ACCOUNT_TYPE",
            Self::FieldTooLong { .. } | Self::FieldRequired(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvariantViolation(_) => 422,
            Self::UnknownAccountType(_) | Self::FieldTooLong { .. } | Self::FieldRequired(_) => {
                400
            }
        }
    }
}

impl From<ChartRule> for ChartError {
    fn from(rule: ChartRule) -> Self {
        Self::InvariantViolation(rule)
    }
}
