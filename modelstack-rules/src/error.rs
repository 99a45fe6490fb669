//! Error types for rule evaluation.

use thiserror::Error;

/// Result type for rule operations.
pub type RuleResult<T> = Result<T, RuleError>;

/// Errors that can occur while evaluating rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The expression names an operation no command is registered for.
    #[error("unknown rule operation: {0}")]
    UnknownOperation(String),

    /// A `match`/`not_match` operand is not a valid pattern.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// An operand has a type the operation cannot use.
    #[error("invalid operand for {operation}: {operand}")]
    InvalidOperand { operation: String, operand: String },
}
