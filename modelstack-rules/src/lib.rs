//! Declarative rule evaluation for ModelStack.
//!
//! Rules describe conditions over the attribute values of a model entity and
//! drive conditional validation of attributes:
//! - [`ModelRule`]: the rule itself (applicable values, condition, expressions)
//! - [`RuleCommand`]: a named boolean operation (`in`, `not_match`, ...)
//! - [`CommandRegistry`]: the set of commands, loaded once per evaluator
//! - [`RuleEvaluator`]: evaluates rules synchronously against a value resolver
//!
//! # Example
//!
//! ```
//! use modelstack_rules::{ModelRule, RuleCondition, RuleEvaluator, RuleExpression};
//! use serde_json::json;
//!
//! let rule = ModelRule::new(RuleCondition::And)
//!     .with_expression(RuleExpression::new("displayType", "in", vec![json!("READ_ONLY")]));
//!
//! let evaluator = RuleEvaluator::new();
//! let fulfilled = evaluator
//!     .evaluate_rule(&rule, &json!(null), |_| Some(json!("READ_ONLY")))
//!     .unwrap();
//! assert!(fulfilled);
//! ```

mod command;
mod error;
mod evaluator;
mod rule;

pub use command::{
    CommandRegistry, InCommand, MatchCommand, NotInCommand, NotMatchCommand, RuleCommand,
    value_text,
};
pub use error::{RuleError, RuleResult};
pub use evaluator::RuleEvaluator;
pub use rule::{ModelRule, RuleCondition, RuleExpression};
