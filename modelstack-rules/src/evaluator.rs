//! Rule evaluator.
//!
//! Evaluation is synchronous: the caller supplies a resolver that maps an
//! expression's `field` to the subject entity's current attribute value.

use crate::command::{CommandRegistry, value_text};
use crate::error::RuleResult;
use crate::rule::{ModelRule, RuleCondition, RuleExpression};
use serde_json::Value;
use tracing::debug;

/// Evaluates [`ModelRule`]s using a fixed set of commands.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    registry: CommandRegistry,
}

impl RuleEvaluator {
    /// Creates an evaluator with the built-in commands.
    pub fn new() -> Self {
        Self::with_registry(CommandRegistry::with_builtins())
    }

    /// Creates an evaluator with a custom command registry.
    pub fn with_registry(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    /// Returns the command registry.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Whether the rule applies to the given subject value.
    pub fn is_applicable(&self, rule: &ModelRule, subject: &Value) -> bool {
        match &rule.values {
            None => true,
            Some(values) => {
                let text = value_text(subject);
                values.iter().any(|v| value_text(v) == text)
            }
        }
    }

    /// Evaluates a single expression against the resolved field value.
    /// Unresolvable fields evaluate against `null`.
    pub fn evaluate_expression<F>(&self, expression: &RuleExpression, resolve: &F) -> RuleResult<bool>
    where
        F: Fn(&str) -> Option<Value>,
    {
        let command = self.registry.get(&expression.operation)?;
        let value = resolve(&expression.field).unwrap_or(Value::Null);
        command.execute(&value, &expression.values)
    }

    /// Evaluates a rule.
    ///
    /// The rule is fulfilled when it applies to `subject` and its expressions,
    /// combined by the rule's condition, hold. A rule without expressions is
    /// fulfilled whenever it applies.
    pub fn evaluate_rule<F>(&self, rule: &ModelRule, subject: &Value, resolve: F) -> RuleResult<bool>
    where
        F: Fn(&str) -> Option<Value>,
    {
        if !self.is_applicable(rule, subject) {
            return Ok(false);
        }

        let fulfilled = match rule.condition {
            RuleCondition::And => {
                let mut all = true;
                for expression in &rule.expressions {
                    if !self.evaluate_expression(expression, &resolve)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            RuleCondition::Or => {
                let mut any = rule.expressions.is_empty();
                for expression in &rule.expressions {
                    if self.evaluate_expression(expression, &resolve)? {
                        any = true;
                        break;
                    }
                }
                any
            }
        };

        debug!(
            condition = ?rule.condition,
            expressions = rule.expressions.len(),
            fulfilled,
            "evaluated rule"
        );
        Ok(fulfilled)
    }

    /// Returns the rules that are fulfilled for the subject.
    pub fn fulfilled_rules<'r, F>(
        &self,
        rules: &'r [ModelRule],
        subject: &Value,
        resolve: F,
    ) -> RuleResult<Vec<&'r ModelRule>>
    where
        F: Fn(&str) -> Option<Value>,
    {
        let mut fulfilled = Vec::new();
        for rule in rules {
            if self.evaluate_rule(rule, subject, &resolve)? {
                fulfilled.push(rule);
            }
        }
        Ok(fulfilled)
    }
}
