use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the results of a rule's expressions are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleCondition {
    /// Every expression must hold.
    #[default]
    And,
    /// At least one expression must hold.
    Or,
}

/// One boolean test: look up `field` on the subject and apply `operation`
/// with `values` as operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleExpression {
    pub field: String,
    pub operation: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl RuleExpression {
    pub fn new(field: impl Into<String>, operation: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            operation: operation.into(),
            values,
        }
    }
}

/// A declarative rule attached to attribute metadata.
///
/// `values` lists the subject values the rule applies to. When it is absent
/// the rule applies to every value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default)]
    pub condition: RuleCondition,
    #[serde(default)]
    pub expressions: Vec<RuleExpression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_label: Option<String>,
}

impl ModelRule {
    /// Creates a wildcard rule with no expressions.
    pub fn new(condition: RuleCondition) -> Self {
        Self {
            values: None,
            condition,
            expressions: Vec::new(),
            error_label: None,
        }
    }

    /// Restricts the rule to the given subject values.
    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = Some(values);
        self
    }

    /// Adds an expression.
    pub fn with_expression(mut self, expression: RuleExpression) -> Self {
        self.expressions.push(expression);
        self
    }

    /// Sets the label reported when the rule is fulfilled during validation.
    pub fn with_error_label(mut self, label: impl Into<String>) -> Self {
        self.error_label = Some(label.into());
        self
    }
}
