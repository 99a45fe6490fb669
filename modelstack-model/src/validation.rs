use crate::attribute::{AttributeValidation, ValidationErrorKind};
use crate::error::ModelResult;
use crate::tree::ModelTree;
use modelstack_rules::RuleEvaluator;
use modelstack_types::{AttributeId, NodeId};
use tracing::debug;

/// Label reported for a mandatory attribute without a value.
pub const MANDATORY_LABEL: &str = "administration.models.management.validation.mandatory";

/// Label reported for a fulfilled rule that has no label of its own.
pub const RULE_LABEL: &str = "administration.models.management.validation.rule";

/// Recomputes attribute validation from metadata.
///
/// An attribute is invalid when it is mandatory and empty, or when a rule of
/// its validation model applies to its value and is fulfilled. Rule
/// expressions look up the other attributes of the model holding it.
#[derive(Debug, Clone, Default)]
pub struct AttributeValidator {
    evaluator: RuleEvaluator,
}

impl AttributeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluator(evaluator: RuleEvaluator) -> Self {
        Self { evaluator }
    }

    /// Validates one attribute held by `holder` in `context` and records
    /// the result.
    ///
    /// Rule expressions read the values of `holder`. An attribute that
    /// `context` inherits keeps its own state; the result is recorded for
    /// `context` alone, so validating a descendant never changes what its
    /// ancestors report.
    pub fn validate(
        &self,
        tree: &mut ModelTree,
        context: NodeId,
        holder: NodeId,
        attribute: AttributeId,
    ) -> ModelResult<bool> {
        let mut validation = AttributeValidation::default();
        {
            let model = tree.attribute(attribute);
            if let Some(meta) = model.meta() {
                if meta.validation_model.mandatory && model.is_empty() {
                    validation.add(ValidationErrorKind::Mandatory, MANDATORY_LABEL);
                }
                let subject = model.current_value();
                let fulfilled = self.evaluator.fulfilled_rules(&meta.validation_model.rules, &subject, |field| {
                    tree.attribute_value(holder, field)
                })?;
                for rule in fulfilled {
                    let label = rule.error_label.clone().unwrap_or_else(|| RULE_LABEL.to_string());
                    validation.add(ValidationErrorKind::Rule, label);
                }
            }
        }

        let valid = validation.is_valid();
        tree.set_validation(context, attribute, validation);
        Ok(valid)
    }

    /// Validates the attributes `holder` holds, without its children.
    pub fn validate_attributes(&self, tree: &mut ModelTree, context: NodeId, holder: NodeId) -> ModelResult<bool> {
        let mut valid = true;
        let attributes = tree.node(holder).attributes().models().to_vec();
        for attribute in attributes {
            valid &= self.validate(tree, context, holder, attribute)?;
        }
        Ok(valid)
    }

    /// Validates everything `node` holds, inherited entries included, as
    /// seen from `context`.
    pub fn validate_node(&self, tree: &mut ModelTree, context: NodeId, node: NodeId) -> ModelResult<bool> {
        let mut valid = self.validate_attributes(tree, context, node)?;
        for child in tree.held_children(node) {
            valid &= self.validate_node(tree, context, child)?;
        }
        Ok(valid)
    }

    /// Validates a model and everything it holds.
    ///
    /// Agrees with [`ModelTree::is_valid`] until the model changes again.
    pub fn validate_model(&self, tree: &mut ModelTree, node: NodeId) -> ModelResult<bool> {
        let context = tree.owning_model(node);
        let valid = self.validate_node(tree, context, node)?;
        debug!(model = tree.node(node).id(), valid, "validated model");
        Ok(valid)
    }
}
