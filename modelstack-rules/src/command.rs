//! Rule commands: the named operations an expression can apply.
//!
//! Commands are stateless apart from caches, so a registry is built once and
//! shared by every evaluation.

use crate::error::{RuleError, RuleResult};
use regex_lite::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A named boolean operation over a subject value and a list of operands.
pub trait RuleCommand: Send + Sync {
    /// The operation name used in rule expressions.
    fn name(&self) -> &str;

    /// Applies the operation.
    fn execute(&self, value: &Value, operands: &[Value]) -> RuleResult<bool>;
}

/// Renders a scalar as the text used for comparisons and pattern matching.
///
/// `null` renders as the empty string so that "no value" can be matched by
/// patterns accepting empty input.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn subject_texts(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect(),
        other => vec![value_text(other)],
    }
}

/// Membership test: the value (or any element of an array value) is one of
/// the operands.
#[derive(Debug, Default)]
pub struct InCommand;

impl RuleCommand for InCommand {
    fn name(&self) -> &str {
        "in"
    }

    fn execute(&self, value: &Value, operands: &[Value]) -> RuleResult<bool> {
        let candidates: Vec<String> = operands.iter().map(value_text).collect();
        Ok(subject_texts(value)
            .iter()
            .any(|text| candidates.contains(text)))
    }
}

/// Negated membership test.
#[derive(Debug, Default)]
pub struct NotInCommand;

impl RuleCommand for NotInCommand {
    fn name(&self) -> &str {
        "not_in"
    }

    fn execute(&self, value: &Value, operands: &[Value]) -> RuleResult<bool> {
        InCommand.execute(value, operands).map(|found| !found)
    }
}

/// Compiles patterns on first use and keeps them for later evaluations.
#[derive(Debug, Default)]
struct PatternCache {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl PatternCache {
    fn get(&self, operation: &str, operand: &Value) -> RuleResult<Regex> {
        let Value::String(pattern) = operand else {
            return Err(RuleError::InvalidOperand {
                operation: operation.to_string(),
                operand: operand.to_string(),
            });
        };

        if let Ok(cache) = self.compiled.read() {
            if let Some(regex) = cache.get(pattern) {
                return Ok(regex.clone());
            }
        }

        let regex = Regex::new(pattern).map_err(|e| RuleError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        if let Ok(mut cache) = self.compiled.write() {
            cache.insert(pattern.clone(), regex.clone());
        }
        Ok(regex)
    }

    fn any_match(&self, operation: &str, value: &Value, operands: &[Value]) -> RuleResult<bool> {
        let texts = subject_texts(value);
        for operand in operands {
            let regex = self.get(operation, operand)?;
            if texts.iter().any(|text| regex.is_match(text)) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// The value matches at least one of the supplied patterns.
#[derive(Debug, Default)]
pub struct MatchCommand {
    patterns: PatternCache,
}

impl RuleCommand for MatchCommand {
    fn name(&self) -> &str {
        "match"
    }

    fn execute(&self, value: &Value, operands: &[Value]) -> RuleResult<bool> {
        self.patterns.any_match(self.name(), value, operands)
    }
}

/// The value fails to match every supplied pattern.
#[derive(Debug, Default)]
pub struct NotMatchCommand {
    patterns: PatternCache,
}

impl RuleCommand for NotMatchCommand {
    fn name(&self) -> &str {
        "not_match"
    }

    fn execute(&self, value: &Value, operands: &[Value]) -> RuleResult<bool> {
        self.patterns
            .any_match(self.name(), value, operands)
            .map(|matched| !matched)
    }
}

/// Commands available to an evaluator, keyed by operation name.
#[derive(Clone)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn RuleCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(InCommand));
        registry.register(Arc::new(NotInCommand));
        registry.register(Arc::new(MatchCommand::default()));
        registry.register(Arc::new(NotMatchCommand::default()));
        registry
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, command: Arc<dyn RuleCommand>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Looks up a command by operation name.
    pub fn get(&self, operation: &str) -> RuleResult<&Arc<dyn RuleCommand>> {
        self.commands
            .get(operation)
            .ok_or_else(|| RuleError::UnknownOperation(operation.to_string()))
    }

    /// Returns whether an operation is registered.
    pub fn contains(&self, operation: &str) -> bool {
        self.commands.contains_key(operation)
    }

    /// Returns the registered operation names, sorted.
    pub fn operations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("operations", &self.operations())
            .finish()
    }
}
