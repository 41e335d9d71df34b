//! Declarative per-field rules and the validator built from them.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use super::Validator;
use crate::answers::{AnswerSet, AnswerValue, FieldErrors};
use crate::errors::FlowError;
use crate::step::{FieldDefinition, FieldKind};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Rules attached to a field in a flow definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldRules {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Message shown when `pattern` does not match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    /// Minimum number of entries for list fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
}

#[derive(Debug, Clone)]
struct CompiledField {
    label: String,
    kind: FieldKind,
    options: Vec<String>,
    rules: FieldRules,
    pattern: Option<Regex>,
}

impl CompiledField {
    fn check(&self, value: &AnswerValue) -> Option<String> {
        let label = &self.label;

        if value.is_blank() {
            if self.rules.required {
                return Some(format!("{} is required", label));
            }
            return match (self.kind, self.rules.min_items) {
                (FieldKind::List, Some(min)) if min > 0 => self.check_list(&[]),
                _ => None,
            };
        }

        match (self.kind, value) {
            (FieldKind::Bool, AnswerValue::Bool(_)) => None,
            (FieldKind::Bool, _) => Some(format!("{} must be yes or no", label)),
            (FieldKind::Number, AnswerValue::Number(_)) => None,
            (FieldKind::Number, AnswerValue::Text(s)) if s.trim().parse::<f64>().is_ok() => None,
            (FieldKind::Number, _) => Some(format!("{} must be a number", label)),
            (FieldKind::List, AnswerValue::List(items)) => self.check_list(items),
            (FieldKind::List, _) => Some(format!("{} must be a list", label)),
            (_, AnswerValue::Text(s)) => self.check_text(s.trim()),
            (_, other) => self.check_text(&other.display()),
        }
    }

    fn check_text(&self, text: &str) -> Option<String> {
        let label = &self.label;
        let len = text.chars().count();

        if let Some(min) = self.rules.min_length
            && len < min
        {
            return Some(format!("{} must be at least {} characters", label, min));
        }
        if let Some(max) = self.rules.max_length
            && len > max
        {
            return Some(format!("{} must be at most {} characters", label, max));
        }
        if self.kind == FieldKind::Email && !EMAIL.is_match(text) {
            return Some(format!("{} must be a valid email address", label));
        }
        if self.kind == FieldKind::Select && !self.options.iter().any(|o| o == text) {
            return Some(format!(
                "{} must be one of: {}",
                label,
                self.options.join(", ")
            ));
        }
        if let Some(pattern) = &self.pattern
            && !pattern.is_match(text)
        {
            return Some(
                self.rules
                    .pattern_message
                    .clone()
                    .unwrap_or_else(|| format!("{} has an invalid format", label)),
            );
        }
        None
    }

    fn check_list(&self, items: &[String]) -> Option<String> {
        let items: Vec<&str> = items
            .iter()
            .map(|i| i.trim())
            .filter(|i| !i.is_empty())
            .collect();

        if let Some(min) = self.rules.min_items
            && items.len() < min
        {
            return Some(format!(
                "Select at least {} {}",
                min,
                self.label.to_lowercase()
            ));
        }
        if let Some(pattern) = &self.pattern
            && let Some(bad) = items.iter().find(|i| !pattern.is_match(i))
        {
            return Some(
                self.rules
                    .pattern_message
                    .clone()
                    .unwrap_or_else(|| format!("{} contains an invalid entry: {}", self.label, bad)),
            );
        }
        None
    }
}

/// Validator driven by the rules declared on each field.
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    fields: HashMap<String, CompiledField>,
}

impl RuleValidator {
    /// Compile the rules of every field. Patterns are compiled once here.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, FlowError>
    where
        I: IntoIterator<Item = &'a FieldDefinition>,
    {
        let mut compiled = HashMap::new();
        for field in fields {
            if field.kind == FieldKind::Select && field.options.is_empty() {
                return Err(FlowError::MissingOptions(field.key.clone()));
            }
            let pattern = field
                .rules
                .pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|source| FlowError::InvalidPattern {
                    key: field.key.clone(),
                    source,
                })?;
            compiled.insert(
                field.key.clone(),
                CompiledField {
                    label: field.label.clone(),
                    kind: field.kind,
                    options: field.options.clone(),
                    rules: field.rules.clone(),
                    pattern,
                },
            );
        }
        Ok(Self { fields: compiled })
    }

    /// Synchronous check of a subset; `validate` delegates here.
    pub fn check(&self, subset: &AnswerSet) -> FieldErrors {
        subset
            .iter()
            .filter_map(|(key, value)| {
                let field = self.fields.get(key)?;
                field.check(value).map(|msg| (key.to_string(), msg))
            })
            .collect()
    }
}

#[async_trait]
impl Validator for RuleValidator {
    async fn validate(&self, subset: &AnswerSet) -> FieldErrors {
        self.check(subset)
    }
}
