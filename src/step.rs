//! Step definitions and the ordered step registry for a wizard.
//!
//! A registry is immutable once built and shared read-only (`Arc`) by every
//! wizard instance of the same flow. Indices are 1-based and contiguous;
//! names are the stable tokens written into the URL.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::answers::{AnswerSet, AnswerValue};
use crate::errors::RegistryError;
use crate::validation::FieldRules;
use crate::wizard::Position;

/// URL token reserved for the review screen.
pub const REVIEW_TOKEN: &str = "review";

static STEP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("step name pattern is valid"));

/// Input kind of a field; drives prompting and implicit validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Number,
    Bool,
    List,
    /// One of `FieldDefinition::options`
    Select,
}

/// A single answer-set key owned by a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    /// Allowed values for `Select` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub rules: FieldRules,
}

impl FieldDefinition {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            options: Vec::new(),
            rules: FieldRules::default(),
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.kind = FieldKind::Select;
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn required(mut self) -> Self {
        self.rules.required = true;
        self
    }

    pub fn with_rules(mut self, rules: FieldRules) -> Self {
        self.rules = rules;
        self
    }

    /// Turn raw text typed by the user into an answer value for this field.
    ///
    /// Blank input becomes `Null`. Numbers that do not parse stay text so
    /// the validator can report them.
    pub fn parse_input(&self, raw: &str) -> AnswerValue {
        let raw = raw.trim();
        if raw.is_empty() {
            return AnswerValue::Null;
        }
        match self.kind {
            FieldKind::Number => raw
                .parse::<f64>()
                .map(AnswerValue::Number)
                .unwrap_or_else(|_| AnswerValue::from(raw)),
            FieldKind::Bool => match raw.to_lowercase().as_str() {
                "y" | "yes" | "true" => AnswerValue::Bool(true),
                "n" | "no" | "false" => AnswerValue::Bool(false),
                _ => AnswerValue::from(raw),
            },
            FieldKind::List => AnswerValue::List(
                raw.split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
            FieldKind::Text | FieldKind::Email | FieldKind::Select => AnswerValue::from(raw),
        }
    }
}

/// One ordered unit of data entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// 1-based position, assigned by the registry
    #[serde(default)]
    pub index: usize,
    /// Stable identifier used as the URL token
    pub name: String,
    /// Heading shown to the user
    #[serde(default)]
    pub title: String,
    /// Fields this step validates before it can be left forward
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl StepDefinition {
    pub fn new(name: &str, title: &str, fields: Vec<FieldDefinition>) -> Self {
        Self {
            index: 0,
            name: name.to_string(),
            title: title.to_string(),
            fields,
        }
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn owns(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Ordered, validated list of steps.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
    owners: HashMap<String, usize>,
}

impl StepRegistry {
    /// Build a registry, assigning contiguous 1-based indices in list order.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, RegistryError> {
        if steps.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut steps = steps;
        let mut owners: HashMap<String, usize> = HashMap::new();
        let mut names: Vec<&str> = Vec::with_capacity(steps.len());

        for (i, step) in steps.iter().enumerate() {
            if step.name == REVIEW_TOKEN {
                return Err(RegistryError::ReservedStepName(step.name.clone()));
            }
            if !STEP_NAME.is_match(&step.name) {
                return Err(RegistryError::InvalidStepName(step.name.clone()));
            }
            if names.contains(&step.name.as_str()) {
                return Err(RegistryError::DuplicateStepName(step.name.clone()));
            }
            names.push(&step.name);

            for key in step.field_keys() {
                if let Some(&owner) = owners.get(key) {
                    return Err(RegistryError::DuplicateField {
                        key: key.to_string(),
                        first: steps[owner].name.clone(),
                        second: step.name.clone(),
                    });
                }
                owners.insert(key.to_string(), i);
            }
        }

        for (i, step) in steps.iter_mut().enumerate() {
            step.index = i + 1;
        }

        Ok(Self { steps, owners })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Step at a 1-based index.
    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        index.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn by_name(&self, name: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Step owning a field key.
    pub fn owner_of(&self, key: &str) -> Option<&StepDefinition> {
        self.owners.get(key).map(|&i| &self.steps[i])
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.owner_of(key).and_then(|s| s.field(key))
    }

    pub fn all_keys(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().flat_map(|s| s.field_keys())
    }

    /// Resolve a URL token to a position. `None` when unknown.
    pub fn position_for_token(&self, token: &str) -> Option<Position> {
        if token == REVIEW_TOKEN {
            return Some(Position::Review);
        }
        self.by_name(token).map(|s| Position::Step(s.index))
    }

    /// URL token for a navigable position.
    pub fn token_for(&self, position: Position) -> Option<&str> {
        match position {
            Position::Step(i) => self.get(i).map(|s| s.name.as_str()),
            Position::Review => Some(REVIEW_TOKEN),
            Position::Submitting | Position::Submitted => None,
        }
    }

    /// Restrict an answer set to the keys owned by this registry.
    pub fn payload(&self, answers: &AnswerSet) -> AnswerSet {
        let mut payload = answers.clone();
        payload.retain(|k| self.owners.contains_key(k));
        payload
    }
}
