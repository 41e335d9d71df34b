//! Review projector: a read-only summary of the answer set, grouped by step.
//!
//! `project` is a pure function of the registry and the answers, so views
//! call it on every render instead of caching its output.

use serde::Serialize;

use crate::answers::AnswerSet;
use crate::step::StepRegistry;

/// Shown for fields with no value.
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    pub key: String,
    pub label: String,
    pub display: String,
}

impl ReviewEntry {
    pub fn is_placeholder(&self) -> bool {
        self.display == PLACEHOLDER
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSection {
    /// 1-based step index, used for edit-step jumps
    pub index: usize,
    pub name: String,
    pub title: String,
    pub entries: Vec<ReviewEntry>,
}

pub fn project(registry: &StepRegistry, answers: &AnswerSet) -> Vec<ReviewSection> {
    registry
        .steps()
        .iter()
        .map(|step| ReviewSection {
            index: step.index,
            name: step.name.clone(),
            title: step.title.clone(),
            entries: step
                .fields
                .iter()
                .map(|field| {
                    let display = answers
                        .get(&field.key)
                        .filter(|v| !v.is_blank())
                        .map(|v| v.display())
                        .filter(|d| !d.is_empty())
                        .unwrap_or_else(|| PLACEHOLDER.to_string());
                    ReviewEntry {
                        key: field.key.clone(),
                        label: field.label.clone(),
                        display,
                    }
                })
                .collect(),
        })
        .collect()
}
