//! Terminal rendering of wizard screens.

use console::style;

use crate::answers::FieldErrors;
use crate::review::ReviewSection;
use crate::step::{StepDefinition, StepRegistry};
use crate::ui::icons::{CROSS, REVIEW, STEP};

/// Dot trail for `(current, total)`, e.g. `●●○○`.
pub fn progress_dots(current: usize, total: usize) -> String {
    let done = current.min(total);
    format!("{}{}", "●".repeat(done), "○".repeat(total - done))
}

/// Human-readable age, e.g. `5m ago`.
pub fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Plain `label: value` lines of a review, grouped under numbered titles.
pub fn review_lines(sections: &[ReviewSection]) -> Vec<String> {
    let mut lines = Vec::new();
    for section in sections {
        lines.push(format!("{}. {}", section.index, section.title));
        let width = section
            .entries
            .iter()
            .map(|e| e.label.chars().count())
            .max()
            .unwrap_or(0);
        for entry in &section.entries {
            lines.push(format!(
                "   {:<width$}  {}",
                entry.label,
                entry.display,
                width = width
            ));
        }
    }
    lines
}

/// Error lines in field order, labelled by the owning field.
pub fn error_lines(step: &StepDefinition, errors: &FieldErrors) -> Vec<String> {
    step.fields
        .iter()
        .filter_map(|f| errors.get(&f.key))
        .cloned()
        .collect()
}

pub fn print_step_header(step: &StepDefinition, progress: (usize, usize), edit_mode: bool) {
    println!();
    let title = if step.title.is_empty() {
        step.name.as_str()
    } else {
        step.title.as_str()
    };
    let mode = if edit_mode {
        format!(" {}", style("(editing)").yellow())
    } else {
        String::new()
    };
    println!(
        "{}{} {}{}",
        STEP,
        style(title).bold(),
        style(progress_dots(progress.0, progress.1)).dim(),
        mode
    );
}

pub fn print_step_errors(step: &StepDefinition, errors: &FieldErrors) {
    for line in error_lines(step, errors) {
        println!("  {} {}", CROSS, style(line).red());
    }
}

pub fn print_review(title: &str, sections: &[ReviewSection]) {
    println!();
    println!("{}{}", REVIEW, style(format!("Review {}", title)).bold());
    for line in review_lines(sections) {
        if line.starts_with(' ') {
            println!("{}", line);
        } else {
            println!("{}", style(line).cyan());
        }
    }
}

/// One line per step for the flow listing.
pub fn flow_outline(registry: &StepRegistry) -> String {
    registry
        .steps()
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(" → ")
}
