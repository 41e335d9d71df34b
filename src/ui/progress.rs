use crate::ui::icons::{CHECK, CROSS, SEND};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a submission is in flight.
///
/// The confirm prompt is not offered again until the spinner finishes, so
/// there is no way to trigger a second submission meanwhile.
pub struct SubmitSpinner {
    bar: ProgressBar,
}

impl SubmitSpinner {
    pub fn start(title: &str) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg} {elapsed:.dim}")
            .expect("progress bar template is a valid static string");

        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style);
        bar.set_prefix(SEND.to_string());
        bar.set_message(format!("Submitting {}...", style(title).cyan()));
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    pub fn finish_success(&self, message: &str) {
        self.bar
            .finish_with_message(format!("{} {}", CHECK, style(message).green()));
    }

    pub fn finish_error(&self, message: &str) {
        self.bar
            .finish_with_message(format!("{} {}", CROSS, style(message).red()));
    }
}

impl Drop for SubmitSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
