pub mod icons;
pub mod notifier;
pub mod progress;
pub mod render;

pub use notifier::ConsoleNotifier;
pub use progress::SubmitSpinner;
