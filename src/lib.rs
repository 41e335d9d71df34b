//! Multi-step onboarding wizards.
//!
//! The engine is split into a few pieces:
//! - `step`: the ordered step registry and field definitions
//! - `wizard`: the state machine that moves between steps, review and submission
//! - `review`: the read-only summary projection
//! - `draft`, `validation`, `nav`, `transport`, `notify`: the capabilities a
//!   wizard is mounted with
//!
//! `flow`, `config`, `init` and `ui` back the `onboard` command-line tool.

pub mod answers;
pub mod config;
pub mod debounce;
pub mod draft;
pub mod errors;
pub mod flow;
pub mod init;
pub mod nav;
pub mod notify;
pub mod review;
pub mod step;
pub mod transport;
pub mod ui;
pub mod validation;
pub mod wizard;
