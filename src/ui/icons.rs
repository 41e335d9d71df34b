//! Shared UI icons and emojis.
//!
//! Common emoji constants used across the wizard views for consistent
//! visual styling. Each has a plain-text fallback for terminals without
//! emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");

// Draft indicators
pub static DRAFT: Emoji<'_, '_> = Emoji("📝 ", "~");
pub static DISCARD: Emoji<'_, '_> = Emoji("🗑️  ", "-");
pub static RESUME: Emoji<'_, '_> = Emoji("🔄 ", "[R]");

// Wizard indicators
pub static STEP: Emoji<'_, '_> = Emoji("▶️  ", "[>]");
pub static REVIEW: Emoji<'_, '_> = Emoji("🔍 ", "[?]");
pub static SEND: Emoji<'_, '_> = Emoji("📤 ", "[^]");
