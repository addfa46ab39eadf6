//! Infrastructure adapters. Implement outbound ports.
//!
//! Telegram Bot API, filesystem artifacts, build info, environment, terminal UI.
//! Map errors to DomainError.

pub mod artifacts;
pub mod build;
pub mod env;
pub mod telegram;
pub mod ui;
