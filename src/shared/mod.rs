//! Cross-cutting helpers: configuration and field validation.

pub mod config;
pub mod validation;
