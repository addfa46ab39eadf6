//! Telegram Bot API adapter. Implements BotApi with reqwest multipart calls.

pub mod client;
pub mod response;

pub use client::BotApiClient;
