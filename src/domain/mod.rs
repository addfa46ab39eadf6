//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod changelog;
pub mod entities;
pub mod errors;
pub mod expand;
pub mod limits;
pub mod markdown;

pub use entities::{
    Artifact, BotConfig, BuildChanges, BuildResult, ChangeEntry, DEFAULT_API_BASE_URL,
    DEFAULT_FILTER, Delivery, DeliveryKind, Forward, ProxyConfig, RunReport, TelegramResponse,
    UploadJob, effective_filter, parse_chat_list,
};
pub use errors::DomainError;
