//! Application use cases. Orchestrate domain logic via ports.

pub mod admin_service;
pub mod caption;
pub mod failure_policy;
pub mod upload_service;

pub use admin_service::AdminService;
pub use caption::CaptionExpander;
pub use failure_policy::FailurePolicy;
pub use upload_service::UploadService;
