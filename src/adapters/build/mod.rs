//! Build source adapters: build result and change history.

pub mod json_file;
pub mod static_source;

pub use json_file::load_build_info;
pub use static_source::StaticBuildSource;
