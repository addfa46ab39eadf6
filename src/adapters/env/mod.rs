//! Environment adapters: variable expansion for captions.

pub mod map_env;

pub use map_env::MapEnvironment;
