mod env_overrides;
mod loader;
mod types;
mod validation;

pub use types::Config;
