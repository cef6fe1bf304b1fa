//! Configuration
//!
//! - `AssistantConfig`: model, request and orchestration settings
//! - `FileConfigProvider`: YAML file-based (user/workspace level)

mod error;
mod file;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use file::{load_config, ConfigLevel, FileConfigProvider};
pub use settings::AssistantConfig;
