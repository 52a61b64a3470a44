//! Configuration management module.
//!
//! This module provides:
//! - YAML, TOML and JSON configuration file loading
//! - Configuration validation with descriptive error messages
//! - Environment variable overrides for deployment-specific values
//!
//! # Example
//!
//! ```rust,ignore
//! use hearth_core::config::{ConfigLoader, ConfigFormat};
//!
//! let config: MyConfig = ConfigLoader::new()
//!     .with_env_prefix("HEARTH")
//!     .load_file("hearth.yaml")?;
//! ```

mod loader;
mod traits;

pub use loader::{ConfigFormat, ConfigLoader};
pub use traits::{Configurable, Validatable, env_var};
