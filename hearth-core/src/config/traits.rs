//! Configuration traits for validation and environment overrides.

use crate::error::ConfigError;

/// Trait for types that can be validated.
///
/// # Example
///
/// ```rust
/// use hearth_core::config::Validatable;
/// use hearth_core::error::ConfigError;
///
/// struct ListenConfig {
///     port: u16,
/// }
///
/// impl Validatable for ListenConfig {
///     fn validate(&self) -> Result<(), ConfigError> {
///         if self.port == 0 {
///             return Err(ConfigError::invalid_value("port", "Port cannot be 0"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Trait for types that support environment variable overrides.
pub trait Configurable: Sized {
    /// Applies environment variable overrides using the given prefix
    /// (e.g. `HEARTH`).
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError>;

    /// Returns the environment variable names that can override this configuration.
    fn env_var_names(prefix: &str) -> Vec<String>;
}

/// Reads `{prefix}_{suffix}` from the environment, returning the variable
/// name alongside its value for error reporting.
#[must_use]
pub fn env_var(prefix: &str, suffix: &str) -> Option<(String, String)> {
    let name = format!("{prefix}_{suffix}");
    std::env::var(&name).ok().map(|value| (name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestConfig {
        value: i32,
    }

    impl Validatable for TestConfig {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.value < 0 {
                return Err(ConfigError::invalid_value(
                    "value",
                    "Value must be non-negative",
                ));
            }
            Ok(())
        }
    }

    #[test]
    fn test_validatable() {
        assert!(TestConfig { value: 1 }.validate().is_ok());
        assert!(TestConfig { value: -1 }.validate().is_err());
    }

    #[test]
    fn test_env_var_missing() {
        assert!(env_var("HEARTH_TEST_UNSET_PREFIX", "NOTHING_HERE").is_none());
    }
}
