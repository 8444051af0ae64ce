//! # Core Configuration
//!
//! Configuration structures for the scene core. Every section has sane
//! defaults, so an empty TOML/RON document is a valid configuration.
//!
//! ## Configuration Categories
//!
//! - **Logging Config**: default log filter handed to `env_logger`
//! - **Collision Config**: broad-phase stages and GJK termination limits

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter used when `RUST_LOG` is not set
    pub level: String,
}

impl LoggingConfig {
    /// Create a logging configuration with the given filter
    pub fn new(level: impl Into<String>) -> Self {
        Self { level: level.into() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// # Broad-Phase Configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadPhaseConfig {
    /// Run the world-AABB overlap test after the sphere test passes
    pub aabb_stage: bool,
}

impl Default for BroadPhaseConfig {
    fn default() -> Self {
        Self { aabb_stage: true }
    }
}

/// # GJK Configuration
///
/// GJK terminates on its own when the simplex encloses the origin or a
/// separating direction is found. `max_iterations` is only a safety cap for
/// numerically stuck queries, which are then reported as inconclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GjkConfig {
    /// Upper bound on support-point iterations per query
    pub max_iterations: usize,
    /// Distance below which the origin counts as touching the simplex
    pub tolerance: f32,
}

impl GjkConfig {
    /// Set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the contact tolerance
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("GJK max_iterations must be at least 1".to_string()));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "GJK tolerance must be a non-negative finite number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

impl Default for GjkConfig {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            tolerance: 1.0e-6,
        }
    }
}

/// # Collision Configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Broad-phase settings
    pub broad_phase: BroadPhaseConfig,
    /// Narrow-phase settings
    pub gjk: GjkConfig,
}

impl CollisionConfig {
    /// Enable or disable the AABB broad-phase stage
    pub fn with_aabb_stage(mut self, enabled: bool) -> Self {
        self.broad_phase.aabb_stage = enabled;
        self
    }

    /// Replace the GJK settings
    pub fn with_gjk(mut self, gjk: GjkConfig) -> Self {
        self.gjk = gjk;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gjk.validate()
    }
}

/// # Complete Core Configuration
///
/// Top-level configuration for a [`Scene`](crate::scene::Scene).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Collision system configuration
    pub collision: CollisionConfig,
}

impl CoreConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("Log level cannot be empty".to_string()));
        }
        self.collision.validate()
    }
}

impl Config for CoreConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = CoreConfig::from_toml_str(
            r#"
            [logging]
            level = "debug"

            [collision.gjk]
            max_iterations = 16
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.collision.gjk.max_iterations, 16);
        assert!(config.collision.broad_phase.aabb_stage);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = CoreConfig::default();
        config.collision = config.collision.with_aabb_stage(false);

        let text = config.to_ron_string().unwrap();
        let back = CoreConfig::from_ron_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_gjk_settings_rejected() {
        let config = CollisionConfig::default().with_gjk(GjkConfig::default().with_max_iterations(0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = GjkConfig::default().with_tolerance(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = CoreConfig::load_from_file("settings.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
