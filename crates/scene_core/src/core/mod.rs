//! # Core Module
//!
//! Shared configuration for the transform hierarchy and collision subsystems.

pub mod config;

// Re-export commonly used config types
pub use config::{
    CoreConfig,
    LoggingConfig,
    CollisionConfig,
    BroadPhaseConfig,
    GjkConfig,
    Config,
    ConfigError,
};
