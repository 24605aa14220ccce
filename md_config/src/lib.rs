//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Layers defaults, an optional config file and MOTION_ environment variables

use config::{Config as ConfigBuilder, Environment, File};
use md_core::{Error, Result};
use md_vision::MotionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Environment variable prefix, e.g. `MOTION_DETECTOR__FRAME_SKIP=0`
pub const ENV_PREFIX: &str = "MOTION";

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub app: AppConfig,
    #[validate(nested)]
    pub detector: MotionConfig,
}

/// Process-level settings for the runner
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// "production" switches logging to JSON
    #[validate(length(min = 1))]
    pub environment: String,
    /// Name used for the published sensor and in logs
    #[validate(length(min = 1))]
    pub service_name: String,
    /// Frames between "still running" heartbeat logs
    #[validate(range(min = 1))]
    pub heartbeat_frames: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            service_name: "motion-detector".to_string(),
            heartbeat_frames: 300,
        }
    }
}

impl Config {
    /// Load configuration from defaults and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering `path` (toml/yaml/json) under the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = AppConfig::default();

        // Detector keys fall back to MotionConfig's serde defaults; seeding them
        // here would collide with the legacy `threshold` alias
        let mut builder = ConfigBuilder::builder()
            .set_default("app.environment", defaults.environment)?
            .set_default("app.service_name", defaults.service_name)?
            .set_default("app.heartbeat_frames", defaults.heartbeat_frames as i64)?;

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).required(true));
        }

        // Environment variables have the highest priority
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        parsed.check()?;
        Ok(parsed)
    }

    /// Validate every section
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;
        self.detector
            .check()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))
    }

    /// Serialize to pretty JSON, e.g. for `--print-config`
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}
