use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, TweenError};

/// Engine-wide options handed to every entity at construction and reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether entities built with this configuration belong to an object pool.
    #[serde(default)]
    pub pooling: bool,
}

impl EngineConfig {
    pub fn pooled() -> Self {
        Self { pooling: true }
    }
}

/// Repetition settings. A negative `count` repeats forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatConfig {
    pub count: i32,
    #[serde(default)]
    pub delay_millis: i32,
    #[serde(default)]
    pub yoyo: bool,
}

/// Timing of a single tween or timeline, as read from JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default)]
    pub delay_millis: i32,
    pub duration_millis: i32,
    #[serde(default)]
    pub repeat: Option<RepeatConfig>,
}

impl TimingConfig {
    pub fn new(delay_millis: i32, duration_millis: i32) -> Self {
        Self {
            delay_millis,
            duration_millis,
            repeat: None,
        }
    }

    pub fn with_repeat(mut self, count: i32, delay_millis: i32) -> Self {
        self.repeat = Some(RepeatConfig {
            count,
            delay_millis,
            yoyo: false,
        });
        self
    }

    pub fn with_repeat_yoyo(mut self, count: i32, delay_millis: i32) -> Self {
        self.repeat = Some(RepeatConfig {
            count,
            delay_millis,
            yoyo: true,
        });
        self
    }

    /// Rejects configurations that break the engine's input contract.
    ///
    /// A negative repeat delay is not an error: it is clamped to zero when the
    /// configuration is applied.
    pub fn validate(&self) -> Result<()> {
        if self.delay_millis < 0 {
            return Err(TweenError::InvalidConfig(format!(
                "delay must be non-negative, got {}ms",
                self.delay_millis
            )));
        }
        if self.duration_millis < 0 {
            return Err(TweenError::InvalidConfig(format!(
                "duration must be non-negative, got {}ms",
                self.duration_millis
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
