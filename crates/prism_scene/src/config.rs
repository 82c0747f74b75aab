//! Scene configuration, loaded once at startup.
//!
//! ```toml
//! [ecs]
//! max_entities = 1024
//!
//! [demo]
//! entity_count = 256
//! frames = 8
//! despawn_every = 3
//! ```

use std::path::Path;

use prism_core::{EcsConfig, EcsError, EcsResult};
use serde::Deserialize;

/// Parameters of the demo scene.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Entities spawned before the first frame.
    pub entity_count: u32,
    /// Frames to run.
    pub frames: u32,
    /// Every this many frames the oldest entity is replaced. 0 disables churn.
    pub despawn_every: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            entity_count: 256,
            frames: 8,
            despawn_every: 3,
        }
    }
}

/// Full scene configuration: ECS limits plus demo parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Coordinator limits.
    pub ecs: EcsConfig,
    /// Demo scene parameters.
    pub demo: DemoConfig,
}

impl SceneConfig {
    /// Checks the ECS limits and that the demo fits inside them.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> EcsResult<()> {
        self.ecs.validate()?;
        if self.demo.entity_count >= self.ecs.max_entities {
            return Err(EcsError::InvalidConfig(format!(
                "demo.entity_count ({}) must be below ecs.max_entities ({})",
                self.demo.entity_count, self.ecs.max_entities
            )));
        }
        if self.demo.frames == 0 {
            return Err(EcsError::InvalidConfig("demo.frames must be at least 1".into()));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`EcsError::ConfigIo`] if the file cannot be read, otherwise as
    /// [`SceneConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| EcsError::ConfigIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_are_optional() {
        let config = SceneConfig::from_toml_str("[demo]\nframes = 2\n").unwrap();
        assert_eq!(config.demo.frames, 2);
        assert_eq!(config.demo.entity_count, 256);
        assert_eq!(config.ecs, EcsConfig::default());
    }

    #[test]
    fn test_nested_ecs_section() {
        let config = SceneConfig::from_toml_str(
            "[ecs]\nmax_entities = 64\npreallocate_components = true\n\n[demo]\nentity_count = 10\n",
        )
        .unwrap();
        assert_eq!(config.ecs.max_entities, 64);
        assert!(config.ecs.preallocate_components);
    }

    #[test]
    fn test_demo_must_fit_population() {
        let err = SceneConfig::from_toml_str("[ecs]\nmax_entities = 16\n[demo]\nentity_count = 16\n")
            .unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(message) if message.contains("entity_count")));
    }

    #[test]
    fn test_zero_frames_rejected() {
        assert!(SceneConfig::from_toml_str("[demo]\nframes = 0\n").is_err());
    }
}
