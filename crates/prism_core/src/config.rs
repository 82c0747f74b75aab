//! # Runtime Configuration
//!
//! Capacity limits for one coordinator, fixed at startup.
//!
//! ```toml
//! max_entities = 5000
//! max_component_types = 32
//! max_event_types = 32
//! max_system_types = 32
//! preallocate_components = false
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected.

use std::path::Path;

use serde::Deserialize;

use crate::ecs::SIGNATURE_BITS;
use crate::error::{EcsError, EcsResult};

/// Default entity population bound (exclusive; id 0 is reserved).
pub const DEFAULT_MAX_ENTITIES: u32 = 5000;

/// Default family limit for components, events and systems.
pub const DEFAULT_MAX_TYPES: u8 = 32;

/// Capacity limits for a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Exclusive bound on entity ids. At most `max_entities - 1` are alive.
    pub max_entities: u32,
    /// Exclusive bound on component family ids.
    pub max_component_types: u8,
    /// Exclusive bound on event family ids.
    pub max_event_types: u8,
    /// Exclusive bound on system family ids.
    pub max_system_types: u8,
    /// Reserve a slot per possible entity in every component array, so
    /// packed arrays never reallocate.
    pub preallocate_components: bool,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_entities: DEFAULT_MAX_ENTITIES,
            max_component_types: DEFAULT_MAX_TYPES,
            max_event_types: DEFAULT_MAX_TYPES,
            max_system_types: DEFAULT_MAX_TYPES,
            preallocate_components: false,
        }
    }
}

impl EcsConfig {
    /// Checks every limit.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities < 2 {
            return Err(EcsError::InvalidConfig(format!(
                "max_entities must be at least 2, got {}",
                self.max_entities
            )));
        }
        if self.max_component_types < 2 || usize::from(self.max_component_types) > SIGNATURE_BITS {
            return Err(EcsError::InvalidConfig(format!(
                "max_component_types must be in 2..={SIGNATURE_BITS}, got {}",
                self.max_component_types
            )));
        }
        if self.max_event_types < 2 {
            return Err(EcsError::InvalidConfig(format!(
                "max_event_types must be at least 2, got {}",
                self.max_event_types
            )));
        }
        if self.max_system_types < 2 {
            return Err(EcsError::InvalidConfig(format!(
                "max_system_types must be at least 2, got {}",
                self.max_system_types
            )));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] on malformed TOML, unknown keys, or
    /// out-of-range limits.
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
    /// - [`EcsError::ConfigIo`] if the file cannot be read.
    /// - Anything [`EcsConfig::from_toml_str`] reports.
    pub fn load(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| EcsError::ConfigIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?config, "loaded ECS configuration");
        Ok(config)
    }

    /// Slots to reserve per component array, if preallocation is on.
    #[must_use]
    pub fn preallocation(&self) -> Option<usize> {
        self.preallocate_components
            .then(|| self.max_entities.saturating_sub(1) as usize)
    }
}
