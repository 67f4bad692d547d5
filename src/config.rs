//! Engine settings, read from a JSON file.

use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{
    abs::BufferUsage,
    error::{RenderError, RenderResult},
    resource::{ResourceLoader, TextureLoader},
    vertex::BufferBuilder,
};

/// Settings shared by the resource, builder and logging setup.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one folder per resource namespace.
    pub resource_root: PathBuf,
    /// A `log` level name such as `"info"` or `"trace"`.
    pub log_level: String,
    /// Initial byte capacity of buffer builders.
    pub builder_capacity: usize,
    pub buffer_usage: BufferUsage,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resource_root: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("renderkit"),
            log_level: "info".to_string(),
            builder_capacity: 64000,
            buffer_usage: BufferUsage::Static,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn from_json(json: &str) -> RenderResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.level_filter()?;
        Ok(config)
    }

    pub fn level_filter(&self) -> RenderResult<LevelFilter> {
        self.log_level.parse().map_err(|_| {
            RenderError::configuration(format!("unknown log level '{}'", self.log_level))
        })
    }

    pub fn resource_loader(&self) -> ResourceLoader {
        ResourceLoader::new(&self.resource_root)
    }

    pub fn texture_loader(&self) -> TextureLoader {
        TextureLoader::new(self.resource_loader())
    }

    pub fn buffer_builder(&self) -> BufferBuilder {
        BufferBuilder::new(self.builder_capacity)
    }
}
