//! Configuration for the ambient scope using Figment
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. A config file: `.scriptvm/config.{toml,yaml,yml,json}` in the current
//!    directory, or an explicit path
//! 3. Environment variables prefixed with `SCRIPTVM_`
//!    (e.g. `SCRIPTVM_MEMORY_LIMIT=33554432`)

use crate::error::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory searched for a config file, relative to the current directory
pub const CONFIG_DIR: &str = ".scriptvm";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SCRIPTVM_";

const CONFIG_FILE_STEM: &str = "config";
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Engine settings for the ambient scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Heap limit in bytes
    pub memory_limit: Option<usize>,
    /// Stack limit in bytes
    pub max_stack_size: Option<usize>,
    /// Allocation threshold in bytes that triggers garbage collection
    pub gc_threshold: Option<usize>,
    /// Inject `env` and `process.env` mirroring the process environment
    pub expose_env: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_limit: Some(10 * 1024 * 1024),
            max_stack_size: Some(512 * 1024),
            gc_threshold: None,
            expose_env: true,
        }
    }
}

impl VmConfig {
    /// Load from defaults, the discovered config file and the environment
    pub fn load() -> Result<Self> {
        let file = std::env::current_dir()
            .ok()
            .and_then(|dir| discover_config_file(&dir));
        Self::extract(Self::figment(file.as_deref()))
    }

    /// Load from defaults, the given config file and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::extract(Self::figment(Some(path.as_ref())))
    }

    /// Build the figment with all sources in precedence order
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(VmConfig::default()));

        if let Some(path) = config_file {
            debug!("Loading scriptvm config from {}", path.display());
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }

        figment.merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into()))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: VmConfig = figment.extract()?;
        debug!("Loaded scriptvm config: {:?}", config);
        Ok(config)
    }
}

/// Find the first existing config file under `<dir>/.scriptvm/`
pub fn discover_config_file(dir: &Path) -> Option<PathBuf> {
    let config_dir = dir.join(CONFIG_DIR);
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| config_dir.join(format!("{}.{}", CONFIG_FILE_STEM, ext)))
        .find(|path| path.is_file())
}
