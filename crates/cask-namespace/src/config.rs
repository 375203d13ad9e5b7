use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cask_types::NamespaceId;

use crate::error::{ConfigError, ConfigResult};

/// Which medium a backend stores bytes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Memory,
    FileSystem,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BackendKind,
    /// Root directory; required for `file_system`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub id: NamespaceId,
    /// Id of the backend this namespace stores its blobs in.
    pub backend: String,
    /// Minimum age, in hours, before an unreachable blob is collected.
    #[serde(default)]
    pub gc_delay_hrs: f64,
}

impl NamespaceConfig {
    /// The GC delay as a duration. Invalid values read as zero; call
    /// [`StorageConfig::validate`] first.
    pub fn gc_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.gc_delay_hrs * 3600.0).unwrap_or_default()
    }
}

/// Backends and the namespaces built on them.
///
/// ```toml
/// [[backends]]
/// id = "disk"
/// type = "file_system"
/// base_dir = "/var/lib/cask"
///
/// [[namespaces]]
/// id = "artifacts"
/// backend = "disk"
/// gc_delay_hrs = 6.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
    #[serde(default)]
    pub namespaces: Vec<NamespaceConfig>,
}

impl Default for StorageConfig {
    /// A single in-memory namespace named `memory`.
    fn default() -> Self {
        Self {
            backends: vec![BackendConfig {
                id: "memory".into(),
                kind: BackendKind::Memory,
                base_dir: None,
            }],
            namespaces: vec![NamespaceConfig {
                id: NamespaceId::new("memory").expect("static namespace id is valid"),
                backend: "memory".into(),
                gc_delay_hrs: DEFAULT_GC_DELAY_HRS,
            }],
        }
    }
}

/// GC delay of the default namespace.
pub const DEFAULT_GC_DELAY_HRS: f64 = 6.0;

impl StorageConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn backend(&self, id: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.id == id)
    }

    pub fn namespace(&self, id: &NamespaceId) -> Option<&NamespaceConfig> {
        self.namespaces.iter().find(|n| &n.id == id)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let mut backend_ids = HashSet::new();
        for backend in &self.backends {
            if backend.id.is_empty() {
                return Err(ConfigError::Invalid("backend id must not be empty".into()));
            }
            if !backend_ids.insert(backend.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate backend id {:?}",
                    backend.id
                )));
            }
            if backend.kind == BackendKind::FileSystem && backend.base_dir.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "file_system backend {:?} needs a base_dir",
                    backend.id
                )));
            }
        }

        let mut namespace_ids = HashSet::new();
        for namespace in &self.namespaces {
            if !namespace_ids.insert(&namespace.id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate namespace id {:?}",
                    namespace.id.as_str()
                )));
            }
            if !backend_ids.contains(namespace.backend.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "namespace {:?} uses unknown backend {:?}",
                    namespace.id.as_str(),
                    namespace.backend
                )));
            }
            let delay = namespace.gc_delay_hrs;
            if !delay.is_finite()
                || delay < 0.0
                || Duration::try_from_secs_f64(delay * 3600.0).is_err()
            {
                return Err(ConfigError::Invalid(format!(
                    "namespace {:?} has invalid gc_delay_hrs {delay}",
                    namespace.id.as_str()
                )));
            }
        }
        Ok(())
    }
}
