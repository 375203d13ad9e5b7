use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use cask_store::{FileSystemBackend, MemoryBackend, StorageBackend};
use cask_types::{Clock, NamespaceId, SystemClock};

use crate::config::{BackendConfig, BackendKind, StorageConfig};
use crate::error::{ConfigError, NamespaceError, NamespaceResult};
use crate::gc::GcReport;
use crate::namespace::Namespace;

/// Owns every configured backend and namespace.
///
/// Backends are built once per backend id and shared by every namespace
/// that names them; the namespace prefix in each locator keeps their
/// contents apart.
#[derive(Debug)]
pub struct StorageService {
    config: StorageConfig,
    backends: HashMap<String, Arc<dyn StorageBackend>>,
    namespaces: HashMap<NamespaceId, Arc<Namespace>>,
}

impl StorageService {
    pub async fn new(config: StorageConfig, clock: Arc<dyn Clock>) -> NamespaceResult<Self> {
        config.validate()?;

        let mut backends = HashMap::new();
        for backend in &config.backends {
            backends.insert(backend.id.clone(), open_backend(backend).await?);
        }

        let mut namespaces = HashMap::new();
        for ns in &config.namespaces {
            let backend = backends.get(&ns.backend).cloned().ok_or_else(|| {
                ConfigError::Invalid(format!("unknown backend {:?}", ns.backend))
            })?;
            let namespace = Namespace::open(ns.clone(), backend, clock.clone()).await?;
            namespaces.insert(ns.id.clone(), Arc::new(namespace));
        }

        info!(
            backends = backends.len(),
            namespaces = namespaces.len(),
            "storage service started"
        );
        Ok(Self {
            config,
            backends,
            namespaces,
        })
    }

    /// The default configuration on the system clock.
    pub async fn in_memory() -> NamespaceResult<Self> {
        Self::new(StorageConfig::default(), Arc::new(SystemClock)).await
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn get_namespace(&self, id: &NamespaceId) -> NamespaceResult<Arc<Namespace>> {
        self.namespaces
            .get(id)
            .cloned()
            .ok_or_else(|| NamespaceError::NamespaceNotFound(id.clone()))
    }

    pub fn backend(&self, id: &str) -> Option<Arc<dyn StorageBackend>> {
        self.backends.get(id).cloned()
    }

    /// Configured namespace ids, sorted.
    pub fn namespace_ids(&self) -> Vec<NamespaceId> {
        let mut ids: Vec<NamespaceId> = self.namespaces.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Collect garbage in every namespace. A failing namespace is logged
    /// and skipped; the others still run.
    pub async fn collect_garbage(&self) -> Vec<(NamespaceId, NamespaceResult<GcReport>)> {
        let mut results = Vec::with_capacity(self.namespaces.len());
        for id in self.namespace_ids() {
            let result = match self.namespaces.get(&id) {
                Some(ns) => ns.collect_garbage().await,
                None => Err(NamespaceError::NamespaceNotFound(id.clone())),
            };
            if let Err(err) = &result {
                warn!(namespace = %id, error = %err, "garbage collection failed");
            }
            results.push((id, result));
        }
        results
    }
}

async fn open_backend(config: &BackendConfig) -> NamespaceResult<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config.kind {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::FileSystem => {
            let base_dir = config.base_dir.clone().ok_or_else(|| {
                ConfigError::Invalid(format!("file_system backend {:?} needs a base_dir", config.id))
            })?;
            Arc::new(FileSystemBackend::open(base_dir).await?)
        }
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_types::ManualClock;

    #[tokio::test]
    async fn default_service_has_memory_namespace() {
        let service = StorageService::in_memory().await.unwrap();
        let ns = service
            .get_namespace(&NamespaceId::new("memory").unwrap())
            .unwrap();
        assert_eq!(ns.id().as_str(), "memory");
        assert_eq!(service.namespace_ids().len(), 1);
    }

    #[tokio::test]
    async fn unknown_namespace_is_not_found() {
        let service = StorageService::new(StorageConfig::default(), Arc::new(ManualClock::new()))
            .await
            .unwrap();
        let missing = NamespaceId::new("nope").unwrap();
        assert!(matches!(
            service.get_namespace(&missing),
            Err(NamespaceError::NamespaceNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = StorageConfig::default();
        config.namespaces[0].backend = "ghost".into();
        let err = StorageService::new(config, Arc::new(ManualClock::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, NamespaceError::Config(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn namespaces_share_a_backend() {
        let config = StorageConfig::from_toml_str(
            r#"
            [[backends]]
            id = "shared"
            type = "memory"
            [[namespaces]]
            id = "a"
            backend = "shared"
            [[namespaces]]
            id = "b"
            backend = "shared"
            "#,
        )
        .unwrap();
        let service = StorageService::new(config, Arc::new(ManualClock::new()))
            .await
            .unwrap();
        let a = service.get_namespace(&NamespaceId::new("a").unwrap()).unwrap();
        let b = service.get_namespace(&NamespaceId::new("b").unwrap()).unwrap();
        assert!(Arc::ptr_eq(a.blob_store().backend(), b.blob_store().backend()));
        assert!(service.backend("shared").is_some());
    }
}
