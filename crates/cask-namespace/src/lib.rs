//! Namespaces for Cask.
//!
//! A [`Namespace`] ties together a blob store, a ref manager, and an alias
//! index over a storage backend, and runs garbage collection over them.
//! Blobs, aliases, and refs all live in the backend, so a namespace on a
//! file-system backend comes back intact after a restart.
//! A [`StorageService`] builds every namespace described by a
//! [`StorageConfig`], sharing one backend instance per backend id.
//!
//! ```no_run
//! # async fn demo() -> Result<(), cask_namespace::NamespaceError> {
//! use cask_namespace::{RefOptions, StorageService};
//! use cask_types::{BlobType, NamespaceId};
//!
//! let service = StorageService::in_memory().await?;
//! let ns = service.get_namespace(&NamespaceId::new("memory").unwrap())?;
//!
//! let mut writer = ns.create_writer();
//! writer.write_string("hello")?;
//! writer.add_alias("greeting", 0)?;
//! let handle = writer.complete(BlobType::new(uuid::Uuid::nil(), 1)).await?;
//!
//! ns.write_ref("latest", handle.target(), RefOptions::permanent()).await?;
//! let data = ns.read_ref("latest").await?.read_blob_data().await?;
//! assert_eq!(data.reader().read_string().unwrap(), "hello");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gc;
pub mod namespace;
pub mod ref_store;
pub mod service;

pub use config::{BackendConfig, BackendKind, NamespaceConfig, StorageConfig, DEFAULT_GC_DELAY_HRS};
pub use error::{ConfigError, ConfigResult, NamespaceError, NamespaceResult};
pub use gc::GcReport;
pub use namespace::Namespace;
pub use ref_store::BackendRefStore;
pub use service::StorageService;

pub use cask_codec::BlobReader;
pub use cask_index::Alias;
pub use cask_refs::{RefError, RefOptions, RefRecord};
pub use cask_store::{BlobData, BlobHandle, BlobWriter, StoreError};
