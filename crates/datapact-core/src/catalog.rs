//! Resource catalog
//!
//! Maps request paths to hosted resources and classifies each resource
//! explicitly as a primary dataset or the derived output of a declared
//! transform protocol. Classification happens once, when the catalog
//! is built; the decision path never inspects path strings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// What kind of resource a catalog entry is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A primary dataset, fetched with a plain read.
    Primary,

    /// The output of a declared transform protocol.
    Derived {
        /// Name of the protocol that produced this resource.
        protocol: String,
    },
}

/// Catalog errors. `Io` is the internal-error case: a resource the
/// catalog knows about could not be served. It is never a denial.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("resource {0} not in catalog")]
    NotFound(String),

    #[error("resource fetch failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only view of the resources a server hosts.
///
/// Implementations must be immutable after construction; the engine
/// shares them across concurrent evaluations without locking.
pub trait ResourceCatalog: Send + Sync {
    /// Classify a request path, or `None` when the resource is not
    /// hosted here.
    fn kind_of(&self, path: &str) -> Option<&ResourceKind>;

    /// Fetch the resource bytes after an allow decision.
    fn read(&self, path: &str) -> Result<Vec<u8>, CatalogError>;
}

/// Naming convention used when building a catalog from a directory
/// scan: files whose name starts with the reserved prefix are derived
/// transform outputs, named `<protocol>.json`.
#[derive(Debug, Clone)]
pub struct NamingConvention {
    /// Reserved file-name prefix for derived outputs.
    pub derived_prefix: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            derived_prefix: "x-to-".to_string(),
        }
    }
}

impl NamingConvention {
    fn classify(&self, file_name: &str) -> ResourceKind {
        match file_name.strip_suffix(".json") {
            Some(stem) if stem.starts_with(&self.derived_prefix) => ResourceKind::Derived {
                protocol: stem.to_string(),
            },
            _ => ResourceKind::Primary,
        }
    }
}

/// In-memory catalog keyed by request path (`/<file>.json`).
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: HashMap<String, Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    kind: ResourceKind,
    bytes: Vec<u8>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource with an explicit kind.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        kind: ResourceKind,
        bytes: impl Into<Vec<u8>>,
    ) {
        self.entries.insert(
            path.into(),
            Entry {
                kind,
                bytes: bytes.into(),
            },
        );
    }

    /// Build a catalog by scanning a data directory for `*.json`
    /// files, applying the naming convention once per file.
    pub async fn scan(
        dir: impl AsRef<Path>,
        convention: &NamingConvention,
    ) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let mut catalog = Self::new();
        let mut listing = tokio::fs::read_dir(dir).await?;
        while let Some(dirent) = listing.next_entry().await? {
            if !dirent.file_type().await?.is_file() {
                continue;
            }
            let name = dirent.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".json") {
                continue;
            }
            let bytes = tokio::fs::read(dirent.path()).await?;
            let kind = convention.classify(&name);
            tracing::debug!(resource = %name, ?kind, "catalog entry");
            catalog.insert(format!("/{name}"), kind, bytes);
        }
        tracing::info!(dir = %dir.display(), resources = catalog.len(), "resource catalog loaded");
        Ok(catalog)
    }

    /// Number of hosted resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceCatalog for MemoryCatalog {
    fn kind_of(&self, path: &str) -> Option<&ResourceKind> {
        self.entries.get(path).map(|entry| &entry.kind)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, CatalogError> {
        self.entries
            .get(path)
            .map(|entry| entry.bytes.clone())
            .ok_or_else(|| CatalogError::NotFound(path.to_string()))
    }
}
