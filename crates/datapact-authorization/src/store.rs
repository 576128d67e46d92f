//! Capability store
//!
//! Loads the persisted capability records from the directory the
//! issuer writes to and indexes them by id and by controller. The
//! store is built once at startup and never mutated afterwards; a
//! fresh configuration is a full reload into a new store, never an
//! in-place edit.

use crate::capability::Capability;
use crate::errors::LoadError;
use datapact_core::{Did, RetryPolicy, StartupError};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;

/// File name of the identity registry, which shares the capability
/// directory and is not a capability record.
pub const REGISTRY_FILE_NAME: &str = "keys.json";

/// Immutable snapshot of all issued capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapabilityStore {
    by_id: HashMap<String, Capability>,
    by_controller: IndexMap<Did, Vec<String>>,
}

impl CapabilityStore {
    /// Build a store from already-parsed records, validating each and
    /// rejecting duplicate ids.
    pub fn from_capabilities(
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Result<Self, LoadError> {
        let mut store = Self::default();
        for capability in capabilities {
            capability.validate()?;
            if store.by_id.contains_key(&capability.id) {
                return Err(LoadError::DuplicateId(capability.id));
            }
            store
                .by_controller
                .entry(capability.controller.clone())
                .or_default()
                .push(capability.id.clone());
            store.by_id.insert(capability.id.clone(), capability);
        }
        Ok(store)
    }

    /// Single load attempt: parse every `*.json` record in `dir`,
    /// skipping the identity registry. File names are sorted so the
    /// per-controller insertion order does not depend on directory
    /// enumeration order.
    pub async fn load_once(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let mut names = Vec::new();
        let mut listing = tokio::fs::read_dir(dir).await?;
        while let Some(dirent) = listing.next_entry().await? {
            let name = dirent.file_name().to_string_lossy().into_owned();
            if name == REGISTRY_FILE_NAME || !name.ends_with(".json") {
                continue;
            }
            names.push(name);
        }
        names.sort();

        let mut capabilities = Vec::with_capacity(names.len());
        for name in &names {
            let raw = tokio::fs::read(dir.join(name)).await?;
            let capability: Capability =
                serde_json::from_slice(&raw).map_err(|source| LoadError::Malformed {
                    path: name.clone(),
                    source,
                })?;
            tracing::debug!(record = %name, id = %capability.id, "capability record parsed");
            capabilities.push(capability);
        }

        let store = Self::from_capabilities(capabilities)?;
        tracing::info!(dir = %dir.display(), capabilities = store.len(), "capability store loaded");
        Ok(store)
    }

    /// Load with the bounded startup retry: the issuer writes the
    /// records on its own schedule, so early attempts may find the
    /// directory missing or empty of records.
    pub async fn load(dir: impl AsRef<Path>, retry: RetryPolicy) -> Result<Self, StartupError> {
        let dir = dir.as_ref();
        retry
            .run(|| async move {
                let store = Self::load_once(dir).await?;
                if store.is_empty() {
                    // Never serve from an empty store: the issuer has
                    // not written the records yet.
                    return Err(LoadError::NoRecords(dir.display().to_string()));
                }
                Ok(store)
            })
            .await
            .map_err(|error| StartupError::new("capability store", retry.max_attempts, error))
    }

    /// Resolve a capability by id.
    pub fn lookup(&self, id: &str) -> Option<&Capability> {
        self.by_id.get(id)
    }

    /// All capabilities controlled by an identity, in insertion order.
    /// Introspection only; enforcement never consults this index.
    pub fn controlled_by(&self, controller: &Did) -> Vec<&Capability> {
        self.by_controller
            .get(controller)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    /// Number of capabilities in the store.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the store holds no capabilities.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Action;
    use assert_matches::assert_matches;

    fn capability(id: &str, controller: &str) -> Capability {
        Capability {
            id: id.to_string(),
            parent: None,
            invoker: Did::from("did:key:zA"),
            controller: Did::from(controller),
            invocation_target: Some("https://a.example.com/ab.json".parse().unwrap()),
            allowed_actions: vec![Action::Read],
            caveats: None,
        }
    }

    #[test]
    fn test_duplicate_id_is_a_load_error() {
        let result = CapabilityStore::from_capabilities(vec![
            capability("urn:uuid:1", "did:key:zB"),
            capability("urn:uuid:1", "did:key:zC"),
        ]);
        assert_matches!(result, Err(LoadError::DuplicateId(id)) if id == "urn:uuid:1");
    }

    #[test]
    fn test_controlled_by_preserves_insertion_order() {
        let store = CapabilityStore::from_capabilities(vec![
            capability("urn:uuid:1", "did:key:zB"),
            capability("urn:uuid:2", "did:key:zC"),
            capability("urn:uuid:3", "did:key:zB"),
        ])
        .unwrap();

        let held: Vec<&str> = store
            .controlled_by(&Did::from("did:key:zB"))
            .iter()
            .map(|capability| capability.id.as_str())
            .collect();
        assert_eq!(held, vec!["urn:uuid:1", "urn:uuid:3"]);

        assert!(store.controlled_by(&Did::from("did:key:zX")).is_empty());
    }

    #[tokio::test]
    async fn test_load_once_skips_registry_and_rejects_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let record = serde_json::to_vec(&capability("urn:uuid:1", "did:key:zB")).unwrap();
        std::fs::write(dir.path().join("abc-A.json"), &record).unwrap();
        std::fs::write(dir.path().join(REGISTRY_FILE_NAME), b"{not a capability}").unwrap();

        let store = CapabilityStore::load_once(dir.path()).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.lookup("urn:uuid:1").is_some());

        std::fs::write(dir.path().join("abc-B.json"), b"{\"id\": 42}").unwrap();
        let result = CapabilityStore::load_once(dir.path()).await;
        assert_matches!(result, Err(LoadError::Malformed { path, .. }) if path == "abc-B.json");
    }

    #[tokio::test]
    async fn test_load_fails_fatally_after_bounded_retries() {
        let dir = tempfile::tempdir().unwrap();

        // Present but empty: the records have not been written yet.
        let error = CapabilityStore::load(dir.path(), RetryPolicy::once())
            .await
            .unwrap_err();
        assert_eq!(error.attempts(), 1);
    }

    #[tokio::test]
    async fn test_load_succeeds_once_records_appear() {
        let dir = tempfile::tempdir().unwrap();
        let record = serde_json::to_vec(&capability("urn:uuid:1", "did:key:zB")).unwrap();
        std::fs::write(dir.path().join("abc-A.json"), &record).unwrap();

        let store = CapabilityStore::load(dir.path(), RetryPolicy::once())
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }
}
