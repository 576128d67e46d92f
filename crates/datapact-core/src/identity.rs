//! Persistent identities and the label directory
//!
//! Parties are authenticated by persistent identity strings (DIDs),
//! but capability caveats name parties by short human labels. The
//! directory is the bidirectional label ↔ identity mapping built once
//! from the trusted root registry; an identity with no known label can
//! never satisfy a label-based caveat (fails closed).

use crate::{RetryPolicy, StartupError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A persistent party identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Did {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Did {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Directory construction errors.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("registry unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("label {0} registered twice")]
    DuplicateLabel(String),

    #[error("identity {0} registered under two labels")]
    DuplicateIdentity(Did),
}

/// One registry entry. The registry also persists key material for the
/// issuing workflow; only the identity is consumed here, unknown
/// fields are ignored.
#[derive(Debug, Deserialize)]
struct RegistryEntry {
    did: Did,
}

/// Bidirectional mapping between labels and persistent identities.
///
/// Built once at startup from the root identity registry and never
/// mutated afterwards, so it is safe to share read-only across
/// concurrent evaluations.
#[derive(Debug, Clone, Default)]
pub struct IdentityDirectory {
    label_by_did: HashMap<Did, String>,
    did_by_label: HashMap<String, Did>,
}

impl IdentityDirectory {
    /// Build a directory from (label, identity) pairs, enforcing the
    /// 1:1 invariant in both directions.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, Did)>,
    ) -> Result<Self, DirectoryError> {
        let mut directory = Self::default();
        for (label, did) in entries {
            if directory.did_by_label.contains_key(&label) {
                return Err(DirectoryError::DuplicateLabel(label));
            }
            if directory.label_by_did.contains_key(&did) {
                return Err(DirectoryError::DuplicateIdentity(did));
            }
            directory.label_by_did.insert(did.clone(), label.clone());
            directory.did_by_label.insert(label, did);
        }
        Ok(directory)
    }

    /// Parse the root registry (a JSON map of label → entry).
    pub fn parse_registry(raw: &[u8]) -> Result<Self, DirectoryError> {
        let registry: HashMap<String, RegistryEntry> = serde_json::from_slice(raw)?;
        Self::from_entries(registry.into_iter().map(|(label, entry)| (label, entry.did)))
    }

    /// Load the registry file, retrying while the issuer has not yet
    /// written it.
    pub async fn load(path: impl AsRef<Path>, retry: RetryPolicy) -> Result<Self, StartupError> {
        let path = path.as_ref();
        retry
            .run(|| async move {
                let raw = tokio::fs::read(path).await?;
                let directory = Self::parse_registry(&raw)?;
                tracing::info!(path = %path.display(), parties = directory.len(), "identity registry loaded");
                Ok(directory)
            })
            .await
            .map_err(|error: DirectoryError| {
                StartupError::new("identity registry", retry.max_attempts, error)
            })
    }

    /// Translate an authenticated identity to its label, if known.
    pub fn label_of(&self, did: &Did) -> Option<&str> {
        self.label_by_did.get(did).map(String::as_str)
    }

    /// Resolve a label to its persistent identity, if registered.
    pub fn identity_of(&self, label: &str) -> Option<&Did> {
        self.did_by_label.get(label)
    }

    /// Number of registered parties.
    pub fn len(&self) -> usize {
        self.did_by_label.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.did_by_label.is_empty()
    }
}
