//! Capability records
//!
//! A capability is an unscoped bearer token granting specific actions
//! on a specific resource to a specific controller. Records are plain
//! JSON objects produced by the issuing workflow; field names on the
//! wire are camelCase.

use crate::errors::LoadError;
use datapact_core::Did;
use serde::{Deserialize, Serialize};
use url::Url;

/// Actions a capability may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Fetch a primary dataset.
    Read,

    /// Mint a narrower capability for another party.
    Delegate,

    /// Produce and expose the output of a declared protocol.
    Transform,
}

/// Caveats narrowing how a capability may be used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caveats {
    /// The only transform protocol this capability authorizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// Controller *labels* allowed to fetch the transform output.
    /// Labels, not identities: the engine translates the caller's
    /// identity through the directory before testing membership.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readers: Vec<String>,

    /// Domain hosting the derived output. Recorded by the issuer;
    /// not enforced by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_domain: Option<String>,
}

/// A delegated capability record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    /// Globally unique opaque identifier (`urn:uuid:…` in practice).
    pub id: String,

    /// The capability this one was delegated from. Recorded for
    /// accountability only: evaluation never walks the chain, the
    /// immediate record's own fields are authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Identity of the party that minted this capability.
    pub invoker: Did,

    /// Identity currently entitled to invoke this capability.
    pub controller: Did,

    /// Absolute URI of the resource a read-type capability grants.
    /// Parsing into [`Url`] enforces well-formedness at the load
    /// boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_target: Option<Url>,

    /// Actions this capability allows; never empty in a valid record.
    pub allowed_actions: Vec<Action>,

    /// Optional caveats narrowing applicability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caveats: Option<Caveats>,
}

impl Capability {
    /// Whether this capability allows the given action.
    pub fn allows(&self, action: Action) -> bool {
        self.allowed_actions.contains(&action)
    }

    /// The path component of the invocation target, if present.
    pub fn target_path(&self) -> Option<&str> {
        self.invocation_target.as_ref().map(Url::path)
    }

    /// The protocol caveat, if present.
    pub fn protocol_caveat(&self) -> Option<&str> {
        self.caveats.as_ref()?.protocol.as_deref()
    }

    /// The reader labels caveat; empty when absent.
    pub fn reader_caveat(&self) -> &[String] {
        self.caveats
            .as_ref()
            .map(|caveats| caveats.readers.as_slice())
            .unwrap_or_default()
    }

    /// Check record invariants that JSON shape alone cannot express.
    /// Runs once at the load boundary.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.allowed_actions.is_empty() {
            return Err(LoadError::EmptyActions(self.id.clone()));
        }
        if self.protocol_caveat().is_some() && !self.allows(Action::Transform) {
            return Err(LoadError::ProtocolWithoutTransform(self.id.clone()));
        }
        Ok(())
    }
}
