//! Authorization decisions
//!
//! `evaluate` is a pure, synchronous function of the request and the
//! immutable store/directory/catalog snapshot: an ordered sequence of
//! checks where the first failing check terminates with a specific
//! deny reason and no branch falls through to an allow. The engine
//! performs no I/O; fetching resource bytes after an allow is a
//! separate, independently-failing step.

use crate::capability::{Action, Capability};
use crate::store::CapabilityStore;
use datapact_core::{Did, IdentityDirectory, ResourceCatalog, ResourceKind};

/// One access request, as forwarded by the transport layer after it
/// has verified the invocation signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    /// The capability reference presented by the caller.
    pub capability_id: Option<String>,

    /// The already-authenticated caller identity.
    pub caller: Option<Did>,

    /// The resource path being requested, e.g. `/ab.json`.
    pub path: String,
}

/// Why a request was denied. Logged internally with full detail; the
/// transport surfaces authorization denials as a generic forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The requested path names no hosted resource.
    NotFound,

    /// Capability reference or caller identity missing.
    BadRequest,

    /// The capability id resolves to nothing in the store.
    CapabilityUnrecognized,

    /// The capability does not allow the requested action.
    ActionNotAllowed,

    /// The capability is scoped to a different resource.
    TargetMismatch,

    /// The caller is not the controller of the capability.
    ControllerMismatch,

    /// The capability authorizes a different transform protocol.
    ProtocolMismatch,

    /// The caller is neither the controller nor a permitted reader.
    ReaderMismatch,
}

impl DenyReason {
    /// Stable reason code for audit records.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NotFound => "not_found",
            DenyReason::BadRequest => "bad_request",
            DenyReason::CapabilityUnrecognized => "capability_unrecognized",
            DenyReason::ActionNotAllowed => "action_not_allowed",
            DenyReason::TargetMismatch => "target_mismatch",
            DenyReason::ControllerMismatch => "controller_mismatch",
            DenyReason::ProtocolMismatch => "protocol_mismatch",
            DenyReason::ReaderMismatch => "reader_mismatch",
        }
    }

    /// HTTP-style status for the transport layer. Authorization
    /// denials all collapse to 403; no detail beyond that leaks out.
    pub fn http_status(&self) -> u16 {
        match self {
            DenyReason::NotFound => 404,
            DenyReason::BadRequest => 400,
            _ => 403,
        }
    }
}

/// The outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Access granted to the named resource.
    Allow {
        /// Catalog key of the resource to serve.
        path: String,
    },

    /// Access denied; terminal, never retried.
    Deny(DenyReason),
}

impl Decision {
    /// Whether this decision grants access.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }
}

/// The decision engine: an immutable snapshot of capabilities,
/// identities, and hosted resources.
///
/// Nothing here mutates after construction, so one engine value can be
/// shared behind an `Arc` across arbitrarily many concurrent
/// evaluations without synchronization.
#[derive(Debug, Clone)]
pub struct AuthorizationEngine<C> {
    store: CapabilityStore,
    directory: IdentityDirectory,
    catalog: C,
}

impl<C: ResourceCatalog> AuthorizationEngine<C> {
    /// Assemble an engine from loaded components.
    pub fn new(store: CapabilityStore, directory: IdentityDirectory, catalog: C) -> Self {
        Self {
            store,
            directory,
            catalog,
        }
    }

    /// The capability store, for introspection queries.
    pub fn store(&self) -> &CapabilityStore {
        &self.store
    }

    /// The resource catalog, for serving bytes after an allow.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Decide whether `request` may proceed, emitting one structured
    /// audit event per evaluation.
    pub fn evaluate(&self, request: &AccessRequest) -> Decision {
        let decision = self.decide(request);
        let capability = request.capability_id.as_deref().unwrap_or("-");
        let caller = request.caller.as_ref().map(Did::as_str).unwrap_or("-");
        match &decision {
            Decision::Allow { path } => {
                tracing::info!(capability, caller, %path, decision = "allow", "access granted");
            }
            Decision::Deny(reason) => {
                tracing::warn!(
                    capability,
                    caller,
                    path = %request.path,
                    decision = "deny",
                    reason = reason.code(),
                    "access denied"
                );
            }
        }
        decision
    }

    fn decide(&self, request: &AccessRequest) -> Decision {
        let Some(kind) = self.catalog.kind_of(&request.path) else {
            return Decision::Deny(DenyReason::NotFound);
        };
        let (Some(capability_id), Some(caller)) = (&request.capability_id, &request.caller) else {
            return Decision::Deny(DenyReason::BadRequest);
        };
        let Some(capability) = self.store.lookup(capability_id) else {
            return Decision::Deny(DenyReason::CapabilityUnrecognized);
        };
        match kind {
            ResourceKind::Primary => self.check_read(capability, caller, &request.path),
            ResourceKind::Derived { protocol } => {
                self.check_transform(capability, caller, protocol, &request.path)
            }
        }
    }

    /// Direct read of a primary dataset: the capability must allow
    /// read, be scoped to exactly this path, and be invoked by its
    /// controller. The parent chain is never walked.
    fn check_read(&self, capability: &Capability, caller: &Did, path: &str) -> Decision {
        if !capability.allows(Action::Read) {
            return Decision::Deny(DenyReason::ActionNotAllowed);
        }
        match capability.target_path() {
            Some(target) if target == path => {}
            _ => return Decision::Deny(DenyReason::TargetMismatch),
        }
        if capability.controller != *caller {
            return Decision::Deny(DenyReason::ControllerMismatch);
        }
        Decision::Allow {
            path: path.to_string(),
        }
    }

    /// Fetch of a derived transform output: the capability must allow
    /// transform, its protocol caveat must match the protocol that
    /// produced the resource, and the caller must be the controller or
    /// carry a label listed in the readers caveat. Readers are tested
    /// by label; an identity the directory does not know fails closed.
    fn check_transform(
        &self,
        capability: &Capability,
        caller: &Did,
        protocol: &str,
        path: &str,
    ) -> Decision {
        if !capability.allows(Action::Transform) {
            return Decision::Deny(DenyReason::ActionNotAllowed);
        }
        if capability.protocol_caveat() != Some(protocol) {
            return Decision::Deny(DenyReason::ProtocolMismatch);
        }
        if capability.controller != *caller {
            let permitted = self
                .directory
                .label_of(caller)
                .is_some_and(|label| capability.reader_caveat().iter().any(|r| r == label));
            if !permitted {
                return Decision::Deny(DenyReason::ReaderMismatch);
            }
        }
        Decision::Allow {
            path: path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Caveats;
    use datapact_core::MemoryCatalog;

    fn did(tag: &str) -> Did {
        Did::from(format!("did:key:z{tag}").as_str())
    }

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog.insert("/ab.json", ResourceKind::Primary, b"{}".as_slice());
        catalog.insert(
            "/x-to-y.json",
            ResourceKind::Derived {
                protocol: "x-to-y".to_string(),
            },
            b"{}".as_slice(),
        );
        catalog
    }

    fn read_capability() -> Capability {
        Capability {
            id: "urn:uuid:read".to_string(),
            parent: None,
            invoker: did("A"),
            controller: did("B"),
            invocation_target: Some("https://a.example.com/ab.json".parse().unwrap()),
            allowed_actions: vec![Action::Read],
            caveats: None,
        }
    }

    fn engine(capabilities: Vec<Capability>) -> AuthorizationEngine<MemoryCatalog> {
        let store = CapabilityStore::from_capabilities(capabilities).unwrap();
        let directory = IdentityDirectory::from_entries(vec![
            ("CompanyA".to_string(), did("A")),
            ("CompanyB".to_string(), did("B")),
            ("UserC".to_string(), did("C")),
        ])
        .unwrap();
        AuthorizationEngine::new(store, directory, catalog())
    }

    fn request(capability_id: &str, caller: Did, path: &str) -> AccessRequest {
        AccessRequest {
            capability_id: Some(capability_id.to_string()),
            caller: Some(caller),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_unknown_resource_denied_before_anything_else() {
        let engine = engine(vec![read_capability()]);
        // Even with no capability reference at all, a miss on the
        // catalog reports not-found, not bad-request.
        let decision = engine.evaluate(&AccessRequest {
            capability_id: None,
            caller: None,
            path: "/missing.json".to_string(),
        });
        assert_eq!(decision, Decision::Deny(DenyReason::NotFound));
    }

    #[test]
    fn test_missing_reference_is_bad_request() {
        let engine = engine(vec![read_capability()]);

        let mut incomplete = request("urn:uuid:read", did("B"), "/ab.json");
        incomplete.caller = None;
        assert_eq!(
            engine.evaluate(&incomplete),
            Decision::Deny(DenyReason::BadRequest)
        );

        let mut incomplete = request("urn:uuid:read", did("B"), "/ab.json");
        incomplete.capability_id = None;
        assert_eq!(
            engine.evaluate(&incomplete),
            Decision::Deny(DenyReason::BadRequest)
        );
    }

    #[test]
    fn test_unresolvable_capability_denied_without_panic() {
        let engine = engine(vec![read_capability()]);
        let decision = engine.evaluate(&request("urn:uuid:nope", did("B"), "/ab.json"));
        assert_eq!(decision, Decision::Deny(DenyReason::CapabilityUnrecognized));
    }

    #[test]
    fn test_read_requires_read_action() {
        let mut capability = read_capability();
        capability.allowed_actions = vec![Action::Delegate];
        let engine = engine(vec![capability]);

        let decision = engine.evaluate(&request("urn:uuid:read", did("B"), "/ab.json"));
        assert_eq!(decision, Decision::Deny(DenyReason::ActionNotAllowed));
    }

    #[test]
    fn test_read_scoped_to_exact_target_path() {
        let mut other = read_capability();
        other.id = "urn:uuid:other".to_string();
        other.invocation_target = Some("https://a.example.com/other.json".parse().unwrap());
        let engine = engine(vec![read_capability(), other]);

        // Same controller, wrong resource: the capability cannot be
        // reused against a path it was not scoped to.
        let decision = engine.evaluate(&request("urn:uuid:other", did("B"), "/ab.json"));
        assert_eq!(decision, Decision::Deny(DenyReason::TargetMismatch));
    }

    #[test]
    fn test_read_without_target_is_a_mismatch() {
        let mut capability = read_capability();
        capability.invocation_target = None;
        let engine = engine(vec![capability]);

        let decision = engine.evaluate(&request("urn:uuid:read", did("B"), "/ab.json"));
        assert_eq!(decision, Decision::Deny(DenyReason::TargetMismatch));
    }

    #[test]
    fn test_controller_must_match_exactly_no_parent_walk() {
        // A delegated capability records its parent, but evaluation
        // only ever consults the immediate record.
        let mut capability = read_capability();
        capability.parent = Some("urn:uuid:root".to_string());
        let engine = engine(vec![capability]);

        let decision = engine.evaluate(&request("urn:uuid:read", did("C"), "/ab.json"));
        assert_eq!(decision, Decision::Deny(DenyReason::ControllerMismatch));
    }

    #[test]
    fn test_transform_protocol_caveat_must_match() {
        let capability = Capability {
            id: "urn:uuid:tf".to_string(),
            parent: None,
            invoker: did("A"),
            controller: did("B"),
            invocation_target: Some("https://a.example.com/ab.json".parse().unwrap()),
            allowed_actions: vec![Action::Transform],
            caveats: Some(Caveats {
                protocol: Some("x-to-z".to_string()),
                readers: vec!["CompanyB".to_string()],
                target_domain: None,
            }),
        };
        let engine = engine(vec![capability]);

        let decision = engine.evaluate(&request("urn:uuid:tf", did("B"), "/x-to-y.json"));
        assert_eq!(decision, Decision::Deny(DenyReason::ProtocolMismatch));
    }

    #[test]
    fn test_transform_without_caveats_never_matches_a_protocol() {
        let capability = Capability {
            id: "urn:uuid:tf".to_string(),
            parent: None,
            invoker: did("A"),
            controller: did("B"),
            invocation_target: None,
            allowed_actions: vec![Action::Transform],
            caveats: None,
        };
        let engine = engine(vec![capability]);

        let decision = engine.evaluate(&request("urn:uuid:tf", did("B"), "/x-to-y.json"));
        assert_eq!(decision, Decision::Deny(DenyReason::ProtocolMismatch));
    }

    #[test]
    fn test_evaluate_is_idempotent_on_a_fixed_snapshot() {
        let engine = engine(vec![read_capability()]);
        let request = request("urn:uuid:read", did("B"), "/ab.json");

        let first = engine.evaluate(&request);
        assert!(first.is_allow());
        for _ in 0..10 {
            assert_eq!(engine.evaluate(&request), first);
        }
    }

    #[test]
    fn test_status_mapping_leaks_no_denial_detail() {
        assert_eq!(DenyReason::NotFound.http_status(), 404);
        assert_eq!(DenyReason::BadRequest.http_status(), 400);
        // Every authorization denial is externally the same forbidden.
        for reason in [
            DenyReason::CapabilityUnrecognized,
            DenyReason::ActionNotAllowed,
            DenyReason::TargetMismatch,
            DenyReason::ControllerMismatch,
            DenyReason::ProtocolMismatch,
            DenyReason::ReaderMismatch,
        ] {
            assert_eq!(reason.http_status(), 403);
        }
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuthorizationEngine<MemoryCatalog>>();
    }
}
