//! Datapact Authorization
//!
//! Capability-based access-control decisions for a federated,
//! multi-party dataset-sharing service. Trust is encoded entirely in
//! delegated capability records and their caveats; there is no central
//! authorization authority.
//!
//! The caller identity arriving here is a precondition: an external
//! transport layer has already verified the invocation signature.
//! This crate only answers whether that verified identity, presenting
//! a specific capability, may access a specific resource:
//!
//! - [`CapabilityStore`] loads the persisted capability records and
//!   indexes them by id and by controller.
//! - [`AuthorizationEngine::evaluate`] is the pure decision function,
//!   an ordered fail-closed sequence of checks.
//!
//! Revocation, expiry, and multi-hop delegation-chain validation are
//! deliberately not modeled; see the notes on [`Capability::parent`].

pub mod capability;
pub mod engine;
pub mod errors;
pub mod store;

pub use capability::{Action, Capability, Caveats};
pub use engine::{AccessRequest, AuthorizationEngine, Decision, DenyReason};
pub use errors::LoadError;
pub use store::CapabilityStore;

// Core types the public API is expressed in.
pub use datapact_core::{
    Did, IdentityDirectory, MemoryCatalog, NamingConvention, ResourceCatalog, ResourceKind,
    RetryPolicy, StartupError,
};
