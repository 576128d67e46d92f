//! Datapact Core
//!
//! Shared building blocks for the Datapact authorization engine:
//! - persistent identities and the label directory used to interpret
//!   reader caveats
//! - the resource catalog that classifies hosted resources as primary
//!   datasets or derived transform outputs
//! - the bounded-retry policy used for startup loads
//!
//! Everything in this crate is immutable after its initial load and
//! safe to share read-only across concurrent request handling.

pub mod catalog;
pub mod errors;
pub mod identity;
pub mod retry;

pub use catalog::{CatalogError, MemoryCatalog, NamingConvention, ResourceCatalog, ResourceKind};
pub use errors::StartupError;
pub use identity::{Did, DirectoryError, IdentityDirectory};
pub use retry::RetryPolicy;
