//! Startup failure reporting
//!
//! The capability store and the identity registry are written by a
//! separately scheduled issuer process. Loads retry with a bounded
//! policy; once the policy is exhausted the process must refuse to
//! serve rather than operate on an empty snapshot.

/// A startup load that remained unavailable after bounded retries.
///
/// This is fatal: the caller must not begin serving requests.
#[derive(Debug, thiserror::Error)]
#[error("{what} unavailable after {attempts} attempts: {source}")]
pub struct StartupError {
    /// Which load failed (e.g. "capability store", "identity registry").
    what: &'static str,

    /// How many attempts were made before giving up.
    attempts: u32,

    /// The error returned by the final attempt.
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl StartupError {
    /// Record an exhausted startup load.
    pub fn new(
        what: &'static str,
        attempts: u32,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            what,
            attempts,
            source: Box::new(source),
        }
    }

    /// The number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
