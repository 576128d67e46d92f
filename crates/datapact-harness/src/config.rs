//! Harness configuration
//!
//! Flags win over environment variables, which win over the defaults
//! the deployment uses (`/caps` and `/data` volumes shared with the
//! issuer and the dataset producer).

use datapact_authorization::store::REGISTRY_FILE_NAME;
use std::path::PathBuf;

/// Resolved locations of the shared inputs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding capability records and the identity registry.
    pub caps_dir: PathBuf,

    /// Directory holding the hosted datasets.
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve from optional flag values with env fallbacks.
    pub fn resolve(caps_dir: Option<PathBuf>, data_dir: Option<PathBuf>) -> Self {
        Self {
            caps_dir: caps_dir
                .or_else(|| std::env::var_os("CAPS_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("/caps")),
            data_dir: data_dir
                .or_else(|| std::env::var_os("DATA_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("/data")),
        }
    }

    /// Path of the identity registry inside the caps directory.
    pub fn registry_path(&self) -> PathBuf {
        self.caps_dir.join(REGISTRY_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::resolve(Some(PathBuf::from("./caps")), None);
        assert_eq!(config.caps_dir, PathBuf::from("./caps"));
        assert_eq!(config.registry_path(), PathBuf::from("./caps/keys.json"));
    }
}
