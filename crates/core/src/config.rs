//! Layered configuration loading.
//!
//! Both binaries (`attest-prover`, `attest-verifier`) follow the same
//! three-layer precedence: compiled-in defaults, an optional TOML config
//! file, then CLI flags explicitly passed on the command line override
//! whatever the file said. This module provides the file-loading half;
//! the merge-with-CLI half lives in each binary's own `Config` type
//! since the fields differ between prover and verifier.

use crate::error::CoreError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load and parse a TOML config file, if `path` is given and the file
/// exists. Returns `Ok(None)` when no path was given, and an error when
/// a path was given but the file is missing or malformed.
#[cfg(feature = "toml")]
pub fn load_file<T, P>(path: Option<P>) -> Result<Option<T>, CoreError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let Some(path) = path else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path.as_ref())?;
    let parsed: T = toml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))?;
    Ok(Some(parsed))
}

/// Resolve a single config value using the standard precedence: an
/// explicitly-set CLI value wins, otherwise the file value, otherwise
/// the compiled-in default.
pub fn resolve<T>(cli: Option<T>, file: Option<T>, default: T) -> T {
    cli.or(file).unwrap_or(default)
}
