// ABOUTME: Extraction strategies: profiles, candidate selection, and song parsing.
// ABOUTME: Groups the configuration model with the two stages that consume it.

//! Extraction module.
//!
//! Submodules:
//! - `profile`: extraction profiles, format rules, and the profile registry.
//! - `loader`: builtin and file-based registry loading.
//! - `candidates`: candidate line extraction from queryable content.
//! - `songs`: parsing, normalization, deduplication, and quality scoring.

pub mod candidates;
pub mod loader;
pub mod profile;
pub mod songs;
