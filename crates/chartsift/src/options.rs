// ABOUTME: Configuration options for extraction, plus ExtractorBuilder.
// ABOUTME: ExtractorBuilder provides a fluent API for constructing Extractor instances.

use std::sync::Arc;

use crate::extractor::Extractor;
use crate::extractors::candidates::{
    DEFAULT_MAX_CANDIDATE_LEN, DEFAULT_MIN_CANDIDATE_LEN, DEFAULT_NOISE_TERMS,
};
use crate::extractors::profile::ProfileRegistry;
use crate::extractors::songs::DEFAULT_MAX_FIELD_LEN;

/// Default fraction of the expected count a result must reach to succeed.
pub const DEFAULT_SUCCESS_THRESHOLD: f64 = 0.7;

/// Default valid ratio below which the generic profile is tried.
pub const DEFAULT_FALLBACK_RATIO: f64 = 0.7;

/// Tunables for one extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub success_threshold: f64,
    pub fallback_ratio: f64,
    pub min_candidate_len: usize,
    pub max_candidate_len: usize,
    /// Artist and title must both be shorter than this to count as valid.
    pub max_field_len: usize,
    pub noise_terms: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            fallback_ratio: DEFAULT_FALLBACK_RATIO,
            min_candidate_len: DEFAULT_MIN_CANDIDATE_LEN,
            max_candidate_len: DEFAULT_MAX_CANDIDATE_LEN,
            max_field_len: DEFAULT_MAX_FIELD_LEN,
            noise_terms: DEFAULT_NOISE_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Builder for constructing Extractor instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ExtractorBuilder {
    opts: ExtractOptions,
    registry: Option<Arc<ProfileRegistry>>,
}

impl ExtractorBuilder {
    /// Create a new ExtractorBuilder with default options and the builtin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options at once.
    pub fn options(mut self, opts: ExtractOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Set the fraction of the expected count needed for success.
    pub fn success_threshold(mut self, threshold: f64) -> Self {
        self.opts.success_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the valid ratio below which the generic profile is retried.
    pub fn fallback_ratio(mut self, ratio: f64) -> Self {
        self.opts.fallback_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the shortest candidate kept, in characters.
    pub fn min_candidate_len(mut self, len: usize) -> Self {
        self.opts.min_candidate_len = len;
        self
    }

    /// Set the longest candidate kept, in characters.
    pub fn max_candidate_len(mut self, len: usize) -> Self {
        self.opts.max_candidate_len = len;
        self
    }

    /// Set the field length limit used by the validity check.
    pub fn max_field_len(mut self, len: usize) -> Self {
        self.opts.max_field_len = len;
        self
    }

    /// Add a noise term to the blocklist.
    pub fn noise_term(mut self, term: impl Into<String>) -> Self {
        self.opts.noise_terms.push(term.into());
        self
    }

    /// Replace the noise blocklist.
    pub fn noise_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.noise_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Use a custom profile registry.
    pub fn registry(mut self, registry: ProfileRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Share a registry already held elsewhere.
    pub fn shared_registry(mut self, registry: Arc<ProfileRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the Extractor with the configured options.
    pub fn build(self) -> Extractor {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(crate::extractors::loader::load_builtin_registry()));
        Extractor::new(registry, self.opts)
    }
}
