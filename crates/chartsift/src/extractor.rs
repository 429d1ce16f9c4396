// ABOUTME: The Extractor that runs the classify, extract, parse pipeline for one page.
// ABOUTME: Retries with the generic profile when the domain profile underperforms and keeps the better result.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classifier::{Classification, DomainClassifier, MatchSource};
use crate::content::{PageContent, Queryable};
use crate::error::Diagnostic;
use crate::extractors::candidates::{extract_candidates, Candidate, CandidateFilter};
use crate::extractors::profile::{ExtractionProfile, ProfileRegistry};
use crate::extractors::songs::parse_and_validate;
use crate::options::{ExtractOptions, ExtractorBuilder};
use crate::result::ExtractionResult;

/// Song extractor holding an immutable profile registry and options.
///
/// `Extractor` is `Send + Sync`; share one behind an `Arc` across workers.
#[derive(Debug, Clone)]
pub struct Extractor {
    classifier: DomainClassifier,
    opts: ExtractOptions,
    filter: CandidateFilter,
}

impl Extractor {
    /// Create a new ExtractorBuilder for configuring the extractor.
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::new()
    }

    /// Create a new Extractor from a registry and options.
    pub fn new(registry: Arc<ProfileRegistry>, opts: ExtractOptions) -> Self {
        let filter = CandidateFilter::new(
            opts.min_candidate_len,
            opts.max_candidate_len,
            &opts.noise_terms,
        );
        Self {
            classifier: DomainClassifier::new(registry),
            opts,
            filter,
        }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        self.classifier.registry()
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.opts
    }

    /// Classifies a URL without extracting anything.
    pub fn classify(&self, url: &str) -> Classification<'_> {
        self.classifier.classify(url)
    }

    /// Extracts songs from page content fetched from `url`.
    ///
    /// `expected_count` is the caller's own hint; when given, success means
    /// reaching `expected_count * success_threshold` songs. Empty and
    /// low-quality results never succeed.
    pub fn extract(
        &self,
        url: &str,
        content: &PageContent,
        expected_count: Option<usize>,
    ) -> ExtractionResult {
        match content {
            PageContent::Text(text) => self.extract_from(url, text, expected_count),
            PageContent::Html(html) => self.extract_from(url, html, expected_count),
        }
    }

    /// Extracts from a raw string, sniffing whether it is HTML or text.
    pub fn extract_str(&self, url: &str, raw: &str, expected_count: Option<usize>) -> ExtractionResult {
        self.extract(url, &PageContent::detect(raw), expected_count)
    }

    /// Extracts from any queryable content.
    pub fn extract_from<Q: Queryable>(
        &self,
        url: &str,
        content: &Q,
        expected_count: Option<usize>,
    ) -> ExtractionResult {
        let classification = self.classifier.classify(url);
        let primary = classification.profile;
        let mut errors = Vec::new();
        if classification.source == MatchSource::Default {
            errors.push(Diagnostic::NoProfileMatch {
                host: classification.host.clone(),
            });
        }

        let mut result = self.run_profile(content, primary, expected_count);

        if !primary.is_generic() && self.underperforms(&result) {
            let generic = self.registry().generic();
            warn!(
                url,
                profile = %primary.name,
                valid_ratio = result.quality.valid_ratio,
                songs = result.songs.len(),
                "profile underperformed, retrying with generic"
            );
            let fallback = self.run_profile(content, generic, expected_count);
            debug!(
                primary_ratio = result.quality.valid_ratio,
                fallback_ratio = fallback.quality.valid_ratio,
                "fallback finished"
            );
            if fallback.is_better_than(&result) {
                result = fallback;
            }
        }

        if result.quality.total == 0 {
            errors.push(Diagnostic::EmptyContent);
        } else if result.quality.valid_ratio < self.opts.fallback_ratio {
            warn!(
                url,
                profile = %result.profile_used,
                valid_ratio = result.quality.valid_ratio,
                "extraction stayed low quality"
            );
            errors.push(Diagnostic::LowQualityExtraction {
                profile: result.profile_used.clone(),
                valid_ratio: result.quality.valid_ratio,
            });
        }

        result.url = url.to_string();
        result.content_kind = classification.content_kind;
        result.errors = errors;

        info!(
            url,
            profile = %result.profile_used,
            songs = result.songs.len(),
            valid_ratio = result.quality.valid_ratio,
            success = result.success,
            "extraction finished"
        );
        result
    }

    /// Parses an already collected candidate list under a named profile.
    ///
    /// Unknown profile names fall back to generic.
    pub fn parse_candidates(
        &self,
        candidates: &[Candidate],
        profile: &str,
        expected_count: Option<usize>,
    ) -> ExtractionResult {
        let profile = self
            .registry()
            .get(profile)
            .unwrap_or_else(|| self.registry().generic());
        parse_and_validate(candidates, profile, expected_count, &self.opts)
    }

    fn run_profile<Q: Queryable>(
        &self,
        content: &Q,
        profile: &ExtractionProfile,
        expected_count: Option<usize>,
    ) -> ExtractionResult {
        let candidates = extract_candidates(content, profile, &self.filter);
        parse_and_validate(&candidates, profile, expected_count, &self.opts)
    }

    fn underperforms(&self, result: &ExtractionResult) -> bool {
        result.songs.is_empty() || result.quality.valid_ratio < self.opts.fallback_ratio
    }
}

impl Default for Extractor {
    fn default() -> Self {
        ExtractorBuilder::new().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_text_on_known_host() {
        let lines: Vec<String> = (1..=25)
            .map(|i| format!("{}. Artist {} - Song {}", i, i, i))
            .collect();
        let content = PageContent::from_text(&lines.join("\n"));

        let extractor = Extractor::default();
        let result = extractor.extract("https://pitchfork.com/best-songs", &content, Some(25));

        assert_eq!(result.profile_used, "editorial_style");
        assert_eq!(result.songs.len(), 25);
        assert_eq!(result.songs[0].artist, "Artist 1");
        assert_eq!(result.songs[24].position, 25);
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.url, "https://pitchfork.com/best-songs");
    }

    #[test]
    fn test_empty_content_diagnostic() {
        let extractor = Extractor::default();
        let result = extractor.extract_str("https://example.com/about", "", None);
        assert!(result.songs.is_empty());
        assert!(!result.success);
        assert_eq!(result.profile_used, "generic");
        assert!(result.errors.contains(&Diagnostic::EmptyContent));
        assert!(result.errors.contains(&Diagnostic::NoProfileMatch {
            host: Some("example.com".to_string())
        }));
    }

    #[test]
    fn test_parse_candidates_unknown_profile_uses_generic() {
        let extractor = Extractor::default();
        let candidates = vec![Candidate::new("Lorde - Royals")];
        let result = extractor.parse_candidates(&candidates, "nope", None);
        assert_eq!(result.profile_used, "generic");
        assert_eq!(result.songs.len(), 1);
    }

    #[test]
    fn test_extractor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extractor>();
    }
}
