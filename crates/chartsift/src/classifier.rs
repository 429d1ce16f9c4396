// ABOUTME: Domain classifier mapping a page URL to an extraction profile.
// ABOUTME: Exact host table first, then URL keyword heuristics, then the generic profile.

//! Domain classification.
//!
//! A URL is classified in three steps:
//! 1. Its host (lower-case, without `www.`) is looked up in the registry's
//!    domain table.
//! 2. On a miss, keywords in the URL suggest a [`ContentKind`] and an
//!    expected song count; the non-generic profile whose expected range fits
//!    that count best is chosen.
//! 3. Otherwise the generic profile is used.
//!
//! Classification never fails; unparseable URLs go straight to generic.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::extractors::profile::{normalize_host, ExtractionProfile, ProfileRegistry};

/// Kind of page suggested by keywords in its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Chart,
    List,
    Review,
    Article,
    #[default]
    Unknown,
}

/// How a profile was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Host,
    Heuristic,
    Default,
}

/// Outcome of classifying one URL.
#[derive(Debug, Clone)]
pub struct Classification<'r> {
    pub profile: &'r ExtractionProfile,
    /// Lower-case host without `www.`, if the URL had one.
    pub host: Option<String>,
    pub content_kind: ContentKind,
    pub expected_count: usize,
    pub source: MatchSource,
}

// Checked in order; the first kind with a hit wins.
const KIND_KEYWORDS: &[(ContentKind, &[&str])] = &[
    (ContentKind::Chart, &["hot", "top", "chart", "best", "billboard"]),
    (ContentKind::List, &["list", "100", "50", "countdown", "ranking"]),
    (ContentKind::Review, &["review"]),
    (ContentKind::Article, &["article", "feature"]),
];

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Guesses the content kind from URL keywords.
pub fn predict_content_kind(url: &str) -> ContentKind {
    let lower = url.to_lowercase();
    KIND_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(kind, _)| *kind)
        .unwrap_or_default()
}

/// Estimates how many songs a page lists from numbers and keywords in its URL.
pub fn estimate_song_count(url: &str) -> usize {
    let lower = url.to_lowercase();

    let embedded = NUMBER_RE
        .find_iter(&lower)
        .filter_map(|m| m.as_str().parse::<usize>().ok())
        .filter(|&n| (50..=200).contains(&n))
        .max();
    if let Some(n) = embedded {
        return n;
    }

    if lower.contains("hot-100") || lower.contains("top-100") {
        100
    } else if lower.contains("billboard-200") {
        200
    } else if ["best", "top", "chart"].iter().any(|w| lower.contains(w)) {
        50
    } else if lower.contains("review") {
        12
    } else {
        20
    }
}

/// Maps URLs to extraction profiles from a shared registry.
#[derive(Debug, Clone)]
pub struct DomainClassifier {
    registry: Arc<ProfileRegistry>,
}

impl DomainClassifier {
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Classifies a URL. Pure: the same URL always yields the same profile.
    pub fn classify(&self, url: &str) -> Classification<'_> {
        let content_kind = predict_content_kind(url);
        let expected_count = estimate_song_count(url);

        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(normalize_host));

        let (profile, source) = match host.as_deref().and_then(|h| self.registry.for_host(h)) {
            Some(profile) => (profile, MatchSource::Host),
            None if host.is_some() && content_kind != ContentKind::Unknown => {
                match self.best_fit(expected_count) {
                    Some(profile) => (profile, MatchSource::Heuristic),
                    None => (self.registry.generic(), MatchSource::Default),
                }
            }
            None => (self.registry.generic(), MatchSource::Default),
        };

        debug!(
            url,
            host = host.as_deref().unwrap_or("-"),
            profile = %profile.name,
            kind = ?content_kind,
            expected_count,
            source = ?source,
            "classified"
        );

        Classification {
            profile,
            host,
            content_kind,
            expected_count,
            source,
        }
    }

    /// The non-generic profile whose range contains `count` with the closest
    /// midpoint; narrower range, then registry order, break ties.
    fn best_fit(&self, count: usize) -> Option<&ExtractionProfile> {
        let mut best: Option<(&ExtractionProfile, f64, usize)> = None;
        for profile in self.registry.iter() {
            let range = &profile.expected_count_range;
            if profile.is_generic() || !range.contains(count) {
                continue;
            }
            let distance = (range.midpoint() - count as f64).abs();
            let width = range.width();
            let better = match best {
                None => true,
                Some((_, d, w)) => distance < d || (distance == d && width < w),
            };
            if better {
                best = Some((profile, distance, width));
            }
        }
        best.map(|(profile, _, _)| profile)
    }
}
