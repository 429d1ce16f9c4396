// ABOUTME: Candidate line extraction: runs a profile's selectors against queryable content.
// ABOUTME: Filters noise, strips leading position markers, and keeps document order.

//! Candidate line extraction.
//!
//! Key behaviors:
//! - Selectors are tried in profile order; the first whose candidate count
//!   exceeds the profile's `min_candidates` wins.
//! - If none does, a secondary scan (paragraphs, headings, plain lines) runs
//!   with the same threshold. If that also falls short, the largest candidate
//!   set seen so far is returned, earliest selector first on ties.
//! - Entries that are too short, too long, or contain a noise term are dropped.
//! - A leading `N. `, `N - `, `N) ` or `#N. ` marker becomes the position.
//! - Raw duplicates are kept; deduplication happens on parsed songs.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::content::{normalize_whitespace, NodeQuery, Queryable};
use crate::extractors::profile::{CompiledSelector, ExtractionProfile, PairOrder, Role, SelectorMatcher};

/// Terms marking page furniture rather than list entries.
pub const DEFAULT_NOISE_TERMS: &[&str] = &[
    "advertisement",
    "subscribe",
    "cookie",
    "privacy",
    "newsletter",
    "sign up",
    "terms of use",
    "all rights reserved",
];

pub const DEFAULT_MIN_CANDIDATE_LEN: usize = 5;
pub const DEFAULT_MAX_CANDIDATE_LEN: usize = 300;

/// An unparsed line suspected to encode one song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub raw_text: String,
    /// 1-based rank taken from a numbering marker.
    pub position: Option<u32>,
}

impl Candidate {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            position: None,
        }
    }

    pub fn with_position(raw_text: impl Into<String>, position: u32) -> Self {
        Self {
            raw_text: raw_text.into(),
            position: Some(position),
        }
    }

    /// Builds a candidate from a line, lifting any leading marker into `position`.
    pub fn from_line(line: &str) -> Self {
        let (position, rest) = split_marker(line);
        Self {
            raw_text: rest.to_string(),
            position,
        }
    }
}

/// Length and noise limits applied to every collected string.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    min_len: usize,
    max_len: usize,
    noise: Option<AhoCorasick>,
}

impl CandidateFilter {
    pub fn new<I, S>(min_len: usize, max_len: usize, noise_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = noise_terms
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let noise = if terms.is_empty() {
            None
        } else {
            match AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build(&terms)
            {
                Ok(ac) => Some(ac),
                Err(e) => {
                    warn!("noise filter disabled: {}", e);
                    None
                }
            }
        };
        Self {
            min_len,
            max_len,
            noise,
        }
    }

    /// Returns true if a normalized string may become a candidate.
    pub fn accepts(&self, text: &str) -> bool {
        let len = text.chars().count();
        if len < self.min_len || len > self.max_len {
            return false;
        }
        match &self.noise {
            Some(ac) => !ac.is_match(text),
            None => true,
        }
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_CANDIDATE_LEN,
            DEFAULT_MAX_CANDIDATE_LEN,
            DEFAULT_NOISE_TERMS,
        )
    }
}

// Position markers in priority order
static MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(\d{1,3})\.\s+(.+)$",
        r"^(\d{1,3})\s+[-–]\s+(.+)$",
        r"^(\d{1,3})\)\s+(.+)$",
        r"^#(\d{1,3})\.\s+(.+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RUN_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)\d{1,3}\.\s").unwrap());

/// Splits a leading position marker off a line.
///
/// Returns the 1-based position and the remaining text; without a marker the
/// position is `None` and the text is returned unchanged.
pub fn split_marker(line: &str) -> (Option<u32>, &str) {
    for re in MARKERS.iter() {
        if let Some(caps) = re.captures(line) {
            let pos = caps[1].parse::<u32>().ok().filter(|&n| n > 0);
            if let (Some(pos), Some(rest)) = (pos, caps.get(2)) {
                return (Some(pos), rest.as_str().trim());
            }
        }
    }
    (None, line)
}

/// Splits flattened text wherever an inline `N. ` marker begins.
///
/// Text before the first marker is discarded.
fn split_numbered_runs(text: &str) -> Vec<String> {
    let starts: Vec<usize> = RUN_START
        .find_iter(text)
        .map(|m| m.start() + (m.as_str().len() - m.as_str().trim_start().len()))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim().to_string()
        })
        .filter(|run| !run.is_empty())
        .collect()
}

fn node_texts<Q: Queryable>(content: &Q, query: NodeQuery<'_>) -> Vec<String> {
    content
        .query(query)
        .into_iter()
        .map(|node| content.text(node))
        .collect()
}

/// Collects raw strings for one selector, before filtering.
fn collect<Q: Queryable>(content: &Q, selector: &CompiledSelector) -> Vec<String> {
    match selector.matcher() {
        SelectorMatcher::Role(role) => node_texts(content, NodeQuery::Role(*role)),
        SelectorMatcher::Css(css) => node_texts(content, NodeQuery::Css(css)),
        SelectorMatcher::SiblingPair { selector, order } => content
            .query(NodeQuery::Css(selector))
            .into_iter()
            .filter_map(|node| {
                let first = content.text(node);
                let second = content
                    .next_sibling(node)
                    .map(|s| content.text(s))
                    .filter(|s| !s.is_empty())?;
                Some(match order {
                    PairOrder::TitleFirst => format!("{} - {}", second, first),
                    PairOrder::ArtistFirst => format!("{} - {}", first, second),
                })
            })
            .collect(),
        SelectorMatcher::NumberedLines => content
            .lines()
            .into_iter()
            .filter(|line| split_marker(line).0.is_some())
            .collect(),
        SelectorMatcher::NumberedRuns => split_numbered_runs(&content.lines().join(" ")),
        SelectorMatcher::Lines => content.lines(),
        SelectorMatcher::Pattern(re) => content
            .lines()
            .iter()
            .flat_map(|line| {
                re.captures_iter(line)
                    .filter_map(|caps| caps.name("entry").or_else(|| caps.get(0)))
                    .map(|m| m.as_str().to_string())
                    .collect::<Vec<_>>()
            })
            .collect(),
    }
}

/// Runs one selector and turns its strings into candidates.
pub fn run_selector<Q: Queryable>(
    content: &Q,
    selector: &CompiledSelector,
    filter: &CandidateFilter,
) -> Vec<Candidate> {
    collect(content, selector)
        .into_iter()
        .filter_map(|raw| {
            let text = normalize_whitespace(&raw);
            if !filter.accepts(&text) {
                return None;
            }
            let candidate = Candidate::from_line(&text);
            (!candidate.raw_text.is_empty()).then_some(candidate)
        })
        .collect()
}

fn secondary_selectors() -> [CompiledSelector; 3] {
    [
        CompiledSelector::role(Role::Paragraph),
        CompiledSelector::role(Role::Heading),
        CompiledSelector::lines(),
    ]
}

/// Extracts candidates from content under a profile.
///
/// Never fails: empty or unqueryable content yields an empty vector.
pub fn extract_candidates<Q: Queryable>(
    content: &Q,
    profile: &ExtractionProfile,
    filter: &CandidateFilter,
) -> Vec<Candidate> {
    let threshold = profile.min_candidates;
    let mut best: Vec<Candidate> = Vec::new();

    let secondary = secondary_selectors();
    let primary = profile.candidate_selectors.iter();
    for (tier, selector) in primary
        .map(|s| ("primary", s))
        .chain(secondary.iter().map(|s| ("secondary", s)))
    {
        let found = run_selector(content, selector, filter);
        debug!(
            profile = %profile.name,
            tier,
            selector = %selector,
            count = found.len(),
            "candidate selector ran"
        );
        if found.len() > threshold {
            return found;
        }
        if found.len() > best.len() {
            best = found;
        }
    }

    debug!(
        profile = %profile.name,
        count = best.len(),
        threshold,
        "no selector cleared threshold, using largest set"
    );
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{HtmlContent, TextContent};
    use crate::extractors::profile::{CandidateSelector, CountRange, FormatRule};
    use pretty_assertions::assert_eq;

    fn compiled(spec: CandidateSelector) -> CompiledSelector {
        CompiledSelector::compile(spec, "test").unwrap()
    }

    fn profile(selectors: Vec<CandidateSelector>, min_candidates: usize) -> ExtractionProfile {
        ExtractionProfile {
            name: "test".to_string(),
            description: String::new(),
            expected_count_range: CountRange::new(1, 100),
            min_candidates,
            candidate_selectors: selectors.into_iter().map(compiled).collect(),
            format_rules: FormatRule::standard(),
        }
    }

    #[test]
    fn test_split_marker_forms_in_priority_order() {
        assert_eq!(split_marker("1. Daft Punk - One More Time"), (Some(1), "Daft Punk - One More Time"));
        assert_eq!(split_marker("12 - SZA - Kill Bill"), (Some(12), "SZA - Kill Bill"));
        assert_eq!(split_marker("3) Lorde - Royals"), (Some(3), "Lorde - Royals"));
        assert_eq!(split_marker("#4. Drake - Hotline Bling"), (Some(4), "Drake - Hotline Bling"));
        assert_eq!(split_marker("#1 Crush - Garbage"), (None, "#1 Crush - Garbage"));
        assert_eq!(split_marker("2 Chainz - Birthday Song"), (None, "2 Chainz - Birthday Song"));
        assert_eq!(split_marker("1999 - Prince"), (None, "1999 - Prince"));
        assert_eq!(split_marker("0. Nobody - Nothing"), (None, "0. Nobody - Nothing"));
    }

    #[test]
    fn test_filter_length_and_noise() {
        let filter = CandidateFilter::default();
        assert!(!filter.accepts("ABBA"));
        assert!(filter.accepts("ABBA - SOS"));
        assert!(!filter.accepts("Subscribe to our Newsletter"));
        assert!(!filter.accepts("Read our PRIVACY policy"));
        assert!(!filter.accepts(&"x".repeat(301)));
    }

    #[test]
    fn test_numbered_runs_split_flattened_text() {
        let runs = split_numbered_runs("Our picks 1. A - B 2. C - D 10. E - F");
        assert_eq!(runs, vec!["1. A - B", "2. C - D", "10. E - F"]);
    }

    #[test]
    fn test_first_selector_over_threshold_wins() {
        let text: String = (1..=12)
            .map(|i| format!("{}. Artist {} - Song {}\n", i, i, i))
            .collect();
        let content = TextContent::new(&text);
        let p = profile(vec![CandidateSelector::NumberedLines, CandidateSelector::Lines], 10);

        let found = extract_candidates(&content, &p, &CandidateFilter::default());
        assert_eq!(found.len(), 12);
        assert_eq!(found[0], Candidate::with_position("Artist 1 - Song 1", 1));
        assert_eq!(found[11].position, Some(12));
    }

    #[test]
    fn test_largest_set_when_nothing_clears_threshold() {
        let html = r#"<html><body>
            <ol><li>SZA - Kill Bill</li><li>Lorde - Royals</li><li>Drake - Hotline Bling</li></ol>
            <p>A short intro paragraph.</p>
        </body></html>"#;
        let content = HtmlContent::new(html);
        let p = profile(
            vec![CandidateSelector::Role {
                role: Role::OrderedListItem,
            }],
            20,
        );

        let found = extract_candidates(&content, &p, &CandidateFilter::default());
        // lines scan finds the three items plus the paragraph
        assert_eq!(found.len(), 4);
        assert_eq!(found[0].raw_text, "SZA - Kill Bill");
        assert_eq!(found[3].raw_text, "A short intro paragraph.");
    }

    #[test]
    fn test_earliest_selector_wins_ties() {
        let html = r#"<ol><li>SZA - Kill Bill</li><li>Lorde - Royals</li></ol>"#;
        let content = HtmlContent::new(html);
        let p = profile(
            vec![
                CandidateSelector::Role {
                    role: Role::OrderedListItem,
                },
                CandidateSelector::Role {
                    role: Role::ListItem,
                },
            ],
            10,
        );
        let found = extract_candidates(&content, &p, &CandidateFilter::default());
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let content = TextContent::new("SZA - Kill Bill\nSZA - Kill Bill\n");
        let p = profile(vec![CandidateSelector::Lines], 0);
        let found = extract_candidates(&content, &p, &CandidateFilter::default());
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_sibling_pair_title_first() {
        let html = r#"<ul>
            <li class="row"><span>1</span><h3>Flowers</h3><span>Miley Cyrus</span></li>
            <li class="row"><span>2</span><h3>Kill Bill</h3><span>SZA</span></li>
        </ul>"#;
        let content = HtmlContent::new(html);
        let selector = compiled(CandidateSelector::SiblingPair {
            selector: "li.row h3".to_string(),
            order: PairOrder::TitleFirst,
        });
        let found = run_selector(&content, &selector, &CandidateFilter::default());
        assert_eq!(
            found,
            vec![
                Candidate::new("Miley Cyrus - Flowers"),
                Candidate::new("SZA - Kill Bill"),
            ]
        );
    }

    #[test]
    fn test_pattern_selector_uses_entry_group() {
        let content = TextContent::new("Listen: Lorde - Royals (2013)\nnothing here");
        let selector = compiled(CandidateSelector::Pattern {
            pattern: r"Listen: (?P<entry>.+?) \(\d{4}\)".to_string(),
        });
        let found = run_selector(&content, &selector, &CandidateFilter::default());
        assert_eq!(found, vec![Candidate::new("Lorde - Royals")]);
    }

    #[test]
    fn test_empty_content_yields_nothing() {
        let content = TextContent::new("");
        let p = profile(vec![CandidateSelector::Lines], 10);
        assert!(extract_candidates(&content, &p, &CandidateFilter::default()).is_empty());
    }

    #[test]
    fn test_noise_and_short_lines_dropped() {
        let content = TextContent::new("Advertisement\nHi\n1. Lorde - Royals\nCookie settings");
        let found = run_selector(&content, &CompiledSelector::lines(), &CandidateFilter::default());
        assert_eq!(found, vec![Candidate::with_position("Lorde - Royals", 1)]);
    }
}
