// ABOUTME: Song parsing and validation: format rules, normalization, dedup, positions, quality.
// ABOUTME: Turns candidates into an ExtractionResult without ever failing on bad text.

//! Song parser and validator.
//!
//! Each candidate is split by the first format rule that yields a non-empty
//! artist and title. Candidates no rule can split become `Unknown` entries:
//! they stay in the output so a bad extraction is visible, but they count as
//! invalid.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::content::normalize_whitespace;
use crate::extractors::candidates::{split_marker, Candidate};
use crate::extractors::profile::{ExtractionProfile, FormatRule};
use crate::options::ExtractOptions;
use crate::result::{is_success, ExtractionResult, QualityReport, Song};

/// Artist assigned when no format rule matches.
pub const UNKNOWN_ARTIST: &str = "Unknown";

pub const DEFAULT_MAX_FIELD_LEN: usize = 100;

const DOUBLE_QUOTES: &[char] = &['"', '“', '”', '„', '«', '»'];
const SINGLE_QUOTES: &[char] = &['\'', '‘', '’'];

static LEADING_NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:#?\d{1,3}[.)]\s*|[-–—•*·]\s+)+").unwrap());

/// A candidate split into fields, before dedup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub artist: String,
    pub title: String,
    /// Name of the matching rule; `None` for the Unknown fallback.
    pub rule: Option<String>,
}

impl ParsedEntry {
    /// Both fields non-empty, distinct, shorter than `max_len`, and produced by a rule.
    pub fn is_format_valid(&self, max_len: usize) -> bool {
        self.rule.is_some()
            && !self.artist.is_empty()
            && !self.title.is_empty()
            && self.artist != self.title
            && self.artist.chars().count() < max_len
            && self.title.chars().count() < max_len
    }

    /// Whether the entry can be returned as a Song at all.
    fn is_song(&self) -> bool {
        !self.artist.is_empty() && !self.title.is_empty() && self.artist != self.title
    }

    fn dedup_key(&self) -> (String, String) {
        (self.artist.to_lowercase(), self.title.to_lowercase())
    }
}

/// Normalizes an artist field: whitespace, then leading numbering and bullets.
pub fn normalize_artist(raw: &str) -> String {
    let collapsed = normalize_whitespace(raw);
    LEADING_NUMBERING.replace(&collapsed, "").trim().to_string()
}

/// Normalizes a title field: whitespace, then one pair of surrounding quotes.
pub fn normalize_title(raw: &str) -> String {
    let collapsed = normalize_whitespace(raw);
    let s = strip_quote_pair(&collapsed);
    s.trim().trim_end_matches(',').trim().to_string()
}

// Quotes are only removed when both ends carry one of the same kind
fn strip_quote_pair(s: &str) -> &str {
    let mut chars = s.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return s;
    };
    let paired = (DOUBLE_QUOTES.contains(&first) && DOUBLE_QUOTES.contains(&last))
        || (SINGLE_QUOTES.contains(&first) && SINGLE_QUOTES.contains(&last));
    if paired {
        &s[first.len_utf8()..s.len() - last.len_utf8()]
    } else {
        s
    }
}

/// Splits normalized candidate text with the first rule that yields both fields.
pub fn parse_entry(text: &str, rules: &[FormatRule]) -> ParsedEntry {
    for rule in rules {
        if let Some((artist, title)) = rule.split(text) {
            let artist = normalize_artist(artist);
            let title = normalize_title(title);
            if !artist.is_empty() && !title.is_empty() {
                return ParsedEntry {
                    artist,
                    title,
                    rule: Some(rule.name().to_string()),
                };
            }
        }
    }
    ParsedEntry {
        artist: UNKNOWN_ARTIST.to_string(),
        title: normalize_title(text),
        rule: None,
    }
}

/// Parses, validates, deduplicates, and ranks candidates under a profile.
///
/// The returned result carries the profile name and success flag; URL,
/// content kind, and diagnostics are left for the caller to fill in.
pub fn parse_and_validate(
    candidates: &[Candidate],
    profile: &ExtractionProfile,
    expected_count: Option<usize>,
    opts: &ExtractOptions,
) -> ExtractionResult {
    let mut quality = QualityReport {
        total: candidates.len(),
        ..Default::default()
    };
    let mut seen: HashSet<(String, String)> = HashSet::new();
    // (desired position, input index, entry)
    let mut kept: Vec<(u32, usize, ParsedEntry)> = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let raw = candidate.raw_text.trim();
        let (marker, text) = match candidate.position {
            Some(pos) => (Some(pos), raw),
            None => split_marker(raw),
        };
        let text = normalize_whitespace(text);
        if text.is_empty() {
            quality.empty += 1;
            continue;
        }

        let entry = parse_entry(&text, &profile.format_rules);
        if !seen.insert(entry.dedup_key()) {
            quality.duplicates += 1;
            continue;
        }

        if entry.is_format_valid(opts.max_field_len) {
            quality.valid += 1;
        } else {
            quality.invalid += 1;
        }

        if entry.is_song() {
            let desired = marker.unwrap_or(index as u32 + 1);
            kept.push((desired, index, entry));
        }
    }

    let songs = assign_positions(kept);
    let quality = quality.finish();
    let success = is_success(
        songs.len(),
        quality.valid_ratio,
        expected_count,
        opts.success_threshold,
        opts.fallback_ratio,
    );

    ExtractionResult {
        songs,
        quality,
        profile_used: profile.name.clone(),
        success,
        expected_count,
        ..Default::default()
    }
}

/// Orders entries by desired position (input order on ties) and makes
/// positions strictly increasing, bumping collisions to the next free rank.
fn assign_positions(mut kept: Vec<(u32, usize, ParsedEntry)>) -> Vec<Song> {
    kept.sort_by_key(|(desired, index, _)| (*desired, *index));
    let mut last = 0u32;
    kept.into_iter()
        .map(|(desired, _, entry)| {
            let position = desired.max(last + 1);
            last = position;
            Song::new(entry.artist, entry.title, position)
        })
        .collect()
}
