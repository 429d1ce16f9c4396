// ABOUTME: ExtractionResult, Song, and QualityReport records returned to callers.
// ABOUTME: Serializable with serde; includes text rendering and comparison helpers.

use serde::{Deserialize, Serialize};

use crate::classifier::ContentKind;
use crate::error::Diagnostic;

/// One validated song entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub artist: String,
    pub title: String,
    /// 1-based rank, unique within a result.
    pub position: u32,
}

impl Song {
    pub fn new(artist: impl Into<String>, title: impl Into<String>, position: u32) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            position,
        }
    }

    /// The `Artist - Title` form used by downstream consumers.
    pub fn to_line(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

/// Counts behind a result's valid ratio.
///
/// `total == valid + invalid + empty + duplicates`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub empty: usize,
    pub duplicates: usize,
    pub valid_ratio: f64,
}

impl QualityReport {
    /// Recomputes `valid_ratio` from the counts; 0 when nothing was considered.
    pub fn finish(mut self) -> Self {
        self.valid_ratio = if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64
        };
        self
    }
}

/// Decides success.
///
/// A result with no songs, or with a valid ratio under `min_valid_ratio`,
/// never succeeds. Otherwise the song count is checked against
/// `expected * threshold` when a count is expected.
pub fn is_success(
    song_count: usize,
    valid_ratio: f64,
    expected_count: Option<usize>,
    threshold: f64,
    min_valid_ratio: f64,
) -> bool {
    if song_count == 0 || valid_ratio < min_valid_ratio {
        return false;
    }
    match expected_count {
        Some(expected) => song_count as f64 >= expected as f64 * threshold,
        None => true,
    }
}

/// The outcome of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExtractionResult {
    pub url: String,
    pub songs: Vec<Song>,
    pub quality: QualityReport,
    pub profile_used: String,
    pub success: bool,
    pub expected_count: Option<usize>,
    pub content_kind: ContentKind,
    pub errors: Vec<Diagnostic>,
}

impl ExtractionResult {
    /// Returns true if no songs were found.
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Songs as `Artist - Title` strings, in position order.
    pub fn to_song_strings(&self) -> Vec<String> {
        self.songs.iter().map(Song::to_line).collect()
    }

    /// Renders a numbered list, or "No songs found".
    pub fn format_text(&self) -> String {
        if self.songs.is_empty() {
            return "No songs found".to_string();
        }
        self.songs
            .iter()
            .map(|s| format!("{}. {}", s.position, s.to_line()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Higher valid ratio wins; equal ratios go to the larger song list.
    pub fn is_better_than(&self, other: &ExtractionResult) -> bool {
        self.quality.valid_ratio > other.quality.valid_ratio
            || (self.quality.valid_ratio == other.quality.valid_ratio
                && self.songs.len() > other.songs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result_with(songs: Vec<Song>, ratio: f64) -> ExtractionResult {
        ExtractionResult {
            songs,
            quality: QualityReport {
                valid_ratio: ratio,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_format_text() {
        let result = result_with(
            vec![Song::new("Daft Punk", "One More Time", 1), Song::new("SZA", "Kill Bill", 3)],
            1.0,
        );
        assert_eq!(result.format_text(), "1. Daft Punk - One More Time\n3. SZA - Kill Bill");
        assert_eq!(
            result.to_song_strings(),
            vec!["Daft Punk - One More Time", "SZA - Kill Bill"]
        );
    }

    #[test]
    fn test_format_text_empty() {
        let result = ExtractionResult::default();
        assert!(result.is_empty());
        assert_eq!(result.format_text(), "No songs found");
    }

    #[test]
    fn test_quality_ratio() {
        let q = QualityReport {
            total: 20,
            valid: 17,
            invalid: 3,
            ..Default::default()
        }
        .finish();
        assert_eq!(q.valid_ratio, 0.85);
        assert_eq!(QualityReport::default().finish().valid_ratio, 0.0);
    }

    #[test]
    fn test_is_success() {
        assert!(!is_success(3, 1.0, Some(100), 0.7, 0.7));
        assert!(is_success(70, 1.0, Some(100), 0.7, 0.7));
        assert!(!is_success(69, 1.0, Some(100), 0.7, 0.7));
        assert!(is_success(1, 1.0, None, 0.7, 0.7));
        assert!(!is_success(0, 0.0, None, 0.7, 0.7));
    }

    #[test]
    fn test_low_quality_or_empty_never_succeeds() {
        // count target met, but most entries failed to parse
        assert!(!is_success(12, 0.0, None, 0.7, 0.7));
        assert!(!is_success(80, 0.5, Some(100), 0.7, 0.7));
        assert!(is_success(80, 0.7, Some(100), 0.7, 0.7));
        // an expected count of zero is trivially met but nothing was found
        assert!(!is_success(0, 0.0, Some(0), 0.7, 0.7));
    }

    #[test]
    fn test_is_better_than() {
        let low = result_with(vec![Song::new("A", "B", 1)], 0.4);
        let high = result_with(vec![], 0.85);
        assert!(high.is_better_than(&low));
        assert!(!low.is_better_than(&high));

        let more = result_with(vec![Song::new("A", "B", 1), Song::new("C", "D", 2)], 0.5);
        let fewer = result_with(vec![Song::new("A", "B", 1)], 0.5);
        assert!(more.is_better_than(&fewer));
        assert!(!fewer.is_better_than(&fewer.clone()));
    }

    #[test]
    fn test_serializes_plain_record() {
        let result = ExtractionResult {
            url: "https://pitchfork.com/x".to_string(),
            songs: vec![Song::new("SZA", "Kill Bill", 1)],
            profile_used: "editorial_style".to_string(),
            success: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["songs"][0]["artist"], "SZA");
        assert_eq!(json["songs"][0]["position"], 1);
        assert_eq!(json["quality"]["duplicates"], 0);
        assert_eq!(json["profile_used"], "editorial_style");
        assert_eq!(json["content_kind"], "unknown");
        assert_eq!(json["success"], true);
    }
}
