// ABOUTME: Main library entry point for the chartsift song extraction engine.
// ABOUTME: Re-exports the public API: Extractor, ExtractorBuilder, ExtractionResult, Song, PageContent, ChartsiftError.

//! Chartsift - extracts ranked "Artist - Title" song lists from music pages.
//!
//! Given a page URL and its text or HTML, the extractor picks an extraction
//! profile for the site, collects candidate lines, parses each into an artist
//! and title, and returns a deduplicated, position-ordered song list with
//! quality counts.
//!
//! # Example
//!
//! ```
//! use chartsift::{Extractor, PageContent};
//!
//! let extractor = Extractor::builder().build();
//! let page = PageContent::from_text("1. Daft Punk - One More Time\n2. SZA - Kill Bill");
//! let result = extractor.extract("https://example.com/best-songs", &page, None);
//! println!("{}", result.format_text());
//! ```

pub mod classifier;
pub mod content;
pub mod error;
pub mod extractor;
pub mod extractors;
pub mod options;
pub mod result;

pub use crate::classifier::{Classification, ContentKind, DomainClassifier, MatchSource};
pub use crate::content::{HtmlContent, NodeQuery, PageContent, Queryable, TextContent};
pub use crate::error::{ChartsiftError, Diagnostic};
pub use crate::extractor::Extractor;
pub use crate::extractors::candidates::{extract_candidates, Candidate, CandidateFilter};
pub use crate::extractors::loader::{
    load_builtin_registry, load_registry_from_path, load_registry_from_str,
};
pub use crate::extractors::profile::{
    CandidateSelector, CompiledSelector, CountRange, ExtractionProfile, FormatRule, PairOrder,
    ProfileRegistry, Role, RuleSpec, SelectorMatcher,
};
pub use crate::extractors::songs::parse_and_validate;
pub use crate::options::{ExtractOptions, ExtractorBuilder};
pub use crate::result::{ExtractionResult, QualityReport, Song};
