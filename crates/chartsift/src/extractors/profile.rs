// ABOUTME: Extraction profile data models, format rules, and the read-only profile registry.
// ABOUTME: Profiles are deserialized from JSON specs, validated, and never mutated afterwards.

//! Extraction profiles.
//!
//! A profile bundles the candidate selectors tried against a page and the
//! ordered format rules used to split a candidate into artist and title.
//! Profiles are described by [`ProfileSpec`] documents and compiled into
//! [`ExtractionProfile`] values, which a [`ProfileRegistry`] owns for the
//! life of the process. Compilation parses every CSS selector and regex once;
//! extraction only reads the compiled forms.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::ChartsiftError;

/// Name of the profile every registry must contain.
pub const GENERIC_PROFILE: &str = "generic";

/// Structural roles a queryable document can answer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    OrderedListItem,
    ListItem,
    Heading,
    Paragraph,
    TableRow,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::OrderedListItem,
        Role::ListItem,
        Role::Heading,
        Role::Paragraph,
        Role::TableRow,
    ];

    /// CSS used when the role is answered by an HTML document.
    pub fn css(&self) -> &'static str {
        match self {
            Role::OrderedListItem => "ol > li",
            Role::ListItem => "li",
            Role::Heading => "h1, h2, h3, h4, h5, h6",
            Role::Paragraph => "p",
            Role::TableRow => "tr",
        }
    }
}

/// Which side of a sibling pair holds the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairOrder {
    /// Node text is the title, its next sibling names the artist (chart rows).
    #[default]
    TitleFirst,
    /// Node text is the artist, its next sibling is the title.
    ArtistFirst,
}

/// One strategy for pulling candidate strings out of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSelector {
    /// Text of every node playing a structural role.
    Role { role: Role },
    /// Text of every node matching a CSS selector.
    Css { selector: String },
    /// Node text joined with the text of its next element sibling.
    SiblingPair {
        selector: String,
        #[serde(default)]
        order: PairOrder,
    },
    /// Text lines that start with a numeric position marker.
    NumberedLines,
    /// Flattened text split wherever an inline `N. ` marker starts.
    NumberedRuns,
    /// Every text line.
    Lines,
    /// Regex matches over text lines; the `entry` group if present, else the whole match.
    Pattern { pattern: String },
}

impl fmt::Display for CandidateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSelector::Role { role } => write!(f, "role:{:?}", role),
            CandidateSelector::Css { selector } => write!(f, "css:{}", selector),
            CandidateSelector::SiblingPair { selector, .. } => write!(f, "pair:{}", selector),
            CandidateSelector::NumberedLines => write!(f, "numbered_lines"),
            CandidateSelector::NumberedRuns => write!(f, "numbered_runs"),
            CandidateSelector::Lines => write!(f, "lines"),
            CandidateSelector::Pattern { pattern } => write!(f, "pattern:{}", pattern),
        }
    }
}

/// How a compiled selector matches content.
#[derive(Debug, Clone)]
pub enum SelectorMatcher {
    Role(Role),
    Css(Selector),
    SiblingPair { selector: Selector, order: PairOrder },
    NumberedLines,
    NumberedRuns,
    Lines,
    Pattern(Regex),
}

/// A candidate selector with its CSS or regex parsed.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    spec: CandidateSelector,
    matcher: SelectorMatcher,
}

impl CompiledSelector {
    /// Parses a selector's CSS or regex. `profile` names the owner in errors.
    pub fn compile(spec: CandidateSelector, profile: &str) -> Result<Self, ChartsiftError> {
        let parse_css = |css: &str| {
            Selector::parse(css).map_err(|_| ChartsiftError::invalid_selector(profile, css))
        };
        let matcher = match &spec {
            CandidateSelector::Role { role } => SelectorMatcher::Role(*role),
            CandidateSelector::Css { selector } => SelectorMatcher::Css(parse_css(selector)?),
            CandidateSelector::SiblingPair { selector, order } => SelectorMatcher::SiblingPair {
                selector: parse_css(selector)?,
                order: *order,
            },
            CandidateSelector::NumberedLines => SelectorMatcher::NumberedLines,
            CandidateSelector::NumberedRuns => SelectorMatcher::NumberedRuns,
            CandidateSelector::Lines => SelectorMatcher::Lines,
            CandidateSelector::Pattern { pattern } => SelectorMatcher::Pattern(
                Regex::new(pattern)
                    .map_err(|e| ChartsiftError::invalid_rule(profile, pattern, e))?,
            ),
        };
        Ok(Self { spec, matcher })
    }

    /// Structural role selector; never fails.
    pub fn role(role: Role) -> Self {
        Self {
            spec: CandidateSelector::Role { role },
            matcher: SelectorMatcher::Role(role),
        }
    }

    /// Every-line selector; never fails.
    pub fn lines() -> Self {
        Self {
            spec: CandidateSelector::Lines,
            matcher: SelectorMatcher::Lines,
        }
    }

    pub fn spec(&self) -> &CandidateSelector {
        &self.spec
    }

    pub fn matcher(&self) -> &SelectorMatcher {
        &self.matcher
    }
}

impl fmt::Display for CompiledSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.spec.fmt(f)
    }
}

/// A format rule as written in a profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    /// Name of a builtin rule, e.g. "dash".
    Builtin(String),
    /// A custom regex with named groups `artist` and `title`.
    Custom { name: String, pattern: String },
}

/// Builtin format rules in standard precedence.
const BUILTIN_RULES: &[(&str, &str)] = &[
    (
        "quoted_colon",
        r#"^(?P<artist>[^:"“”]+?)\s*:\s*["“”](?P<title>.+?)["“”]\s*$"#,
    ),
    ("colon", r"^(?P<artist>[^:]+?)\s*:\s+(?P<title>.+)$"),
    ("dash", r"^(?P<artist>.+?)\s+[-–]\s+(?P<title>.+)$"),
    (
        "by",
        r#"^["“”'‘’](?P<title>.+?)["“”'‘’],?\s+by\s+(?P<artist>.+)$"#,
    ),
    ("pipe", r"^(?P<artist>.+?)\s+\|\s+(?P<title>.+)$"),
];

/// A compiled rule splitting candidate text into artist and title.
#[derive(Debug, Clone)]
pub struct FormatRule {
    name: String,
    regex: Regex,
}

impl FormatRule {
    /// Compiles a rule, requiring named groups `artist` and `title`.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, String> {
        let regex = Regex::new(pattern).map_err(|e| e.to_string())?;
        let names: Vec<&str> = regex.capture_names().flatten().collect();
        for group in ["artist", "title"] {
            if !names.contains(&group) {
                return Err(format!("missing group `{}`", group));
            }
        }
        Ok(Self {
            name: name.into(),
            regex,
        })
    }

    /// Looks up a builtin rule by name.
    pub fn builtin(name: &str) -> Option<Self> {
        BUILTIN_RULES
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(n, p)| Self::new(*n, p).ok())
    }

    /// All builtin rules in standard precedence.
    pub fn standard() -> Vec<Self> {
        BUILTIN_RULES
            .iter()
            .filter_map(|(n, _)| Self::builtin(n))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the rule, returning raw (artist, title) captures on a structural match.
    pub fn split<'t>(&self, text: &'t str) -> Option<(&'t str, &'t str)> {
        let caps = self.regex.captures(text)?;
        let artist = caps.name("artist")?.as_str();
        let title = caps.name("title")?.as_str();
        Some((artist, title))
    }
}

/// Inclusive song-count range a profile is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

impl CountRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }

    pub fn width(&self) -> usize {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) as f64 / 2.0
    }
}

impl From<[usize; 2]> for CountRange {
    fn from(v: [usize; 2]) -> Self {
        CountRange::new(v[0], v[1])
    }
}

impl From<CountRange> for [usize; 2] {
    fn from(r: CountRange) -> Self {
        [r.min, r.max]
    }
}

fn default_min_candidates() -> usize {
    10
}

/// A profile as written in a registry document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub expected_count_range: CountRange,
    /// A selector is accepted once its candidate count exceeds this.
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,
    #[serde(default)]
    pub candidate_selectors: Vec<CandidateSelector>,
    #[serde(default)]
    pub format_rules: Vec<RuleSpec>,
}

/// A registry document: profiles plus the host-to-profile table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySpec {
    pub profiles: Vec<ProfileSpec>,
    #[serde(default)]
    pub domains: HashMap<String, String>,
}

/// A validated, immutable extraction profile.
#[derive(Debug, Clone)]
pub struct ExtractionProfile {
    pub name: String,
    pub description: String,
    pub expected_count_range: CountRange,
    pub min_candidates: usize,
    pub candidate_selectors: Vec<CompiledSelector>,
    pub format_rules: Vec<FormatRule>,
}

impl ExtractionProfile {
    /// Validates a spec: rules must compile, selectors must parse.
    pub fn compile(spec: ProfileSpec) -> Result<Self, ChartsiftError> {
        let mut format_rules = Vec::with_capacity(spec.format_rules.len());
        for rule in &spec.format_rules {
            let compiled = match rule {
                RuleSpec::Builtin(name) => FormatRule::builtin(name).ok_or_else(|| {
                    ChartsiftError::invalid_rule(&spec.name, name, "no such builtin rule")
                })?,
                RuleSpec::Custom { name, pattern } => FormatRule::new(name, pattern)
                    .map_err(|reason| ChartsiftError::invalid_rule(&spec.name, name, reason))?,
            };
            format_rules.push(compiled);
        }

        let candidate_selectors = spec
            .candidate_selectors
            .into_iter()
            .map(|selector| CompiledSelector::compile(selector, &spec.name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: spec.name,
            description: spec.description,
            expected_count_range: spec.expected_count_range,
            min_candidates: spec.min_candidates,
            candidate_selectors,
            format_rules,
        })
    }

    pub fn is_generic(&self) -> bool {
        self.name == GENERIC_PROFILE
    }
}

/// Read-only lookup of profiles by name and by host.
///
/// Cloning is cheap; profiles are shared behind `Arc`.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<Arc<ExtractionProfile>>,
    by_name: HashMap<String, usize>,
    by_host: HashMap<String, usize>,
    generic: usize,
}

impl ProfileRegistry {
    /// Builds a registry from compiled profiles and a host table.
    ///
    /// Hosts are stored lower-case without a leading `www.`. A later profile
    /// with the same name replaces an earlier one.
    pub fn new<I>(profiles: Vec<ExtractionProfile>, domains: I) -> Result<Self, ChartsiftError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut stored: Vec<Arc<ExtractionProfile>> = Vec::with_capacity(profiles.len());
        let mut by_name = HashMap::new();
        for profile in profiles {
            match by_name.get(&profile.name) {
                Some(&idx) => stored[idx] = Arc::new(profile),
                None => {
                    by_name.insert(profile.name.clone(), stored.len());
                    stored.push(Arc::new(profile));
                }
            }
        }

        let generic = *by_name
            .get(GENERIC_PROFILE)
            .ok_or(ChartsiftError::MissingGeneric)?;

        let mut by_host = HashMap::new();
        for (host, name) in domains {
            let idx = *by_name
                .get(&name)
                .ok_or_else(|| ChartsiftError::UnknownProfile(name.clone()))?;
            by_host.insert(normalize_host(&host), idx);
        }

        Ok(Self {
            profiles: stored,
            by_name,
            by_host,
            generic,
        })
    }

    /// Compiles every profile in a registry document.
    pub fn from_spec(spec: RegistrySpec) -> Result<Self, ChartsiftError> {
        let profiles = spec
            .profiles
            .into_iter()
            .map(ExtractionProfile::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(profiles, spec.domains)
    }

    /// Looks up a profile by name.
    pub fn get(&self, name: &str) -> Option<&ExtractionProfile> {
        self.by_name.get(name).map(|&i| self.profiles[i].as_ref())
    }

    /// Looks up the profile mapped to a host (exact, ignoring `www.`).
    pub fn for_host(&self, host: &str) -> Option<&ExtractionProfile> {
        self.by_host
            .get(&normalize_host(host))
            .map(|&i| self.profiles[i].as_ref())
    }

    /// The fallback profile.
    pub fn generic(&self) -> &ExtractionProfile {
        &self.profiles[self.generic]
    }

    /// Profiles in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtractionProfile> {
        self.profiles.iter().map(|p| p.as_ref())
    }

    /// Hosts mapped to the named profile, sorted.
    pub fn hosts_for(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.by_name.get(name) else {
            return Vec::new();
        };
        let mut hosts: Vec<&str> = self
            .by_host
            .iter()
            .filter(|(_, i)| **i == idx)
            .map(|(h, _)| h.as_str())
            .collect();
        hosts.sort_unstable();
        hosts
    }

    /// Number of registered profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Always false for a constructed registry, which holds at least `generic`.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Lower-cases a host and drops a trailing dot and a leading `www.`.
pub(crate) fn normalize_host(host: &str) -> String {
    let lower = host.trim().trim_end_matches('.').to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}
