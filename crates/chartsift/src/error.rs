// ABOUTME: Error types for chartsift: configuration errors and non-fatal extraction diagnostics.
// ABOUTME: ChartsiftError is returned at registry load time; Diagnostic rides along on results.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors raised while building or loading extraction configuration.
///
/// Extraction itself never fails; data-quality problems are reported as
/// [`Diagnostic`] values on the returned result instead.
#[derive(Debug, thiserror::Error)]
pub enum ChartsiftError {
    /// The registry document is not valid JSON or has the wrong shape.
    #[error("malformed profile registry: {0}")]
    Registry(#[from] serde_json::Error),

    /// A format rule failed to compile or lacks its capture groups.
    #[error("profile {profile}: invalid format rule {rule}: {reason}")]
    InvalidRule {
        profile: String,
        rule: String,
        reason: String,
    },

    /// A CSS selector in a candidate selector could not be parsed.
    #[error("profile {profile}: invalid selector {selector:?}")]
    InvalidSelector { profile: String, selector: String },

    /// A profile name was referenced but never registered.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// Every registry needs a profile named `generic` to fall back on.
    #[error("registry has no generic profile")]
    MissingGeneric,

    /// Reading a registry file failed.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ChartsiftError {
    /// Create an InvalidRule error.
    pub fn invalid_rule(
        profile: impl Into<String>,
        rule: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        ChartsiftError::InvalidRule {
            profile: profile.into(),
            rule: rule.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidSelector error.
    pub fn invalid_selector(profile: impl Into<String>, selector: impl Into<String>) -> Self {
        ChartsiftError::InvalidSelector {
            profile: profile.into(),
            selector: selector.into(),
        }
    }

    /// Returns true if this is a malformed registry document.
    pub fn is_registry(&self) -> bool {
        matches!(self, ChartsiftError::Registry(_))
    }

    /// Returns true if a format rule was rejected.
    pub fn is_invalid_rule(&self) -> bool {
        matches!(self, ChartsiftError::InvalidRule { .. })
    }

    /// Returns true if a selector was rejected.
    pub fn is_invalid_selector(&self) -> bool {
        matches!(self, ChartsiftError::InvalidSelector { .. })
    }

    /// Returns true if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChartsiftError::Io { .. })
    }
}

/// Non-fatal conditions observed during one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The content had no extractable text.
    EmptyContent,
    /// The URL's host is not in the domain table and no heuristic matched.
    NoProfileMatch { host: Option<String> },
    /// The valid ratio stayed below the fallback threshold.
    LowQualityExtraction { profile: String, valid_ratio: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyContent => write!(f, "content has no extractable text"),
            Diagnostic::NoProfileMatch { host: Some(host) } => {
                write!(f, "no profile for {}, using generic", host)
            }
            Diagnostic::NoProfileMatch { host: None } => {
                write!(f, "unparseable URL, using generic")
            }
            Diagnostic::LowQualityExtraction {
                profile,
                valid_ratio,
            } => write!(
                f,
                "low quality extraction with {}: valid ratio {:.2}",
                profile, valid_ratio
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChartsiftError::invalid_rule("generic", "dash", "missing group `title`");
        assert_eq!(
            err.to_string(),
            "profile generic: invalid format rule dash: missing group `title`"
        );
        assert!(err.is_invalid_rule());
        assert!(!err.is_registry());
    }

    #[test]
    fn test_registry_error_from_serde() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ChartsiftError = parse.unwrap_err().into();
        assert!(err.is_registry());
    }

    #[test]
    fn test_diagnostic_serializes_tagged() {
        let diag = Diagnostic::LowQualityExtraction {
            profile: "generic".to_string(),
            valid_ratio: 0.5,
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "low_quality_extraction");
        assert_eq!(json["profile"], "generic");
    }
}
