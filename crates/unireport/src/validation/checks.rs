//! Heuristic checks run against generated narratives.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::analysis::{AnalysisResult, EntityKind};
use crate::error::Result;

use super::result::ValidationResult;

static NUMERIC_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

static THOUSANDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}(?:[.,]\d{3})+$").unwrap());

static ENTITY_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(Program Studi|Prodi|Fakultas|Jurusan|Department of|Faculty of)\s+(\p{Lu}\p{L}*(?:[ \t]+\p{Lu}\p{L}*)*)",
    )
    .unwrap()
});

/// Number token: digits with optional separators, never ending on one.
const NUMBER: &str = r"(\d[\d.,]*\d|\d)";

/// One heuristic applied to a narrative.
pub trait ReportCheck: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Return an issue description when the check trips.
    fn evaluate(&self, text: &str, analysis: &AnalysisResult) -> Option<String>;
}

/// Flags narratives shorter than a minimum number of characters.
#[derive(Debug, Clone)]
pub struct LengthCheck {
    pub min_chars: usize,
}

impl Default for LengthCheck {
    fn default() -> Self {
        Self { min_chars: 200 }
    }
}

impl ReportCheck for LengthCheck {
    fn name(&self) -> &str {
        "length"
    }

    fn evaluate(&self, text: &str, _analysis: &AnalysisResult) -> Option<String> {
        (text.chars().count() < self.min_chars).then(|| {
            format!(
                "Report seems too short (less than {} characters)",
                self.min_chars
            )
        })
    }
}

/// Flags phrases admitting missing or unusable data.
#[derive(Debug, Clone)]
pub struct HedgingCheck {
    /// Lowercase phrases matched case-insensitively.
    pub phrases: Vec<String>,
}

impl Default for HedgingCheck {
    fn default() -> Self {
        Self {
            phrases: [
                "data yang diberikan",
                "tidak dapat",
                "data tidak cukup",
                "data tidak tersedia",
                "cannot determine",
                "insufficient data",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl ReportCheck for HedgingCheck {
    fn name(&self) -> &str {
        "hedging"
    }

    fn evaluate(&self, text: &str, _analysis: &AnalysisResult) -> Option<String> {
        let lower = text.to_lowercase();
        let phrase = self.phrases.iter().find(|p| lower.contains(p.as_str()))?;
        Some(format!(
            "Report may indicate missing or unclear data (found \"{}\")",
            phrase
        ))
    }
}

/// Flags a stated entity count that disagrees with the data.
///
/// Looks for a number directly before or after one of the entity keywords
/// (e.g. "120 mahasiswa", "mahasiswa: 120"). A value deviating from the
/// true total by more than `max(1, tolerance * total)` is an issue.
#[derive(Debug, Clone)]
pub struct NumericClaimCheck {
    pub tolerance: f64,
}

impl Default for NumericClaimCheck {
    fn default() -> Self {
        Self { tolerance: 0.05 }
    }
}

impl NumericClaimCheck {
    fn claims(text: &str, keywords: &[&str]) -> Result<Vec<f64>> {
        let alternatives = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let before = Regex::new(&format!(
            r"(?i)\b{NUMBER}\s+(?:orang\s+)?(?:{alternatives})\b"
        ))?;
        let after = Regex::new(&format!(
            r"(?i)\b(?:{alternatives})\s*(?:[:=]|sebanyak|berjumlah|total|of)?\s*{NUMBER}"
        ))?;

        Ok([before, after]
            .iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|cap| cap.get(1))
            .filter_map(|m| parse_claim(m.as_str()))
            .collect())
    }
}

/// Parse a stated count, reading `1.200` and `1,200` as thousands.
///
/// Decimals such as `3.40` are not counts.
fn parse_claim(token: &str) -> Option<f64> {
    if THOUSANDS.is_match(token) {
        token.replace(['.', ','], "").parse().ok()
    } else if token.contains(['.', ',']) {
        None
    } else {
        token.parse().ok()
    }
}

impl ReportCheck for NumericClaimCheck {
    fn name(&self) -> &str {
        "numeric_claim"
    }

    fn evaluate(&self, text: &str, analysis: &AnalysisResult) -> Option<String> {
        let expected = analysis.entity_total()?;
        let total = expected.total as f64;
        let allowed = (total * self.tolerance).max(1.0);

        let claims = match Self::claims(text, expected.keywords) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Skipping numeric claim check: {}", e);
                return None;
            }
        };
        let stated = claims
            .into_iter()
            .find(|value| (value - total).abs() > allowed)?;

        Some(format!(
            "Numeric mismatch: report states {} {} but the data has {}",
            stated, expected.keywords[0], expected.total
        ))
    }
}

/// Flags named sub-entities that do not occur in the data.
#[derive(Debug, Clone, Default)]
pub struct UnknownEntityCheck;

impl ReportCheck for UnknownEntityCheck {
    fn name(&self) -> &str {
        "unknown_entity"
    }

    fn evaluate(&self, text: &str, analysis: &AnalysisResult) -> Option<String> {
        if analysis.entities.is_empty() {
            return None;
        }

        let mut unknown: Vec<String> = Vec::new();
        for cap in ENTITY_MENTION.captures_iter(text) {
            let (Some(full), Some(prefix), Some(name)) = (cap.get(0), cap.get(1), cap.get(2)) else {
                continue;
            };
            // mentions of a kind the data has no column for cannot be judged
            let Some(set) = EntityKind::from_mention(prefix.as_str()).and_then(|k| analysis.entity_set(k))
            else {
                continue;
            };

            let mention = name.as_str().trim().to_lowercase();
            let full_lower = full.as_str().to_lowercase();
            let is_known = set.names.iter().map(|n| n.trim().to_lowercase()).any(|k| {
                mention == k || mention.starts_with(k.as_str()) || k.ends_with(&mention) || full_lower == k
            });
            if !is_known && !unknown.iter().any(|u| u == full.as_str()) {
                unknown.push(full.as_str().to_string());
            }
        }

        if unknown.is_empty() {
            return None;
        }
        Some(format!(
            "Report mentions entities not in the data: {}",
            unknown.join(", ")
        ))
    }
}

/// Runs every check and collects issues.
pub struct ReportValidator {
    checks: Vec<Box<dyn ReportCheck>>,
}

impl ReportValidator {
    /// Create a validator with all built-in checks.
    pub fn new() -> Self {
        Self {
            checks: vec![
                Box::new(LengthCheck::default()),
                Box::new(HedgingCheck::default()),
                Box::new(NumericClaimCheck::default()),
                Box::new(UnknownEntityCheck),
            ],
        }
    }

    /// Create a validator with no checks.
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// Append a check.
    pub fn with_check(mut self, check: impl ReportCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Validate a narrative. Never fails.
    pub fn validate(&self, text: &str, analysis: &AnalysisResult) -> ValidationResult {
        let mut issues = Vec::new();

        for check in &self.checks {
            if let Some(issue) = check.evaluate(text, analysis) {
                debug!("Check {} raised: {}", check.name(), issue);
                issues.push(issue);
            }
        }

        if !issues.is_empty() {
            warn!("Validation raised {} issue(s)", issues.len());
        }

        ValidationResult::new(
            issues,
            NUMERIC_TOKEN.find_iter(text).count(),
            text.chars().count(),
        )
    }
}

impl Default for ReportValidator {
    fn default() -> Self {
        Self::new()
    }
}
