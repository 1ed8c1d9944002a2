
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ComplianceError, Result};

/// Minimum length of a `reason` after trimming, in characters.
pub const MIN_REASON_LEN: usize = 5;

/// Canonical compliance verdict vocabulary.
///
/// The serialized form matches the wire strings the model is instructed to
/// produce ("Non-Compliant", "Partially Compliant"), so a canonical result
/// round-trips through JSON unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceStatus {
    Compliant,
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
    #[serde(rename = "Partially Compliant")]
    PartiallyCompliant,
    Unknown,
}

/// Canonical risk vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

// Model-output synonyms, lowercase alias -> canonical value. Canonical names
// themselves are matched separately in from_keyword.
const STATUS_ALIASES: &[(&str, ComplianceStatus)] = &[
    ("yes", ComplianceStatus::Compliant),
    ("pass", ComplianceStatus::Compliant),
    ("no", ComplianceStatus::NonCompliant),
    ("fail", ComplianceStatus::NonCompliant),
    ("noncompliant", ComplianceStatus::NonCompliant),
    ("partial", ComplianceStatus::PartiallyCompliant),
    ("partly", ComplianceStatus::PartiallyCompliant),
];

const RISK_ALIASES: &[(&str, RiskLevel)] = &[
    ("l", RiskLevel::Low),
    ("m", RiskLevel::Medium),
    ("med", RiskLevel::Medium),
    ("moderate", RiskLevel::Medium),
    ("h", RiskLevel::High),
    ("critical", RiskLevel::High),
];

impl ComplianceStatus {
    pub const ALL: [Self; 4] = [
        Self::Compliant,
        Self::NonCompliant,
        Self::PartiallyCompliant,
        Self::Unknown,
    ];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "Compliant",
            Self::NonCompliant => "Non-Compliant",
            Self::PartiallyCompliant => "Partially Compliant",
            Self::Unknown => "Unknown",
        }
    }

    /// Map a raw model-output value onto the canonical vocabulary.
    ///
    /// Matching is case-insensitive and whitespace-trimmed. Returns `None`
    /// for values that are neither canonical nor a known synonym.
    #[inline]
    pub fn from_keyword(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&needle))
            .or_else(|| {
                STATUS_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == needle)
                    .map(|&(_, status)| status)
            })
    }
}

impl RiskLevel {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Unknown];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }

    /// Map a raw model-output value onto the canonical vocabulary.
    #[inline]
    pub fn from_keyword(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(&needle))
            .or_else(|| {
                RISK_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == needle)
                    .map(|&(_, level)| level)
            })
    }
}

impl fmt::Display for ComplianceStatus {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RiskLevel {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The validated verdict produced by every analysis, successful or not.
///
/// Invariants: `reason` is non-blank and at least [`MIN_REASON_LEN`]
/// characters after trimming, `confidence_score` is finite and within
/// `[0.0, 1.0]`. Construct through [`ComplianceResult::new`] (which enforces
/// them) or [`ComplianceResult::unknown`] (which satisfies them by
/// construction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub compliance_status: ComplianceStatus,
    pub reason: String,
    pub risk_level: RiskLevel,
    pub confidence_score: f64,
}

impl ComplianceResult {
    /// Build a result, failing with a `Validation` error naming every
    /// violated field when the invariants do not hold.
    #[inline]
    pub fn new(
        compliance_status: ComplianceStatus,
        reason: impl Into<String>,
        risk_level: RiskLevel,
        confidence_score: f64,
    ) -> Result<Self> {
        let result = Self {
            compliance_status,
            reason: reason.into(),
            risk_level,
            confidence_score,
        };
        result.validate()?;
        Ok(result)
    }

    /// The canonical fallback for every fault path. Always valid: a blank or
    /// too-short diagnostic is replaced rather than propagated.
    #[inline]
    pub fn unknown(reason: impl Into<String>) -> Self {
        let reason = reason.into().trim().to_string();
        let reason = if reason.is_empty() {
            "No diagnostic available".to_string()
        } else if reason.chars().count() < MIN_REASON_LEN {
            format!("Diagnostic: {reason}")
        } else {
            reason
        };

        Self {
            compliance_status: ComplianceStatus::Unknown,
            reason,
            risk_level: RiskLevel::Unknown,
            confidence_score: 0.0,
        }
    }

    /// Re-check every field invariant.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        let trimmed = self.reason.trim();
        if trimmed.is_empty() {
            violations.push("reason is blank");
        } else if trimmed.chars().count() < MIN_REASON_LEN {
            violations.push("reason is shorter than 5 characters");
        }

        if !self.confidence_score.is_finite()
            || self.confidence_score < 0.0
            || self.confidence_score > 1.0
        {
            violations.push("confidence_score is outside [0.0, 1.0]");
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ComplianceError::Validation(violations.join("; ")))
        }
    }
}
