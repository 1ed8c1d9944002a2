
use tracing::info;

use crate::schema::{ComplianceResult, ComplianceStatus, RiskLevel};

/// Confidence floor applied when a rule fires. An existing higher score is
/// kept.
pub const OVERRIDE_CONFIDENCE_FLOOR: f64 = 0.85;

/// A deterministic policy rule: any phrase match overwrites the model
/// verdict.
struct OverrideRule {
    name: &'static str,
    phrases: &'static [&'static str],
    reason: &'static str,
}

// Applied in order; each match unconditionally overwrites, so the last
// matching rule's reason wins.
const RULES: [OverrideRule; 3] = [
    OverrideRule {
        name: "indefinite-retention",
        phrases: &[
            "retained indefinitely",
            "retain personal data indefinitely",
            "stored indefinitely",
            "kept indefinitely",
            "retained permanently",
            "stored permanently",
            "kept forever",
            "without any retention limit",
            "no retention period",
        ],
        reason: "Clause permits indefinite retention of personal data, violating the storage \
                 limitation principle (GDPR Article 5(1)(e)).",
    },
    OverrideRule {
        name: "unauthorized-sharing",
        phrases: &[
            "shared with third parties without consent",
            "share personal data without consent",
            "disclosed to third parties without consent",
            "sold to third parties",
            "sell personal data",
            "transferred to third parties without",
        ],
        reason: "Clause permits disclosure of personal data to third parties without a lawful \
                 basis or consent (GDPR Articles 6 and 44).",
    },
    OverrideRule {
        name: "denied-subject-rights",
        phrases: &[
            "cannot request deletion",
            "may not request deletion",
            "no right to erasure",
            "waives the right to access",
            "cannot access their data",
            "cannot withdraw consent",
            "may not withdraw consent",
        ],
        reason: "Clause denies data subjects their access, erasure or consent-withdrawal rights \
                 (GDPR Articles 7, 15 and 17).",
    },
];

/// Scan the original clause text for known-critical phrasings and overwrite
/// the model verdict when one matches.
///
/// Deterministic defense-in-depth: the override always wins over a
/// disagreeing model judgment. Matching is naive substring containment over
/// the lower-cased clause text.
#[inline]
pub fn apply(clause_text: &str, result: ComplianceResult) -> ComplianceResult {
    let haystack = clause_text.to_lowercase();
    let mut result = result;

    for rule in &RULES {
        if rule.phrases.iter().any(|phrase| haystack.contains(phrase)) {
            info!(
                "Rule override '{}' fired, overriding model verdict {}",
                rule.name, result.compliance_status
            );
            result.compliance_status = ComplianceStatus::NonCompliant;
            result.risk_level = RiskLevel::High;
            result.reason = rule.reason.to_string();
            result.confidence_score = result.confidence_score.max(OVERRIDE_CONFIDENCE_FLOOR);
        }
    }

    result
}
