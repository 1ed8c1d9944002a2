
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::schema::{ComplianceResult, ComplianceStatus, MIN_REASON_LEN, RiskLevel};

/// Prefix applied to a model reason that is too short to stand alone.
pub const SHORT_REASON_PREFIX: &str = "Model explanation: ";

const NO_JSON_REASON: &str = "LLM did not return structured output";

const REQUIRED_FIELDS: [&str; 4] = [
    "compliance_status",
    "reason",
    "risk_level",
    "confidence_score",
];

/// Recover a well-formed [`ComplianceResult`] from arbitrary model output.
///
/// The model is asked for JSON but may wrap it in prose, truncate it, or
/// ignore the request entirely. Every failure mode degrades to the
/// canonical Unknown result with a diagnostic reason; this function never
/// fails.
#[inline]
pub fn extract_result(raw: &str) -> ComplianceResult {
    let mut last_parse_error = None;

    for candidate in json_candidates(raw) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => {
                debug!("Extracted JSON object ({} bytes)", candidate.len());
                return normalize_object(&map);
            }
            Ok(_) => {}
            Err(e) => last_parse_error = Some(e),
        }
    }

    match last_parse_error {
        Some(e) => {
            warn!("Model output contained braces but no parsable JSON: {e}");
            ComplianceResult::unknown(format!("JSON parsing failed: {e}"))
        }
        None => {
            warn!("Model output contained no JSON object");
            ComplianceResult::unknown(NO_JSON_REASON)
        }
    }
}

/// Balanced-brace object candidates in order of appearance.
///
/// An explicit depth scanner rather than a regex: tracks nesting to
/// arbitrary depth and skips braces inside JSON string literals (including
/// escaped quotes). Text outside any object is ignored, so prose quotes
/// before the JSON cannot swallow it.
fn json_candidates(raw: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (position, ch) in raw.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(position);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(span) =
                        start.take().and_then(|open| raw.get(open..=position))
                    {
                        candidates.push(span);
                    }
                }
            }
            _ => {}
        }
    }

    candidates
}

fn normalize_object(map: &Map<String, Value>) -> ComplianceResult {
    let mut missing: Vec<&str> = Vec::new();

    let status = match map.get("compliance_status").and_then(Value::as_str) {
        Some(raw) => ComplianceStatus::from_keyword(raw).unwrap_or(ComplianceStatus::Unknown),
        None => {
            missing.push(REQUIRED_FIELDS[0]);
            ComplianceStatus::Unknown
        }
    };

    let reason = match map.get("reason").and_then(Value::as_str) {
        Some(raw) if !raw.trim().is_empty() => Some(normalize_reason(raw)),
        _ => {
            missing.push(REQUIRED_FIELDS[1]);
            None
        }
    };

    let risk = match map.get("risk_level").and_then(Value::as_str) {
        Some(raw) => RiskLevel::from_keyword(raw).unwrap_or(RiskLevel::Unknown),
        None => {
            missing.push(REQUIRED_FIELDS[2]);
            RiskLevel::Unknown
        }
    };

    let confidence = match map.get("confidence_score") {
        Some(value) => coerce_confidence(value),
        None => {
            missing.push(REQUIRED_FIELDS[3]);
            0.0
        }
    };

    let reason = if missing.is_empty() {
        reason.unwrap_or_else(|| "Incomplete analysis".to_string())
    } else {
        warn!("Model output is missing required fields: {missing:?}");
        let annotation = format!("missing fields: {}", missing.join(", "));
        match reason {
            Some(reason) => format!("{reason} ({annotation})"),
            None => format!("Incomplete analysis ({annotation})"),
        }
    };

    match ComplianceResult::new(status, reason, risk, confidence) {
        Ok(result) => result,
        Err(e) => {
            // Fail closed: a result that still violates the schema after
            // normalization must not escape.
            warn!("Normalized model output failed validation: {e}");
            ComplianceResult::unknown(format!("Validation failed: {e}"))
        }
    }
}

fn normalize_reason(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_REASON_LEN {
        format!("{SHORT_REASON_PREFIX}{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Coerce a confidence value to a float in `[0.0, 1.0]`.
///
/// Accepts numbers and numeric strings; anything else, including NaN and
/// infinities, becomes 0.0.
fn coerce_confidence(value: &Value) -> f64 {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match score {
        Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => 0.0,
    }
}
