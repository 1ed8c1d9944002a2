
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::{ComplianceError, Result};

/// A single regulation clause as produced by the dataset builder.
///
/// Identity is `clause_id`; clauses are immutable once loaded and live for
/// the lifetime of the index built over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationClause {
    #[serde(default)]
    pub regulation: Option<String>,
    pub clause_id: String,
    #[serde(default)]
    pub heading: String,
    pub text: String,
}

impl RegulationClause {
    /// A clause is usable only when both its identity and its text are
    /// present.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.clause_id.trim().is_empty() {
            return Err(ComplianceError::Dataset(
                "clause is missing a clause_id".to_string(),
            ));
        }
        if self.text.trim().is_empty() {
            return Err(ComplianceError::Dataset(format!(
                "clause {} has no text",
                self.clause_id
            )));
        }
        Ok(())
    }
}

/// Load and validate the regulation dataset from a JSON file.
///
/// Fails with a `Dataset` error when the file is missing or unparsable,
/// when the dataset is empty, or when any clause is missing required
/// fields. The process must not start without a valid dataset.
#[inline]
pub fn load_regulations(path: &Path) -> Result<Vec<RegulationClause>> {
    debug!("Loading regulation dataset from {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| {
        ComplianceError::Dataset(format!(
            "failed to read dataset file {}: {e}",
            path.display()
        ))
    })?;

    let clauses: Vec<RegulationClause> = serde_json::from_str(&content).map_err(|e| {
        ComplianceError::Dataset(format!(
            "failed to parse dataset file {}: {e}",
            path.display()
        ))
    })?;

    if clauses.is_empty() {
        return Err(ComplianceError::Dataset(format!(
            "dataset file {} contains no clauses",
            path.display()
        )));
    }

    for clause in &clauses {
        clause.validate()?;
    }

    info!(
        "Loaded {} regulation clauses from {}",
        clauses.len(),
        path.display()
    );
    Ok(clauses)
}
