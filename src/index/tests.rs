use super::*;
use anyhow::anyhow;

/// Deterministic embedding provider keyed by exact text.
struct StubEmbedder {
    entries: Vec<(&'static str, Vec<f32>)>,
}

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.entries
            .iter()
            .find(|(key, _)| *key == text)
            .map(|(_, vector)| vector.clone())
            .ok_or_else(|| anyhow!("no stub embedding for {text:?}"))
    }
}

fn clause(id: &str, text: &str) -> RegulationClause {
    RegulationClause {
        regulation: Some("GDPR".to_string()),
        clause_id: id.to_string(),
        heading: format!("{id} heading"),
        text: text.to_string(),
    }
}

fn three_clause_index() -> (RegulationIndex, StubEmbedder) {
    let clauses = vec![
        clause("Article_5_1", "storage limitation"),
        clause("Article_6_1", "lawful basis"),
        clause("Article_17_1", "right to erasure"),
    ];
    let embedder = StubEmbedder {
        entries: vec![
            ("storage limitation", vec![1.0, 0.0]),
            ("lawful basis", vec![0.0, 1.0]),
            ("right to erasure", vec![0.5, 0.5]),
            // Query closest to clause 1, then clause 3, then clause 2.
            ("data kept forever", vec![0.9, 0.1]),
            ("equidistant", vec![0.0, 0.0]),
        ],
    };
    let index = RegulationIndex::build(clauses, &embedder).expect("should build index");
    (index, embedder)
}

#[test]
fn build_reports_size_and_dimension() {
    let (index, _embedder) = three_clause_index();
    assert_eq!(index.len(), 3);
    assert!(!index.is_empty());
    assert_eq!(index.dimension(), 2);
}

#[test]
fn search_orders_by_distance() {
    let (index, embedder) = three_clause_index();

    let results = index
        .search(&embedder, "data kept forever", 2)
        .expect("should search index");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].clause.clause_id, "Article_5_1");
    assert_eq!(results[1].clause.clause_id, "Article_17_1");
    assert!(results[0].distance <= results[1].distance);
}

#[test]
fn search_caps_results_at_index_size() {
    let (index, embedder) = three_clause_index();

    let results = index
        .search(&embedder, "data kept forever", 10)
        .expect("should search index");

    assert_eq!(results.len(), 3);
}

#[test]
fn search_is_deterministic() {
    let (index, embedder) = three_clause_index();

    let first = index
        .search(&embedder, "data kept forever", 3)
        .expect("should search index");
    let second = index
        .search(&embedder, "data kept forever", 3)
        .expect("should search index");

    assert_eq!(first, second);
}

#[test]
fn equidistant_ties_break_by_insertion_order() {
    let clauses = vec![
        clause("first", "alpha"),
        clause("second", "beta"),
        clause("third", "gamma"),
    ];
    let embedder = StubEmbedder {
        entries: vec![
            ("alpha", vec![1.0, 0.0]),
            ("beta", vec![0.0, 1.0]),
            ("gamma", vec![1.0, 0.0]),
            ("query", vec![0.0, 0.0]),
        ],
    };
    let index = RegulationIndex::build(clauses, &embedder).expect("should build index");

    // All three rows are equidistant from the origin query.
    let results = index
        .search(&embedder, "query", 3)
        .expect("should search index");

    let ids: Vec<&str> = results.iter().map(|r| r.clause.clause_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[test]
fn empty_dataset_is_rejected() {
    let embedder = StubEmbedder { entries: vec![] };
    let result = RegulationIndex::build(Vec::new(), &embedder);
    assert!(matches!(result, Err(ComplianceError::Dataset(_))));
}

#[test]
fn invalid_clause_is_rejected() {
    let embedder = StubEmbedder {
        entries: vec![("alpha", vec![1.0])],
    };
    let clauses = vec![clause("ok", "alpha"), clause("", "alpha")];
    let result = RegulationIndex::build(clauses, &embedder);
    assert!(matches!(result, Err(ComplianceError::Dataset(_))));
}

#[test]
fn inconsistent_dimensions_are_rejected() {
    let embedder = StubEmbedder {
        entries: vec![("alpha", vec![1.0, 0.0]), ("beta", vec![1.0])],
    };
    let clauses = vec![clause("first", "alpha"), clause("second", "beta")];
    let result = RegulationIndex::build(clauses, &embedder);
    assert!(result.is_err());
}

#[test]
fn zero_k_is_rejected() {
    let (index, _embedder) = three_clause_index();
    let result = index.search_vector(&[0.0, 0.0], 0);
    assert!(result.is_err());
}

#[test]
fn query_dimension_mismatch_is_rejected() {
    let (index, _embedder) = three_clause_index();
    let result = index.search_vector(&[0.0, 0.0, 0.0], 1);
    assert!(result.is_err());
}
