use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComplianceError>;

#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Index not ready: {0}")]
    NotBuilt(String),

    #[error("Model client fault: {0}")]
    ModelClient(String),

    #[error("Extraction fault: {0}")]
    Extraction(String),

    #[error("Validation fault: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod dataset;
pub mod embeddings;
pub mod extract;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod rules;
pub mod schema;
