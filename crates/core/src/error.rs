use thiserror::Error;

/// Fatal startup errors. Nothing in here is raised once probing has begun.
#[derive(Error, Debug)]
pub enum BisectError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Inverted row id bounds: min {min} > max {max}")]
    InvertedBounds { min: u64, max: u64 },

    #[error("Table {0} has no rows")]
    EmptyTable(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Why a probe did not come back clean.
///
/// All variants are handled identically by the bisection engine: a transient
/// query failure narrows the range exactly like a corrupted row does.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe returned no rows")]
    EmptyResult,

    #[error("query failed: {0}")]
    Query(String),

    #[error("probe panicked")]
    Panicked,
}
