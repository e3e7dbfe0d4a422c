//! Error types for grid construction and ray marching

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("grid has no cells")]
    EmptyGrid,

    #[error("grid row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell symbol {symbol:?} at row {row}, column {col}")]
    UnknownCell { row: usize, col: usize, symbol: char },

    #[error("march step must be positive and finite, got {0}")]
    InvalidStep(f32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("ray for column {column} did not resolve after {steps} steps")]
    MarchUnresolved { column: usize, steps: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
