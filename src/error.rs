//! Error type shared by loading, persistence and training.

use std::io;

/// Everything that can go wrong between reading a file and scoring a model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	#[error("source is empty")]
	EmptySource,

	#[error("header has {columns} column(s), at least 2 are required")]
	HeaderTooShort { columns: usize },

	#[error("source contains no data rows")]
	NoRows,

	#[error("line {line}: expected {expected} columns, found {found}")]
	MissingColumns {
		line: usize,
		expected: usize,
		found: usize,
	},

	#[error("line {line}, column {column}: {value:?} is not a valid number")]
	InvalidNumber {
		line: usize,
		column: usize,
		value: String,
	},

	#[error("invalid record: {0}")]
	InvalidRecord(String),

	#[error("expected {expected} features, got {found}")]
	DimensionMismatch { expected: usize, found: usize },

	#[error("dataset has no train/test split")]
	NotSplit,

	#[error("test partition is empty")]
	EmptyTestSet,

	#[error("unknown model kind {0}")]
	UnknownModelKind(u16),
}

pub type Result<T> = std::result::Result<T, Error>;
