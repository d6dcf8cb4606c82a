// error.rs

#[cfg(feature = "cli")]
use indicatif::style::TemplateError;
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HibfError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No user bins provided; at least one input file is required")]
    EmptyInput,

    #[error("Malformed layout at line {line}: {reason}")]
    MalformedLayout { line: usize, reason: String },

    #[error("Input file not found: {0}")]
    MissingInputFile(String),

    #[error("Could not read sequence data from {path}: {reason}")]
    UnreadableSequence { path: String, reason: String },

    #[error("Requested bin count overflows the technical bin budget: {0}")]
    SizeOverflow(String),

    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Parse integer error: {0}")]
    ParseIntError(#[from] ParseIntError),

    #[error("Parse float error: {0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("Bincode error: {0}")]
    BincodeError(String),

    #[error("{0}")]
    StringError(String),

    #[cfg(feature = "cli")]
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[cfg(feature = "cli")]
    #[error("Template error: {0}")]
    TemplateError(#[from] TemplateError),
}

impl From<&str> for HibfError {
    fn from(error: &str) -> Self {
        HibfError::StringError(error.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for HibfError {
    fn from(error: Box<bincode::ErrorKind>) -> Self {
        HibfError::BincodeError(error.to_string())
    }
}
