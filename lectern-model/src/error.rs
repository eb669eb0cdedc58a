use std::fmt::{self, Display};

/// Errors produced by model constructors and parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnknownRole(String),
    UnknownSort(String),
    UnknownViewMode(String),
    EmptyId(&'static str),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownRole(value) => {
                write!(f, "unknown role: {value}")
            }
            ModelError::UnknownSort(value) => {
                write!(f, "unknown sort order: {value}")
            }
            ModelError::UnknownViewMode(value) => {
                write!(f, "unknown view mode: {value}")
            }
            ModelError::EmptyId(kind) => write!(f, "{kind} id cannot be empty"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
