use std::path::PathBuf;

use thiserror::Error;

/// The query itself is unusable. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("No query was sent")]
    Empty,

    #[error("Unicode decode problem: invalid utf-8 in search query")]
    InvalidUtf8,

    #[error("Unbalanced quotes in query")]
    UnbalancedQuotes,

    #[error("Unbalanced parentheses in query")]
    UnbalancedParens,

    #[error("Syntax error: {0}")]
    Syntax(String),
}

/// The backend failed while executing a well-formed query.
#[derive(Error, Debug)]
#[error("search failed: {message}")]
pub struct SearchError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SearchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Everything a facade call can fail with.
#[derive(Error, Debug)]
pub enum SearchFailure {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// The backend estimated zero matches.
    #[error("no results")]
    NoResults,

    #[error("No such index at {path}: {reason}")]
    NoSuchIndex { path: PathBuf, reason: String },
}

impl SearchFailure {
    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            SearchFailure::Query(_) => 2,
            SearchFailure::NoResults => 3,
            SearchFailure::Search(_) | SearchFailure::NoSuchIndex { .. } => 1,
        }
    }
}
