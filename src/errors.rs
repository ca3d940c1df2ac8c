//! # Error Types Module
//!
//! This module defines the error type returned by the few shopping list
//! operations that can genuinely fail: persistence writes, catalog loading
//! and URL handling. Corrupt stored documents, bad scales and broken share
//! links are recovered in place and never surface here.

use thiserror::Error;

/// Errors produced by the shopping list engine
#[derive(Debug, Error)]
pub enum ShoppingListError {
    /// SQLite backend errors
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Serializing the shopping list document failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The recipe catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(String),
    /// A share link or base URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// File system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ShoppingListError>;
