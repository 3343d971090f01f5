//! Error types for nbgen.
//!
//! Errors fall into three families: retrieval failures talking to the
//! inventory service, data-validity failures in otherwise accepted records,
//! and filesystem or rendering failures while producing an artifact.

use std::path::PathBuf;
use thiserror::Error;

use crate::netbox::Collection;

/// Result type alias for nbgen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for nbgen.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Retrieval Errors
    // ========================================================================
    /// Fetching or decoding a collection from the inventory service failed.
    #[error("Failed to retrieve {collection}: {message}")]
    Retrieval {
        /// Collection being fetched
        collection: Collection,
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// An address or prefix field could not be parsed.
    #[error("Invalid address '{value}' on {collection} record '{record}': {message}")]
    InvalidAddress {
        /// Collection the record came from
        collection: Collection,
        /// Name or id of the offending record
        record: String,
        /// Raw field value
        value: String,
        /// Error message
        message: String,
    },

    /// A record that passed policy filters lacks a field every record needs.
    #[error("{collection} record '{record}' is missing required field '{field}'")]
    MissingField {
        /// Collection the record came from
        collection: Collection,
        /// Name or id of the offending record
        record: String,
        /// Missing field name
        field: &'static str,
    },

    // ========================================================================
    // Output Errors
    // ========================================================================
    /// The output directory could not be prepared.
    #[error("Output directory '{path}' is unusable: {message}")]
    OutputDir {
        /// Directory path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Writing or renaming an output file failed.
    #[error("Failed to write '{path}': {source}")]
    Write {
        /// Target file path
        path: PathBuf,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Template parsing or rendering failed.
    #[error("Template '{template}' failed: {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration or config-context content is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // IO and Serialization Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a retrieval error without a source.
    pub fn retrieval(collection: Collection, message: impl Into<String>) -> Self {
        Self::Retrieval {
            collection,
            message: message.into(),
            source: None,
        }
    }

    /// Create a retrieval error wrapping its cause.
    pub fn retrieval_with_source(
        collection: Collection,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Retrieval {
            collection,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid address error.
    pub fn invalid_address(
        collection: Collection,
        record: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAddress {
            collection,
            record: record.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a template error.
    pub fn template(template: impl Into<String>, err: &minijinja::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: err.to_string(),
        }
    }

    /// The collection involved, for retrieval and data errors.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            Error::Retrieval { collection, .. }
            | Error::InvalidAddress { collection, .. }
            | Error::MissingField { collection, .. } => Some(*collection),
            _ => None,
        }
    }

    /// Check if the error came from talking to the inventory service.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Error::Retrieval { .. })
    }
}
