//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates resource errors, validation errors,
//! backend errors and codec errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Invalid caller input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend errors raised outside of a specific call (client construction)
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A backend call failed; `context` names the operation and its target.
    #[error("{context}: {source}")]
    BackendCall {
        context: String,
        #[source]
        source: BackendError,
    },

    /// Object encoding/decoding errors
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StorageError {
    /// Wraps a backend error with the operation that produced it.
    pub fn backend_call(context: impl Into<String>, source: BackendError) -> Self {
        StorageError::BackendCall {
            context: context.into(),
            source,
        }
    }

    /// Returns true if the error maps to an invalid-argument condition.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StorageError::Validation(_))
    }

    /// Returns true if the requested object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }

    /// Returns true if more than one document was found for a unique key.
    pub fn is_internal_consistency(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::Duplicate { .. }))
    }

    /// Returns the underlying backend error, if any.
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            StorageError::Backend(e) => Some(e),
            StorageError::BackendCall { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No document matched the requested key.
    #[error("resource not found: {group_resource} {namespace}/{name} in cluster {cluster}")]
    NotFound {
        group_resource: String,
        cluster: String,
        namespace: String,
        name: String,
    },

    /// More than one document matched a key that must be unique.
    #[error(
        "found {count} documents for {group_resource} {namespace}/{name} in cluster {cluster}, expected exactly one"
    )]
    Duplicate {
        group_resource: String,
        cluster: String,
        namespace: String,
        name: String,
        count: usize,
    },
}

/// Validation errors for caller input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{group_version}: kind is required")]
    MissingKind { group_version: String },

    #[error("fieldSelector {path}: list fields are not supported by storage <{storage}>")]
    UnsupportedListField { path: String, storage: String },

    #[error("invalid {selector} selector {input:?}: {message}")]
    InvalidSelector {
        selector: &'static str,
        input: String,
        message: String,
    },

    #[error("invalid continue token {token:?}: expected a non-negative integer offset")]
    InvalidContinueToken { token: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Backend errors.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be reached (transport failure, timeout).
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("{backend_name} rejected request (status {status}): {body}")]
    Rejected {
        backend_name: String,
        status: u16,
        body: String,
    },

    /// The backend answered, but the body could not be understood.
    #[error("malformed response from {backend_name}: {message}")]
    MalformedResponse {
        backend_name: String,
        message: String,
    },

    /// The backend client could not be constructed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },
}

impl BackendError {
    /// Returns the HTTP-like status code of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised by an [`ObjectCodec`](crate::codec::ObjectCodec).
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to encode object: {message}")]
    Encode { message: String },

    #[error("failed to decode object: {message}")]
    Decode { message: String },
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Decode {
            message: e.to_string(),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
