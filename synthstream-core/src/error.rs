// Copyright 2026 The synthstream authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the synthstream engine.
//!
//! The root [`StreamError`] covers the full taxonomy of the engine:
//! setup-time configuration failures (unknown stream type, missing URL,
//! invalid tunables), frame schema misuse, and the two external-path
//! failure modes (feed connection, chunked transfer). Transient ingest
//! failures — malformed feed messages, skipped rows — are deliberately
//! *not* represented here; they are logged and dropped at the point of
//! ingestion and never reach a caller.

/// Root error type for all synthstream operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The query named a stream type the dispatcher does not know.
    ///
    /// Raised synchronously at dispatch, before any resource is acquired.
    #[error("unknown stream type: {stream_type}")]
    UnknownStreamType {
        /// The unrecognized `type` value as supplied by the query.
        stream_type: String,
    },

    /// A chunked stream was requested without a source URL.
    #[error("chunked stream requires a url")]
    MissingUrl,

    /// A configuration field failed validation at resolve time.
    #[error("invalid stream configuration: {context}")]
    InvalidConfig {
        /// Description of the offending field and value.
        context: String,
    },

    /// A frame operation violated the frame's schema rules, e.g. adding a
    /// field after rows exist or appending a row of the wrong arity.
    #[error("frame schema violation: {context}")]
    SchemaViolation {
        /// Description of the violated rule.
        context: String,
    },

    /// An external feed connection could not be established or was lost.
    ///
    /// Never fatal to a bridge stream: the producer logs it and keeps
    /// emitting its last known value.
    #[error("feed connection error: {context}")]
    Connection {
        /// Description of the connection failure.
        context: String,
    },

    /// A chunked transfer failed mid-stream.
    ///
    /// Terminal for the producer: delivered to the consumer as the final
    /// `Err` event, after which no further emissions occur.
    #[error("chunked transfer error: {context}")]
    Transfer {
        /// Description of the transfer failure.
        context: String,
    },
}

impl StreamError {
    /// Create an [`StreamError::InvalidConfig`] with the given context.
    pub fn invalid_config(context: impl Into<String>) -> Self {
        Self::InvalidConfig {
            context: context.into(),
        }
    }

    /// Create a [`StreamError::SchemaViolation`] with the given context.
    pub fn schema(context: impl Into<String>) -> Self {
        Self::SchemaViolation {
            context: context.into(),
        }
    }

    /// Create a [`StreamError::Connection`] with the given context.
    pub fn connection(context: impl Into<String>) -> Self {
        Self::Connection {
            context: context.into(),
        }
    }

    /// Create a [`StreamError::Transfer`] with the given context.
    pub fn transfer(context: impl Into<String>) -> Self {
        Self::Transfer {
            context: context.into(),
        }
    }

    /// Whether this error is raised before any resource is acquired.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::UnknownStreamType { .. } | Self::MissingUrl | Self::InvalidConfig { .. }
        )
    }
}

/// Convenience alias used across the workspace.
pub type Result<T> = core::result::Result<T, StreamError>;
