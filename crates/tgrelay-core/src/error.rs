// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the tgrelay monitor.
//!
//! Every fallible operation returns [`RelayError`], a tagged enumeration that
//! lets callers branch on failure *kind* (configuration vs. transport vs.
//! resolution) instead of downcasting source errors.

use thiserror::Error;

/// The primary error type used across the tgrelay seam traits and core operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration errors (missing credentials, absent session file,
    /// unset target title). Recoverable: retried on the next poll tick.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport or session errors from the messaging backend (connect
    /// failure, unauthorized session, RPC errors, dropped connection).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Target-channel resolution failed (no match or more than one match).
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Storage backend errors (database open, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why the configured target title could not be resolved to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No dialog title matched the configured target after normalization.
    #[error("target channel `{title}` not found in account dialogs")]
    NotFound { title: String },

    /// More than one dialog matched; forwarding destination would be
    /// ambiguous. The caller must disambiguate by renaming.
    #[error("target channel `{title}` is ambiguous: {count} dialogs match")]
    Ambiguous { title: String, count: usize },
}

/// Coarse failure category, used for backoff decisions and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    Resolution,
    Storage,
    Internal,
}

impl RelayError {
    /// Build a transport error with a source.
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a transport error from a bare message.
    pub fn transport_msg(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// The coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
