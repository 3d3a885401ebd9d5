// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Falzwerk.

use thiserror::Error;

use crate::types::ToolKind;

/// Top-level error type for all Falzwerk operations.
#[derive(Debug, Error)]
pub enum FalzwerkError {
    // -- Registry / staging --
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{tool} accepts only one file at a time (got {count})")]
    TooManyFiles { tool: ToolKind, count: usize },

    #[error("index {index} out of range ({len} files staged)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    // -- Options --
    #[error("invalid page range: {0}")]
    InvalidRange(String),

    #[error("invalid options: {0}")]
    Validation(String),

    // -- Document errors --
    #[error("could not decode input: {0}")]
    Decode(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("archive operation failed: {0}")]
    ArchiveError(String),

    #[error("page rendering failed: {0}")]
    RasterError(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// Any failure raised while a transformation was running.
    #[error("transformation failed: {cause}")]
    Transformation {
        #[source]
        cause: Box<FalzwerkError>,
    },

    // -- Session lifecycle --
    #[error("no tool is open")]
    NoActiveTool,

    #[error("a transformation is already running")]
    SessionBusy,

    #[error("no files staged")]
    NoFilesStaged,

    #[error("no result available")]
    NoArtifact,

    #[error("operation not allowed while {0}")]
    InvalidPhase(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FalzwerkError {
    /// Wrap this error as a [`FalzwerkError::Transformation`], unless it
    /// already is one.
    pub fn into_transformation(self) -> Self {
        match self {
            already @ Self::Transformation { .. } => already,
            other => Self::Transformation {
                cause: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through transformation wrappers.
    pub fn root_cause(&self) -> &FalzwerkError {
        match self {
            Self::Transformation { cause } => cause.root_cause(),
            other => other,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FalzwerkError>;
