// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool registry — static description of every tool: title, accepted file
// extensions, and single/multi-file policy.

use serde::Serialize;

use crate::error::Result;
use crate::types::ToolKind;

/// Immutable description of one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub kind: ToolKind,
    pub title: &'static str,
    /// Lowercase extensions without the leading dot.
    pub accepted_extensions: &'static [&'static str],
    pub allows_multiple_files: bool,
    pub has_options: bool,
}

impl ToolDescriptor {
    /// Whether `extension` (any case, with or without a dot) is accepted.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
        self.accepted_extensions.iter().any(|ext| *ext == wanted)
    }

    /// Accept-list in file-picker form, e.g. `.jpg,.jpeg,.png`.
    pub fn accept_filter(&self) -> String {
        self.accepted_extensions
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

const PDF: &[&str] = &["pdf"];
const DOCX: &[&str] = &["docx"];
const IMAGES: &[&str] = &["jpg", "jpeg", "png"];

/// Lookup table over the fixed set of tools.
pub struct ToolRegistry;

impl ToolRegistry {
    /// Descriptor for `kind`. Total over [`ToolKind`].
    pub fn describe(kind: ToolKind) -> ToolDescriptor {
        let (title, accepted_extensions, allows_multiple_files, has_options) = match kind {
            ToolKind::Merge => ("Merge PDF", PDF, true, false),
            ToolKind::Split => ("Split PDF", PDF, false, true),
            ToolKind::Compress => ("Compress PDF", PDF, false, true),
            ToolKind::DocToText => ("PDF to Word", PDF, false, false),
            ToolKind::TextToDoc => ("Word to PDF", DOCX, false, false),
            ToolKind::DocToImage => ("PDF to JPG", PDF, false, true),
            ToolKind::ImageToDoc => ("JPG to PDF", IMAGES, true, false),
            ToolKind::Rotate => ("Rotate PDF", PDF, false, true),
            ToolKind::Watermark => ("Watermark PDF", PDF, false, true),
        };

        ToolDescriptor {
            kind,
            title,
            accepted_extensions,
            allows_multiple_files,
            has_options,
        }
    }

    /// Descriptor for a tool identifier such as `"pdf-to-jpg"`.
    ///
    /// Fails with `UnknownTool` for anything outside the nine tools.
    pub fn describe_id(id: &str) -> Result<ToolDescriptor> {
        Ok(Self::describe(id.parse()?))
    }

    /// Every descriptor, in menu order.
    pub fn all() -> Vec<ToolDescriptor> {
        ToolKind::ALL.into_iter().map(Self::describe).collect()
    }
}
