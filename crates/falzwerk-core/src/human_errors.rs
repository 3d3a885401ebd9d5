// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the message is presented.

use crate::error::FalzwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something outside the user's files went wrong — trying again may help.
    Transient,
    /// User must change something (options, file selection).
    ActionRequired,
    /// The input itself cannot be processed.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying with the same input could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, retriable: bool, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
            severity,
        }
    }
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `FalzwerkError` into a `HumanError` anyone can act on.
pub fn humanize_error(err: &FalzwerkError) -> HumanError {
    use Severity::*;

    match err {
        FalzwerkError::Transformation { cause } => humanize_error(cause),

        // -- Registry / staging --
        FalzwerkError::UnknownTool(id) => HumanError::new(
            "That tool doesn't exist.",
            format!("Pick one of the listed tools. (Asked for: {id})"),
            false,
            ActionRequired,
        ),

        FalzwerkError::TooManyFiles { .. } => HumanError::new(
            "This tool only accepts one file at a time.",
            "Choose a single file, then try again.",
            false,
            ActionRequired,
        ),

        FalzwerkError::IndexOutOfRange { .. } => HumanError::new(
            "That file isn't in the list.",
            "Refresh the file list and try removing it again.",
            false,
            ActionRequired,
        ),

        FalzwerkError::UnsupportedDocument(detail) => HumanError::new(
            "This type of file isn't supported by this tool.",
            format!("Check which file types the tool accepts and choose a matching file. ({detail})"),
            false,
            ActionRequired,
        ),

        // -- Options --
        FalzwerkError::InvalidRange(_) => HumanError::new(
            "The page range doesn't look right.",
            "Use page numbers and ranges separated by commas, for example 1-3, 5, 7-9.",
            false,
            ActionRequired,
        ),

        FalzwerkError::Validation(detail) => HumanError::new(
            "Some options are missing or invalid.",
            format!("Fix the options and try again. ({detail})"),
            false,
            ActionRequired,
        ),

        // -- Document errors --
        FalzwerkError::Decode(_) | FalzwerkError::PdfError(_) => HumanError::new(
            "There's a problem with this file.",
            "The file may be damaged or not what its name says. Try opening it elsewhere first, or choose a different file.",
            false,
            Permanent,
        ),

        FalzwerkError::ImageError(_) => HumanError::new(
            "There's a problem with this image.",
            "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.",
            false,
            Permanent,
        ),

        FalzwerkError::ArchiveError(_) => HumanError::new(
            "The packaged document couldn't be read or written.",
            "If you uploaded a Word file, re-save it as .docx and try again.",
            false,
            Permanent,
        ),

        FalzwerkError::RasterError(_) => HumanError::new(
            "The pages couldn't be turned into images.",
            "Check that the PDF rendering library is installed, then try again.",
            true,
            Transient,
        ),

        FalzwerkError::Internal(_) => HumanError::new(
            "Something went wrong while processing your files.",
            "Try again. If this keeps happening, please report it.",
            true,
            Transient,
        ),

        // -- Session lifecycle --
        FalzwerkError::NoActiveTool => HumanError::new(
            "No tool is open.",
            "Choose a tool first.",
            false,
            ActionRequired,
        ),

        FalzwerkError::SessionBusy => HumanError::new(
            "Your files are still being processed.",
            "Wait for the current run to finish.",
            true,
            Transient,
        ),

        FalzwerkError::NoFilesStaged => HumanError::new(
            "No files selected.",
            "Add at least one file, then try again.",
            false,
            ActionRequired,
        ),

        FalzwerkError::NoArtifact => HumanError::new(
            "There's nothing to download yet.",
            "Process your files first.",
            false,
            ActionRequired,
        ),

        FalzwerkError::InvalidPhase(detail) => HumanError::new(
            "That can't be done right now.",
            format!("Finish or close the current step first. ({detail})"),
            false,
            ActionRequired,
        ),

        // -- Storage --
        FalzwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
                false,
                ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "Falzwerk doesn't have permission to use that file or folder.",
                "Check the permissions, or pick a different location.",
                false,
                ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your disk may be full.",
                true,
                Transient,
            ),
        },

        FalzwerkError::Serialization(_) => HumanError::new(
            "The settings file couldn't be read.",
            "Fix or delete the settings file; defaults will be used.",
            false,
            ActionRequired,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolKind;

    #[test]
    fn wrapped_errors_use_their_cause() {
        let err = FalzwerkError::Decode("bad xref".into()).into_transformation();
        let human = humanize_error(&err);
        assert_eq!(human, humanize_error(&FalzwerkError::Decode("x".into())));
        assert_eq!(human.severity, Severity::Permanent);
        assert!(!human.retriable);
    }

    #[test]
    fn too_many_files_is_action_required() {
        let human = humanize_error(&FalzwerkError::TooManyFiles {
            tool: ToolKind::Rotate,
            count: 3,
        });
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn missing_renderer_is_transient() {
        let human = humanize_error(&FalzwerkError::RasterError("no pdfium".into()));
        assert!(human.retriable);
        assert_eq!(human.severity, Severity::Transient);
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = FalzwerkError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }
}
