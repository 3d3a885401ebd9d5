// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File staging area — the ordered input files of one session.

use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::{StagedFile, ToolKind, ToolRegistry};
use tracing::{debug, instrument};

/// Input files waiting to be transformed, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct FileStagingArea {
    files: Vec<StagedFile>,
}

impl FileStagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `files` for `tool`. Returns the number of staged files.
    ///
    /// Multi-file tools append; single-file tools replace. Nothing changes
    /// when any check fails: more than one file for a single-file tool is
    /// `TooManyFiles`, an extension the tool does not accept is
    /// `UnsupportedDocument`.
    #[instrument(skip(self, files), fields(tool = %tool, incoming = files.len()))]
    pub fn stage(&mut self, tool: ToolKind, files: Vec<StagedFile>) -> Result<usize> {
        let descriptor = ToolRegistry::describe(tool);

        if !descriptor.allows_multiple_files && files.len() > 1 {
            return Err(FalzwerkError::TooManyFiles {
                tool,
                count: files.len(),
            });
        }

        if let Some(rejected) = files.iter().find(|file| {
            !file
                .extension()
                .is_some_and(|ext| descriptor.accepts_extension(&ext))
        }) {
            return Err(FalzwerkError::UnsupportedDocument(format!(
                "{} (accepted: {})",
                rejected.name(),
                descriptor.accept_filter()
            )));
        }

        if files.is_empty() {
            return Ok(self.files.len());
        }

        for file in &files {
            debug!(name = file.name(), size = file.size(), digest = file.digest(), "File staged");
        }

        if descriptor.allows_multiple_files {
            self.files.extend(files);
        } else {
            self.files = files;
        }
        Ok(self.files.len())
    }

    /// Remove the file at `index`. Returns the number of files left.
    pub fn remove(&mut self, index: usize) -> Result<usize> {
        if index >= self.files.len() {
            return Err(FalzwerkError::IndexOutOfRange {
                index,
                len: self.files.len(),
            });
        }
        let removed = self.files.remove(index);
        debug!(name = removed.name(), remaining = self.files.len(), "File removed");
        Ok(self.files.len())
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> StagedFile {
        StagedFile::new(name, name.as_bytes().to_vec())
    }

    fn names(area: &FileStagingArea) -> Vec<&str> {
        area.files().iter().map(StagedFile::name).collect()
    }

    #[test]
    fn multi_file_tools_append_in_order() {
        let mut area = FileStagingArea::new();
        area.stage(ToolKind::Merge, vec![file("a.pdf"), file("b.pdf")])
            .unwrap();
        let count = area.stage(ToolKind::Merge, vec![file("c.PDF")]).unwrap();

        assert_eq!(count, 3);
        assert_eq!(names(&area), ["a.pdf", "b.pdf", "c.PDF"]);
    }

    #[test]
    fn single_file_tools_replace() {
        let mut area = FileStagingArea::new();
        area.stage(ToolKind::Rotate, vec![file("first.pdf")]).unwrap();
        area.stage(ToolKind::Rotate, vec![file("second.pdf")]).unwrap();
        assert_eq!(names(&area), ["second.pdf"]);
    }

    #[test]
    fn too_many_files_leaves_area_unchanged() {
        let mut area = FileStagingArea::new();
        area.stage(ToolKind::Split, vec![file("keep.pdf")]).unwrap();

        let err = area
            .stage(ToolKind::Split, vec![file("x.pdf"), file("y.pdf")])
            .unwrap_err();

        assert!(matches!(err, FalzwerkError::TooManyFiles { count: 2, .. }));
        assert_eq!(names(&area), ["keep.pdf"]);
    }

    #[test]
    fn unsupported_extension_rejects_the_whole_batch() {
        let mut area = FileStagingArea::new();
        let err = area
            .stage(
                ToolKind::ImageToDoc,
                vec![file("photo.jpg"), file("notes.txt"), file("scan.png")],
            )
            .unwrap_err();

        assert!(matches!(err, FalzwerkError::UnsupportedDocument(ref detail) if detail.contains("notes.txt")));
        assert!(area.is_empty());
    }

    #[test]
    fn files_without_extension_are_rejected() {
        let mut area = FileStagingArea::new();
        assert!(area.stage(ToolKind::Compress, vec![file("README")]).is_err());
    }

    #[test]
    fn remove_reports_remaining_count() {
        let mut area = FileStagingArea::new();
        area.stage(ToolKind::Merge, vec![file("a.pdf"), file("b.pdf")])
            .unwrap();

        assert_eq!(area.remove(0).unwrap(), 1);
        assert_eq!(names(&area), ["b.pdf"]);
        assert!(matches!(
            area.remove(1),
            Err(FalzwerkError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert_eq!(area.remove(0).unwrap(), 0);
    }

    #[test]
    fn clear_empties_everything() {
        let mut area = FileStagingArea::new();
        area.stage(ToolKind::ImageToDoc, vec![file("a.png"), file("b.jpeg")])
            .unwrap();
        area.clear();
        assert_eq!(area.len(), 0);
    }
}
