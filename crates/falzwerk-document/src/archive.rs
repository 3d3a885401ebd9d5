// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory zip archives: bundling page images and the Word container.

use std::io::{Cursor, Read, Write};

use falzwerk_core::error::{FalzwerkError, Result};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Builds a deflate-compressed zip archive in memory.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
    entries: usize,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        }
    }

    /// Add a named entry. Names use `/` as the path separator.
    pub fn add_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.writer
            .start_file(name, self.options)
            .map_err(|e| FalzwerkError::ArchiveError(format!("failed to start entry {name}: {e}")))?;
        self.writer
            .write_all(data)
            .map_err(|e| FalzwerkError::ArchiveError(format!("failed to write entry {name}: {e}")))?;
        self.entries += 1;
        Ok(())
    }

    /// Finalise the archive and return its bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| FalzwerkError::ArchiveError(format!("failed to finalise archive: {e}")))?;
        let bytes = cursor.into_inner();
        debug!(entries = self.entries, output_bytes = bytes.len(), "Archive written");
        Ok(bytes)
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn open(data: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(data))
        .map_err(|e| FalzwerkError::Decode(format!("not a readable archive: {e}")))
}

/// Read one entry of an archive as UTF-8 text.
pub fn read_text_entry(data: &[u8], name: &str) -> Result<String> {
    let mut archive = open(data)?;
    let mut entry = archive
        .by_name(name)
        .map_err(|e| FalzwerkError::Decode(format!("archive has no {name}: {e}")))?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| FalzwerkError::Decode(format!("failed to read {name}: {e}")))?;
    Ok(text)
}

/// Names of all entries, in archive order.
pub fn entry_names(data: &[u8]) -> Result<Vec<String>> {
    let mut archive = open(data)?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| FalzwerkError::Decode(format!("failed to read archive entry: {e}")))?;
        names.push(entry.name().to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_insertion_order() {
        let mut builder = ArchiveBuilder::new();
        builder.add_entry("page_1.jpg", b"one").unwrap();
        builder.add_entry("page_2.jpg", b"two").unwrap();
        builder.add_entry("notes/readme.txt", b"hello").unwrap();
        let bytes = builder.finish().unwrap();

        assert_eq!(
            entry_names(&bytes).unwrap(),
            vec!["page_1.jpg", "page_2.jpg", "notes/readme.txt"]
        );
        assert_eq!(read_text_entry(&bytes, "notes/readme.txt").unwrap(), "hello");
    }

    #[test]
    fn missing_entry_is_a_decode_error() {
        let bytes = ArchiveBuilder::new().finish().unwrap();
        assert!(matches!(
            read_text_entry(&bytes, "word/document.xml"),
            Err(FalzwerkError::Decode(_))
        ));
    }

    #[test]
    fn non_archive_is_a_decode_error() {
        assert!(matches!(
            entry_names(b"%PDF-1.7"),
            Err(FalzwerkError::Decode(_))
        ));
    }
}
