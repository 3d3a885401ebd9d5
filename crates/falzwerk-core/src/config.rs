// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{CompressionLevel, ImageQuality, PaperSize};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page size for documents built from images or Word text.
    pub paper_size: PaperSize,
    /// Directory downloads are written to (current directory when unset).
    pub output_dir: Option<PathBuf>,
    /// JPEG quality (1-100) for rendered pages.
    pub jpeg_quality: u8,
    /// Explicit location of the pdfium library; the system library is used
    /// when unset.
    pub pdfium_library_path: Option<PathBuf>,
    /// Compression level a new compress session starts with.
    pub default_compression: CompressionLevel,
    /// Render quality a new PDF-to-JPG session starts with.
    pub default_image_quality: ImageQuality,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            output_dir: None,
            jpeg_quality: 95,
            pdfium_library_path: None,
            default_compression: CompressionLevel::Medium,
            default_image_quality: ImageQuality::Medium,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write settings as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Directory downloads go to.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
