// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Falzwerk: tool kinds, typed per-tool options, staged
// input files, and result artifacts.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{FalzwerkError, Result};

/// Unique identifier for a tool session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tool kinds
// ---------------------------------------------------------------------------

/// The nine document tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    #[serde(rename = "merge")]
    Merge,
    #[serde(rename = "split")]
    Split,
    #[serde(rename = "compress")]
    Compress,
    #[serde(rename = "pdf-to-word")]
    DocToText,
    #[serde(rename = "word-to-pdf")]
    TextToDoc,
    #[serde(rename = "pdf-to-jpg")]
    DocToImage,
    #[serde(rename = "jpg-to-pdf")]
    ImageToDoc,
    #[serde(rename = "rotate")]
    Rotate,
    #[serde(rename = "watermark")]
    Watermark,
}

impl ToolKind {
    /// Every tool, in menu order.
    pub const ALL: [ToolKind; 9] = [
        Self::Merge,
        Self::Split,
        Self::Compress,
        Self::DocToText,
        Self::TextToDoc,
        Self::DocToImage,
        Self::ImageToDoc,
        Self::Rotate,
        Self::Watermark,
    ];

    /// Stable identifier used on the command line and in download names.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Compress => "compress",
            Self::DocToText => "pdf-to-word",
            Self::TextToDoc => "word-to-pdf",
            Self::DocToImage => "pdf-to-jpg",
            Self::ImageToDoc => "jpg-to-pdf",
            Self::Rotate => "rotate",
            Self::Watermark => "watermark",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ToolKind {
    type Err = FalzwerkError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| FalzwerkError::UnknownTool(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Per-tool options
// ---------------------------------------------------------------------------

/// How the split tool selects pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Copy the pages named by a range expression.
    #[default]
    Range,
    /// Copy every page.
    All,
}

impl FromStr for SplitMode {
    type Err = FalzwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "range" => Ok(Self::Range),
            "all" => Ok(Self::All),
            other => Err(FalzwerkError::Validation(format!(
                "split mode must be 'range' or 'all', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SplitOptions {
    pub mode: SplitMode,
    /// Range expression such as `1-3,5,7-9`; ignored in [`SplitMode::All`].
    pub range: String,
}

/// Re-encoding granularity for the compress tool.
///
/// This only tunes how the serializer batches its output; it does not
/// resample images or subset fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressionLevel {
    /// Number of objects written per serializer batch.
    pub fn objects_per_batch(&self) -> usize {
        match self {
            Self::High => 25,
            Self::Medium => 75,
            Self::Low => 150,
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = FalzwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(FalzwerkError::Validation(format!(
                "compression level must be low, medium or high, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompressOptions {
    pub level: CompressionLevel,
}

/// Rendering quality for the PDF-to-image tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    High,
    #[default]
    Medium,
    Low,
}

impl ImageQuality {
    /// Render scale relative to the page's native size.
    pub fn scale_factor(&self) -> f32 {
        match self {
            Self::High => 2.0,
            Self::Medium => 1.5,
            Self::Low => 1.0,
        }
    }
}

impl FromStr for ImageQuality {
    type Err = FalzwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(FalzwerkError::Validation(format!(
                "image quality must be high, medium or low, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocToImageOptions {
    pub quality: ImageQuality,
}

/// Clockwise page rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum RotationAngle {
    #[default]
    Deg90,
    Deg180,
    Deg270,
}

impl RotationAngle {
    pub fn degrees(&self) -> i32 {
        match self {
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl TryFrom<i32> for RotationAngle {
    type Error = FalzwerkError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(FalzwerkError::Validation(format!(
                "rotation must be 90, 180 or 270 degrees, got {other}"
            ))),
        }
    }
}

impl From<RotationAngle> for i32 {
    fn from(angle: RotationAngle) -> Self {
        angle.degrees()
    }
}

impl FromStr for RotationAngle {
    type Err = FalzwerkError;

    fn from_str(s: &str) -> Result<Self> {
        let degrees: i32 = s.trim().parse().map_err(|_| {
            FalzwerkError::Validation(format!("rotation must be a number, got '{s}'"))
        })?;
        Self::try_from(degrees)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RotateOptions {
    pub angle: RotationAngle,
}

/// Vertical anchor for watermark text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkPosition {
    #[default]
    Center,
    Top,
    Bottom,
}

impl FromStr for WatermarkPosition {
    type Err = FalzwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" => Ok(Self::Center),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            other => Err(FalzwerkError::Validation(format!(
                "watermark position must be center, top or bottom, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatermarkOptions {
    pub text: String,
    pub position: WatermarkPosition,
}

/// Options for one tool run, keyed by tool kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
pub enum ToolOptions {
    Merge,
    Split(SplitOptions),
    Compress(CompressOptions),
    DocToText,
    TextToDoc,
    DocToImage(DocToImageOptions),
    ImageToDoc,
    Rotate(RotateOptions),
    Watermark(WatermarkOptions),
}

impl ToolOptions {
    /// The options a freshly opened tool starts with.
    pub fn defaults_for(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Merge => Self::Merge,
            ToolKind::Split => Self::Split(SplitOptions::default()),
            ToolKind::Compress => Self::Compress(CompressOptions::default()),
            ToolKind::DocToText => Self::DocToText,
            ToolKind::TextToDoc => Self::TextToDoc,
            ToolKind::DocToImage => Self::DocToImage(DocToImageOptions::default()),
            ToolKind::ImageToDoc => Self::ImageToDoc,
            ToolKind::Rotate => Self::Rotate(RotateOptions::default()),
            ToolKind::Watermark => Self::Watermark(WatermarkOptions::default()),
        }
    }

    /// The tool these options belong to.
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Merge => ToolKind::Merge,
            Self::Split(_) => ToolKind::Split,
            Self::Compress(_) => ToolKind::Compress,
            Self::DocToText => ToolKind::DocToText,
            Self::TextToDoc => ToolKind::TextToDoc,
            Self::DocToImage(_) => ToolKind::DocToImage,
            Self::ImageToDoc => ToolKind::ImageToDoc,
            Self::Rotate(_) => ToolKind::Rotate,
            Self::Watermark(_) => ToolKind::Watermark,
        }
    }

    /// Check everything that can be checked without decoding any input.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Watermark(options) if options.text.is_empty() => Err(
                FalzwerkError::Validation("watermark text must not be empty".into()),
            ),
            Self::Split(SplitOptions {
                mode: SplitMode::Range,
                range,
            }) => crate::range::PageRangeParser::validate(range),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Staged input files
// ---------------------------------------------------------------------------

/// A user-supplied input file held in memory for one session.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Debug, Clone)]
pub struct StagedFile {
    name: String,
    data: Arc<[u8]>,
    digest: String,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        let digest = hash_bytes(&data);
        Self {
            name: name.into(),
            data: Arc::from(data),
            digest,
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// SHA-256 of the contents, lowercase hex.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Lowercased extension of the original file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Result artifacts
// ---------------------------------------------------------------------------

/// Container format of a result artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Pdf,
    /// Bundle of page images.
    Zip,
    /// WordprocessingML container.
    Docx,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Zip => "zip",
            Self::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Zip => "application/zip",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// The artifact kind each tool produces.
    pub fn for_tool(tool: ToolKind) -> Self {
        match tool {
            ToolKind::DocToImage => Self::Zip,
            ToolKind::DocToText => Self::Docx,
            _ => Self::Pdf,
        }
    }
}

/// Size report produced by the compress tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionReport {
    pub original_size: usize,
    pub compressed_size: usize,
    /// Percentage saved; negative when the output grew.
    pub reduction_percent: f64,
}

impl CompressionReport {
    pub fn new(original_size: usize, compressed_size: usize) -> Self {
        let reduction_percent = if original_size == 0 {
            0.0
        } else {
            (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0
        };
        Self {
            original_size,
            compressed_size,
            reduction_percent,
        }
    }
}

/// The single output of one transformation run.
#[derive(Debug, Clone)]
pub struct ResultArtifact {
    pub tool: ToolKind,
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
    /// Present only for compress runs.
    pub report: Option<CompressionReport>,
}

impl ResultArtifact {
    pub fn new(tool: ToolKind, bytes: Vec<u8>) -> Self {
        Self {
            tool,
            kind: ArtifactKind::for_tool(tool),
            bytes,
            report: None,
        }
    }

    pub fn with_report(mut self, report: CompressionReport) -> Self {
        self.report = Some(report);
        self
    }

    /// File name offered for download: `processed_<tool>_<millis>.<ext>`.
    pub fn download_name(&self, timestamp_ms: i64) -> String {
        format!(
            "processed_{}_{}.{}",
            self.tool.id(),
            timestamp_ms,
            self.kind.extension()
        )
    }
}

// ---------------------------------------------------------------------------
// Paper
// ---------------------------------------------------------------------------

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Render a byte count the way the file list shows it (`1.5 KB`, `2 MB`).
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
