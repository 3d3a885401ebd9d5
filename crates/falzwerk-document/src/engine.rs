// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transformation engine — one algorithm per tool, run off the async executor.
//
// Every run takes the staged input bytes and typed options and yields exactly
// one result artifact. Inputs are never modified. A failed run reports a
// `FalzwerkError::Transformation` wrapping the cause.

use std::path::Path;
use std::sync::Arc;

use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::{
    AppConfig, CompressionLevel, CompressionReport, ImageQuality, PageRangeParser, PaperSize,
    ResultArtifact, RotationAngle, SplitMode, SplitOptions, StagedFile, ToolKind, ToolOptions,
    ToolRegistry, WatermarkOptions, WatermarkPosition,
};
use tracing::{debug, error, info, instrument};

use crate::archive::ArchiveBuilder;
use crate::image::ImageProcessor;
use crate::pdf::reader::{PdfReader, TextStamp};
use crate::pdf::writer::PdfWriter;
use crate::raster::{PageRasterizer, PdfiumRasterizer};
use crate::word;

/// Watermark appearance.
const WATERMARK_FONT_SIZE: f32 = 30.0;
const WATERMARK_GRAY: f32 = 0.7;
const WATERMARK_OPACITY: f32 = 0.3;
/// Distance of a top/bottom watermark baseline from the page edge, in points.
const WATERMARK_EDGE_OFFSET: f32 = 50.0;
/// Approximate half-width of one watermark glyph, used for centring.
const WATERMARK_HALF_GLYPH: f32 = 5.0;

/// Runs the nine document tools.
///
/// Cheap to clone; clones share the rasterizer.
#[derive(Clone)]
pub struct TransformationEngine {
    rasterizer: Arc<dyn PageRasterizer>,
    paper_size: PaperSize,
    jpeg_quality: u8,
}

impl TransformationEngine {
    /// Build an engine from the application settings, rendering pages with
    /// pdfium.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            rasterizer: Arc::new(PdfiumRasterizer::new(config.pdfium_library_path.clone())),
            paper_size: config.paper_size,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Replace the page rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Run `tool` over `files` on a blocking worker thread.
    ///
    /// Errors are always [`FalzwerkError::Transformation`].
    #[instrument(skip(self, files, options), fields(tool = %tool, files = files.len()))]
    pub async fn run(
        &self,
        tool: ToolKind,
        files: Vec<StagedFile>,
        options: ToolOptions,
    ) -> Result<ResultArtifact> {
        let engine = self.clone();
        let outcome = tokio::task::spawn_blocking(move || engine.execute(tool, &files, &options))
            .await
            .map_err(|e| FalzwerkError::Internal(format!("transformation task panicked: {e}")))
            .and_then(|result| result);

        match outcome {
            Ok(artifact) => {
                info!(output_bytes = artifact.bytes.len(), kind = ?artifact.kind, "Transformation complete");
                Ok(artifact)
            }
            Err(err) => {
                error!(%err, "Transformation failed");
                Err(err.into_transformation())
            }
        }
    }

    /// Run `tool` on the current thread. Errors are not wrapped.
    pub fn execute(
        &self,
        tool: ToolKind,
        files: &[StagedFile],
        options: &ToolOptions,
    ) -> Result<ResultArtifact> {
        if options.kind() != tool {
            return Err(FalzwerkError::Validation(format!(
                "options for {} cannot be used with {tool}",
                options.kind()
            )));
        }
        options.validate()?;

        if files.is_empty() {
            return Err(FalzwerkError::NoFilesStaged);
        }
        if files.len() > 1 && !ToolRegistry::describe(tool).allows_multiple_files {
            return Err(FalzwerkError::TooManyFiles {
                tool,
                count: files.len(),
            });
        }

        match options {
            ToolOptions::Merge => self.merge(files),
            ToolOptions::Split(split) => self.split(&files[0], split),
            ToolOptions::Compress(compress) => self.compress(&files[0], compress.level),
            ToolOptions::Rotate(rotate) => self.rotate(&files[0], rotate.angle),
            ToolOptions::Watermark(watermark) => self.watermark(&files[0], watermark),
            ToolOptions::ImageToDoc => self.images_to_pdf(files),
            ToolOptions::DocToImage(render) => self.pdf_to_images(&files[0], render.quality),
            ToolOptions::DocToText => self.pdf_to_word(&files[0]),
            ToolOptions::TextToDoc => self.word_to_pdf(&files[0]),
        }
    }

    // -- Page structure -------------------------------------------------------

    fn merge(&self, files: &[StagedFile]) -> Result<ResultArtifact> {
        let mut output = PdfReader::empty();
        for file in files {
            let source = PdfReader::from_bytes(file.bytes())?;
            debug!(file = file.name(), pages = source.page_count(), "Merging");
            output.append_all_pages_from(&source)?;
        }
        info!(documents = files.len(), pages = output.page_count(), "PDFs merged");
        Ok(ResultArtifact::new(ToolKind::Merge, output.to_bytes()?))
    }

    fn split(&self, file: &StagedFile, options: &SplitOptions) -> Result<ResultArtifact> {
        let source = PdfReader::from_bytes(file.bytes())?;
        let total = source.page_count();

        let selection = match options.mode {
            SplitMode::All => (0..total).collect(),
            SplitMode::Range => PageRangeParser::parse(&options.range, total)?,
        };
        if selection.is_empty() {
            return Err(FalzwerkError::Validation(format!(
                "the selection matches none of the document's {total} pages"
            )));
        }

        let mut output = PdfReader::empty();
        output.append_pages_from(&source, &selection)?;
        info!(total, selected = selection.len(), "PDF split");
        Ok(ResultArtifact::new(ToolKind::Split, output.to_bytes()?))
    }

    fn compress(&self, file: &StagedFile, level: CompressionLevel) -> Result<ResultArtifact> {
        let mut document = PdfReader::from_bytes(file.bytes())?;
        document.strip_metadata();
        let bytes = document.to_bytes_batched(level.objects_per_batch())?;

        let report = CompressionReport::new(file.size(), bytes.len());
        info!(
            original_size = report.original_size,
            compressed_size = report.compressed_size,
            reduction_percent = report.reduction_percent,
            ?level,
            "PDF compressed"
        );
        Ok(ResultArtifact::new(ToolKind::Compress, bytes).with_report(report))
    }

    fn rotate(&self, file: &StagedFile, angle: RotationAngle) -> Result<ResultArtifact> {
        let mut document = PdfReader::from_bytes(file.bytes())?;
        document.rotate_all(angle.degrees())?;
        Ok(ResultArtifact::new(ToolKind::Rotate, document.to_bytes()?))
    }

    fn watermark(&self, file: &StagedFile, options: &WatermarkOptions) -> Result<ResultArtifact> {
        let mut document = PdfReader::from_bytes(file.bytes())?;

        for index in 0..document.page_count() {
            let (x, y) = watermark_origin(document.page_size(index)?, options);
            document.stamp_text(
                index,
                &TextStamp {
                    text: &options.text,
                    x,
                    y,
                    font_size: WATERMARK_FONT_SIZE,
                    gray: WATERMARK_GRAY,
                    opacity: WATERMARK_OPACITY,
                },
            )?;
        }

        info!(pages = document.page_count(), position = ?options.position, "Watermark applied");
        Ok(ResultArtifact::new(ToolKind::Watermark, document.to_bytes()?))
    }

    // -- Conversions ----------------------------------------------------------

    fn images_to_pdf(&self, files: &[StagedFile]) -> Result<ResultArtifact> {
        let images: Vec<&[u8]> = files.iter().map(StagedFile::bytes).collect();
        let mut writer = PdfWriter::new(self.paper_size);
        if let Some(first) = files.first() {
            writer.set_title(document_title(first));
        }
        let bytes = writer.create_from_images(&images)?;
        Ok(ResultArtifact::new(ToolKind::ImageToDoc, bytes))
    }

    fn pdf_to_images(&self, file: &StagedFile, quality: ImageQuality) -> Result<ResultArtifact> {
        let pages = self
            .rasterizer
            .render_pages(file.bytes(), quality.scale_factor())?;

        let mut archive = ArchiveBuilder::new();
        for (index, page) in pages.into_iter().enumerate() {
            let jpeg = ImageProcessor::from_dynamic(page).to_jpeg_bytes(self.jpeg_quality)?;
            archive.add_entry(&format!("page_{}.jpg", index + 1), &jpeg)?;
        }
        Ok(ResultArtifact::new(ToolKind::DocToImage, archive.finish()?))
    }

    fn pdf_to_word(&self, file: &StagedFile) -> Result<ResultArtifact> {
        let document = PdfReader::from_bytes(file.bytes())?;
        let text: String = document
            .page_texts()
            .into_iter()
            .map(|page| page + "\n\n")
            .collect();
        Ok(ResultArtifact::new(ToolKind::DocToText, word::build_document(&text)?))
    }

    fn word_to_pdf(&self, file: &StagedFile) -> Result<ResultArtifact> {
        let text = word::extract_text(file.bytes())?;
        let mut writer = PdfWriter::new(self.paper_size);
        writer.set_title(document_title(file));
        let bytes = writer.create_from_text(&text)?;
        Ok(ResultArtifact::new(ToolKind::TextToDoc, bytes))
    }
}

/// Title for a generated PDF: the input's file name without its extension.
fn document_title(file: &StagedFile) -> String {
    Path::new(file.name())
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.name().to_string())
}

/// Baseline origin of a watermark on a page of `(width, height)` points.
fn watermark_origin((width, height): (f32, f32), options: &WatermarkOptions) -> (f32, f32) {
    let glyphs = options.text.chars().count() as f32;
    let y = match options.position {
        WatermarkPosition::Top => height - WATERMARK_EDGE_OFFSET,
        WatermarkPosition::Bottom => WATERMARK_EDGE_OFFSET,
        WatermarkPosition::Center => height / 2.0,
    };
    (width / 2.0 - WATERMARK_HALF_GLYPH * glyphs, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive;
    use crate::fixtures::{labelled_pdf, png};
    use falzwerk_core::{ArtifactKind, CompressOptions, DocToImageOptions, RotateOptions};
    use image::DynamicImage;

    /// Renders one blank image per page, sized by the scale factor.
    struct FakeRasterizer;

    impl PageRasterizer for FakeRasterizer {
        fn render_pages(&self, pdf: &[u8], scale: f32) -> Result<Vec<DynamicImage>> {
            let pages = PdfReader::from_bytes(pdf)?.page_count();
            let side = (10.0 * scale) as u32;
            Ok((0..pages).map(|_| DynamicImage::new_rgb8(side, side)).collect())
        }
    }

    fn engine() -> TransformationEngine {
        TransformationEngine::new(&AppConfig::default()).with_rasterizer(Arc::new(FakeRasterizer))
    }

    fn pdf_file(label: &str, pages: usize) -> StagedFile {
        StagedFile::new(format!("{label}.pdf"), labelled_pdf(label, pages))
    }

    fn page_labels(bytes: &[u8]) -> Vec<String> {
        PdfReader::from_bytes(bytes).unwrap().page_texts()
    }

    #[tokio::test]
    async fn merge_keeps_document_and_page_order() {
        let artifact = engine()
            .run(
                ToolKind::Merge,
                vec![pdf_file("A", 2), pdf_file("B", 3)],
                ToolOptions::Merge,
            )
            .await
            .unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Pdf);
        assert_eq!(page_labels(&artifact.bytes), ["A1", "A2", "B1", "B2", "B3"]);
    }

    #[tokio::test]
    async fn split_range_follows_expression_order() {
        let options = ToolOptions::Split(SplitOptions {
            mode: SplitMode::Range,
            range: "3,1-2,9".into(),
        });
        let artifact = engine()
            .run(ToolKind::Split, vec![pdf_file("S", 4)], options)
            .await
            .unwrap();
        assert_eq!(page_labels(&artifact.bytes), ["S3", "S1", "S2"]);
    }

    #[tokio::test]
    async fn split_with_empty_selection_fails() {
        let options = ToolOptions::Split(SplitOptions {
            mode: SplitMode::Range,
            range: "7-9".into(),
        });
        let err = engine()
            .run(ToolKind::Split, vec![pdf_file("S", 4)], options)
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), FalzwerkError::Validation(_)));
    }

    #[tokio::test]
    async fn compress_reports_sizes_and_strips_metadata() {
        let file = pdf_file("C", 2);
        let options = ToolOptions::Compress(CompressOptions {
            level: CompressionLevel::High,
        });
        let artifact = engine()
            .run(ToolKind::Compress, vec![file.clone()], options)
            .await
            .unwrap();

        let report = artifact.report.unwrap();
        assert_eq!(report.original_size, file.size());
        assert_eq!(report.compressed_size, artifact.bytes.len());
        let output = PdfReader::from_bytes(&artifact.bytes).unwrap();
        assert_eq!(output.metadata_field("Title"), None);
        assert_eq!(output.page_count(), 2);
    }

    #[tokio::test]
    async fn rotate_applies_to_every_page() {
        let options = ToolOptions::Rotate(RotateOptions {
            angle: RotationAngle::Deg270,
        });
        let artifact = engine()
            .run(ToolKind::Rotate, vec![pdf_file("R", 3)], options)
            .await
            .unwrap();
        let output = PdfReader::from_bytes(&artifact.bytes).unwrap();
        for index in 0..3 {
            assert_eq!(output.page_rotation(index).unwrap(), 270);
        }
    }

    #[tokio::test]
    async fn watermark_draws_on_every_page() {
        let options = ToolOptions::Watermark(WatermarkOptions {
            text: "CONFIDENTIAL".into(),
            position: WatermarkPosition::Top,
        });
        let artifact = engine()
            .run(ToolKind::Watermark, vec![pdf_file("W", 2)], options)
            .await
            .unwrap();
        let output = PdfReader::from_bytes(&artifact.bytes).unwrap();
        for index in 0..2 {
            let content = String::from_utf8_lossy(&output.page_content(index).unwrap()).into_owned();
            assert!(content.contains("(CONFIDENTIAL)"));
        }
    }

    #[test]
    fn watermark_anchors_follow_position() {
        let mut options = WatermarkOptions {
            text: "CONFIDENTIAL".into(),
            position: WatermarkPosition::Top,
        };
        assert_eq!(watermark_origin((612.0, 792.0), &options), (246.0, 742.0));

        options.position = WatermarkPosition::Bottom;
        assert_eq!(watermark_origin((612.0, 792.0), &options), (246.0, 50.0));

        options.position = WatermarkPosition::Center;
        assert_eq!(watermark_origin((612.0, 792.0), &options), (246.0, 396.0));
    }

    #[tokio::test]
    async fn empty_watermark_is_rejected_for_every_position() {
        for position in [
            WatermarkPosition::Center,
            WatermarkPosition::Top,
            WatermarkPosition::Bottom,
        ] {
            let options = ToolOptions::Watermark(WatermarkOptions {
                text: String::new(),
                position,
            });
            let err = engine()
                .run(ToolKind::Watermark, vec![pdf_file("W", 1)], options)
                .await
                .unwrap_err();
            assert!(matches!(err.root_cause(), FalzwerkError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn images_become_one_page_each() {
        let files = vec![
            StagedFile::new("a.png", png(30, 10)),
            StagedFile::new("b.png", png(10, 30)),
            StagedFile::new("c.png", png(20, 20)),
        ];
        let artifact = engine()
            .run(ToolKind::ImageToDoc, files, ToolOptions::ImageToDoc)
            .await
            .unwrap();
        let output = PdfReader::from_bytes(&artifact.bytes).unwrap();
        assert_eq!(output.page_count(), 3);
        assert_eq!(output.metadata_field("Title").as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn pages_become_numbered_jpegs() {
        let options = ToolOptions::DocToImage(DocToImageOptions {
            quality: ImageQuality::High,
        });
        let artifact = engine()
            .run(ToolKind::DocToImage, vec![pdf_file("J", 3)], options)
            .await
            .unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Zip);
        assert_eq!(
            archive::entry_names(&artifact.bytes).unwrap(),
            ["page_1.jpg", "page_2.jpg", "page_3.jpg"]
        );
    }

    #[tokio::test]
    async fn pdf_text_survives_a_word_round_trip() {
        let docx = engine()
            .run(ToolKind::DocToText, vec![pdf_file("T", 2)], ToolOptions::DocToText)
            .await
            .unwrap();
        assert_eq!(docx.kind, ArtifactKind::Docx);
        assert_eq!(word::extract_text(&docx.bytes).unwrap(), "T1 T2");

        let pdf = engine()
            .run(
                ToolKind::TextToDoc,
                vec![StagedFile::new("notes.docx", docx.bytes)],
                ToolOptions::TextToDoc,
            )
            .await
            .unwrap();
        let output = PdfReader::from_bytes(&pdf.bytes).unwrap();
        assert_eq!(output.page_count(), 1);
        assert_eq!(output.metadata_field("Title").as_deref(), Some("notes"));
    }

    #[tokio::test]
    async fn corrupt_input_is_wrapped_once() {
        let err = engine()
            .run(
                ToolKind::Rotate,
                vec![StagedFile::new("bad.pdf", b"this is not a PDF".to_vec())],
                ToolOptions::defaults_for(ToolKind::Rotate),
            )
            .await
            .unwrap_err();

        match err {
            FalzwerkError::Transformation { cause } => {
                assert!(matches!(*cause, FalzwerkError::Decode(_)));
            }
            other => panic!("expected Transformation, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_options_are_rejected() {
        let err = engine()
            .execute(ToolKind::Rotate, &[pdf_file("X", 1)], &ToolOptions::Merge)
            .unwrap_err();
        assert!(matches!(err, FalzwerkError::Validation(_)));
    }

    #[test]
    fn single_file_tools_refuse_several_files() {
        let err = engine()
            .execute(
                ToolKind::Compress,
                &[pdf_file("X", 1), pdf_file("Y", 1)],
                &ToolOptions::defaults_for(ToolKind::Compress),
            )
            .unwrap_err();
        assert!(matches!(err, FalzwerkError::TooManyFiles { count: 2, .. }));
    }
}
