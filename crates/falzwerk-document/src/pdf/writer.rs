// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — create new PDF documents from text or images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use falzwerk_core::PaperSize;
use falzwerk_core::error::{FalzwerkError, Result};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;

/// Fixed geometry for laying plain text out on pages, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub left_margin_mm: f32,
    /// Distance from the top edge to the first baseline.
    pub top_margin_mm: f32,
    pub line_height_mm: f32,
    pub wrap_width_mm: f32,
    /// Space kept free below the last baseline.
    pub bottom_margin_mm: f32,
    pub font_size_pt: f32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            left_margin_mm: 15.0,
            top_margin_mm: 20.0,
            line_height_mm: 7.0,
            wrap_width_mm: 180.0,
            // Puts the last baseline at 280 mm on A4.
            bottom_margin_mm: 17.0,
            font_size_pt: 16.0,
        }
    }
}

impl TextLayout {
    /// Characters that fit in the wrap width, estimating Helvetica's average
    /// glyph at half the font size.
    fn chars_per_line(&self) -> usize {
        let avg_char_width_mm = 0.5 * self.font_size_pt * MM_PER_PT;
        ((self.wrap_width_mm / avg_char_width_mm) as usize).max(1)
    }
}

const MM_PER_PT: f32 = 0.3528;

/// Creates new PDF documents from text content or raster images.
pub struct PdfWriter {
    paper_size: PaperSize,
    title: Option<String>,
    layout: TextLayout,
}

impl PdfWriter {
    /// Create a new writer targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
            layout: TextLayout::default(),
        }
    }

    /// Create a new writer defaulting to A4.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    /// Set the document information title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    // -- Text to PDF ----------------------------------------------------------

    /// Create a PDF from plain text.
    ///
    /// Lines are word-wrapped to the layout's wrap width and flow top to
    /// bottom in Helvetica, starting a new page when the next baseline would
    /// cross the bottom margin. Empty text gives one blank page.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Falzwerk Document");

        info!(paper = ?self.paper_size, title, "Creating text PDF");

        let wrapped_lines = wrap_text(text, self.layout.chars_per_line());
        let laid_out = paginate(&wrapped_lines, &self.layout, page_h.0);
        let left_pt = Mm(self.layout.left_margin_mm).into_pt();
        let page_h_pt = page_h.into_pt().0;

        let mut pages: Vec<PdfPage> = laid_out
            .iter()
            .map(|lines| {
                let mut ops: Vec<Op> = Vec::new();
                for (line, from_top_mm) in lines {
                    if line.is_empty() {
                        continue;
                    }
                    ops.push(Op::StartTextSection);
                    ops.push(Op::SetTextCursor {
                        pos: Point {
                            x: left_pt,
                            y: Pt(page_h_pt - Mm(*from_top_mm).into_pt().0),
                        },
                    });
                    ops.push(Op::SetFontSizeBuiltinFont {
                        size: Pt(self.layout.font_size_pt),
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(line.clone())],
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::EndTextSection);
                }
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();

        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        let mut doc = PdfDocument::new(title);
        doc.with_pages(pages);

        debug!(
            total_lines = wrapped_lines.len(),
            pages = doc.pages.len(),
            "Text layout complete"
        );

        Ok(save(&doc))
    }

    // -- Images to PDF --------------------------------------------------------

    /// Create a PDF with one page per image, in the order given.
    ///
    /// Each image fills its page: it is scaled so its dominant side spans the
    /// page, keeping the aspect ratio, and centred along the other axis.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn create_from_images(&self, images: &[&[u8]]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(FalzwerkError::Validation(
                "at least one image is required".into(),
            ));
        }

        let (page_w, page_h) = self.page_dimensions();
        let page_w_pt = page_w.into_pt().0;
        let page_h_pt = page_h.into_pt().0;
        let title = self.title.as_deref().unwrap_or("Falzwerk Images");

        info!(paper = ?self.paper_size, title, "Creating image PDF");

        let mut doc = PdfDocument::new(title);
        let mut pages = Vec::with_capacity(images.len());

        for (index, image_bytes) in images.iter().enumerate() {
            let dynamic_image = ImageProcessor::from_bytes(image_bytes)
                .inspect_err(|err| warn!(image = index + 1, %err, "Image rejected"))?
                .into_dynamic();

            let img_width = dynamic_image.width() as usize;
            let img_height = dynamic_image.height() as usize;

            let rgb_image = dynamic_image.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb_image.into_raw()),
                width: img_width,
                height: img_height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // At 72 dpi one pixel is one point.
            let placement = fit_to_page(
                (img_width as f32, img_height as f32),
                (page_w_pt, page_h_pt),
            );

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(placement.x)),
                    translate_y: Some(Pt(placement.y)),
                    scale_x: Some(placement.scale),
                    scale_y: Some(placement.scale),
                    dpi: Some(72.0),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(page_w, page_h, ops));

            debug!(
                page = index + 1,
                width = placement.width,
                height = placement.height,
                "Image placed on page"
            );
        }

        doc.with_pages(pages);
        Ok(save(&doc))
    }
}

fn save(doc: &PdfDocument) -> Vec<u8> {
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "printpdf reported warnings");
    }
    output
}

// -- Geometry helpers ---------------------------------------------------------

/// Where an image lands on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Scale `image` so its larger side relative to the page fills that page
/// dimension, and centre it along the other.
pub fn fit_to_page(image: (f32, f32), page: (f32, f32)) -> Placement {
    let (img_w, img_h) = (image.0.max(1.0), image.1.max(1.0));
    let (page_w, page_h) = page;

    let scale = if img_w / page_w >= img_h / page_h {
        page_w / img_w
    } else {
        page_h / img_h
    };

    let width = img_w * scale;
    let height = img_h * scale;
    Placement {
        x: (page_w - width) / 2.0,
        y: (page_h - height) / 2.0,
        width,
        height,
        scale,
    }
}

/// Assign each line a baseline (mm from the top edge), grouping lines into
/// pages.
fn paginate(lines: &[String], layout: &TextLayout, page_height_mm: f32) -> Vec<Vec<(String, f32)>> {
    let last_baseline = page_height_mm - layout.bottom_margin_mm;
    let mut pages: Vec<Vec<(String, f32)>> = Vec::new();
    let mut current: Vec<(String, f32)> = Vec::new();
    let mut y = layout.top_margin_mm;

    for line in lines {
        if y > last_baseline && !current.is_empty() {
            pages.push(std::mem::take(&mut current));
            y = layout.top_margin_mm;
        }
        current.push((line.clone(), y));
        y += layout.line_height_mm;
    }

    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then performs simple word-wrap within each
/// paragraph. Words longer than `max_width` are force-broken.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current_line = String::with_capacity(max_width);

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    if chunks.peek().is_some() {
                        result.push(chunk.iter().collect());
                    } else {
                        current_line.extend(chunk);
                    }
                }
            } else if current_line.is_empty() {
                current_line.push_str(word);
            } else if current_line.chars().count() + 1 + word_len <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                result.push(std::mem::take(&mut current_line));
                current_line.push_str(word);
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::png;
    use crate::pdf::reader::PdfReader;

    #[test]
    fn wide_image_fills_page_width() {
        let placement = fit_to_page((2000.0, 1000.0), (595.0, 842.0));
        assert!((placement.width - 595.0).abs() < 0.01);
        assert!((placement.height - 297.5).abs() < 0.01);
        assert!(placement.x.abs() < 0.01);
        assert!((placement.y - 272.25).abs() < 0.01);
    }

    #[test]
    fn tall_image_fills_page_height_and_upscales() {
        let placement = fit_to_page((100.0, 400.0), (595.0, 842.0));
        assert!((placement.height - 842.0).abs() < 0.01);
        assert!((placement.width - 210.5).abs() < 0.01);
        assert!(placement.scale > 1.0);
    }

    #[test]
    fn wrap_respects_width_and_breaks_long_words() {
        let lines = wrap_text("the quick brown fox\n\nabcdefghij", 9);
        assert_eq!(lines, vec!["the quick", "brown fox", "", "abcdefghi", "j"]);
    }

    #[test]
    fn paginate_starts_new_page_past_bottom() {
        let layout = TextLayout::default();
        let lines: Vec<String> = (0..40).map(|i| format!("line {i}")).collect();
        let pages = paginate(&lines, &layout, 297.0);

        // Baselines 20, 27, ... 279 fit on A4: 38 lines.
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), 38);
        assert_eq!(pages[1][0], ("line 38".to_string(), 20.0));
    }

    #[test]
    fn text_pdf_has_expected_pages() {
        let text = (0..100).map(|i| format!("row {i}")).collect::<Vec<_>>().join("\n");
        let bytes = PdfWriter::a4().create_from_text(&text).unwrap();
        assert_eq!(PdfReader::from_bytes(&bytes).unwrap().page_count(), 3);
    }

    #[test]
    fn empty_text_gives_one_blank_page() {
        let bytes = PdfWriter::a4().create_from_text("").unwrap();
        assert_eq!(PdfReader::from_bytes(&bytes).unwrap().page_count(), 1);
    }

    #[test]
    fn one_page_per_image() {
        let first = png(40, 20);
        let second = png(10, 30);
        let bytes = PdfWriter::a4()
            .create_from_images(&[first.as_slice(), second.as_slice()])
            .unwrap();
        assert_eq!(PdfReader::from_bytes(&bytes).unwrap().page_count(), 2);
    }

    #[test]
    fn undecodable_image_is_rejected() {
        let result = PdfWriter::a4().create_from_images(&[b"nope".as_slice()]);
        assert!(matches!(result, Err(FalzwerkError::Decode(_))));
    }
}
