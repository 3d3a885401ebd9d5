// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation — render PDF pages to images via pdfium.
//
// The pdfium C++ library is not thread-safe and every call blocks, so callers
// must run rasterisation on a blocking thread (the engine does this).

use std::path::{Path, PathBuf};

use falzwerk_core::error::{FalzwerkError, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

/// Renders every page of a PDF to a pixel image.
pub trait PageRasterizer: Send + Sync {
    /// Render all pages in order. `scale` is relative to 72 dpi.
    fn render_pages(&self, pdf: &[u8], scale: f32) -> Result<Vec<DynamicImage>>;
}

/// [`PageRasterizer`] backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    /// Directory or file of the pdfium library; the system library when unset.
    library_path: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(library_file(path)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|err| {
            FalzwerkError::RasterError(format!("failed to bind to pdfium library: {err:?}"))
        })?;
        Ok(Pdfium::new(bindings))
    }
}

/// Accept either the library file itself or the directory holding it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

impl PageRasterizer for PdfiumRasterizer {
    #[instrument(skip_all, fields(bytes_len = pdf.len(), scale))]
    fn render_pages(&self, pdf: &[u8], scale: f32) -> Result<Vec<DynamicImage>> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|err| FalzwerkError::Decode(format!("pdfium cannot open PDF: {err:?}")))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let pages = document.pages();
        info!(pages = pages.len(), "Rendering PDF pages");

        let mut images = Vec::with_capacity(pages.len() as usize);
        for (index, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|err| {
                FalzwerkError::RasterError(format!("page {}: {err:?}", index + 1))
            })?;
            let image = bitmap.as_image();
            debug!(
                page = index + 1,
                width = image.width(),
                height = image.height(),
                "Page rendered"
            );
            images.push(image);
        }

        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_library_file_is_used_as_is() {
        let path = Path::new("/opt/pdfium/lib/libpdfium.so");
        assert_eq!(library_file(path), path.to_path_buf());
    }

    #[test]
    fn library_directory_resolves_to_platform_name() {
        let dir = std::env::temp_dir();
        let resolved = library_file(&dir);
        assert!(resolved.starts_with(&dir));
        assert_ne!(resolved, dir);
    }
}
