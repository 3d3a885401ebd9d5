// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// falzwerk-document — Document processing for Falzwerk.
//
// Provides PDF operations (read, copy pages, rotate, stamp, strip metadata,
// create from text or images), page rasterisation, zip and Word containers,
// and the transformation engine that runs each tool.

pub mod archive;
pub mod engine;
pub mod image;
pub mod pdf;
pub mod raster;
pub mod word;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

// Re-export the primary structs so callers can use `falzwerk_document::PdfReader` etc.
pub use engine::TransformationEngine;
pub use crate::image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use raster::{PageRasterizer, PdfiumRasterizer};
