// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range expressions: "1-3, 5, 7-9" -> zero-based page indices.

use crate::error::{FalzwerkError, Result};

/// Ordered zero-based page indices chosen by a range expression.
///
/// Order follows the expression; overlapping parts yield duplicates.
pub type PageSelection = Vec<usize>;

/// Parser for comma-separated page numbers and inclusive ranges.
///
/// Page numbers are 1-based in the expression and 0-based in the output.
/// Pages at or beyond `total_pages` are dropped silently, a range whose start
/// is after its end selects nothing, and page `0` is rejected.
pub struct PageRangeParser;

impl PageRangeParser {
    /// Parse `expression` against a document of `total_pages` pages.
    pub fn parse(expression: &str, total_pages: usize) -> Result<PageSelection> {
        let mut pages = Vec::new();
        let mut saw_part = false;

        for part in expression.split(',').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            saw_part = true;

            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_page_number(start, part)?;
                    let end = parse_page_number(end, part)?;
                    // Both bounds are >= 1 here, so the subtraction cannot wrap.
                    let last = (end - 1).min(total_pages.saturating_sub(1));
                    if total_pages > 0 {
                        pages.extend((start - 1)..=last);
                    }
                }
                None => {
                    let index = parse_page_number(part, part)? - 1;
                    if index < total_pages {
                        pages.push(index);
                    }
                }
            }
        }

        if !saw_part {
            return Err(FalzwerkError::InvalidRange(format!(
                "'{expression}' names no pages"
            )));
        }

        Ok(pages)
    }

    /// Check the syntax of `expression` without knowing the page count.
    pub fn validate(expression: &str) -> Result<()> {
        Self::parse(expression, 0).map(|_| ())
    }
}

/// Parse one 1-based page number, rejecting zero and non-numbers.
fn parse_page_number(raw: &str, part: &str) -> Result<usize> {
    let raw = raw.trim();
    let number: usize = raw.parse().map_err(|_| {
        FalzwerkError::InvalidRange(format!("'{part}' is not a page number or range"))
    })?;
    if number == 0 {
        return Err(FalzwerkError::InvalidRange(format!(
            "'{part}': pages are numbered from 1"
        )));
    }
    Ok(number)
}
