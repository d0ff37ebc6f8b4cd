//! Page text search with glyph geometry.
//!
//! pdf-extract decodes the fonts and runs the text operators. `extract`
//! keeps the outline of every glyph it reports, and `forms` rewrites form
//! XObjects beforehand so their text lands where it is drawn.

mod extract;
mod forms;

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::SignError;
use crate::geometry::{PageBox, Rect};
use extract::{Glyph, GlyphCollector};

/// Positioned text of every page of a document, keyed by 1-based page number.
#[derive(Debug, Clone, Default)]
pub struct TextLayer {
    pages: BTreeMap<u32, Vec<Glyph>>,
}

/// A character of page text and the glyph it came from.
#[derive(Debug, Clone, Copy)]
struct CharRef {
    ch: char,
    glyph: usize,
}

impl TextLayer {
    /// Extract positioned text from a serialized PDF.
    pub fn extract(pdf_bytes: &[u8]) -> Result<TextLayer, SignError> {
        let mut doc = pdf_extract::Document::load_mem(pdf_bytes)
            .map_err(|e| SignError::DocumentParse(e.to_string()))?;
        let pinned = forms::pin_form_placements(&mut doc);

        let mut collector = GlyphCollector::default();
        // pdf-extract panics on some malformed input instead of erroring
        match catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::output_doc(&doc, &mut collector)
        })) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(SignError::DocumentParse(e.to_string())),
            Err(_) => {
                return Err(SignError::DocumentParse(
                    "text extraction failed".to_string(),
                ))
            }
        }

        tracing::debug!(
            "Extracted {} glyphs from {} pages ({} form placements)",
            collector.pages.values().map(Vec::len).sum::<usize>(),
            collector.pages.len(),
            pinned
        );

        Ok(TextLayer {
            pages: collector.pages,
        })
    }

    /// All occurrences of `needle` on a page, in content-stream order,
    /// as rectangles in the page space of `page`.
    ///
    /// Matching is ASCII case-insensitive and any whitespace in `needle`
    /// matches any whitespace on the page. Occurrences do not overlap.
    pub fn search(&self, page_number: u32, page: &PageBox, needle: &str) -> Vec<Rect> {
        let needle: Vec<char> = needle.chars().collect();
        let Some(glyphs) = self.pages.get(&page_number) else {
            return Vec::new();
        };
        if needle.is_empty() {
            return Vec::new();
        }

        let chars = reading_order(glyphs);
        let mut hits = Vec::new();
        let mut i = 0;

        while i + needle.len() <= chars.len() {
            let window = &chars[i..i + needle.len()];
            let matched = window.iter().zip(&needle).all(|(c, n)| {
                c.ch.eq_ignore_ascii_case(n) || (c.ch.is_whitespace() && n.is_whitespace())
            });

            if matched {
                let corners: Vec<(f64, f64)> = window
                    .iter()
                    .flat_map(|c| glyphs[c.glyph].quad)
                    .map(|(x, y)| page.to_page_space(x, y))
                    .collect();
                hits.extend(Rect::bounding(&corners));
                i += needle.len();
            } else {
                i += 1;
            }
        }

        hits
    }

    /// Extracted page text, lines separated by `'\n'`.
    pub fn page_text(&self, page_number: u32) -> String {
        self.pages
            .get(&page_number)
            .map(|glyphs| reading_order(glyphs).into_iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }
}

/// Flatten glyphs into characters, inserting the separators a reader
/// would see between them.
fn reading_order(glyphs: &[Glyph]) -> Vec<CharRef> {
    let mut out: Vec<CharRef> = Vec::with_capacity(glyphs.len());

    for (index, glyph) in glyphs.iter().enumerate() {
        if let Some(prev) = index.checked_sub(1) {
            let last_is_space = out.last().is_some_and(|c| c.ch.is_whitespace());
            if let Some(separator) = separator_between(&glyphs[prev], glyph) {
                if !last_is_space {
                    out.push(CharRef {
                        ch: separator,
                        glyph: prev,
                    });
                }
            }
        }
        out.extend(glyph.text.chars().map(|ch| CharRef { ch, glyph: index }));
    }

    out
}

/// `'\n'` when `next` starts a new line, `' '` when it sits after a visible
/// gap along the line, `None` when the glyphs are adjacent.
///
/// Measured in `prev`'s own text direction, so rotated text reads the same.
fn separator_between(prev: &Glyph, next: &Glyph) -> Option<char> {
    let [origin, end, _, top] = prev.quad;
    let up = (top.0 - origin.0, top.1 - origin.1);
    let height = up.0.hypot(up.1);
    let (up, height) = if height > f64::EPSILON {
        ((up.0 / height, up.1 / height), height)
    } else {
        ((0.0, 1.0), f64::EPSILON)
    };
    let along = (up.1, -up.0);
    let dot = |v: (f64, f64), axis: (f64, f64)| v.0 * axis.0 + v.1 * axis.1;

    let [next_origin, next_end, _, _] = next.quad;
    let rise = dot((next_origin.0 - origin.0, next_origin.1 - origin.1), up);
    let behind = dot((next_end.0 - origin.0, next_end.1 - origin.1), along);
    let gap = dot((next_origin.0 - end.0, next_origin.1 - end.1), along);

    if rise.abs() > height / 2.0 || behind < 0.0 {
        Some('\n')
    } else if gap > height * 0.25 {
        Some(' ')
    } else {
        None
    }
}
