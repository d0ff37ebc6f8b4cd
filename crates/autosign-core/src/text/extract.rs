//! Glyph collection on top of pdf-extract's content interpreter.

use std::collections::BTreeMap;

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};

use crate::geometry::Matrix;

/// Vertical extent of a glyph as a fraction of the font size.
const ASCENT: f64 = 0.8;
const DESCENT: f64 = -0.2;

/// One shown glyph and its outline in user space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    pub text: String,
    /// Bottom-left, bottom-right, top-right, top-left, in text direction.
    pub quad: [(f64, f64); 4],
}

#[cfg(test)]
impl Glyph {
    pub fn upright(text: &str, x0: f64, x1: f64, baseline: f64, size: f64) -> Self {
        let (bottom, top) = (baseline + DESCENT * size, baseline + ASCENT * size);
        Self {
            text: text.to_string(),
            quad: [(x0, bottom), (x1, bottom), (x1, top), (x0, top)],
        }
    }
}

/// Receives every shown character and keeps it, grouped by page number.
#[derive(Debug, Default)]
pub(crate) struct GlyphCollector {
    current: u32,
    pub pages: BTreeMap<u32, Vec<Glyph>>,
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.current = page_num;
        self.pages.entry(page_num).or_default();
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        text: &str,
    ) -> Result<(), OutputError> {
        if text.is_empty() || !width.is_finite() || !font_size.is_finite() {
            return Ok(());
        }

        // trm carries scaling and rise but not the font size
        let m = Matrix::from_array([trm.m11, trm.m12, trm.m21, trm.m22, trm.m31, trm.m32]);
        let advance = width * font_size;
        let (bottom, top) = (DESCENT * font_size, ASCENT * font_size);
        let quad = [
            m.apply(0.0, bottom),
            m.apply(advance, bottom),
            m.apply(advance, top),
            m.apply(0.0, top),
        ];
        if quad.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Ok(());
        }

        self.pages.entry(self.current).or_default().push(Glyph {
            text: text.to_string(),
            quad,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
