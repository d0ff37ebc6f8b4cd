//! Where the signature goes relative to the anchor.

use serde::Serialize;

use crate::error::SignError;
use crate::geometry::Rect;

/// Default vertical gap between the anchor's bottom edge and the signature.
pub const DEFAULT_MARGIN: f64 = 20.0;

/// Smallest (and fixed-mode) signature box, in points.
pub const MIN_WIDTH: f64 = 100.0;
pub const MIN_HEIGHT: f64 = 50.0;

/// How the insertion rectangle is sized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum SizingMode {
    /// Always this size, whatever the image.
    Fixed { width: f64, height: f64 },
    /// The image's pixel size taken as points, but never below the floor.
    NativeWithFloor { min_width: f64, min_height: f64 },
}

impl Default for SizingMode {
    fn default() -> Self {
        SizingMode::NativeWithFloor {
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        }
    }
}

impl SizingMode {
    pub fn fixed() -> Self {
        SizingMode::Fixed {
            width: MIN_WIDTH,
            height: MIN_HEIGHT,
        }
    }

    /// Box size for an image of `px_width` × `px_height`.
    pub fn size_for(&self, px_width: u32, px_height: u32) -> (f64, f64) {
        match *self {
            SizingMode::Fixed { width, height } => (width, height),
            SizingMode::NativeWithFloor {
                min_width,
                min_height,
            } => (
                f64::from(px_width).max(min_width),
                f64::from(px_height).max(min_height),
            ),
        }
    }
}

/// Rectangle below `anchor`, offset by `margin`, sized by `sizing`.
///
/// `page_width`/`page_height` bound the page in the same top-left space as
/// `anchor`; a rectangle that would spill past the right or bottom edge is
/// rejected.
pub fn insertion_rect(
    anchor: &Rect,
    margin: f64,
    sizing: SizingMode,
    image_size: (u32, u32),
    page_width: f64,
    page_height: f64,
) -> Result<Rect, SignError> {
    let x = anchor.x0;
    let y = anchor.y1 + margin;
    let (width, height) = sizing.size_for(image_size.0, image_size.1);

    if x + width > page_width || y + height > page_height {
        return Err(SignError::OutOfBounds);
    }
    Ok(Rect::new(x, y, x + width, y + height))
}

/// Largest rectangle with the image's aspect ratio that fits in `target`,
/// centred.
pub fn fit_within(target: &Rect, px_width: u32, px_height: u32) -> Rect {
    let (w, h) = (f64::from(px_width), f64::from(px_height));
    if w <= 0.0 || h <= 0.0 {
        return *target;
    }
    let scale = (target.width() / w).min(target.height() / h);
    let (fw, fh) = (w * scale, h * scale);
    let x0 = target.x0 + (target.width() - fw) / 2.0;
    let y0 = target.y0 + (target.height() - fh) / 2.0;
    Rect::new(x0, y0, x0 + fw, y0 + fh)
}
