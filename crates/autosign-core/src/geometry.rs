//! Rectangles and affine transforms shared by search and compositing.
//!
//! Two coordinate spaces meet here:
//! - PDF user space, origin bottom-left, as written in content streams.
//! - Page space as reported by this crate: the page as displayed, `/Rotate`
//!   applied, origin top-left, y growing downward. Anchors and insertion
//!   rectangles use this one.

use lopdf::{Document, Object, ObjectId};
use serde::Serialize;

/// Axis-aligned rectangle in page space (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Bounding box of a set of points.
    pub fn bounding(points: &[(f64, f64)]) -> Option<Rect> {
        let (first, rest) = points.split_first()?;
        let mut rect = Rect::new(first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            rect.x0 = rect.x0.min(x);
            rect.y0 = rect.y0.min(y);
            rect.x1 = rect.x1.max(x);
            rect.y1 = rect.y1.max(y);
        }
        Some(rect)
    }
}

/// PDF affine matrix `[a b c d e f]`, row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub fn identity() -> Self {
        Self::from_array([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }

    pub fn from_array([a, b, c, d, e, f]: [f64; 6]) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// The page's visible box in PDF user space, plus its `/Rotate`.
///
/// Page space is what a viewer shows: rotation is applied, so `width` and
/// `height` swap for quarter turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
    /// Clockwise display rotation, one of 0, 90, 180, 270.
    pub rotation: u16,
}

impl PageBox {
    /// US Letter, used when no box can be found in the page tree.
    pub const LETTER: PageBox = PageBox {
        llx: 0.0,
        lly: 0.0,
        urx: 612.0,
        ury: 792.0,
        rotation: 0,
    };

    fn quarter_turned(&self) -> bool {
        self.rotation == 90 || self.rotation == 270
    }

    pub fn width(&self) -> f64 {
        if self.quarter_turned() {
            self.ury - self.lly
        } else {
            self.urx - self.llx
        }
    }

    pub fn height(&self) -> f64 {
        if self.quarter_turned() {
            self.urx - self.llx
        } else {
            self.ury - self.lly
        }
    }

    /// Convert a user-space point to page space.
    pub fn to_page_space(&self, x: f64, y: f64) -> (f64, f64) {
        let (w, h) = (self.urx - self.llx, self.ury - self.lly);
        let (ux, uy) = (x - self.llx, y - self.lly);
        match self.rotation {
            90 => (uy, ux),
            180 => (w - ux, uy),
            270 => (h - uy, w - ux),
            _ => (ux, h - uy),
        }
    }

    /// Convert a page-space point back to user space.
    pub fn to_user(&self, x: f64, y: f64) -> (f64, f64) {
        let (w, h) = (self.urx - self.llx, self.ury - self.lly);
        let (ux, uy) = match self.rotation {
            90 => (y, x),
            180 => (w - x, y),
            270 => (w - y, h - x),
            _ => (x, h - y),
        };
        (ux + self.llx, uy + self.lly)
    }

    /// `cm` operands that map the unit square onto `rect`, upright as the
    /// page is displayed.
    pub fn placement_matrix(&self, rect: &Rect) -> Matrix {
        let origin = self.to_user(rect.x0, rect.y1);
        let right = self.to_user(rect.x1, rect.y1);
        let up = self.to_user(rect.x0, rect.y0);
        Matrix {
            a: right.0 - origin.0,
            b: right.1 - origin.1,
            c: up.0 - origin.0,
            d: up.1 - origin.1,
            e: origin.0,
            f: origin.1,
        }
    }

    /// Resolve `/CropBox`, then `/MediaBox`, walking up `/Parent` for
    /// inherited values. `/Rotate` is inherited the same way.
    pub fn for_page(doc: &Document, page_id: ObjectId) -> PageBox {
        let rotation = inherited(doc, page_id, b"Rotate")
            .and_then(|obj| number(resolve(doc, obj)))
            .map_or(0, normalize_rotation);

        for key in [b"CropBox".as_slice(), b"MediaBox".as_slice()] {
            if let Some(found) = inherited(doc, page_id, key).and_then(|obj| box_from(doc, obj)) {
                return PageBox { rotation, ..found };
            }
        }
        PageBox {
            rotation,
            ..PageBox::LETTER
        }
    }
}

/// Reduce `/Rotate` to 0..360; anything off a quarter turn counts as 0.
fn normalize_rotation(degrees: f64) -> u16 {
    let turned = (degrees as i64).rem_euclid(360);
    if turned % 90 == 0 {
        turned as u16
    } else {
        0
    }
}

fn box_from(doc: &Document, obj: &Object) -> Option<PageBox> {
    let arr = resolve(doc, obj).as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let x0 = number(resolve(doc, &arr[0]))?;
    let y0 = number(resolve(doc, &arr[1]))?;
    let x1 = number(resolve(doc, &arr[2]))?;
    let y1 = number(resolve(doc, &arr[3]))?;
    Some(PageBox {
        llx: x0.min(x1),
        lly: y0.min(y1),
        urx: x0.max(x1),
        ury: y0.max(y1),
        rotation: 0,
    })
}

/// Look up `key` on the page dictionary or, failing that, its ancestors.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = Some(page_id);
    // Page trees are shallow; the bound only guards against /Parent cycles.
    let mut depth = 0;
    while let Some(id) = current {
        if depth > 32 {
            return None;
        }
        depth += 1;
        let dict = doc.get_object(id).and_then(|o| o.as_dict()).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    None
}

/// Follow a reference one level; anything else is returned as-is.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}
