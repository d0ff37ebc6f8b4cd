//! Locating the marker the signature is placed under.

use lopdf::{Document, ObjectId};
use serde::Serialize;

use crate::geometry::{PageBox, Rect};
use crate::text::TextLayer;

/// Marker contractor documents carry above the signature line.
pub const ANCHOR_MARKER: &str = "CONTRATISTA";

/// The selected marker occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnchorMatch {
    /// 1-based page number.
    pub page_number: u32,
    /// Marker bounds in page space (origin top-left, page rotation applied).
    pub rect: Rect,
    #[serde(skip)]
    pub page_id: ObjectId,
}

/// Last occurrence of `marker` on the last page that contains it.
///
/// Pages are visited in order and each page's hits come back in
/// content-stream order, so this is also the last occurrence in the
/// document as a whole.
pub fn find_anchor(doc: &Document, text: &TextLayer, marker: &str) -> Option<AnchorMatch> {
    let mut last = None;

    for (page_number, page_id) in doc.get_pages() {
        let page = PageBox::for_page(doc, page_id);
        if let Some(rect) = text.search(page_number, &page, marker).pop() {
            tracing::debug!(
                "Found '{}' on page {} at ({:.1}, {:.1}, {:.1}, {:.1})",
                marker,
                page_number,
                rect.x0,
                rect.y0,
                rect.x1,
                rect.y1
            );
            last = Some(AnchorMatch {
                page_number,
                rect,
                page_id,
            });
        }
    }

    last
}
