//! Automatic signing of contractor PDFs
//!
//! Finds the last `CONTRATISTA` marker in a document and stamps the
//! configured signature image just below it. Text is located with
//! pdf-extract; lopdf does the parsing, editing and serialization.
//!
//! - `load_signature_image` / `describe_signature`: decode the base64 signature
//! - `sign_document`: locate the anchor, place and draw the image, serialize

pub mod anchor;
mod compose;
pub mod error;
pub mod geometry;
pub mod placement;
pub mod signature;
pub mod text;

pub use anchor::{find_anchor, AnchorMatch, ANCHOR_MARKER};
pub use error::SignError;
pub use geometry::Rect;
pub use placement::{SizingMode, DEFAULT_MARGIN};
pub use signature::{
    decode_signature_config, describe_signature, load_signature_image, SignatureImage,
    SignatureInfo,
};
pub use text::TextLayer;

use geometry::PageBox;
use lopdf::Document;
use serde::Serialize;

/// Knobs for where and how large the signature is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignerOptions {
    pub anchor: String,
    /// Gap between the anchor's bottom edge and the signature, in points.
    pub margin: f64,
    pub sizing: SizingMode,
}

impl Default for SignerOptions {
    fn default() -> Self {
        Self {
            anchor: ANCHOR_MARKER.to_string(),
            margin: DEFAULT_MARGIN,
            sizing: SizingMode::default(),
        }
    }
}

/// Result of a successful signing.
#[derive(Debug, Clone)]
pub struct SignedDocument {
    pub bytes: Vec<u8>,
    pub anchor: AnchorMatch,
    /// Rectangle reserved for the signature, in page space as displayed.
    pub placement: Rect,
}

/// Stamp `signature` below the last anchor in `pdf_bytes`.
///
/// Signing is not idempotent: a signed document that still contains the
/// anchor gets another copy of the image on a second pass.
pub fn sign_document(
    pdf_bytes: &[u8],
    signature: &SignatureImage,
    options: &SignerOptions,
) -> Result<SignedDocument, SignError> {
    if signature.width() == 0 || signature.height() == 0 {
        return Err(SignError::InvalidImage);
    }

    let mut doc =
        Document::load_mem(pdf_bytes).map_err(|e| SignError::DocumentParse(e.to_string()))?;

    let text = TextLayer::extract(pdf_bytes)?;
    let anchor = find_anchor(&doc, &text, &options.anchor)
        .ok_or_else(|| SignError::MarkerNotFound(options.anchor.clone()))?;

    let page = PageBox::for_page(&doc, anchor.page_id);
    let target = placement::insertion_rect(
        &anchor.rect,
        options.margin,
        options.sizing,
        (signature.width(), signature.height()),
        page.width(),
        page.height(),
    )?;

    let drawn = placement::fit_within(&target, signature.width(), signature.height());

    let image_id = compose::embed_image(&mut doc, signature)?;
    let name = compose::draw_image(
        &mut doc,
        anchor.page_id,
        image_id,
        &page.placement_matrix(&drawn),
    )?;

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| SignError::Compositing(e.to_string()))?;

    tracing::info!(
        "Signed page {} as /{} at ({:.1}, {:.1}, {:.1}, {:.1}), {} -> {} bytes",
        anchor.page_number,
        name,
        target.x0,
        target.y0,
        target.x1,
        target.y1,
        pdf_bytes.len(),
        bytes.len()
    );

    Ok(SignedDocument {
        bytes,
        anchor,
        placement: target,
    })
}
