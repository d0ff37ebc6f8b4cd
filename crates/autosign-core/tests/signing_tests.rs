//! End-to-end signing against generated PDFs.

mod common;

use autosign_core::{
    sign_document, SignError, SignatureImage, SignerOptions, SizingMode, TextLayer,
};
use common::{image_count, letter_pdf, page_ids, pdf_with_pages, png_bytes, rotated_pdf};
use lopdf::Document;
use pretty_assertions::assert_eq;

fn signature(width: u32, height: u32) -> SignatureImage {
    SignatureImage::from_bytes(png_bytes(width, height)).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn test_signs_page_with_marker() {
    let pdf = pdf_with_pages(
        612,
        842,
        &[
            &[(72, 700, "Contract terms")],
            &[(72, 700, "Schedule of works")],
            &[(72, 400, "Firmas"), (50, 130, "CONTRATISTA")],
        ],
    );

    let signed = sign_document(&pdf, &signature(120, 60), &SignerOptions::default()).unwrap();
    assert_eq!(signed.anchor.page_number, 3);

    // Directly below the marker, left edges aligned, native image size
    let anchor = signed.anchor.rect;
    assert!(approx(signed.placement.x0, anchor.x0));
    assert!(approx(signed.placement.y0, anchor.y1 + 20.0));
    assert!(approx(signed.placement.width(), 120.0));
    assert!(approx(signed.placement.height(), 60.0));

    let before = Document::load_mem(&pdf).unwrap();
    let after = Document::load_mem(&signed.bytes).unwrap();
    assert_eq!(after.get_pages().len(), 3);

    let (before_ids, after_ids) = (page_ids(&before), page_ids(&after));
    assert_eq!(image_count(&after, after_ids[2]), image_count(&before, before_ids[2]) + 1);
    assert_eq!(image_count(&after, after_ids[0]), 0);
    assert_eq!(image_count(&after, after_ids[1]), 0);
}

#[test]
fn test_marker_on_several_pages_uses_last_page() {
    let pdf = letter_pdf(&[
        &[(72, 500, "CONTRATISTA")],
        &[(72, 700, "nothing here")],
        &[(90, 600, "CONTRATISTA")],
    ]);

    let signed = sign_document(&pdf, &signature(40, 20), &SignerOptions::default()).unwrap();
    assert_eq!(signed.anchor.page_number, 3);
    assert!(approx(signed.anchor.rect.x0, 90.0));

    let after = Document::load_mem(&signed.bytes).unwrap();
    let ids = page_ids(&after);
    assert_eq!(image_count(&after, ids[0]), 0);
    assert_eq!(image_count(&after, ids[2]), 1);
}

#[test]
fn test_last_occurrence_in_stream_order_wins() {
    // Lower line is drawn first, upper line last
    let pdf = letter_pdf(&[&[(72, 300, "CONTRATISTA"), (72, 600, "CONTRATISTA")]]);

    let signed = sign_document(&pdf, &signature(40, 20), &SignerOptions::default()).unwrap();
    // User-space y 600 is 192 from the top of a letter page
    assert!(signed.anchor.rect.y1 < 200.0);
    assert!(signed.anchor.rect.y1 > 180.0);
}

#[test]
fn test_marker_is_matched_case_insensitively() {
    let pdf = letter_pdf(&[&[(72, 600, "Firma del Contratista")]]);
    let signed = sign_document(&pdf, &signature(40, 20), &SignerOptions::default()).unwrap();
    assert_eq!(signed.anchor.page_number, 1);
}

#[test]
fn test_missing_marker() {
    let pdf = letter_pdf(&[&[(72, 700, "CONTRATANTE")], &[(72, 700, "Anexo")]]);
    let err = sign_document(&pdf, &signature(40, 20), &SignerOptions::default()).unwrap_err();
    assert!(matches!(err, SignError::MarkerNotFound(_)));
    assert_eq!(err.to_string(), "'CONTRATISTA' not found in the PDF.");
}

#[test]
fn test_garbage_input_is_a_parse_error() {
    let err = sign_document(
        b"definitely not a pdf",
        &signature(40, 20),
        &SignerOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SignError::DocumentParse(_)));
    assert!(err.to_string().starts_with("Failed to parse PDF: "));
}

#[test]
fn test_marker_near_bottom_is_out_of_bounds() {
    let pdf = letter_pdf(&[&[(72, 40, "CONTRATISTA")]]);
    let err = sign_document(&pdf, &signature(120, 60), &SignerOptions::default()).unwrap_err();
    assert!(matches!(err, SignError::OutOfBounds));
    assert_eq!(err.to_string(), "Signature position would be outside page bounds");
}

#[test]
fn test_marker_near_right_edge_is_out_of_bounds() {
    let pdf = letter_pdf(&[&[(560, 600, "CONTRATISTA")]]);
    let err = sign_document(&pdf, &signature(40, 20), &SignerOptions::default()).unwrap_err();
    assert!(matches!(err, SignError::OutOfBounds));
}

#[test]
fn test_signing_twice_adds_second_image() {
    let pdf = letter_pdf(&[&[(72, 600, "CONTRATISTA")]]);
    let options = SignerOptions::default();

    let once = sign_document(&pdf, &signature(40, 20), &options).unwrap();
    let twice = sign_document(&once.bytes, &signature(40, 20), &options).unwrap();

    let after = Document::load_mem(&twice.bytes).unwrap();
    let ids = page_ids(&after);
    assert_eq!(image_count(&after, ids[0]), 2);
    assert_eq!(once.anchor.rect, twice.anchor.rect);
}

#[test]
fn test_fixed_sizing_scales_large_image_into_box() {
    let pdf = letter_pdf(&[&[(72, 600, "CONTRATISTA")]]);
    let options = SignerOptions {
        sizing: SizingMode::fixed(),
        ..SignerOptions::default()
    };

    let signed = sign_document(&pdf, &signature(300, 200), &options).unwrap();
    assert!(approx(signed.placement.width(), 100.0));
    assert!(approx(signed.placement.height(), 50.0));

    // 3:2 image in a 2:1 box is drawn 75 × 50
    let after = Document::load_mem(&signed.bytes).unwrap();
    let content = after.get_page_content(page_ids(&after)[0]).unwrap();
    let text = String::from_utf8_lossy(&content);
    assert!(text.contains("75.0000 0.0000 0.0000 50.0000"));
    assert!(text.contains("/ImSig1 Do"));
}

#[test]
fn test_custom_anchor_and_margin() {
    let pdf = letter_pdf(&[&[(72, 600, "CONTRATANTE"), (300, 600, "CONTRATISTA")]]);
    let options = SignerOptions {
        anchor: "CONTRATANTE".to_string(),
        margin: 5.0,
        ..SignerOptions::default()
    };

    let signed = sign_document(&pdf, &signature(40, 20), &options).unwrap();
    assert!(approx(signed.anchor.rect.x0, 72.0));
    assert!(approx(signed.placement.y0, signed.anchor.rect.y1 + 5.0));
}

#[test]
fn test_signed_output_keeps_text() {
    let pdf = letter_pdf(&[&[(72, 600, "CONTRATISTA"), (72, 400, "Clausula final")]]);
    let signed = sign_document(&pdf, &signature(40, 20), &SignerOptions::default()).unwrap();

    let text = TextLayer::extract(&signed.bytes).unwrap().page_text(1);
    assert!(text.contains("CONTRATISTA"));
    assert!(text.contains("Clausula final"));
}

fn page_content(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let content = doc.get_page_content(page_ids(&doc)[0]).unwrap();
    String::from_utf8_lossy(&content).into_owned()
}

#[test]
fn test_quarter_turned_page_places_in_displayed_space() {
    let pdf = rotated_pdf(612, 792, 90, &[&[(72, 200, "CONTRATISTA")]]);
    let signed = sign_document(&pdf, &signature(120, 60), &SignerOptions::default()).unwrap();

    // user y becomes displayed x, user x becomes displayed y
    let anchor = signed.anchor.rect;
    assert!(approx(anchor.x0, 200.0 - 2.4));
    assert!(approx(anchor.y0, 72.0));
    assert!(approx(signed.placement.x0, anchor.x0));
    assert!(approx(signed.placement.y0, anchor.y1 + 20.0));
    assert!(signed.placement.x1 <= 792.0 && signed.placement.y1 <= 612.0);

    // image axes turned with the page so it reads upright
    assert!(page_content(&signed.bytes).contains("0.0000 120.0000 -60.0000 0.0000"));
}

#[test]
fn test_upside_down_page_places_in_displayed_space() {
    let pdf = rotated_pdf(612, 792, 180, &[&[(300, 600, "CONTRATISTA")]]);
    let signed = sign_document(&pdf, &signature(120, 60), &SignerOptions::default()).unwrap();

    assert!(approx(signed.anchor.rect.y0, 600.0 - 2.4));
    assert!(approx(signed.placement.y0, signed.anchor.rect.y1 + 20.0));
    assert!(page_content(&signed.bytes).contains("-120.0000 0.0000 0.0000 -60.0000"));
}

#[test]
fn test_rotation_decides_bounds() {
    let lines: &[&[(i64, i64, &str)]] = &[&[(480, 400, "CONTRATISTA")]];
    let options = SignerOptions::default();

    assert!(sign_document(&letter_pdf(lines), &signature(120, 60), &options).is_ok());

    // turned, the marker sits 480 points down a 612 point tall page
    let err = sign_document(&rotated_pdf(612, 792, 90, lines), &signature(120, 60), &options)
        .unwrap_err();
    assert!(matches!(err, SignError::OutOfBounds));
}
