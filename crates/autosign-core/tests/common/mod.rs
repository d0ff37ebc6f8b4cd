//! PDF and image fixtures built in memory with lopdf and image.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Text placed with `Td` at (x, y) in PDF user space, Helvetica 12pt.
pub type Line<'a> = (i64, i64, &'a str);

/// Build a PDF whose pages are `width` × `height` points and show `lines`.
///
/// Fonts live on the `/Pages` node so pages inherit their resources.
pub fn pdf_with_pages(width: i64, height: i64, pages: &[&[Line]]) -> Vec<u8> {
    rotated_pdf(width, height, 0, pages)
}

/// Like `pdf_with_pages`, with `/Rotate` set on the `/Pages` node.
pub fn rotated_pdf(width: i64, height: i64, rotate: i64, pages: &[&[Line]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for &(x, y, text) in lines.iter() {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![x.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    };
    if rotate != 0 {
        pages_dict.set("Rotate", rotate);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// US Letter shortcut.
pub fn letter_pdf(pages: &[&[Line]]) -> Vec<u8> {
    pdf_with_pages(612, 792, pages)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([20, 20, 120, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Number of image XObjects reachable from the page's own `/Resources`.
pub fn image_count(doc: &Document, page_id: ObjectId) -> usize {
    let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
        return 0;
    };
    let resources = match page.get(b"Resources") {
        Ok(Object::Reference(id)) => doc.get_object(*id).and_then(Object::as_dict).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let Some(xobjects) = resources
        .and_then(|r| r.get(b"XObject").ok())
        .and_then(|x| x.as_dict().ok())
    else {
        return 0;
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| obj.as_reference().ok())
        .filter_map(|id| doc.get_object(id).and_then(Object::as_stream).ok())
        .filter(|stream| {
            matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image")
        })
        .count()
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}
