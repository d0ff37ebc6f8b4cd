//! Embedding the signature as an image XObject and drawing it on a page.

use image::ImageFormat;
use jpeg_decoder::PixelFormat;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::SignError;
use crate::geometry::{inherited, resolve, Matrix};
use crate::signature::SignatureImage;

/// Add the signature to the document as an image XObject.
///
/// 8-bit RGB or gray JPEGs are embedded untouched with `/DCTDecode`;
/// everything else is re-encoded as Flate-compressed 8-bit RGB, with an
/// `/SMask` when the source has alpha.
pub(crate) fn embed_image(
    doc: &mut Document,
    signature: &SignatureImage,
) -> Result<ObjectId, SignError> {
    let image = signature.image();
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));

    if signature.format() == Some(ImageFormat::Jpeg) {
        if let Some(color_space) = jpeg_color_space(signature.bytes()) {
            let mut stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => color_space,
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                signature.bytes().to_vec(),
            );
            stream.allows_compression = false;
            return Ok(doc.add_object(stream));
        }
    }

    let rgba = image.to_rgba8();
    let pixels = rgba.as_raw();
    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(pixels.len() / 4);
    for px in pixels.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
    }

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if image.color().has_alpha() {
        let mut smask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        smask
            .compress()
            .map_err(|e| SignError::Compositing(e.to_string()))?;
        let smask_id = doc.add_object(smask);
        image_dict.set("SMask", smask_id);
    }

    let mut stream = Stream::new(image_dict, rgb);
    stream
        .compress()
        .map_err(|e| SignError::Compositing(e.to_string()))?;
    Ok(doc.add_object(stream))
}

/// `/ColorSpace` for embedding a JPEG as-is, from the frame header itself.
///
/// `None` for CMYK, 16-bit or unreadable data, which gets re-encoded.
fn jpeg_color_space(bytes: &[u8]) -> Option<&'static str> {
    let mut decoder = jpeg_decoder::Decoder::new(bytes);
    decoder.read_info().ok()?;
    match decoder.info()?.pixel_format {
        PixelFormat::RGB24 => Some("DeviceRGB"),
        PixelFormat::L8 => Some("DeviceGray"),
        _ => None,
    }
}

/// Draw `image_id` on the page, mapping the image's unit square through
/// `placement` (user space `cm` operands).
///
/// The page's existing content is wrapped in `q … Q` so whatever graphics
/// state it leaves behind cannot displace the image.
pub(crate) fn draw_image(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
    placement: &Matrix,
) -> Result<String, SignError> {
    let name = register_xobject(doc, page_id, image_id)?;

    let existing = existing_contents(doc, page_id)?;
    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let m = placement;
    let draw = format!(
        "\nQ\nq {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} cm /{} Do Q\n",
        m.a, m.b, m.c, m.d, m.e, m.f, name
    );
    let draw_id = doc.add_object(Stream::new(dictionary! {}, draw.into_bytes()));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(draw_id));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(name)
}

/// Register the image in the page's `/Resources /XObject` under a fresh name.
fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
) -> Result<String, SignError> {
    // Resources live either in an indirect object (possibly shared with other
    // pages), inline on the page, or on an ancestor in the page tree.
    let own = page_dict_mut(doc, page_id)?.remove(b"Resources");
    let (shared_id, mut resources) = match own {
        Some(Object::Reference(id)) => {
            let dict = doc
                .get_object(id)
                .and_then(Object::as_dict)
                .map_err(|e| SignError::Compositing(format!("page resources: {}", e)))?
                .clone();
            (Some(id), dict)
        }
        Some(Object::Dictionary(dict)) => (None, dict),
        Some(_) => {
            return Err(SignError::Compositing(
                "page resources are not a dictionary".into(),
            ))
        }
        None => {
            let dict = inherited(doc, page_id, b"Resources")
                .and_then(|obj| resolve(doc, obj).as_dict().ok())
                .cloned()
                .unwrap_or_default();
            (None, dict)
        }
    };

    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let name = (1..)
        .map(|n| format!("ImSig{}", n))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_else(|| "ImSig".to_string());
    xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    match shared_id {
        Some(id) => {
            doc.objects.insert(id, Object::Dictionary(resources));
            page_dict_mut(doc, page_id)?.set("Resources", Object::Reference(id));
        }
        None => {
            page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
        }
    }
    Ok(name)
}

/// Current `/Contents` entries of the page as a flat list of objects.
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, SignError> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| SignError::Compositing(format!("page dictionary: {}", e)))?;

    Ok(match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    })
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, SignError> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| SignError::Compositing(format!("page dictionary: {}", e)))
}
