//! Prepares a document copy for text extraction.
//!
//! pdf-extract runs a form XObject with an identity CTM and no `/Matrix`,
//! so text inside forms would come out at the wrong place. Every page is
//! rewritten so each form it invokes is a private copy whose content starts
//! with the full transform in effect at the `Do`. Image XObjects carry no
//! text and are dropped.

use pdf_extract::content::{Content, Operation};
use pdf_extract::{Dictionary, Document, Object, ObjectId, Stream};

use crate::geometry::Matrix;

/// Forms nested deeper than this are not shown.
pub(crate) const MAX_FORM_DEPTH: usize = 8;

/// Rewrite every page so form text is positioned; returns the number of
/// form invocations pinned.
pub(crate) fn pin_form_placements(doc: &mut Document) -> usize {
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let mut pinner = Pinner { doc, pinned: 0 };

    for (page_number, page_id) in pages {
        let resources = inherited(pinner.doc, page_id, b"Resources")
            .and_then(|obj| resolve_dict(pinner.doc, obj))
            .cloned()
            .unwrap_or_else(Dictionary::new);
        let has_media_box = inherited(pinner.doc, page_id, b"MediaBox").is_some();

        let operations = match pinner
            .doc
            .get_page_content(page_id)
            .ok()
            .and_then(|bytes| Content::decode(&bytes).ok())
        {
            Some(content) => content.operations,
            None => {
                tracing::warn!(
                    "Page {} content could not be decoded, skipping its text",
                    page_number
                );
                Vec::new()
            }
        };

        let (operations, xobjects) =
            pinner.rewrite(operations, &resources, Matrix::identity(), 0);
        let content = Content { operations }.encode().unwrap_or_default();
        let content_id = pinner.doc.add_object(Stream::new(Dictionary::new(), content));

        if let Ok(page) = pinner
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
        {
            page.set("Contents", Object::Reference(content_id));
            page.set("Resources", Object::Dictionary(with_xobjects(resources, xobjects)));
            if !has_media_box {
                page.set(
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
                );
            }
        }
    }

    pinner.pinned
}

struct Pinner<'a> {
    doc: &'a mut Document,
    pinned: usize,
}

impl Pinner<'_> {
    /// Rewrite operations that run under `base`. Returns the new operations
    /// and the XObject dictionary their `Do`s refer to.
    fn rewrite(
        &mut self,
        operations: Vec<Operation>,
        resources: &Dictionary,
        base: Matrix,
        depth: usize,
    ) -> (Vec<Operation>, Dictionary) {
        let mut ctm = base;
        let mut saved = Vec::new();
        let mut xobjects = Dictionary::new();
        let mut out = Vec::with_capacity(operations.len());

        for operation in operations {
            match operation.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => {
                    if let Some(restored) = saved.pop() {
                        ctm = restored;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_from(&operation.operands) {
                        ctm = m.multiply(&ctm);
                    }
                }
                "Do" => {
                    if let Some((name, id)) = self.pin(&operation, resources, ctm, depth) {
                        xobjects.set(name.clone(), Object::Reference(id));
                        out.push(Operation::new("Do", vec![Object::Name(name)]));
                    }
                    continue;
                }
                _ => {}
            }
            out.push(operation);
        }

        (out, xobjects)
    }

    /// Copy the form a `Do` invokes with its placement baked in.
    fn pin(
        &mut self,
        operation: &Operation,
        resources: &Dictionary,
        ctm: Matrix,
        depth: usize,
    ) -> Option<(Vec<u8>, ObjectId)> {
        if depth >= MAX_FORM_DEPTH {
            tracing::debug!("Form nesting deeper than {} ignored", MAX_FORM_DEPTH);
            return None;
        }

        let name = operation.operands.first()?.as_name().ok()?;
        let xobjects = resolve_dict(self.doc, resources.get(b"XObject").ok()?)?;
        let form = match resolve(self.doc, xobjects.get(name).ok()?) {
            Object::Stream(stream) => stream.clone(),
            _ => return None,
        };
        let is_form = form
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map_or(false, |subtype| subtype == b"Form");
        if !is_form {
            return None;
        }

        let placement = form
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|obj| resolve(self.doc, obj).as_array().ok())
            .and_then(|operands| matrix_from(operands))
            .unwrap_or_else(Matrix::identity)
            .multiply(&ctm);
        let own_resources = form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|obj| resolve_dict(self.doc, obj))
            .cloned()
            .unwrap_or_else(|| resources.clone());

        let body = form
            .decompressed_content()
            .unwrap_or_else(|_| form.content.clone());
        let operations = Content::decode(&body)
            .map(|content| content.operations)
            .unwrap_or_default();

        let (mut operations, nested) =
            self.rewrite(operations, &own_resources, placement, depth + 1);
        operations.insert(0, Operation::new("cm", matrix_operands(&placement)));
        let content = Content { operations }.encode().ok()?;

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Form".to_vec()));
        if let Ok(bbox) = form.dict.get(b"BBox") {
            dict.set("BBox", bbox.clone());
        }
        dict.set("Resources", Object::Dictionary(with_xobjects(own_resources, nested)));

        self.pinned += 1;
        let id = self.doc.add_object(Stream::new(dict, content));
        Some((format!("Pin{}", self.pinned).into_bytes(), id))
    }
}

fn with_xobjects(mut resources: Dictionary, xobjects: Dictionary) -> Dictionary {
    resources.set("XObject", Object::Dictionary(xobjects));
    resources
}

fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    // bounded against /Parent cycles
    for _ in 0..32 {
        let dict = doc.get_object(current).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).as_dict().ok()
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
    if operands.len() != 6 {
        return None;
    }
    let mut values = [0.0f64; 6];
    for (slot, operand) in values.iter_mut().zip(operands) {
        *slot = match operand {
            Object::Integer(i) => *i as f64,
            Object::Real(f) => f64::from(*f),
            _ => return None,
        };
    }
    Some(Matrix::from_array(values))
}

fn matrix_operands(m: &Matrix) -> Vec<Object> {
    [m.a, m.b, m.c, m.d, m.e, m.f]
        .into_iter()
        .map(|value| Object::Real(value as _))
        .collect()
}
