//! Upgrade existing text fields to multiline.

use super::form_fields::TextFieldFlags;
use super::form_writer::resolve;
use crate::error::{Error, Result};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeSet;
use std::path::Path;

/// Set the multiline flag on every text field of a fillable PDF.
///
/// Walks each page's widget annotations; a widget that doesn't carry `/FT`
/// itself is updated through its parent field. Returns the number of fields
/// changed.
pub fn enable_multiline_fields(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<usize> {
    let input = input.as_ref();
    let mut doc = Document::load(input)?;
    if doc.is_encrypted() {
        return Err(Error::EncryptedDocument {
            path: input.to_path_buf(),
        });
    }

    let updated = set_multiline_flags(&mut doc)?;
    doc.save(output.as_ref())?;
    log::info!(
        "Enabled multiline on {} text fields, saved to {}",
        updated,
        output.as_ref().display()
    );
    Ok(updated)
}

/// In-memory variant of [`enable_multiline_fields`].
pub fn set_multiline_flags(doc: &mut Document) -> Result<usize> {
    let mut targets = BTreeSet::new();
    for page_id in doc.get_pages().into_values() {
        let annots = match doc.get_object(page_id)?.as_dict()?.get(b"Annots") {
            Ok(obj) => resolve(doc, obj)?.as_array().cloned().unwrap_or_default(),
            Err(_) => continue,
        };
        for annot in annots {
            let Ok(annot_id) = annot.as_reference() else {
                log::debug!("Skipping inline annotation on page object {:?}", page_id);
                continue;
            };
            if let Some(field_id) = text_field_owner(doc, annot_id) {
                targets.insert(field_id);
            }
        }
    }

    for field_id in &targets {
        let field = doc.get_object_mut(*field_id)?.as_dict_mut()?;
        let current = field.get(b"Ff").and_then(Object::as_i64).unwrap_or(0);
        field.set("Ff", TextFieldFlags::with_multiline_bit(current, true));
    }
    Ok(targets.len())
}

/// The object holding `/FT /Tx` for a widget: itself or its parent field.
fn text_field_owner(doc: &Document, annot_id: ObjectId) -> Option<ObjectId> {
    let dict = doc.get_object(annot_id).ok()?.as_dict().ok()?;
    match dict.get(b"FT") {
        Ok(ft) => (ft.as_name().ok()? == b"Tx").then_some(annot_id),
        Err(_) => {
            let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
            let parent = doc.get_object(parent_id).ok()?.as_dict().ok()?;
            (parent.get(b"FT").ok()?.as_name().ok()? == b"Tx").then_some(parent_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn form_document() -> (Document, ObjectId, ObjectId, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        let text_id = doc.add_object(dictionary! {
            "Type" => "Annot", "Subtype" => "Widget", "FT" => "Tx",
            "T" => Object::string_literal("name"), "Ff" => Object::Integer(2),
        });
        let parent_id = doc.add_object(dictionary! { "FT" => "Tx", "T" => Object::string_literal("addr") });
        let kid_id = doc.add_object(dictionary! {
            "Type" => "Annot", "Subtype" => "Widget", "Parent" => parent_id,
        });
        let check_id = doc.add_object(dictionary! {
            "Type" => "Annot", "Subtype" => "Widget", "FT" => "Btn", "T" => Object::string_literal("ok"),
        });

        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page", "Parent" => pages_id,
                "Annots" => vec![text_id.into(), kid_id.into(), check_id.into()],
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages", "Kids" => vec![page_id.into()], "Count" => Object::Integer(1),
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        (doc, text_id, parent_id, check_id)
    }

    fn flags(doc: &Document, id: ObjectId) -> Option<i64> {
        doc.get_object(id).unwrap().as_dict().unwrap().get(b"Ff").ok().map(|f| f.as_i64().unwrap())
    }

    #[test]
    fn test_sets_multiline_on_text_fields_only() {
        let (mut doc, text_id, parent_id, check_id) = form_document();
        assert_eq!(set_multiline_flags(&mut doc).unwrap(), 2);

        assert_eq!(flags(&doc, text_id), Some(4096 | 2));
        assert_eq!(flags(&doc, parent_id), Some(4096));
        assert_eq!(flags(&doc, check_id), None);
    }

    #[test]
    fn test_is_idempotent() {
        let (mut doc, text_id, _, _) = form_document();
        set_multiline_flags(&mut doc).unwrap();
        set_multiline_flags(&mut doc).unwrap();
        assert_eq!(flags(&doc, text_id), Some(4096 | 2));
    }
}
