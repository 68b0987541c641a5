//! Form field writer over an existing PDF.
//!
//! [`AcroFormWriter`] loads the input document with `lopdf`, places widget
//! annotations on the original pages, and merges the new fields into the
//! catalog's `/AcroForm` when saved.

use super::acroform::{standard_font, AcroFormBuilder, STANDARD_FORM_FONTS};
use super::form_fields::{
    appearance_stream, CheckboxWidget, FieldAppearance, FormFieldWidget, SignatureFieldWidget, TextFieldWidget,
};
use super::{FormWriter, FormWriterFactory};
use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, PageGeometry, Rect};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};

/// Letter size, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Upper bound on `/Parent` hops when resolving inherited page attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Writes AcroForm fields into a copy of an existing document.
pub struct AcroFormWriter {
    doc: Option<Document>,
    source: PathBuf,
    pages: Vec<ObjectId>,
    acroform: AcroFormBuilder,
    cleared: bool,
}

impl AcroFormWriter {
    /// Open `path` for field writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)?;
        if doc.is_encrypted() {
            return Err(Error::EncryptedDocument {
                path: path.to_path_buf(),
            });
        }
        let mut writer = Self::from_document(doc);
        writer.source = path.to_path_buf();
        Ok(writer)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: Document) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc: Some(doc),
            source: PathBuf::new(),
            pages,
            acroform: AcroFormBuilder::new(),
            cleared: false,
        }
    }

    /// Path the document was loaded from, empty for in-memory documents.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of fields added so far.
    pub fn added_field_count(&self) -> usize {
        self.acroform.field_count()
    }

    /// Consume the writer, merging pending fields, and return the document.
    pub fn into_document(mut self) -> Result<Document> {
        self.commit_acroform()?;
        self.doc.take().ok_or(Error::WriterClosed)
    }

    fn doc(&self) -> Result<&Document> {
        self.doc.as_ref().ok_or(Error::WriterClosed)
    }

    fn doc_mut(&mut self) -> Result<&mut Document> {
        self.doc.as_mut().ok_or(Error::WriterClosed)
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        self.pages.get(page).copied().ok_or(Error::PageOutOfRange {
            page,
            page_count: self.pages.len(),
        })
    }

    /// Visible box and rotation of `page`, honoring inherited attributes.
    pub fn page_geometry(&self, page: usize) -> Result<PageGeometry> {
        let doc = self.doc()?;
        let page_id = self.page_id(page)?;

        let media_box = inherited_attribute(doc, page_id, b"MediaBox")?
            .and_then(|obj| rect_from_object(doc, obj))
            .unwrap_or_else(|| {
                let [x0, y0, x1, y1] = DEFAULT_MEDIA_BOX;
                Rect::from_points(x0, y0, x1, y1)
            });
        let visible = inherited_attribute(doc, page_id, b"CropBox")?
            .and_then(|obj| rect_from_object(doc, obj))
            .map(|crop| intersect(&crop, &media_box).unwrap_or(media_box))
            .unwrap_or(media_box);
        let rotation = inherited_attribute(doc, page_id, b"Rotate")?
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);

        Ok(PageGeometry::new(visible, rotation))
    }

    /// Convert a normalized box to page units, rejecting boxes with no area.
    fn placement_rect(&self, name: &str, page: usize, bbox: &BoundingBox) -> Result<(Rect, u16)> {
        if bbox.is_degenerate() {
            return Err(Error::Placement {
                name: name.to_string(),
                reason: format!("zero-area box {:?}", bbox),
            });
        }
        let geometry = self.page_geometry(page)?;
        let rect = geometry.to_pdf_rect(bbox);
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(Error::Placement {
                name: name.to_string(),
                reason: "box collapses to zero size on the page".to_string(),
            });
        }
        Ok((rect, geometry.rotation))
    }

    fn add_widget<W: FormFieldWidget>(&mut self, page: usize, widget: W, rotation: u16) -> Result<()> {
        let page_id = self.page_id(page)?;
        let rect = widget.rect();
        let doc = self.doc_mut()?;

        let normal = match widget.appearance() {
            FieldAppearance::Single(content) => {
                Object::Reference(doc.add_object(appearance_stream(rect, &content)))
            }
            FieldAppearance::OnOff { on_state, on, off } => {
                let on_id = doc.add_object(appearance_stream(rect, &on));
                let off_id = doc.add_object(appearance_stream(rect, &off));
                let mut states = Dictionary::new();
                states.set(on_state.into_bytes(), Object::Reference(on_id));
                states.set("Off", Object::Reference(off_id));
                Object::Dictionary(states)
            }
        };

        let mut dict = widget.build_merged_dict(page_id);
        dict.set("AP", dictionary! { "N" => normal });
        if rotation != 0 {
            if let Ok(Object::Dictionary(mk)) = dict.get_mut(b"MK") {
                mk.set("R", Object::Integer(rotation as i64));
            } else {
                dict.set("MK", dictionary! { "R" => Object::Integer(rotation as i64) });
            }
        }

        let field_id = doc.add_object(dict);
        push_annotation(doc, page_id, field_id)?;
        self.acroform.add_field(field_id);

        log::debug!(
            "Added {} field '{}' on page {} at {:?}",
            widget.field_type(),
            widget.field_name(),
            page,
            rect.to_pdf_array()
        );
        Ok(())
    }

    /// Merge pending fields into the catalog's `/AcroForm`.
    fn commit_acroform(&mut self) -> Result<()> {
        if !self.acroform.has_fields() {
            return Ok(());
        }
        let acroform = std::mem::take(&mut self.acroform);
        let doc = self.doc_mut()?;
        let root_id = doc.trailer.get(b"Root")?.as_reference()?;

        let (existing_id, mut dict) = match doc.get_object(root_id)?.as_dict()?.get(b"AcroForm") {
            Ok(Object::Reference(id)) => (Some(*id), doc.get_object(*id)?.as_dict()?.clone()),
            Ok(Object::Dictionary(d)) => (None, d.clone()),
            _ => (None, Dictionary::new()),
        };
        let existing_fields = match dict.get(b"Fields") {
            Ok(obj) => resolve(doc, obj)?.as_array().cloned().unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        let mut fonts = Dictionary::new();
        for (name, base_font) in STANDARD_FORM_FONTS {
            fonts.set(name, Object::Reference(doc.add_object(standard_font(base_font))));
        }
        acroform.merge_into(&mut dict, existing_fields, &fonts);

        match existing_id {
            Some(id) => {
                doc.objects.insert(id, Object::Dictionary(dict));
            }
            None => {
                let id = doc.add_object(dict);
                doc.get_object_mut(root_id)?
                    .as_dict_mut()?
                    .set("AcroForm", Object::Reference(id));
            }
        }
        Ok(())
    }
}

impl FormWriter for AcroFormWriter {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn clear_existing_fields(&mut self) -> Result<()> {
        let pages = self.pages.clone();
        let doc = self.doc_mut()?;
        let mut removed = 0usize;

        for page_id in pages {
            let annots = match doc.get_object(page_id)?.as_dict()?.get(b"Annots") {
                Ok(obj) => resolve(doc, obj)?.as_array().cloned().unwrap_or_default(),
                Err(_) => continue,
            };
            let before = annots.len();
            let kept: Vec<Object> = annots
                .into_iter()
                .filter(|annot| !is_widget(doc, annot))
                .collect();
            removed += before - kept.len();

            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            if kept.is_empty() {
                page.remove(b"Annots");
            } else {
                page.set("Annots", Object::Array(kept));
            }
        }

        let root_id = doc.trailer.get(b"Root")?.as_reference()?;
        let had_form = doc
            .get_object_mut(root_id)?
            .as_dict_mut()?
            .remove(b"AcroForm")
            .is_some();

        log::info!(
            "Cleared {} existing widget annotations{}",
            removed,
            if had_form { " and the document form" } else { "" }
        );
        self.cleared = true;
        Ok(())
    }

    fn add_text_box(&mut self, name: &str, page: usize, bbox: &BoundingBox, multiline: bool) -> Result<()> {
        let (rect, rotation) = self.placement_rect(name, page, bbox)?;
        let mut field = TextFieldWidget::new(name, rect);
        if multiline {
            field = field.multiline();
        }
        self.add_widget(page, field, rotation)
    }

    fn add_checkbox(&mut self, name: &str, page: usize, bbox: &BoundingBox) -> Result<()> {
        let (rect, rotation) = self.placement_rect(name, page, bbox)?;
        self.add_widget(page, CheckboxWidget::new(name, rect), rotation)
    }

    fn add_signature(&mut self, name: &str, page: usize, bbox: &BoundingBox) -> Result<()> {
        let (rect, rotation) = self.placement_rect(name, page, bbox)?;
        self.add_widget(page, SignatureFieldWidget::new(name, rect), rotation)
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        self.commit_acroform()?;
        let cleared = self.cleared;
        let doc = self.doc_mut()?;
        if cleared {
            let pruned = doc.prune_objects();
            log::debug!("Pruned {} unreferenced objects", pruned.len());
        }
        doc.save(path)?;
        log::info!("Saved form to {}", path.display());
        Ok(())
    }

    fn close(&mut self) {
        if self.doc.take().is_some() {
            log::debug!("Closed form writer for {}", self.source.display());
        }
    }
}

/// Opens [`AcroFormWriter`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcroFormWriterFactory;

impl FormWriterFactory for AcroFormWriterFactory {
    fn open(&self, path: &Path) -> Result<Box<dyn FormWriter>> {
        Ok(Box::new(AcroFormWriter::open(path)?))
    }
}

/// Follow one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Look up `key` on a page node or the nearest ancestor that defines it.
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Result<Option<&'a Object>> {
    let mut node = doc.get_object(page_id)?.as_dict()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Ok(Some(value));
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = doc.get_object(parent)?.as_dict()?,
            Err(_) => return Ok(None),
        }
    }
    Err(Error::InvalidPdf(format!(
        "page tree deeper than {} levels above object {:?}",
        MAX_TREE_DEPTH, page_id
    )))
}

/// Normalized rectangle from a four-number array object.
fn rect_from_object(doc: &Document, obj: &Object) -> Option<Rect> {
    let values = resolve(doc, obj).ok()?.as_array().ok()?;
    if values.len() < 4 {
        return None;
    }
    let mut nums = [0.0f32; 4];
    for (slot, value) in nums.iter_mut().zip(values) {
        *slot = resolve(doc, value).ok()?.as_float().ok()?;
    }
    let [a, b, c, d] = nums;
    let rect = Rect::from_points(a.min(c), b.min(d), a.max(c), b.max(d));
    (rect.width > 0.0 && rect.height > 0.0).then_some(rect)
}

fn intersect(a: &Rect, b: &Rect) -> Option<Rect> {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = a.right().min(b.right());
    let y1 = a.top().min(b.top());
    (x1 > x0 && y1 > y0).then(|| Rect::from_points(x0, y0, x1, y1))
}

fn is_widget(doc: &Document, annot: &Object) -> bool {
    resolve(doc, annot)
        .and_then(|obj| Ok(obj.as_dict()?))
        .and_then(|dict| Ok(dict.get(b"Subtype")?.as_name()?))
        .map(|subtype| subtype == b"Widget")
        .unwrap_or(false)
}

/// Append an annotation reference to a page's `/Annots`, inline or indirect.
fn push_annotation(doc: &mut Document, page_id: ObjectId, annot_id: ObjectId) -> Result<()> {
    let annots = doc.get_object(page_id)?.as_dict()?.get(b"Annots").ok().cloned();
    match annots {
        Some(Object::Reference(array_id)) => {
            doc.get_object_mut(array_id)?
                .as_array_mut()?
                .push(Object::Reference(annot_id));
        }
        Some(Object::Array(mut array)) => {
            array.push(Object::Reference(annot_id));
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Annots", Object::Array(array));
        }
        _ => {
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Annots", vec![Object::Reference(annot_id)]);
        }
    }
    Ok(())
}
