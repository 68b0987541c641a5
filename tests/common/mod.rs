//! Shared fixtures for integration tests: fake collaborators and small
//! `lopdf`-built documents.

#![allow(dead_code)]

use commonforms::detection::{Backend, DetectionModel, PredictParams, RawDetection};
use commonforms::error::{Error, RenderError, Result};
use commonforms::geometry::Page;
use commonforms::ml::{ModelLoader, ModelVariant, WeightResolver};
use commonforms::pipeline::config::Device;
use commonforms::rendering::Renderer;
use image::DynamicImage;
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Blank rendered page of the given pixel size.
pub fn blank_page(width: u32, height: u32) -> Page {
    Page::new(DynamicImage::new_rgb8(width, height))
}

/// Model that replays scripted per-image detections, one entry per image.
pub struct ScriptedModel {
    pub script: VecDeque<Vec<RawDetection>>,
    pub calls: Arc<Mutex<Vec<(usize, PredictParams)>>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Vec<RawDetection>>) -> Self {
        Self {
            script: script.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DetectionModel for ScriptedModel {
    fn predict(&mut self, images: &[&DynamicImage], params: &PredictParams) -> Result<Vec<Vec<RawDetection>>> {
        self.calls.lock().unwrap().push((images.len(), params.clone()));
        Ok(images
            .iter()
            .map(|_| self.script.pop_front().unwrap_or_default())
            .collect())
    }
}

/// Resolver that records requests and returns a fixed path.
#[derive(Default)]
pub struct RecordingResolver {
    pub requests: Arc<Mutex<Vec<(String, ModelVariant)>>>,
}

impl WeightResolver for RecordingResolver {
    fn resolve(&self, model_name: &str, variant: ModelVariant) -> Result<PathBuf> {
        self.requests.lock().unwrap().push((model_name.to_string(), variant));
        Ok(PathBuf::from(format!("/weights/{}.onnx", model_name)))
    }
}

/// Loader handing out a [`ScriptedModel`] with the given script.
pub struct ScriptedLoader {
    pub script: Mutex<Option<Vec<Vec<RawDetection>>>>,
    pub loaded: Arc<Mutex<Vec<(Backend, PathBuf, Device)>>>,
}

impl ScriptedLoader {
    pub fn new(script: Vec<Vec<RawDetection>>) -> Self {
        Self {
            script: Mutex::new(Some(script)),
            loaded: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ModelLoader for ScriptedLoader {
    fn load(&self, backend: Backend, weights: &Path, device: Device) -> Result<Box<dyn DetectionModel>> {
        self.loaded
            .lock()
            .unwrap()
            .push((backend, weights.to_path_buf(), device));
        let script = self.script.lock().unwrap().take().unwrap_or_default();
        Ok(Box::new(ScriptedModel::new(script)))
    }
}

/// Loader that always fails, for paths where detection must not run.
pub struct FailingLoader;

impl ModelLoader for FailingLoader {
    fn load(&self, _: Backend, weights: &Path, _: Device) -> Result<Box<dyn DetectionModel>> {
        Err(Error::Model(format!("refusing to load {}", weights.display())))
    }
}

/// Renderer returning `count` blank pages.
pub struct BlankRenderer {
    pub count: usize,
    pub width: u32,
    pub height: u32,
}

impl Renderer for BlankRenderer {
    fn render(&self, _path: &Path) -> std::result::Result<Vec<Page>, RenderError> {
        Ok((0..self.count).map(|_| blank_page(self.width, self.height)).collect())
    }
}

/// Renderer standing in for a password-protected input.
pub struct LockedRenderer;

impl Renderer for LockedRenderer {
    fn render(&self, _path: &Path) -> std::result::Result<Vec<Page>, RenderError> {
        Err(RenderError::PasswordRequired)
    }
}

/// Renderer standing in for a corrupt input.
pub struct BrokenRenderer;

impl Renderer for BrokenRenderer {
    fn render(&self, _path: &Path) -> std::result::Result<Vec<Page>, RenderError> {
        Err(RenderError::Unreadable("no startxref".to_string()))
    }
}

/// Build a document with `count` pages of 612x792 points.
///
/// Each name in `existing_fields` adds a pre-existing text field to page 0.
pub fn build_pdf(count: usize, existing_fields: &[&str]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    let mut field_refs = Vec::new();
    for index in 0..count {
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT /F1 12 Tf 72 720 Td (Name) Tj ET".to_vec()));
        let page_id = doc.new_object_id();
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if index == 0 && !existing_fields.is_empty() {
            let mut annots = Vec::new();
            for name in existing_fields {
                let field_id = doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "FT" => "Tx",
                    "T" => Object::string_literal(*name),
                    "Rect" => vec![Object::Integer(72), Object::Integer(600), Object::Integer(300), Object::Integer(620)],
                    "P" => page_id,
                });
                annots.push(Object::Reference(field_id));
                field_refs.push(Object::Reference(field_id));
            }
            page.set("Annots", annots);
        }
        doc.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count as i64),
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        }),
    );

    let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
    if !field_refs.is_empty() {
        let acroform_id = doc.add_object(dictionary! { "Fields" => field_refs });
        catalog.set("AcroForm", acroform_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Write a fixture document to `path`.
pub fn write_pdf(path: &Path, count: usize, existing_fields: &[&str]) {
    let mut doc = build_pdf(count, existing_fields);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    std::fs::write(path, buf).unwrap();
}

/// A terminal field read back from a saved document.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedField {
    pub name: String,
    pub field_type: String,
    pub flags: i64,
    pub page: usize,
    pub rect: [f32; 4],
}

/// Fields listed in the document's `/AcroForm /Fields`, with their page.
pub fn read_fields(path: &Path) -> Vec<SavedField> {
    let doc = Document::load(path).unwrap();
    let pages: Vec<lopdf::ObjectId> = doc.get_pages().into_values().collect();
    let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = doc.get_object(root).unwrap().as_dict().unwrap();
    let acroform = match catalog.get(b"AcroForm") {
        Ok(Object::Reference(id)) => doc.get_object(*id).unwrap().as_dict().unwrap(),
        Ok(Object::Dictionary(d)) => d,
        _ => return Vec::new(),
    };
    let fields = acroform.get(b"Fields").unwrap().as_array().unwrap();

    fields
        .iter()
        .map(|field| {
            let id = field.as_reference().unwrap();
            let dict = doc.get_object(id).unwrap().as_dict().unwrap();
            let page_ref = dict.get(b"P").unwrap().as_reference().unwrap();
            let rect: Vec<f32> = dict
                .get(b"Rect")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_float().unwrap())
                .collect();
            SavedField {
                name: String::from_utf8(dict.get(b"T").unwrap().as_str().unwrap().to_vec()).unwrap(),
                field_type: String::from_utf8(dict.get(b"FT").unwrap().as_name().unwrap().to_vec()).unwrap(),
                flags: dict.get(b"Ff").ok().and_then(|f| f.as_i64().ok()).unwrap_or(0),
                page: pages.iter().position(|p| *p == page_ref).unwrap(),
                rect: [rect[0], rect[1], rect[2], rect[3]],
            }
        })
        .collect()
}
