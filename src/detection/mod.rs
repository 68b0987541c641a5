//! Widget detection on rendered pages.
//!
//! A [`Detector`] turns rendered [`Page`]s into a [`DetectionResult`]. Two
//! backend families exist, and their models disagree on almost everything:
//!
//! - **FFDNet** (YOLO-style) reports `(cx, cy, w, h)` boxes normalized to the page
//! - **FFDetr** (DETR-style) reports `(x0, y0, x1, y1)` boxes in page pixels
//!
//! Each adapter converts its model's native output into [`Widget`]s, drops
//! duplicate detections and hands every page to a reading order strategy, so
//! the rest of the pipeline never sees backend-specific data.
//!
//! # Architecture
//!
//! ```text
//! pages ──batches──> DetectionModel::predict ──> RawDetection
//!                                                   │ class table, box convention
//!                                                   ▼
//!                     suppress_duplicates ──> ReadingOrderStrategy ──> DetectionResult
//! ```

mod ffdetr;
mod ffdnet;
pub mod suppression;

pub use ffdetr::FfdetrDetector;
pub use ffdnet::FfdnetDetector;
pub use suppression::{suppress_duplicates, Candidate};

use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Page};
use crate::ml::{registered_model, ModelLoader, ModelVariant, WeightResolver};
use crate::pipeline::config::{DetectionConfig, Device, ReadingOrderConfig};
use crate::pipeline::reading_order::{create_strategy, ReadingOrderStrategy};
use crate::widget::{DetectionResult, Widget, WidgetType};
use image::DynamicImage;
use std::fmt;
use std::path::Path;

/// Detection model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// YOLO-style detector, center-format normalized boxes
    FFDNet,
    /// DETR-style detector, corner-format pixel boxes
    FFDetr,
}

impl Backend {
    /// Select the backend for a model name or weight path.
    ///
    /// Anything containing `FFDNET` (case-insensitive) is an FFDNet model;
    /// everything else, including unrecognized local paths, is FFDetr.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::detection::Backend;
    ///
    /// assert_eq!(Backend::for_model_name("FFDNet-L"), Backend::FFDNet);
    /// assert_eq!(Backend::for_model_name("weights/ffdnet-s-v2.onnx"), Backend::FFDNet);
    /// assert_eq!(Backend::for_model_name("FFDetr"), Backend::FFDetr);
    /// ```
    pub fn for_model_name(name: &str) -> Self {
        if name.to_ascii_uppercase().contains("FFDNET") {
            Backend::FFDNet
        } else {
            Backend::FFDetr
        }
    }

    /// Display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::FFDNet => "FFDNet",
            Backend::FFDetr => "FFDetr",
        }
    }

    /// Map a raw model class id to a widget type.
    ///
    /// Both backends share the same class table. An unknown id is a model
    /// contract violation and fails with [`Error::UnknownClass`].
    pub fn widget_type(&self, class_id: i64) -> Result<WidgetType> {
        match class_id {
            0 => Ok(WidgetType::TextBox),
            1 => Ok(WidgetType::ChoiceButton),
            2 => Ok(WidgetType::Signature),
            _ => Err(Error::UnknownClass {
                class_id,
                backend: self.as_str(),
            }),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detection as reported by a model, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    /// Model class id
    pub class_id: i64,
    /// Box in the backend's native convention
    pub bbox: [f32; 4],
    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

impl RawDetection {
    /// Create a raw detection.
    pub fn new(class_id: i64, bbox: [f32; 4], confidence: f32) -> Self {
        Self {
            class_id,
            bbox,
            confidence,
        }
    }
}

/// Parameters forwarded to a [`DetectionModel`] for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictParams {
    /// Minimum confidence the model should report
    pub confidence: f32,
    /// Model input resolution in pixels
    pub image_size: u32,
    /// Model-level same-class IoU suppression threshold (1.0 disables it)
    pub iou: f32,
    /// Enable test-time augmentation
    pub augment: bool,
    /// Inference device
    pub device: Device,
}

/// An object detection model: images in, raw detections out.
///
/// Implementations must return exactly one result list per input image, in
/// input order.
pub trait DetectionModel: Send {
    /// Run the model on a batch of images.
    fn predict(
        &mut self,
        images: &[&DynamicImage],
        params: &PredictParams,
    ) -> Result<Vec<Vec<RawDetection>>>;
}

/// Per-call detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Minimum detection confidence
    pub confidence: f32,
    /// Requested model input resolution (backends may override it)
    pub image_size: u32,
    /// Pages per model call; must be at least 1
    pub batch_size: usize,
}

impl From<&DetectionConfig> for DetectionParams {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            confidence: config.confidence,
            image_size: config.image_size,
            batch_size: config.batch_size,
        }
    }
}

/// Detects form widgets on rendered pages.
pub trait Detector {
    /// Detect widgets on every page.
    ///
    /// Pages are indexed by their position in `pages`. Pages with no accepted
    /// detections are absent from the result; every present page's widgets
    /// are in reading order.
    fn extract_widgets(&mut self, pages: &[Page], params: &DetectionParams)
        -> Result<DetectionResult>;

    /// Backend family of this detector.
    fn backend(&self) -> Backend;
}

/// Build the detector for `config.model`.
///
/// Resolves weights once through `resolver`, loads the model through
/// `loader` and wires in the configured reading order strategy. A registered
/// model whose published file `loader` can't read is rejected before anything
/// is fetched.
pub fn create_detector(
    config: &DetectionConfig,
    reading_order: &ReadingOrderConfig,
    resolver: &dyn WeightResolver,
    loader: &dyn ModelLoader,
) -> Result<Box<dyn Detector>> {
    let backend = Backend::for_model_name(&config.model);
    let variant = match backend {
        Backend::FFDNet if config.fast => ModelVariant::Fast,
        _ => ModelVariant::Standard,
    };

    log::info!("Using {} detector ({})", backend, config.model);
    if let Some(source) = registered_model(&config.model, variant) {
        if !loader.supports(Path::new(source.filename)) {
            return Err(Error::InvalidConfig(format!(
                "model {} is published as {}, which this build cannot load; \
                 use --fast with FFDNet-S or FFDNet-L, or pass a local .onnx file",
                config.model, source.filename
            )));
        }
    }
    let weights = resolver.resolve(&config.model, variant)?;
    log::debug!("Weights resolved to {}", weights.display());

    let model = loader.load(backend, &weights, config.device)?;
    let sorter = create_strategy(reading_order);

    Ok(match backend {
        Backend::FFDNet => Box::new(
            FfdnetDetector::new(model, sorter)
                .with_fast(config.fast)
                .with_device(config.device)
                .with_suppression_threshold(config.suppression_threshold),
        ),
        Backend::FFDetr => Box::new(
            FfdetrDetector::new(model, sorter)
                .with_device(config.device)
                .with_suppression_threshold(config.suppression_threshold),
        ),
    })
}

/// Shared batch driver for the adapters.
///
/// `to_bbox` converts a raw box in the backend's convention into a normalized
/// box for the given page.
#[allow(clippy::too_many_arguments)]
pub(crate) fn detect_in_batches<F>(
    model: &mut dyn DetectionModel,
    sorter: &dyn ReadingOrderStrategy,
    pages: &[Page],
    params: &DetectionParams,
    predict: &PredictParams,
    backend: Backend,
    suppression_threshold: f32,
    to_bbox: F,
) -> Result<DetectionResult>
where
    F: Fn(&[f32; 4], &Page) -> BoundingBox,
{
    if params.batch_size == 0 {
        return Err(Error::InvalidConfig("batch_size must be at least 1".to_string()));
    }

    let mut result = DetectionResult::new();

    for (batch_index, batch) in pages.chunks(params.batch_size).enumerate() {
        let offset = batch_index * params.batch_size;
        let images: Vec<&DynamicImage> = batch.iter().map(|page| &page.image).collect();

        let predictions = model.predict(&images, predict)?;
        if predictions.len() != batch.len() {
            return Err(Error::BatchMismatch {
                expected: batch.len(),
                found: predictions.len(),
            });
        }

        for (i, (page, detections)) in batch.iter().zip(predictions).enumerate() {
            let page_index = offset + i;
            log::info!("Page {}: {} fields detected", page_index, detections.len());

            let mut candidates = Vec::with_capacity(detections.len());
            for raw in detections {
                if raw.confidence < params.confidence {
                    continue;
                }
                let widget_type = backend.widget_type(raw.class_id)?;
                let bounding_box = to_bbox(&raw.bbox, page).clamped();
                candidates.push(Candidate::new(
                    Widget::new(widget_type, bounding_box, page_index),
                    raw.confidence,
                ));
            }

            let kept = suppress_duplicates(candidates, suppression_threshold);
            log::info!("Page {}: {} after suppression", page_index, kept.len());

            if kept.is_empty() {
                continue;
            }

            let widgets = kept.into_iter().map(|c| c.widget).collect();
            result.insert(page_index, sorter.apply(widgets));
        }
    }

    Ok(result)
}
