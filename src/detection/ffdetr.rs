//! FFDetr (DETR-style) detector adapter.

use crate::error::Result;
use crate::geometry::{BoundingBox, Page};
use crate::pipeline::config::{Device, DEFAULT_SUPPRESSION_THRESHOLD};
use crate::pipeline::reading_order::ReadingOrderStrategy;
use crate::widget::DetectionResult;

use super::{detect_in_batches, Backend, DetectionModel, DetectionParams, Detector, PredictParams};

/// Input resolution FFDetr always runs at.
pub const FFDETR_IMAGE_SIZE: u32 = 1024;

/// Detector adapter for FFDetr models.
///
/// FFDetr reports `(x0, y0, x1, y1)` boxes in the pixel space of the page
/// image it was given. The requested input resolution is ignored.
pub struct FfdetrDetector {
    model: Box<dyn DetectionModel>,
    sorter: Box<dyn ReadingOrderStrategy>,
    device: Device,
    suppression_threshold: f32,
}

impl FfdetrDetector {
    /// Wrap a loaded FFDetr model.
    pub fn new(model: Box<dyn DetectionModel>, sorter: Box<dyn ReadingOrderStrategy>) -> Self {
        Self {
            model,
            sorter,
            device: Device::Cpu,
            suppression_threshold: DEFAULT_SUPPRESSION_THRESHOLD,
        }
    }

    /// Set the inference device.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Override the duplicate suppression threshold.
    pub fn with_suppression_threshold(mut self, threshold: f32) -> Self {
        self.suppression_threshold = threshold;
        self
    }

    /// Model parameters for one `extract_widgets` call.
    pub fn predict_params(&self, params: &DetectionParams) -> PredictParams {
        PredictParams {
            confidence: params.confidence,
            image_size: FFDETR_IMAGE_SIZE,
            iou: 1.0,
            augment: false,
            device: self.device,
        }
    }
}

impl Detector for FfdetrDetector {
    fn extract_widgets(
        &mut self,
        pages: &[Page],
        params: &DetectionParams,
    ) -> Result<DetectionResult> {
        if params.image_size != FFDETR_IMAGE_SIZE {
            log::debug!(
                "FFDetr ignores requested image size {}, using {}",
                params.image_size,
                FFDETR_IMAGE_SIZE
            );
        }
        let predict = self.predict_params(params);

        detect_in_batches(
            self.model.as_mut(),
            self.sorter.as_ref(),
            pages,
            params,
            &predict,
            Backend::FFDetr,
            self.suppression_threshold,
            |&[x0, y0, x1, y1], page| {
                BoundingBox::from_pixels(x0, y0, x1, y1, page.width, page.height)
            },
        )
    }

    fn backend(&self) -> Backend {
        Backend::FFDetr
    }
}
