//! FFDNet (YOLO-style) detector adapter.

use crate::error::Result;
use crate::geometry::{BoundingBox, Page};
use crate::pipeline::config::{Device, DEFAULT_SUPPRESSION_THRESHOLD};
use crate::pipeline::reading_order::ReadingOrderStrategy;
use crate::widget::DetectionResult;

use super::{detect_in_batches, Backend, DetectionModel, DetectionParams, Detector, PredictParams};

/// Input resolution the fast (ONNX export) variant was built for.
pub const FAST_IMAGE_SIZE: u32 = 1216;

/// Model-level IoU threshold in normal mode.
const MODEL_IOU: f32 = 0.1;

/// Detector adapter for FFDNet models.
///
/// FFDNet reports boxes as `(cx, cy, w, h)` fractions of the page. Normal
/// mode runs at the requested resolution with test-time augmentation; fast
/// mode pins the resolution to [`FAST_IMAGE_SIZE`] and turns augmentation
/// and model-level suppression off.
pub struct FfdnetDetector {
    model: Box<dyn DetectionModel>,
    sorter: Box<dyn ReadingOrderStrategy>,
    fast: bool,
    device: Device,
    suppression_threshold: f32,
}

impl FfdnetDetector {
    /// Wrap a loaded FFDNet model.
    pub fn new(model: Box<dyn DetectionModel>, sorter: Box<dyn ReadingOrderStrategy>) -> Self {
        Self {
            model,
            sorter,
            fast: false,
            device: Device::Cpu,
            suppression_threshold: DEFAULT_SUPPRESSION_THRESHOLD,
        }
    }

    /// Enable or disable fast mode.
    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
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
        if self.fast {
            PredictParams {
                confidence: params.confidence,
                image_size: FAST_IMAGE_SIZE,
                iou: 1.0,
                augment: false,
                device: self.device,
            }
        } else {
            PredictParams {
                confidence: params.confidence,
                image_size: params.image_size,
                iou: MODEL_IOU,
                augment: true,
                device: self.device,
            }
        }
    }
}

impl Detector for FfdnetDetector {
    fn extract_widgets(
        &mut self,
        pages: &[Page],
        params: &DetectionParams,
    ) -> Result<DetectionResult> {
        let predict = self.predict_params(params);
        log::debug!(
            "FFDNet: {} pages, imgsz={}, fast={}",
            pages.len(),
            predict.image_size,
            self.fast
        );

        detect_in_batches(
            self.model.as_mut(),
            self.sorter.as_ref(),
            pages,
            params,
            &predict,
            Backend::FFDNet,
            self.suppression_threshold,
            |&[cx, cy, w, h], _page| BoundingBox::from_center(cx, cy, w, h),
        )
    }

    fn backend(&self) -> Backend {
        Backend::FFDNet
    }
}
