//! YOLO-style (FFDNet) ONNX model.
//!
//! Expects a single `[1, 3, S, S]` float input and a `[1, 4 + classes, anchors]`
//! output whose first four rows are `(cx, cy, w, h)` in input pixels.

use crate::detection::{DetectionModel, PredictParams, RawDetection};
use crate::error::{Error, Result};
use crate::geometry::BoundingBox;
use crate::utils::safe_float_cmp;
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;

/// Gray used to pad letterboxed inputs.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Upper bound on detections kept per image.
const MAX_DETECTIONS: usize = 300;

/// Scale and offset applied when letterboxing an image into the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    /// Fit a `width` x `height` image into a `size` x `size` square, centered.
    pub fn fit(width: u32, height: u32, size: u32) -> (Self, u32, u32) {
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let new_w = ((width as f32 * scale).round() as u32).clamp(1, size);
        let new_h = ((height as f32 * scale).round() as u32).clamp(1, size);
        let letterbox = Self {
            scale,
            pad_x: ((size - new_w) / 2) as f32,
            pad_y: ((size - new_h) / 2) as f32,
        };
        (letterbox, new_w, new_h)
    }
}

fn preprocess(image: &DynamicImage, size: u32) -> (Array4<f32>, Letterbox) {
    let (letterbox, new_w, new_h) = Letterbox::fit(image.width(), image.height(), size);
    let resized = image.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();

    let side = size as usize;
    let mut input = Array4::from_elem((1, 3, side, side), PAD_VALUE);
    let (off_x, off_y) = (letterbox.pad_x as usize, letterbox.pad_y as usize);

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (px, py) = (x as usize + off_x, y as usize + off_y);
        for c in 0..3 {
            input[[0, c, py, px]] = f32::from(pixel[c]) / 255.0;
        }
    }

    (input, letterbox)
}

/// Decode a `[1, 4 + classes, anchors]` output into normalized center boxes.
///
/// `flipped` marks output from a horizontally mirrored input; boxes are
/// mirrored back.
pub(crate) fn decode_output(
    dims: &[i64],
    data: &[f32],
    letterbox: &Letterbox,
    width: u32,
    height: u32,
    confidence: f32,
    flipped: bool,
) -> Result<Vec<RawDetection>> {
    if dims.len() != 3 || dims[1] < 5 {
        return Err(Error::Model(format!(
            "expected [1, 4 + classes, anchors] output, got {:?}",
            dims
        )));
    }
    let num_features = dims[1] as usize;
    let num_anchors = dims[2] as usize;
    if data.len() < num_features * num_anchors {
        return Err(Error::Model(format!(
            "output holds {} values, shape {:?} needs {}",
            data.len(),
            dims,
            num_features * num_anchors
        )));
    }

    let (w_img, h_img) = (width as f32, height as f32);
    let mut detections = Vec::new();

    for anchor in 0..num_anchors {
        let feature = |f: usize| data[f * num_anchors + anchor];

        let (class_id, score) = (4..num_features)
            .map(|f| (f - 4, feature(f)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < confidence {
            continue;
        }

        let cx = (feature(0) - letterbox.pad_x) / letterbox.scale / w_img;
        let cy = (feature(1) - letterbox.pad_y) / letterbox.scale / h_img;
        let w = feature(2) / letterbox.scale / w_img;
        let h = feature(3) / letterbox.scale / h_img;
        let cx = if flipped { 1.0 - cx } else { cx };

        detections.push(RawDetection::new(class_id as i64, [cx, cy, w, h], score));
    }

    Ok(detections)
}

/// Same-class greedy suppression, as the model's own post-processing does.
fn suppress_per_class(mut detections: Vec<RawDetection>, iou: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| safe_float_cmp(b.confidence, a.confidence));

    let to_box = |d: &RawDetection| BoundingBox::from_center(d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]);
    let mut kept: Vec<RawDetection> = Vec::new();
    for det in detections {
        let bbox = to_box(&det);
        let duplicate = kept
            .iter()
            .any(|k| k.class_id == det.class_id && to_box(k).iou(&bbox) > iou);
        if !duplicate {
            kept.push(det);
        }
    }
    kept
}

/// FFDNet model running on ONNX Runtime.
pub(crate) struct YoloOnnxModel {
    session: Session,
}

impl YoloOnnxModel {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    fn run_once(
        &mut self,
        image: &DynamicImage,
        params: &PredictParams,
        flipped: bool,
    ) -> Result<Vec<RawDetection>> {
        let (input, letterbox) = preprocess(image, params.image_size);
        let tensor = TensorRef::from_array_view(input.view())?;
        let outputs = self.session.run(ort::inputs![tensor])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        decode_output(
            shape.as_ref(),
            data,
            &letterbox,
            image.width(),
            image.height(),
            params.confidence,
            flipped,
        )
    }
}

impl DetectionModel for YoloOnnxModel {
    fn predict(
        &mut self,
        images: &[&DynamicImage],
        params: &PredictParams,
    ) -> Result<Vec<Vec<RawDetection>>> {
        let mut results = Vec::with_capacity(images.len());

        for image in images {
            let mut detections = self.run_once(image, params, false)?;
            if params.augment {
                // Test-time augmentation: a mirrored pass, merged before suppression.
                let mirrored = image.fliph();
                detections.extend(self.run_once(&mirrored, params, true)?);
            }

            if params.iou < 1.0 {
                detections = suppress_per_class(detections, params.iou);
            } else {
                detections.sort_by(|a, b| safe_float_cmp(b.confidence, a.confidence));
            }
            detections.truncate(MAX_DETECTIONS);
            results.push(detections);
        }

        Ok(results)
    }
}
