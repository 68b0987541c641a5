//! DETR-style (FFDetr) ONNX model.
//!
//! The export takes one `[1, 3, S, S]` ImageNet-normalized input and produces
//! two outputs: boxes `[1, queries, 4]` as normalized `(cx, cy, w, h)` and
//! class logits `[1, queries, classes]`.

use crate::detection::{DetectionModel, PredictParams, RawDetection};
use crate::error::{Error, Result};
use crate::utils::safe_float_cmp;
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Number of top-scoring (query, class) pairs considered per image.
const TOP_K: usize = 300;

fn preprocess(image: &DynamicImage, size: u32) -> Array4<f32> {
    let resized = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let side = size as usize;
    let mut input = Array4::zeros((1, 3, side, side));

    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] =
                (f32::from(pixel[c]) / 255.0 - MEAN[c]) / STD[c];
        }
    }

    input
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Decode box and logit tensors into corner boxes in the pixel space of a
/// `width` x `height` image.
pub(crate) fn decode_output(
    box_dims: &[i64],
    boxes: &[f32],
    logit_dims: &[i64],
    logits: &[f32],
    width: u32,
    height: u32,
    confidence: f32,
) -> Result<Vec<RawDetection>> {
    if box_dims.len() != 3 || box_dims[2] != 4 || logit_dims.len() != 3 || box_dims[1] != logit_dims[1]
    {
        return Err(Error::Model(format!(
            "unexpected DETR output shapes {:?} / {:?}",
            box_dims, logit_dims
        )));
    }
    let queries = box_dims[1] as usize;
    let classes = logit_dims[2] as usize;
    if classes == 0 || boxes.len() < queries * 4 || logits.len() < queries * classes {
        return Err(Error::Model("DETR output tensors are truncated".to_string()));
    }

    let mut scored: Vec<(usize, f32)> = logits[..queries * classes]
        .iter()
        .enumerate()
        .map(|(i, &logit)| (i, sigmoid(logit)))
        .filter(|&(_, score)| score >= confidence)
        .collect();
    scored.sort_by(|a, b| safe_float_cmp(b.1, a.1));
    scored.truncate(TOP_K);

    let (w, h) = (width as f32, height as f32);
    Ok(scored
        .into_iter()
        .map(|(index, score)| {
            let query = index / classes;
            let class_id = (index % classes) as i64;
            let b = &boxes[query * 4..query * 4 + 4];
            let (cx, cy, bw, bh) = (b[0], b[1], b[2], b[3]);
            RawDetection::new(
                class_id,
                [
                    (cx - bw / 2.0) * w,
                    (cy - bh / 2.0) * h,
                    (cx + bw / 2.0) * w,
                    (cy + bh / 2.0) * h,
                ],
                score,
            )
        })
        .collect())
}

/// FFDetr model running on ONNX Runtime.
pub(crate) struct DetrOnnxModel {
    session: Session,
    boxes_output: usize,
    logits_output: usize,
}

impl DetrOnnxModel {
    pub fn new(session: Session) -> Result<Self> {
        if session.outputs.len() < 2 {
            return Err(Error::Model(format!(
                "DETR model has {} outputs, expected boxes and logits",
                session.outputs.len()
            )));
        }

        // Exports name the outputs `dets`/`labels` or `boxes`/`logits`.
        let boxes_output = session
            .outputs
            .iter()
            .position(|o| {
                let name = o.name.to_ascii_lowercase();
                name.contains("box") || name.contains("det")
            })
            .unwrap_or(0);
        let logits_output = if boxes_output == 0 { 1 } else { 0 };

        Ok(Self {
            session,
            boxes_output,
            logits_output,
        })
    }
}

impl DetectionModel for DetrOnnxModel {
    fn predict(
        &mut self,
        images: &[&DynamicImage],
        params: &PredictParams,
    ) -> Result<Vec<Vec<RawDetection>>> {
        let mut results = Vec::with_capacity(images.len());

        for image in images {
            let input = preprocess(image, params.image_size);
            let tensor = TensorRef::from_array_view(input.view())?;
            let outputs = self.session.run(ort::inputs![tensor])?;

            let (box_shape, boxes) = outputs[self.boxes_output].try_extract_tensor::<f32>()?;
            let (logit_shape, logits) = outputs[self.logits_output].try_extract_tensor::<f32>()?;

            results.push(decode_output(
                box_shape.as_ref(),
                boxes,
                logit_shape.as_ref(),
                logits,
                image.width(),
                image.height(),
                params.confidence,
            )?);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_normalizes_with_imagenet_stats() {
        let image = DynamicImage::new_rgb8(4, 4);
        let input = preprocess(&image, 8);
        assert_eq!(input.shape(), &[1, 3, 8, 8]);
        assert!((input[[0, 0, 0, 0]] - (-MEAN[0] / STD[0])).abs() < 1e-6);
    }

    #[test]
    fn test_decode_scales_to_pixels() {
        // Two queries, three classes.
        let boxes = [0.5, 0.5, 0.2, 0.1, 0.1, 0.1, 0.05, 0.05];
        let logits = [-5.0, 3.0, -5.0, -5.0, -5.0, -5.0];

        let dets = decode_output(&[1, 2, 4], &boxes, &[1, 2, 3], &logits, 1000, 2000, 0.4).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert!((dets[0].confidence - sigmoid(3.0)).abs() < 1e-6);

        let expected = [400.0, 900.0, 600.0, 1100.0];
        for (got, want) in dets[0].bbox.iter().zip(expected) {
            assert!((got - want).abs() < 1e-3, "{got} != {want}");
        }
    }

    #[test]
    fn test_decode_rejects_mismatched_queries() {
        assert!(decode_output(&[1, 2, 4], &[0.0; 8], &[1, 3, 3], &[0.0; 9], 10, 10, 0.5).is_err());
    }
}
