//! ONNX Runtime model loading.

use crate::detection::{Backend, DetectionModel};
use crate::error::{Error, Result};
use crate::pipeline::config::Device;
use ort::session::Session;
use std::path::Path;

use super::onnx_detr::DetrOnnxModel;
use super::onnx_yolo::YoloOnnxModel;
use super::ModelLoader;

/// Loads FFDNet and FFDetr models exported to ONNX.
///
/// Only `.onnx` files can be loaded; PyTorch checkpoints (`.pt`, `.pth`) are
/// rejected with [`Error::UnsupportedWeights`]. The registered FFDNet fast
/// variants ship as ONNX, so `--fast` works out of the box.
///
/// # Example
///
/// ```ignore
/// use commonforms::detection::Backend;
/// use commonforms::ml::{ModelLoader, OnnxModelLoader};
/// use commonforms::pipeline::config::Device;
/// use std::path::Path;
///
/// let model = OnnxModelLoader::new().load(Backend::FFDNet, Path::new("FFDNet-S.onnx"), Device::Cpu)?;
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxModelLoader;

impl OnnxModelLoader {
    /// Create a loader.
    pub fn new() -> Self {
        Self
    }

    fn open_session(path: &Path) -> Result<Session> {
        if !path.exists() {
            return Err(Error::Model(format!("Model file not found: {}", path.display())));
        }

        if !is_onnx(path) {
            return Err(Error::UnsupportedWeights(path.to_path_buf()));
        }

        log::info!("Loading ONNX model from {}", path.display());
        let session = Session::builder()?.commit_from_file(path)?;
        log::debug!(
            "Model inputs: {:?}, outputs: {:?}",
            session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            session.outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>()
        );
        Ok(session)
    }
}

fn is_onnx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("onnx"))
        .unwrap_or(false)
}

impl ModelLoader for OnnxModelLoader {
    fn supports(&self, weights: &Path) -> bool {
        is_onnx(weights)
    }

    fn load(
        &self,
        backend: Backend,
        weights: &Path,
        device: Device,
    ) -> Result<Box<dyn DetectionModel>> {
        if !device.is_cpu() {
            log::warn!(
                "Device {} requested but only the CPU execution provider is available; running on CPU",
                device
            );
        }

        let session = Self::open_session(weights)?;
        Ok(match backend {
            Backend::FFDNet => Box::new(YoloOnnxModel::new(session)),
            Backend::FFDetr => Box::new(DetrOnnxModel::new(session)?),
        })
    }
}
