//! Model weights and model runtimes.
//!
//! Detection adapters never touch files or runtimes directly. They receive a
//! [`WeightResolver`] that turns a model name into a local weight file and a
//! [`ModelLoader`] that turns that file into a runnable
//! [`DetectionModel`](crate::detection::DetectionModel).
//!
//! # Features
//!
//! - `hub`: registered model names are downloaded from the Hugging Face hub
//!   and cached ([`HubWeightCache`])
//! - `onnx`: models run on ONNX Runtime ([`OnnxModelLoader`])
//!
//! Without those features, [`LocalWeights`] accepts only paths to existing
//! files and [`default_model_loader`] reports every load as unsupported.

pub mod weights;

#[cfg(feature = "onnx")]
pub mod model_loader;
#[cfg(feature = "onnx")]
mod onnx_detr;
#[cfg(feature = "onnx")]
mod onnx_yolo;

pub use weights::{registered_model, CachedWeights, LocalWeights, ModelSource};

#[cfg(feature = "hub")]
pub use weights::HubWeightCache;

#[cfg(feature = "onnx")]
pub use model_loader::OnnxModelLoader;

use crate::detection::{Backend, DetectionModel};
use crate::error::{Error, Result};
use crate::pipeline::config::Device;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which build of a registered model to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    /// Full-precision weights
    Standard,
    /// CPU-oriented ONNX export
    Fast,
}

/// Resolves a model name or path to a local weight file.
///
/// Implementations must be idempotent and safe to call concurrently: a first
/// call may download, later calls return the same path.
pub trait WeightResolver: Send + Sync {
    /// Resolve `model_name` (a registered name or a filesystem path).
    fn resolve(&self, model_name: &str, variant: ModelVariant) -> Result<PathBuf>;
}

impl<T: WeightResolver + ?Sized> WeightResolver for Arc<T> {
    fn resolve(&self, model_name: &str, variant: ModelVariant) -> Result<PathBuf> {
        (**self).resolve(model_name, variant)
    }
}

/// Loads detection models from weight files.
pub trait ModelLoader: Send + Sync {
    /// Load the weights at `weights` as a `backend` model on `device`.
    fn load(&self, backend: Backend, weights: &Path, device: Device)
        -> Result<Box<dyn DetectionModel>>;

    /// Whether a weight file with this name can be loaded at all.
    ///
    /// Checked against registered file names before anything is downloaded.
    fn supports(&self, _weights: &Path) -> bool {
        true
    }
}

/// Model loader used when no runtime is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRuntimeLoader;

impl ModelLoader for NoRuntimeLoader {
    fn load(
        &self,
        backend: Backend,
        weights: &Path,
        _device: Device,
    ) -> Result<Box<dyn DetectionModel>> {
        Err(Error::Unsupported(format!(
            "cannot load {} model {}: built without the `onnx` feature",
            backend,
            weights.display()
        )))
    }
}

/// The process-wide hub cache.
///
/// Every pipeline built with defaults resolves through this one instance, so
/// a model is downloaded at most once per process.
#[cfg(feature = "hub")]
pub fn shared_hub_cache() -> Arc<HubWeightCache> {
    static HUB: std::sync::OnceLock<Arc<HubWeightCache>> = std::sync::OnceLock::new();
    Arc::clone(HUB.get_or_init(|| Arc::new(HubWeightCache::hub())))
}

/// The weight resolver for this build.
pub fn default_weight_resolver() -> Box<dyn WeightResolver> {
    #[cfg(feature = "hub")]
    {
        Box::new(shared_hub_cache())
    }
    #[cfg(not(feature = "hub"))]
    {
        Box::new(LocalWeights)
    }
}

/// The model loader for this build.
pub fn default_model_loader() -> Box<dyn ModelLoader> {
    #[cfg(feature = "onnx")]
    {
        Box::new(OnnxModelLoader::new())
    }
    #[cfg(not(feature = "onnx"))]
    {
        Box::new(NoRuntimeLoader)
    }
}
