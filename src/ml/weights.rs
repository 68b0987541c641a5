//! Model registry and weight resolution.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{ModelVariant, WeightResolver};

/// Location of a registered model on the Hugging Face hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelSource {
    /// Repository id, e.g. `jbarrow/FFDNet-S`
    pub repo_id: &'static str,
    /// File within the repository
    pub filename: &'static str,
}

const REGISTRY: &[(&str, ModelVariant, ModelSource)] = &[
    (
        "FFDNET-S",
        ModelVariant::Fast,
        ModelSource {
            repo_id: "jbarrow/FFDNet-S-cpu",
            filename: "FFDNet-S.onnx",
        },
    ),
    (
        "FFDNET-S",
        ModelVariant::Standard,
        ModelSource {
            repo_id: "jbarrow/FFDNet-S",
            filename: "FFDNet-S.pt",
        },
    ),
    (
        "FFDNET-L",
        ModelVariant::Fast,
        ModelSource {
            repo_id: "jbarrow/FFDNet-L-cpu",
            filename: "FFDNet-L.onnx",
        },
    ),
    (
        "FFDNET-L",
        ModelVariant::Standard,
        ModelSource {
            repo_id: "jbarrow/FFDNet-L",
            filename: "FFDNet-L.pt",
        },
    ),
    (
        "FFDETR",
        ModelVariant::Standard,
        ModelSource {
            repo_id: "jbarrow/FFDetr",
            filename: "FFDetr.pth",
        },
    ),
];

/// Look up a registered model name (case-insensitive).
///
/// FFDetr has a single build, so it resolves the same for either variant.
/// Returns `None` for names that are not registered; those are treated as
/// local paths.
///
/// # Examples
///
/// ```
/// use commonforms::ml::{registered_model, ModelVariant};
///
/// let source = registered_model("ffdnet-s", ModelVariant::Fast).unwrap();
/// assert_eq!(source.repo_id, "jbarrow/FFDNet-S-cpu");
/// assert_eq!(source.filename, "FFDNet-S.onnx");
///
/// assert!(registered_model("./my-weights.onnx", ModelVariant::Standard).is_none());
/// ```
pub fn registered_model(name: &str, variant: ModelVariant) -> Option<ModelSource> {
    let upper = name.trim().to_ascii_uppercase();
    let variant = if upper == "FFDETR" {
        ModelVariant::Standard
    } else {
        variant
    };

    REGISTRY
        .iter()
        .find(|(key, v, _)| *key == upper && *v == variant)
        .map(|(_, _, source)| *source)
}

fn resolve_local(model_name: &str) -> Result<PathBuf> {
    let path = Path::new(model_name);
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(Error::WeightFetch {
            model: model_name.to_string(),
            reason: "not a registered model name and no such file".to_string(),
        })
    }
}

/// Resolver that only accepts paths to existing weight files.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalWeights;

impl WeightResolver for LocalWeights {
    fn resolve(&self, model_name: &str, variant: ModelVariant) -> Result<PathBuf> {
        if let Some(source) = registered_model(model_name, variant) {
            // A file with the registered name in the working directory still wins.
            if Path::new(model_name).is_file() {
                return Ok(PathBuf::from(model_name));
            }
            return Err(Error::WeightFetch {
                model: model_name.to_string(),
                reason: format!(
                    "{}/{} must be downloaded; build with the `hub` feature or pass a local path",
                    source.repo_id, source.filename
                ),
            });
        }
        resolve_local(model_name)
    }
}

type Slot = Arc<Mutex<Option<PathBuf>>>;

/// Resolver that fetches registered models once per process.
///
/// The first request for a [`ModelSource`] runs `fetch` while holding a
/// per-source lock, so concurrent first calls for the same model wait for a
/// single download instead of racing. Requests for different models proceed
/// in parallel. Failed fetches are not cached.
pub struct CachedWeights<F> {
    fetch: F,
    slots: Mutex<HashMap<ModelSource, Slot>>,
}

impl<F> CachedWeights<F>
where
    F: Fn(&ModelSource) -> Result<PathBuf> + Send + Sync,
{
    /// Create a cache around a fetch function.
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, source: ModelSource) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(source).or_default().clone()
    }

    fn fetch_once(&self, source: ModelSource) -> Result<PathBuf> {
        let slot = self.slot(source);
        let mut cached = slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(path) = cached.as_ref() {
            return Ok(path.clone());
        }

        log::info!("Fetching {}/{}", source.repo_id, source.filename);
        let path = (self.fetch)(&source)?;
        *cached = Some(path.clone());
        Ok(path)
    }
}

impl<F> WeightResolver for CachedWeights<F>
where
    F: Fn(&ModelSource) -> Result<PathBuf> + Send + Sync,
{
    fn resolve(&self, model_name: &str, variant: ModelVariant) -> Result<PathBuf> {
        match registered_model(model_name, variant) {
            Some(source) => self.fetch_once(source),
            None => resolve_local(model_name),
        }
    }
}

/// Weight cache backed by the Hugging Face hub.
#[cfg(feature = "hub")]
pub type HubWeightCache = CachedWeights<fn(&ModelSource) -> Result<PathBuf>>;

#[cfg(feature = "hub")]
impl CachedWeights<fn(&ModelSource) -> Result<PathBuf>> {
    /// Create a cache that downloads through `hf-hub`.
    ///
    /// Files land in the standard hub cache directory, so later processes
    /// reuse them without downloading.
    pub fn hub() -> Self {
        Self::new(fetch_from_hub)
    }
}

#[cfg(feature = "hub")]
fn fetch_from_hub(source: &ModelSource) -> Result<PathBuf> {
    use hf_hub::api::sync::ApiBuilder;

    let fetch_error = |reason: String| Error::WeightFetch {
        model: format!("{}/{}", source.repo_id, source.filename),
        reason,
    };

    let api = ApiBuilder::new()
        .with_progress(true)
        .build()
        .map_err(|e| fetch_error(e.to_string()))?;

    api.model(source.repo_id.to_string())
        .get(source.filename)
        .map_err(|e| fetch_error(e.to_string()))
}
