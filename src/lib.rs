//! # CommonForms
//!
//! Turn flat PDFs into fillable forms: render each page, detect form widgets
//! with an object detector, order them the way a keyboard user tabs through a
//! form, and write AcroForm fields back onto the original document.
//!
//! ## Core Features
//!
//! - **Detection**: FFDNet (YOLO-style) and FFDetr (DETR-style) detectors
//!   behind one [`Detector`](detection::Detector) trait, with class-agnostic
//!   duplicate suppression
//! - **Reading Order**: line-grouping sort with a configurable threshold
//!   ([`LineGroupingStrategy`](pipeline::LineGroupingStrategy))
//! - **Field Writing**: text boxes, checkboxes and signature fields written
//!   with `lopdf`, honoring CropBox and `/Rotate`
//! - **Model Weights**: registry of published models, fetched once from the
//!   Hugging Face hub (`hub` feature)
//!
//! ## Cargo Features
//!
//! - `rendering`: rasterize pages with pdfium
//! - `onnx`: run detectors through ONNX Runtime
//! - `hub`: download registered weights
//! - `full`: all of the above, required by the `commonforms` binary
//!
//! ## Quick Start
//!
//! ```ignore
//! use commonforms::{prepare_form, FormConfig};
//!
//! let config = FormConfig::default()
//!     .with_model("FFDNet-L")
//!     .with_fast(true)
//!     .with_signature_fields(true);
//!
//! let report = prepare_form("flat.pdf".as_ref(), "fillable.pdf".as_ref(), &config)?;
//! println!("wrote {} fields", report.field_count());
//! ```
//!
//! ## Custom Collaborators
//!
//! Every stage is a trait object. [`FormPipeline::new`](pipeline::FormPipeline::new)
//! takes a [`Renderer`](rendering::Renderer), a
//! [`WeightResolver`](ml::WeightResolver), a [`ModelLoader`](ml::ModelLoader)
//! and a [`FormWriterFactory`](writer::FormWriterFactory), so the pipeline
//! runs unchanged against other rasterizers, runtimes or PDF libraries.
//!
//! ## License
//!
//! MIT OR Apache-2.0.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Geometry and detected widgets
pub mod geometry;
pub mod widget;

// Detection and model runtime
pub mod detection;
pub mod ml;

// Page rasterization
pub mod rendering;

// Orchestration, configuration and reading order
pub mod pipeline;

// Field writing
pub mod writer;

pub use error::{Error, RenderError, Result};
pub use geometry::{BoundingBox, Page};
pub use pipeline::{prepare_form, FieldKind, FormConfig, FormPipeline, FormReport};
pub use widget::{DetectionResult, Widget, WidgetType};
pub use writer::enable_multiline_fields;

// Internal utilities
pub(crate) mod utils {
    use std::cmp::Ordering;

    /// Total order on `f32` for sort keys coming out of model output.
    ///
    /// NaN sorts after every number (including +inf) and compares equal to
    /// itself, whatever its sign bit.
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.total_cmp(&b),
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_manifest() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "commonforms");
    }
}
