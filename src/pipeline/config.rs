//! Configuration for the form preparation pipeline.
//!
//! Settings are grouped by stage: rendering, detection and reading order.
//! [`FormConfig`] ties them together with the field-synthesis options.
//! Every struct implements `Default` with the values the command-line tool
//! uses and can be loaded from JSON, with missing keys falling back to those
//! defaults.

use crate::error::{Error, Result};
use crate::pipeline::reading_order::DEFAULT_LINE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Compute device requested for model inference.
///
/// Parsed from the strings accepted on the command line: `cpu`, `cuda` and
/// `cuda:N`. A bare integer is read as a CUDA ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    /// Run on the CPU
    #[default]
    Cpu,
    /// Run on the CUDA device with the given ordinal
    Cuda(u32),
}

impl Device {
    /// Whether this device is the CPU.
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda(0)),
            other => {
                let ordinal = other.strip_prefix("cuda:").unwrap_or(other);
                ordinal
                    .parse::<u32>()
                    .map(Device::Cuda)
                    .map_err(|_| Error::InvalidConfig(format!("unknown device '{}'", s)))
            },
        }
    }
}

impl TryFrom<String> for Device {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

/// Reading order strategy type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingOrderStrategyType {
    /// Group widgets into visual lines, then order each line left to right
    #[default]
    LineGrouping,
    /// Sort by top edge then left edge, without line grouping
    RowMajor,
}

/// Reading order configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingOrderConfig {
    /// Strategy to use for ordering widgets on a page
    pub strategy: ReadingOrderStrategyType,
    /// Maximum vertical distance, in page-height units, between a widget's
    /// top edge and its line's first widget for both to share the line
    pub line_threshold: f32,
}

impl Default for ReadingOrderConfig {
    fn default() -> Self {
        Self {
            strategy: ReadingOrderStrategyType::default(),
            line_threshold: DEFAULT_LINE_THRESHOLD,
        }
    }
}

impl ReadingOrderConfig {
    /// Set the reading order strategy.
    pub fn with_strategy(mut self, strategy: ReadingOrderStrategyType) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the line grouping threshold.
    pub fn with_line_threshold(mut self, line_threshold: f32) -> Self {
        self.line_threshold = line_threshold;
        self
    }
}

/// Detection stage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Registered model name (`FFDetr`, `FFDNet-S`, `FFDNet-L`) or a path to local weights
    pub model: String,
    /// Inference device
    pub device: Device,
    /// Minimum detection confidence
    pub confidence: f32,
    /// Model input resolution in pixels (longest side)
    pub image_size: u32,
    /// Number of pages submitted to the model per call
    pub batch_size: usize,
    /// Use the CPU-oriented fast variant of the model
    pub fast: bool,
    /// IoU above which overlapping detections are treated as duplicates,
    /// regardless of their predicted class
    pub suppression_threshold: f32,
}

/// Default class-agnostic duplicate suppression threshold.
pub const DEFAULT_SUPPRESSION_THRESHOLD: f32 = 0.1;

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model: "FFDetr".to_string(),
            device: Device::Cpu,
            confidence: 0.4,
            image_size: 1024,
            batch_size: 4,
            fast: false,
            suppression_threshold: DEFAULT_SUPPRESSION_THRESHOLD,
        }
    }
}

impl DetectionConfig {
    /// Set the model name or weight path.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the inference device.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Set the confidence threshold.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the model input resolution.
    pub fn with_image_size(mut self, image_size: u32) -> Self {
        self.image_size = image_size;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable the fast model variant.
    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    /// Set the duplicate suppression threshold.
    pub fn with_suppression_threshold(mut self, threshold: f32) -> Self {
        self.suppression_threshold = threshold;
        self
    }
}

/// Page rasterization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output resolution in dots per inch
    pub dpi: f32,
}

/// Default rendering resolution (2x the PDF user-space unit).
pub const DEFAULT_RENDER_DPI: f32 = 144.0;

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_RENDER_DPI,
        }
    }
}

impl RenderConfig {
    /// Set the rendering resolution.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Scale factor from PDF points (1/72 in) to pixels.
    pub fn scale(&self) -> f32 {
        self.dpi / 72.0
    }
}

/// Full configuration for one `prepare_form` run.
///
/// # Examples
///
/// ```
/// use commonforms::pipeline::config::{Device, FormConfig};
///
/// let config = FormConfig::default()
///     .with_model("FFDNet-L")
///     .with_device(Device::Cuda(0))
///     .with_multiline(true);
///
/// assert_eq!(config.detection.model, "FFDNet-L");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Detection settings
    pub detection: DetectionConfig,
    /// Reading order settings
    pub reading_order: ReadingOrderConfig,
    /// Rendering settings
    pub render: RenderConfig,
    /// Keep fields already present in the input document
    pub keep_existing_fields: bool,
    /// Create signature fields for detected signature blocks instead of text fields
    pub use_signature_fields: bool,
    /// Create text fields with the multiline flag set
    pub multiline: bool,
}

impl FormConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Keys missing from the file take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: FormConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let detection = &self.detection;
        if detection.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&detection.confidence) {
            return Err(Error::InvalidConfig(format!(
                "confidence must be within [0, 1], got {}",
                detection.confidence
            )));
        }
        if detection.image_size == 0 {
            return Err(Error::InvalidConfig("image_size must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&detection.suppression_threshold) {
            return Err(Error::InvalidConfig(format!(
                "suppression_threshold must be within [0, 1], got {}",
                detection.suppression_threshold
            )));
        }
        if detection.model.trim().is_empty() {
            return Err(Error::InvalidConfig("model must not be empty".to_string()));
        }
        if !(self.reading_order.line_threshold >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "line_threshold must be non-negative, got {}",
                self.reading_order.line_threshold
            )));
        }
        if !(self.render.dpi > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "dpi must be positive, got {}",
                self.render.dpi
            )));
        }
        Ok(())
    }

    /// Set the model name or weight path.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.detection.model = model.into();
        self
    }

    /// Set the inference device.
    pub fn with_device(mut self, device: Device) -> Self {
        self.detection.device = device;
        self
    }

    /// Set the confidence threshold.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.detection.confidence = confidence;
        self
    }

    /// Set the model input resolution.
    pub fn with_image_size(mut self, image_size: u32) -> Self {
        self.detection.image_size = image_size;
        self
    }

    /// Set the detection batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.detection.batch_size = batch_size;
        self
    }

    /// Enable or disable the fast model variant.
    pub fn with_fast(mut self, fast: bool) -> Self {
        self.detection.fast = fast;
        self
    }

    /// Keep or clear fields already present in the input.
    pub fn with_keep_existing_fields(mut self, keep: bool) -> Self {
        self.keep_existing_fields = keep;
        self
    }

    /// Create real signature fields for signature detections.
    pub fn with_signature_fields(mut self, enabled: bool) -> Self {
        self.use_signature_fields = enabled;
        self
    }

    /// Create multiline text fields.
    pub fn with_multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// Replace the detection settings.
    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }

    /// Replace the reading order settings.
    pub fn with_reading_order(mut self, reading_order: ReadingOrderConfig) -> Self {
        self.reading_order = reading_order;
        self
    }

    /// Replace the rendering settings.
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli() {
        let config = FormConfig::default();
        assert_eq!(config.detection.model, "FFDetr");
        assert_eq!(config.detection.device, Device::Cpu);
        assert_eq!(config.detection.confidence, 0.4);
        assert_eq!(config.detection.image_size, 1024);
        assert_eq!(config.detection.batch_size, 4);
        assert!(!config.detection.fast);
        assert!(!config.keep_existing_fields);
        assert!(!config.use_signature_fields);
        assert!(!config.multiline);
        assert_eq!(config.reading_order.line_threshold, 0.01);
        assert_eq!(config.detection.suppression_threshold, 0.1);
        assert_eq!(config.render.dpi, 144.0);
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CPU".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!("cuda:1".parse::<Device>().unwrap(), Device::Cuda(1));
        assert_eq!("2".parse::<Device>().unwrap(), Device::Cuda(2));
        assert!("tpu".parse::<Device>().is_err());
        assert!("cuda:x".parse::<Device>().is_err());
    }

    #[test]
    fn test_device_display_round_trips() {
        for device in [Device::Cpu, Device::Cuda(3)] {
            assert_eq!(device.to_string().parse::<Device>().unwrap(), device);
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = FormConfig::default().with_batch_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let config = FormConfig::default().with_confidence(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_line_threshold_rejected() {
        let config = FormConfig::default()
            .with_reading_order(ReadingOrderConfig::default().with_line_threshold(f32::NAN));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_section_builders_replace_whole_sections() {
        let config = FormConfig::default()
            .with_detection(DetectionConfig::default().with_model("FFDNet-S").with_fast(true))
            .with_render(RenderConfig::default().with_dpi(72.0));
        assert_eq!(config.detection.model, "FFDNet-S");
        assert!(config.detection.fast);
        assert_eq!(config.render.scale(), 1.0);
        assert!(config.validate().is_ok());

        let config = config.with_render(RenderConfig::default().with_dpi(0.0));
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "detection": { "model": "FFDNet-S", "fast": true, "device": "cuda:0" },
            "multiline": true,
            "reading_order": { "strategy": "row_major" }
        }"#;
        let config: FormConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.detection.model, "FFDNet-S");
        assert!(config.detection.fast);
        assert_eq!(config.detection.device, Device::Cuda(0));
        assert_eq!(config.detection.confidence, 0.4);
        assert!(config.multiline);
        assert_eq!(config.reading_order.strategy, ReadingOrderStrategyType::RowMajor);
        assert_eq!(config.reading_order.line_threshold, 0.01);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "detection": { "batch_size": 8 } }"#).unwrap();

        let config = FormConfig::from_json_file(&path).unwrap();
        assert_eq!(config.detection.batch_size, 8);
    }

    #[test]
    fn test_from_json_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "detection": { "batch_size": 0 } }"#).unwrap();

        assert!(FormConfig::from_json_file(&path).is_err());
    }

    #[test]
    fn test_render_scale() {
        assert_eq!(RenderConfig::default().scale(), 2.0);
    }
}
