//! Form preparation pipeline.
//!
//! Turns a flat PDF into a fillable one:
//!
//! ```text
//! PDF File
//!     ↓
//! [Renderer] (pages → raster images)
//!     ↓
//! [Detector] (images → widgets, duplicate suppression)
//!     ↓
//! [ReadingOrderStrategy] (per-page tab order)
//!     ↓
//! [FieldKind::for_widget] (widget type → field kind)
//!     ↓
//! [FormWriter] (fields written onto the original pages)
//!     ↓
//! Fillable PDF
//! ```
//!
//! Every collaborator is a trait object, so [`FormPipeline::new`] can run the
//! whole flow against in-memory fakes.

pub mod config;
pub mod reading_order;

pub use config::{
    Device, DetectionConfig, FormConfig, ReadingOrderConfig, ReadingOrderStrategyType,
    RenderConfig,
};
pub use reading_order::{
    create_strategy, LineGroupingStrategy, ReadingOrderStrategy, RowMajorStrategy,
};

use crate::detection::{create_detector, DetectionParams};
use crate::error::{Error, RenderError, Result};
use crate::ml::{default_model_loader, default_weight_resolver, ModelLoader, WeightResolver};
use crate::rendering::{default_renderer, Renderer};
use crate::widget::{widget_count, DetectionResult, Widget, WidgetType};
use crate::writer::{AcroFormWriterFactory, FormWriter, FormWriterFactory};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// Kind of form field written for a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Text input
    TextBox {
        /// Multiline flag set
        multiline: bool,
    },
    /// Checkbox
    Checkbox,
    /// Unsigned signature field
    Signature,
}

impl FieldKind {
    /// Field kind for a detected widget type under `config`.
    ///
    /// Signature blocks become single-line text boxes unless signature fields
    /// are enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::pipeline::{FieldKind, FormConfig};
    /// use commonforms::widget::WidgetType;
    ///
    /// let config = FormConfig::default().with_multiline(true);
    /// assert_eq!(
    ///     FieldKind::for_widget(WidgetType::Signature, &config),
    ///     FieldKind::TextBox { multiline: false }
    /// );
    /// assert_eq!(
    ///     FieldKind::for_widget(WidgetType::TextBox, &config),
    ///     FieldKind::TextBox { multiline: true }
    /// );
    /// ```
    pub fn for_widget(widget_type: WidgetType, config: &FormConfig) -> Self {
        match widget_type {
            WidgetType::TextBox => FieldKind::TextBox {
                multiline: config.multiline,
            },
            WidgetType::ChoiceButton => FieldKind::Checkbox,
            WidgetType::Signature if config.use_signature_fields => FieldKind::Signature,
            WidgetType::Signature => FieldKind::TextBox { multiline: false },
        }
    }
}

/// A field written to the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedField {
    /// Field name, `{type}_{page}_{index}`
    pub name: String,
    /// Zero-based page index
    pub page: usize,
    /// Kind of field written
    pub kind: FieldKind,
}

/// A widget that could not be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedWidget {
    /// Field name the widget would have had
    pub name: String,
    /// Zero-based page index
    pub page: usize,
    /// Why it was skipped
    pub reason: String,
}

/// Outcome of one [`FormPipeline::prepare_form`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormReport {
    /// Fields written, in page then reading order
    pub fields: Vec<PlacedField>,
    /// Widgets dropped at placement
    pub skipped: Vec<SkippedWidget>,
    /// Pages in the input document
    pub page_count: usize,
}

impl FormReport {
    /// Number of fields written.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of fields of `kind` written.
    pub fn count_of(&self, kind: FieldKind) -> usize {
        self.fields.iter().filter(|f| f.kind == kind).count()
    }
}

/// Closes the wrapped writer when dropped, whatever path the run takes.
struct WriterGuard(Box<dyn FormWriter>);

impl Deref for WriterGuard {
    type Target = dyn FormWriter;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl DerefMut for WriterGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

impl Drop for WriterGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// The form preparation pipeline with its collaborators.
pub struct FormPipeline {
    renderer: Box<dyn Renderer>,
    resolver: Box<dyn WeightResolver>,
    loader: Box<dyn ModelLoader>,
    writers: Box<dyn FormWriterFactory>,
    widgets_json: Option<PathBuf>,
}

impl FormPipeline {
    /// Create a pipeline from explicit collaborators.
    pub fn new(
        renderer: Box<dyn Renderer>,
        resolver: Box<dyn WeightResolver>,
        loader: Box<dyn ModelLoader>,
        writers: Box<dyn FormWriterFactory>,
    ) -> Self {
        Self {
            renderer,
            resolver,
            loader,
            writers,
            widgets_json: None,
        }
    }

    /// Create a pipeline from the collaborators compiled into this build.
    pub fn with_defaults(config: &FormConfig) -> Result<Self> {
        Ok(Self::new(
            default_renderer(config.render.dpi)?,
            default_weight_resolver(),
            default_model_loader(),
            Box::new(AcroFormWriterFactory),
        ))
    }

    /// Also write the detected widgets to `path` as JSON.
    pub fn with_widgets_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.widgets_json = Some(path.into());
        self
    }

    /// Render `input` and detect widgets, without writing anything.
    pub fn detect(&self, input: &Path, config: &FormConfig) -> Result<DetectionResult> {
        config.validate()?;
        self.detect_validated(input, config).map(|(result, _)| result)
    }

    fn detect_validated(&self, input: &Path, config: &FormConfig) -> Result<(DetectionResult, usize)> {
        let pages = match self.renderer.render(input) {
            Ok(pages) => pages,
            Err(RenderError::PasswordRequired) => {
                return Err(Error::EncryptedDocument {
                    path: input.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        log::info!("Rendered {} pages from {}", pages.len(), input.display());

        let mut detector = create_detector(
            &config.detection,
            &config.reading_order,
            self.resolver.as_ref(),
            self.loader.as_ref(),
        )?;
        let result = detector.extract_widgets(&pages, &DetectionParams::from(&config.detection))?;
        let rendered = pages.len();
        drop(pages);

        log::info!(
            "Detected {} widgets on {} of {} pages",
            widget_count(&result),
            result.len(),
            rendered
        );
        Ok((result, rendered))
    }

    /// Detect widgets in `input` and write a fillable copy to `output`.
    ///
    /// Nothing is written when the input is password-protected
    /// ([`Error::EncryptedDocument`]). Widgets whose box can't be placed are
    /// skipped and listed in [`FormReport::skipped`].
    pub fn prepare_form(&self, input: &Path, output: &Path, config: &FormConfig) -> Result<FormReport> {
        config.validate()?;
        let (result, rendered) = self.detect_validated(input, config)?;

        if let Some(ref path) = self.widgets_json {
            write_widgets_json(path, &result)?;
        }

        let mut writer = WriterGuard(self.writers.open(input)?);
        let page_count = writer.page_count();
        if page_count != rendered {
            log::warn!(
                "Renderer produced {} pages but the document has {}",
                rendered,
                page_count
            );
        }
        if let Some(&page) = result.keys().find(|&&page| page >= page_count) {
            return Err(Error::PageOutOfRange { page, page_count });
        }

        if !config.keep_existing_fields {
            writer.clear_existing_fields()?;
        }

        let mut report = FormReport {
            page_count,
            ..FormReport::default()
        };
        for (&page, widgets) in &result {
            for (index, widget) in widgets.iter().enumerate() {
                let name = widget.field_name(index);
                let kind = FieldKind::for_widget(widget.widget_type, config);
                match place(&mut writer, &name, page, widget, kind) {
                    Ok(()) => report.fields.push(PlacedField { name, page, kind }),
                    Err(e) if e.is_widget_local() => {
                        log::warn!("Skipping {} on page {}: {}", name, page, e);
                        report.skipped.push(SkippedWidget {
                            name,
                            page,
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        writer.save(output)?;
        log::info!(
            "Wrote {} fields ({} skipped) to {}",
            report.field_count(),
            report.skipped.len(),
            output.display()
        );
        Ok(report)
    }
}

/// Write one widget as a field of `kind`.
fn place(writer: &mut WriterGuard, name: &str, page: usize, widget: &Widget, kind: FieldKind) -> Result<()> {
    let bbox = &widget.bounding_box;
    if bbox.is_degenerate() {
        return Err(Error::Placement {
            name: name.to_string(),
            reason: "zero-area bounding box".to_string(),
        });
    }
    match kind {
        FieldKind::TextBox { multiline } => writer.add_text_box(name, page, bbox, multiline),
        FieldKind::Checkbox => writer.add_checkbox(name, page, bbox),
        FieldKind::Signature => writer.add_signature(name, page, bbox),
    }
}

fn write_widgets_json(path: &Path, result: &DetectionResult) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, result)?;
    log::info!("Wrote detected widgets to {}", path.display());
    Ok(())
}

/// Prepare a fillable form with the collaborators compiled into this build.
///
/// ```ignore
/// use commonforms::{prepare_form, FormConfig};
///
/// let report = prepare_form("flat.pdf".as_ref(), "fillable.pdf".as_ref(), &FormConfig::default())?;
/// println!("{} fields", report.field_count());
/// ```
pub fn prepare_form(input: &Path, output: &Path, config: &FormConfig) -> Result<FormReport> {
    FormPipeline::with_defaults(config)?.prepare_form(input, output, config)
}
