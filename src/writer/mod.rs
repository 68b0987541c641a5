//! Field writing for detected widgets.
//!
//! The pipeline talks to a [`FormWriter`] opened by a [`FormWriterFactory`];
//! the bundled implementation is [`AcroFormWriter`], which edits the input
//! document with `lopdf`.
//!
//! ## Architecture
//!
//! ```text
//! (name, page, BoundingBox)
//!     ↓
//! [AcroFormWriter] (normalized box → page units via MediaBox/CropBox/Rotate)
//!     ↓
//! [form_fields] (TextFieldWidget / CheckboxWidget / SignatureFieldWidget)
//!     ↓
//! [AcroFormBuilder] (merged into the catalog's /AcroForm on save)
//!     ↓
//! PDF file
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use commonforms::geometry::BoundingBox;
//! use commonforms::writer::{AcroFormWriter, FormWriter};
//!
//! let mut writer = AcroFormWriter::open("flat.pdf")?;
//! writer.add_text_box("textbox_0_0", 0, &BoundingBox::new(0.1, 0.1, 0.5, 0.15), false)?;
//! writer.save("fillable.pdf".as_ref())?;
//! ```

mod acroform;
pub mod form_fields;
mod form_writer;
mod multiline;

pub use acroform::{standard_font, AcroFormBuilder, DEFAULT_APPEARANCE, STANDARD_FORM_FONTS};
pub use form_fields::{
    ButtonFieldFlags, CheckboxWidget, FieldAppearance, FormAppearanceGenerator,
    FormFieldWidget, SignatureFieldWidget, TextFieldFlags, TextFieldWidget,
};
pub use form_writer::{AcroFormWriter, AcroFormWriterFactory};
pub use multiline::{enable_multiline_fields, set_multiline_flags};

use crate::error::Result;
use crate::geometry::BoundingBox;
use std::path::Path;

/// Persists form fields into a document.
///
/// Boxes are normalized to the page's displayed orientation; implementations
/// convert them to page units. A box that can't be placed is reported as
/// [`Error::Placement`](crate::Error::Placement) so callers can skip it.
pub trait FormWriter {
    /// Number of pages in the opened document.
    fn page_count(&self) -> usize;

    /// Remove every existing widget annotation and the document's form.
    fn clear_existing_fields(&mut self) -> Result<()>;

    /// Add a text field.
    fn add_text_box(&mut self, name: &str, page: usize, bbox: &BoundingBox, multiline: bool) -> Result<()>;

    /// Add an unchecked checkbox.
    fn add_checkbox(&mut self, name: &str, page: usize, bbox: &BoundingBox) -> Result<()>;

    /// Add an unsigned signature field.
    fn add_signature(&mut self, name: &str, page: usize, bbox: &BoundingBox) -> Result<()>;

    /// Write the document with all added fields to `path`.
    fn save(&mut self, path: &Path) -> Result<()>;

    /// Release the document. Safe to call more than once.
    fn close(&mut self);
}

/// Opens a [`FormWriter`] on an input document.
pub trait FormWriterFactory: Send + Sync {
    /// Open `path` for field writing.
    fn open(&self, path: &Path) -> Result<Box<dyn FormWriter>>;
}
