//! Interactive form field widgets.
//!
//! Builders for the field kinds the pipeline creates, per ISO 32000-1:2008
//! Section 12.7 (Interactive Forms). Each builder produces lopdf dictionaries;
//! the [`AcroFormWriter`](crate::writer::AcroFormWriter) decides where they go.
//!
//! # Supported Field Types
//!
//! - **Text Fields** (`TextFieldWidget`): single-line and multiline text input
//! - **Checkboxes** (`CheckboxWidget`): on/off button fields
//! - **Signature Fields** (`SignatureFieldWidget`): unsigned signature placeholders
//!
//! # Example
//!
//! ```
//! use commonforms::geometry::Rect;
//! use commonforms::writer::form_fields::{CheckboxWidget, FormFieldWidget, TextFieldWidget};
//!
//! let name_field = TextFieldWidget::new("textbox_0_0", Rect::new(72.0, 700.0, 200.0, 20.0))
//!     .multiline();
//! let agree = CheckboxWidget::new("choicebutton_0_1", Rect::new(72.0, 650.0, 15.0, 15.0));
//!
//! assert_eq!(name_field.field_type(), "Tx");
//! assert_eq!(agree.field_type(), "Btn");
//! ```

mod checkbox;
mod field_flags;
mod form_appearance;
mod signature_field;
mod text_field;

pub use checkbox::CheckboxWidget;
pub use field_flags::{ButtonFieldFlags, TextFieldFlags};
pub use form_appearance::{appearance_stream, FieldAppearance, FormAppearanceGenerator};
pub use signature_field::SignatureFieldWidget;
pub use text_field::TextFieldWidget;

use crate::geometry::Rect;
use lopdf::{Dictionary, Object, ObjectId};

/// Common trait for all form field widgets.
///
/// Fields are written as merged field/widget dictionaries: one object that is
/// both the terminal field and its only widget annotation.
pub trait FormFieldWidget {
    /// Get the field name (partial name, `/T`).
    fn field_name(&self) -> &str;

    /// Get the bounding rectangle of the field's widget annotation.
    fn rect(&self) -> Rect;

    /// Build the field dictionary entries.
    fn build_field_dict(&self) -> Dictionary;

    /// Build the widget annotation dictionary entries.
    fn build_widget_dict(&self, page_ref: ObjectId) -> Dictionary;

    /// Get the field type name (Tx, Btn, Sig).
    fn field_type(&self) -> &'static str;

    /// Get the field flags value.
    fn field_flags(&self) -> u32;

    /// Normal appearance content for the widget.
    fn appearance(&self) -> FieldAppearance;

    /// Field and widget entries merged into one dictionary.
    fn build_merged_dict(&self, page_ref: ObjectId) -> Dictionary {
        let mut dict = self.build_field_dict();
        for (key, value) in self.build_widget_dict(page_ref).iter() {
            dict.set(key.clone(), value.clone());
        }
        dict
    }
}

/// `/Rect` array for a widget.
pub(crate) fn rect_array(rect: &Rect) -> Object {
    Object::Array(rect.to_pdf_array().iter().map(|&v| Object::Real(v)).collect())
}

/// RGB color array, e.g. for `/MK` entries.
pub(crate) fn rgb_array((r, g, b): (f32, f32, f32)) -> Object {
    Object::Array(vec![Object::Real(r), Object::Real(g), Object::Real(b)])
}

/// Appearance characteristics (`/MK`) with a border color and no background.
pub(crate) fn appearance_characteristics(border_color: (f32, f32, f32)) -> Dictionary {
    let mut mk = Dictionary::new();
    mk.set("BC", rgb_array(border_color));
    mk
}

/// Solid border style (`/BS`) of the given width.
pub(crate) fn border_style(width: f32) -> Dictionary {
    let mut bs = Dictionary::new();
    bs.set("W", Object::Real(width));
    bs.set("S", Object::Name(b"S".to_vec()));
    bs
}
