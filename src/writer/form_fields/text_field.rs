//! Text input fields (`FT Tx`).
//!
//! ```
//! use commonforms::geometry::Rect;
//! use commonforms::writer::form_fields::{FormFieldWidget, TextFieldWidget};
//!
//! let field = TextFieldWidget::new("textbox_0_0", Rect::new(72.0, 700.0, 200.0, 20.0)).multiline();
//! assert_eq!(field.field_flags(), 4096);
//! ```

use super::{rect_array, FieldAppearance, FormAppearanceGenerator, FormFieldWidget, TextFieldFlags};
use crate::geometry::Rect;
use crate::writer::DEFAULT_APPEARANCE;
use lopdf::{Dictionary, Object, ObjectId};

/// An empty, unstyled text field.
///
/// Detected boxes come in every size, so `/DA` uses Helvetica at font size 0
/// and the viewer fits text to the field height.
#[derive(Debug, Clone)]
pub struct TextFieldWidget {
    name: String,
    rect: Rect,
    flags: TextFieldFlags,
}

impl TextFieldWidget {
    /// Single-line field in auto-sized Helvetica.
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
            flags: TextFieldFlags::empty(),
        }
    }

    /// Allow line breaks and wrapping.
    pub fn multiline(mut self) -> Self {
        self.flags |= TextFieldFlags::MULTILINE;
        self
    }
}

impl FormFieldWidget for TextFieldWidget {
    fn field_name(&self) -> &str {
        &self.name
    }

    fn rect(&self) -> Rect {
        self.rect
    }

    fn field_type(&self) -> &'static str {
        "Tx"
    }

    fn field_flags(&self) -> u32 {
        self.flags.bits()
    }

    fn build_field_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("FT", "Tx");
        dict.set("T", Object::string_literal(self.name.as_str()));
        if !self.flags.is_empty() {
            dict.set("Ff", self.flags.bits() as i64);
        }
        dict.set("DA", Object::string_literal(DEFAULT_APPEARANCE));
        dict
    }

    fn build_widget_dict(&self, page_ref: ObjectId) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", "Annot");
        dict.set("Subtype", "Widget");
        dict.set("Rect", rect_array(&self.rect));
        dict.set("P", Object::Reference(page_ref));
        // Print
        dict.set("F", Object::Integer(4));
        dict
    }

    fn appearance(&self) -> FieldAppearance {
        FieldAppearance::Single(FormAppearanceGenerator::new().empty_text_appearance(self.rect))
    }
}
