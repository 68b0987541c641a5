//! Unsigned signature field widget.
//!
//! Implements signature fields per ISO 32000-1:2008 Section 12.7.4.5. The
//! field carries no `/V`; a signing tool fills it later.

use super::{rect_array, FieldAppearance, FormAppearanceGenerator, FormFieldWidget};
use crate::geometry::Rect;
use lopdf::{Dictionary, Object, ObjectId};

/// Borderless signature placeholder widget.
#[derive(Debug, Clone)]
pub struct SignatureFieldWidget {
    name: String,
    rect: Rect,
}

impl SignatureFieldWidget {
    /// Create a new signature field.
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
        }
    }
}

impl FormFieldWidget for SignatureFieldWidget {
    fn field_name(&self) -> &str {
        &self.name
    }

    fn rect(&self) -> Rect {
        self.rect
    }

    fn field_type(&self) -> &'static str {
        "Sig"
    }

    fn field_flags(&self) -> u32 {
        0
    }

    fn build_field_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("FT", "Sig");
        dict.set("T", Object::string_literal(self.name.as_str()));
        dict
    }

    fn build_widget_dict(&self, page_ref: ObjectId) -> Dictionary {
        let mut dict = Dictionary::new();

        dict.set("Type", "Annot");
        dict.set("Subtype", "Widget");
        dict.set("Rect", rect_array(&self.rect));
        dict.set("P", Object::Reference(page_ref));
        dict.set("F", Object::Integer(4));
        dict
    }

    fn appearance(&self) -> FieldAppearance {
        FieldAppearance::Single(FormAppearanceGenerator::new().frame(self.rect))
    }
}
