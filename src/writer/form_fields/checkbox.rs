//! Checkbox widget for PDF forms.
//!
//! Implements checkbox fields per ISO 32000-1:2008 Section 12.7.4.2.
//!
//! # Example
//!
//! ```
//! use commonforms::geometry::Rect;
//! use commonforms::writer::form_fields::CheckboxWidget;
//!
//! let checkbox = CheckboxWidget::new("choicebutton_0_1", Rect::new(72.0, 700.0, 15.0, 15.0));
//! assert!(!checkbox.is_checked());
//! assert_eq!(checkbox.export_value(), "Yes");
//! ```

use super::{
    appearance_characteristics, border_style, rect_array, ButtonFieldFlags, FieldAppearance,
    FormAppearanceGenerator, FormFieldWidget,
};
use crate::geometry::Rect;
use lopdf::{Dictionary, Object, ObjectId};

/// Border and check mark color.
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);

/// Border width in points.
const BORDER_WIDTH: f32 = 1.0;

/// A checkbox field widget.
///
/// Checkboxes are button fields that toggle between two states: on and off.
/// The appearance is a thin black square with a black checkmark when checked.
#[derive(Debug, Clone)]
pub struct CheckboxWidget {
    /// Field name (unique identifier)
    name: String,
    /// Bounding rectangle for the widget
    rect: Rect,
    /// Whether the checkbox is checked
    checked: bool,
    /// Export value when checked (default: "Yes")
    export_value: String,
}

impl CheckboxWidget {
    /// Create a new, unchecked checkbox.
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
            checked: false,
            export_value: "Yes".to_string(),
        }
    }

    /// Set the checkbox as checked.
    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    /// Set the export value (value submitted when checked).
    pub fn with_export_value(mut self, value: impl Into<String>) -> Self {
        self.export_value = value.into();
        self
    }

    /// Whether the checkbox starts checked.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Value submitted when checked.
    pub fn export_value(&self) -> &str {
        &self.export_value
    }

    fn state_name(&self) -> &str {
        if self.checked {
            &self.export_value
        } else {
            "Off"
        }
    }
}

impl FormFieldWidget for CheckboxWidget {
    fn field_name(&self) -> &str {
        &self.name
    }

    fn rect(&self) -> Rect {
        self.rect
    }

    fn field_type(&self) -> &'static str {
        "Btn"
    }

    fn field_flags(&self) -> u32 {
        // Neither RADIO nor PUSHBUTTON
        ButtonFieldFlags::empty().bits()
    }

    fn build_field_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        dict.set("FT", "Btn");
        dict.set("T", Object::string_literal(self.name.as_str()));

        let value = Object::Name(self.state_name().as_bytes().to_vec());
        dict.set("V", value.clone());
        dict.set("DV", value);

        dict
    }

    fn build_widget_dict(&self, page_ref: ObjectId) -> Dictionary {
        let mut dict = Dictionary::new();

        dict.set("Type", "Annot");
        dict.set("Subtype", "Widget");
        dict.set("Rect", rect_array(&self.rect));
        dict.set("P", Object::Reference(page_ref));
        dict.set("F", Object::Integer(4));
        dict.set("AS", Object::Name(self.state_name().as_bytes().to_vec()));

        dict.set("BS", border_style(BORDER_WIDTH));

        let mut mk = appearance_characteristics(BLACK);
        // ZapfDingbats checkmark
        mk.set("CA", Object::string_literal("4"));
        dict.set("MK", mk);

        dict
    }

    fn appearance(&self) -> FieldAppearance {
        let (r, g, b) = BLACK;
        let generator = FormAppearanceGenerator::new().with_border(BORDER_WIDTH, r, g, b);
        FieldAppearance::OnOff {
            on_state: self.export_value.clone(),
            on: generator.checkbox_on_appearance(self.rect),
            off: generator.checkbox_off_appearance(self.rect),
        }
    }
}
