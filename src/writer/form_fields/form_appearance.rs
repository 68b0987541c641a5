//! Form field appearance stream generation.
//!
//! Generates visual appearance streams for interactive form fields.
//! These streams define how fields appear when printed or displayed.
//!
//! Note: When `NeedAppearances` is set in the AcroForm dictionary,
//! PDF viewers will regenerate appearances. This module provides
//! fallback appearances for compatibility.

use crate::geometry::Rect;
use lopdf::{dictionary, Object, Stream};

/// Normal appearance (`/AP /N`) content for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAppearance {
    /// One appearance stream
    Single(String),
    /// On/off pair for buttons, keyed by the on-state name
    OnOff {
        /// Name of the on state (e.g. "Yes")
        on_state: String,
        /// Content drawn when checked
        on: String,
        /// Content drawn when unchecked
        off: String,
    },
}

/// Generator for form field appearance streams.
///
/// Creates PDF content streams that define the visual appearance of form fields.
#[derive(Debug, Clone, Default)]
pub struct FormAppearanceGenerator {
    /// Border width
    border_width: f32,
    /// Border color (RGB)
    border_color: Option<(f32, f32, f32)>,
}

impl FormAppearanceGenerator {
    /// Create a new appearance generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set border style.
    pub fn with_border(mut self, width: f32, r: f32, g: f32, b: f32) -> Self {
        self.border_width = width;
        self.border_color = Some((r, g, b));
        self
    }

    /// Border frame, shared by every field kind.
    pub fn frame(&self, rect: Rect) -> String {
        let mut stream = String::new();

        let width = rect.width;
        let height = rect.height;

        if let Some((r, g, b)) = self.border_color {
            if self.border_width > 0.0 {
                stream.push_str(&format!("{} {} {} RG\n", r, g, b));
                stream.push_str(&format!("{} w\n", self.border_width));
                let half = self.border_width / 2.0;
                stream.push_str(&format!(
                    "{} {} {} {} re S\n",
                    half,
                    half,
                    width - self.border_width,
                    height - self.border_width
                ));
            }
        }

        stream
    }

    /// Appearance for an empty text or signature field.
    ///
    /// Wrapped in a `/Tx BMC` marked-content section so viewers that
    /// regenerate text know where to place it.
    pub fn empty_text_appearance(&self, rect: Rect) -> String {
        let mut stream = self.frame(rect);
        stream.push_str("/Tx BMC\nEMC\n");
        stream
    }

    /// Generate appearance stream for a checkbox (checked state).
    ///
    /// The checkmark is stroked in black over the frame.
    pub fn checkbox_on_appearance(&self, rect: Rect) -> String {
        let mut stream = self.frame(rect);

        let width = rect.width;
        let height = rect.height;

        // Checkmark
        let margin = width * 0.2;
        stream.push_str("0 0 0 RG\n");
        stream.push_str(&format!("{} w\n", width * 0.1));
        stream.push_str(&format!(
            "{} {} m {} {} l {} {} l S\n",
            margin,
            height * 0.5,
            width * 0.4,
            margin,
            width - margin,
            height - margin
        ));

        stream
    }

    /// Generate appearance stream for a checkbox (unchecked state).
    pub fn checkbox_off_appearance(&self, rect: Rect) -> String {
        self.frame(rect)
    }
}

/// Wrap appearance content in a form XObject sized to `rect`.
pub fn appearance_stream(rect: Rect, content: &str) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(rect.width),
                Object::Real(rect.height),
            ],
        },
        content.as_bytes().to_vec(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Rect {
        Rect::new(0.0, 0.0, 20.0, 10.0)
    }

    #[test]
    fn test_frame_without_style_is_empty() {
        assert!(FormAppearanceGenerator::new().frame(rect()).is_empty());
    }

    #[test]
    fn test_frame_with_border() {
        let generator = FormAppearanceGenerator::new().with_border(1.0, 0.0, 0.0, 0.0);
        let stream = generator.frame(rect());
        assert!(!stream.contains(" rg"));
        assert!(!stream.contains("re f"));
        assert!(stream.contains("0 0 0 RG"));
        assert!(stream.contains("0.5 0.5 19 9 re S"));
    }

    #[test]
    fn test_zero_width_border_is_skipped() {
        let generator = FormAppearanceGenerator::new().with_border(0.0, 0.0, 0.0, 0.0);
        assert!(!generator.frame(rect()).contains("RG"));
    }

    #[test]
    fn test_checkbox_on_draws_checkmark() {
        let generator = FormAppearanceGenerator::new();
        let on = generator.checkbox_on_appearance(rect());
        assert!(on.contains(" m "));
        assert!(on.ends_with("l S\n"));
        assert!(!generator.checkbox_off_appearance(rect()).contains(" m "));
    }

    #[test]
    fn test_empty_text_appearance_marks_content() {
        let stream = FormAppearanceGenerator::new().empty_text_appearance(rect());
        assert!(stream.contains("/Tx BMC"));
        assert!(stream.contains("EMC"));
    }

    #[test]
    fn test_appearance_stream_bbox_matches_rect() {
        let stream = appearance_stream(Rect::new(100.0, 200.0, 30.0, 12.0), "");
        let bbox = stream.dict.get(b"BBox").unwrap().as_array().unwrap();
        assert_eq!(bbox[2].as_float().unwrap(), 30.0);
        assert_eq!(bbox[3].as_float().unwrap(), 12.0);
        assert_eq!(stream.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");
    }
}
