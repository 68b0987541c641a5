//! Detected widgets and per-document detection results.

use crate::geometry::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of form field a detected region should become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetType {
    /// Free-text input
    TextBox,
    /// Checkbox or radio button
    ChoiceButton,
    /// Signature block
    Signature,
}

impl WidgetType {
    /// All widget types, in class-id order.
    pub const ALL: [WidgetType; 3] = [
        WidgetType::TextBox,
        WidgetType::ChoiceButton,
        WidgetType::Signature,
    ];

    /// Class name as emitted by the detection models.
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::TextBox => "TextBox",
            WidgetType::ChoiceButton => "ChoiceButton",
            WidgetType::Signature => "Signature",
        }
    }

    /// Lowercase prefix used for generated field names.
    pub fn name_prefix(&self) -> &'static str {
        match self {
            WidgetType::TextBox => "textbox",
            WidgetType::ChoiceButton => "choicebutton",
            WidgetType::Signature => "signature",
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected form-field candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Field kind
    pub widget_type: WidgetType,
    /// Location on the page, normalized
    pub bounding_box: BoundingBox,
    /// Zero-based page index
    pub page: usize,
}

impl Widget {
    /// Create a widget.
    pub fn new(widget_type: WidgetType, bounding_box: BoundingBox, page: usize) -> Self {
        Self {
            widget_type,
            bounding_box,
            page,
        }
    }

    /// Stable field name for this widget at `position` within its page's reading order.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::geometry::BoundingBox;
    /// use commonforms::widget::{Widget, WidgetType};
    ///
    /// let widget = Widget::new(WidgetType::Signature, BoundingBox::new(0.1, 0.1, 0.4, 0.2), 2);
    /// assert_eq!(widget.field_name(5), "signature_2_5");
    /// ```
    pub fn field_name(&self, position: usize) -> String {
        format!(
            "{}_{}_{}",
            self.widget_type.name_prefix(),
            self.page,
            position
        )
    }
}

/// Widgets per page index, each page already in reading order.
///
/// Pages without accepted detections have no entry.
pub type DetectionResult = BTreeMap<usize, Vec<Widget>>;

/// Widgets detected on `page`, empty when the page has no entry.
pub fn widgets_on_page(result: &DetectionResult, page: usize) -> &[Widget] {
    result.get(&page).map(Vec::as_slice).unwrap_or(&[])
}

/// Total number of widgets across all pages.
pub fn widget_count(result: &DetectionResult) -> usize {
    result.values().map(Vec::len).sum()
}
