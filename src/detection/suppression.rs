//! Class-agnostic duplicate suppression.
//!
//! Detectors occasionally report the same physical box twice, sometimes under
//! two different classes (a small square read as both a text box and a
//! checkbox). Suppression here ignores the predicted class: of any pair of
//! overlapping detections only the more confident one survives.

use crate::utils::safe_float_cmp;
use crate::widget::Widget;

/// A widget with the confidence it was detected at.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Detected widget
    pub widget: Widget,
    /// Detection confidence
    pub confidence: f32,
}

impl Candidate {
    /// Create a candidate.
    pub fn new(widget: Widget, confidence: f32) -> Self {
        Self { widget, confidence }
    }
}

/// Greedy non-maximum suppression, ignoring class.
///
/// Candidates are visited by descending confidence. A candidate is kept
/// unless its IoU with an already-kept candidate exceeds `iou_threshold`.
/// The result is ordered by descending confidence; equal confidences keep
/// their input order.
///
/// # Examples
///
/// ```
/// use commonforms::detection::{suppress_duplicates, Candidate};
/// use commonforms::geometry::BoundingBox;
/// use commonforms::widget::{Widget, WidgetType};
///
/// let bbox = BoundingBox::new(0.1, 0.1, 0.3, 0.2);
/// let kept = suppress_duplicates(
///     vec![
///         Candidate::new(Widget::new(WidgetType::ChoiceButton, bbox, 0), 0.5),
///         Candidate::new(Widget::new(WidgetType::TextBox, bbox, 0), 0.9),
///     ],
///     0.1,
/// );
///
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].widget.widget_type, WidgetType::TextBox);
/// ```
pub fn suppress_duplicates(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| safe_float_cmp(b.confidence, a.confidence));

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let duplicate = kept.iter().any(|k| {
            k.widget.bounding_box.iou(&candidate.widget.bounding_box) > iou_threshold
        });
        if !duplicate {
            kept.push(candidate);
        }
    }

    kept
}
