//! Line-grouping reading order strategy.

use crate::utils::safe_float_cmp;
use crate::widget::Widget;

use super::{row_major_cmp, ReadingOrderStrategy};

/// Default vertical tolerance for two widgets to share a line, in page-height units.
pub const DEFAULT_LINE_THRESHOLD: f32 = 0.01;

/// Groups widgets into visual lines before ordering them.
///
/// Widgets are first sorted by rounded top edge and left edge. Walking that
/// sequence, a widget joins the current line when its top edge is within
/// `line_threshold` of the top edge of the line's *first* widget; otherwise it
/// starts a new line. Each line is then sorted left to right.
///
/// Comparing against the line's first widget (rather than the previous one)
/// keeps a slow vertical drift from chaining an entire column into one line.
///
/// # Examples
///
/// ```
/// use commonforms::geometry::BoundingBox;
/// use commonforms::pipeline::reading_order::{LineGroupingStrategy, ReadingOrderStrategy};
/// use commonforms::widget::{Widget, WidgetType};
///
/// let widget = |x0: f32, y0: f32| {
///     Widget::new(WidgetType::TextBox, BoundingBox::new(x0, y0, x0 + 0.05, y0 + 0.02), 0)
/// };
///
/// let ordered = LineGroupingStrategy::new().apply(vec![
///     widget(0.5, 0.10),
///     widget(0.1, 0.102),
///     widget(0.2, 0.30),
/// ]);
///
/// let lefts: Vec<f32> = ordered.iter().map(|w| w.bounding_box.x0).collect();
/// assert_eq!(lefts, vec![0.1, 0.5, 0.2]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LineGroupingStrategy {
    line_threshold: f32,
}

impl LineGroupingStrategy {
    /// Create a strategy with the default line threshold.
    pub fn new() -> Self {
        Self {
            line_threshold: DEFAULT_LINE_THRESHOLD,
        }
    }

    /// Create a strategy with a custom line threshold.
    pub fn with_line_threshold(line_threshold: f32) -> Self {
        Self { line_threshold }
    }

    /// Vertical tolerance used to group widgets into a line.
    pub fn line_threshold(&self) -> f32 {
        self.line_threshold
    }

    fn group_lines(&self, sorted: Vec<Widget>) -> Vec<Vec<Widget>> {
        let mut lines: Vec<Vec<Widget>> = Vec::new();

        for widget in sorted {
            let joins_current = lines
                .last()
                .and_then(|line| line.first())
                .map(|anchor| {
                    (widget.bounding_box.y0 - anchor.bounding_box.y0).abs() < self.line_threshold
                })
                .unwrap_or(false);

            match lines.last_mut() {
                Some(line) if joins_current => line.push(widget),
                _ => lines.push(vec![widget]),
            }
        }

        lines
    }
}

impl Default for LineGroupingStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingOrderStrategy for LineGroupingStrategy {
    fn apply(&self, mut widgets: Vec<Widget>) -> Vec<Widget> {
        if widgets.len() < 2 {
            return widgets;
        }

        // Stable sort keeps detector order for exact ties.
        widgets.sort_by(row_major_cmp);

        let mut ordered = Vec::with_capacity(widgets.len());
        for mut line in self.group_lines(widgets) {
            line.sort_by(|a, b| safe_float_cmp(a.bounding_box.x0, b.bounding_box.x0));
            ordered.extend(line);
        }

        log::trace!(
            "LineGroupingStrategy ordered {} widgets (threshold {})",
            ordered.len(),
            self.line_threshold
        );

        ordered
    }

    fn name(&self) -> &'static str {
        "LineGroupingStrategy"
    }
}
