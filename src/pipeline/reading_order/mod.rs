//! Reading order strategies for detected widgets.
//!
//! Detectors emit widgets in whatever order the model produced them. Form
//! navigation (Tab / Shift-Tab) follows field order, so each page's widgets are
//! re-sequenced before fields are written.
//!
//! # Available Strategies
//!
//! - [`LineGroupingStrategy`]: groups widgets sharing a visual line, then orders
//!   each line left to right (default)
//! - [`RowMajorStrategy`]: plain top-to-bottom, left-to-right sort without grouping

mod line_grouping;
mod row_major;

pub use line_grouping::{LineGroupingStrategy, DEFAULT_LINE_THRESHOLD};
pub use row_major::RowMajorStrategy;

use crate::pipeline::config::{ReadingOrderConfig, ReadingOrderStrategyType};
use crate::utils::safe_float_cmp;
use crate::widget::Widget;
use std::cmp::Ordering;

/// Trait for determining the navigation order of widgets on one page.
pub trait ReadingOrderStrategy: Send + Sync {
    /// Return the widgets in navigation order.
    ///
    /// Implementations must be deterministic and must accept empty input.
    fn apply(&self, widgets: Vec<Widget>) -> Vec<Widget>;

    /// Return the name of this strategy for debugging.
    fn name(&self) -> &'static str;
}

/// Create a reading order strategy based on configuration.
pub fn create_strategy(config: &ReadingOrderConfig) -> Box<dyn ReadingOrderStrategy> {
    match config.strategy {
        ReadingOrderStrategyType::LineGrouping => {
            Box::new(LineGroupingStrategy::with_line_threshold(config.line_threshold))
        },
        ReadingOrderStrategyType::RowMajor => Box::new(RowMajorStrategy),
    }
}

/// Round to three decimals to absorb sub-pixel jitter between detections.
pub(crate) fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

/// Primary reading order key: rounded top edge, then left edge.
pub(crate) fn row_major_cmp(a: &Widget, b: &Widget) -> Ordering {
    safe_float_cmp(round3(a.bounding_box.y0), round3(b.bounding_box.y0))
        .then_with(|| safe_float_cmp(a.bounding_box.x0, b.bounding_box.x0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.10049), 0.1);
        assert_eq!(round3(0.1026), 0.103);
        assert_eq!(round3(0.0), 0.0);
    }

    #[test]
    fn test_create_strategy_names() {
        let config = ReadingOrderConfig::default();
        assert_eq!(create_strategy(&config).name(), "LineGroupingStrategy");

        let config = ReadingOrderConfig::default().with_strategy(ReadingOrderStrategyType::RowMajor);
        assert_eq!(create_strategy(&config).name(), "RowMajorStrategy");
    }
}
