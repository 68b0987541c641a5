//! Plain top-to-bottom, left-to-right ordering.

use crate::widget::Widget;

use super::{row_major_cmp, ReadingOrderStrategy};

/// Simple top-to-bottom, left-to-right reading order.
///
/// Sorts by the top edge (rounded to three decimals) and then by the left
/// edge. Widgets whose tops differ by a hair land on different rows, so this
/// works best on clean, grid-aligned forms.
pub struct RowMajorStrategy;

impl ReadingOrderStrategy for RowMajorStrategy {
    fn apply(&self, mut widgets: Vec<Widget>) -> Vec<Widget> {
        widgets.sort_by(row_major_cmp);
        widgets
    }

    fn name(&self) -> &'static str {
        "RowMajorStrategy"
    }
}
