//! Per-column measured-height totals.

use smallvec::SmallVec;

/// Columns held inline before spilling to the heap. Staggered lists rarely
/// run more than a handful of columns.
pub(crate) const COLUMN_HINT: usize = 4;

/// Running total of measured content height for every column.
///
/// Totals reflect only *measured* contributions: an item that has been
/// placed but whose height report has not yet arrived counts as 0. This
/// under-counts columns with pending items, so greedy assignment can
/// transiently pick an already-heavier column while reports lag placements;
/// the totals self-correct as soon as the reports land.
#[derive(Clone, Debug, Default)]
pub struct HeightTracker {
    totals: SmallVec<[f32; COLUMN_HINT]>,
}

impl HeightTracker {
    pub fn new(columns: usize) -> Self {
        Self {
            totals: smallvec::smallvec![0.0; columns],
        }
    }

    pub fn column_count(&self) -> usize {
        self.totals.len()
    }

    /// Index-aligned totals, one non-negative value per column.
    pub fn heights(&self) -> &[f32] {
        &self.totals
    }

    /// Index of the column with the smallest total. Ties resolve to the
    /// lowest column index.
    pub fn shortest(&self) -> usize {
        let mut min_index = 0;
        let mut min_total = f32::INFINITY;
        for (index, &total) in self.totals.iter().enumerate() {
            if total < min_total {
                min_total = total;
                min_index = index;
            }
        }
        min_index
    }

    /// Replaces one column's total. Totals never go below zero.
    pub(crate) fn set(&mut self, column: usize, total: f32) {
        if let Some(slot) = self.totals.get_mut(column) {
            *slot = total.max(0.0);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.totals.fill(0.0);
    }
}
