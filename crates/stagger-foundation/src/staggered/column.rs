//! A single vertical stream of placed items.

/// An item that has been assigned to a column.
///
/// `source_index` is the item's position in the data the application pushed.
/// Placement order within a column does not follow source order once the
/// balancing phase interleaves columns, so the index is carried alongside
/// the payload.
#[derive(Clone, Debug)]
pub struct PlacedItem<T> {
    item: T,
    source_index: usize,
}

impl<T> PlacedItem<T> {
    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn source_index(&self) -> usize {
        self.source_index
    }

    pub fn into_item(self) -> T {
        self.item
    }
}

/// Outcome of recording a height for a slot.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RecordedHeight {
    /// Change applied to the column's running total.
    pub delta: f32,
    /// True when this was the slot's first report (not a re-layout).
    pub first_report: bool,
}

/// Ordered sequence of placed items plus their measured heights.
///
/// Insertion order is placement order. An item's height slot stays empty
/// until the measurement report for it arrives; the accumulated total counts
/// empty slots as 0.
pub struct Column<T> {
    items: Vec<PlacedItem<T>>,
    measured: Vec<Option<f32>>,
    total: f32,
}

impl<T> Column<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            measured: Vec::new(),
            total: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Placed items in placement order.
    pub fn items(&self) -> &[PlacedItem<T>] {
        &self.items
    }

    /// Sum of the measured heights of this column's items.
    pub fn column_height(&self) -> f32 {
        self.total
    }

    pub fn is_measured(&self, local_index: usize) -> bool {
        self.measured
            .get(local_index)
            .map(Option::is_some)
            .unwrap_or(false)
    }

    /// Placed items whose first height report has not arrived yet.
    pub fn unmeasured_len(&self) -> usize {
        self.measured.iter().filter(|slot| slot.is_none()).count()
    }

    /// Appends an item and returns its local index within the column.
    pub(crate) fn push(&mut self, item: T, source_index: usize) -> usize {
        let local_index = self.items.len();
        self.items.push(PlacedItem { item, source_index });
        self.measured.push(None);
        local_index
    }

    /// Records a measured height for a slot, replacing any previous value.
    ///
    /// Returns `None` when the slot does not exist. The running total never
    /// goes below zero.
    pub(crate) fn record_height(&mut self, local_index: usize, height: f32) -> Option<RecordedHeight> {
        let slot = self.measured.get_mut(local_index)?;
        let previous = *slot;
        *slot = Some(height);
        let delta = height - previous.unwrap_or(0.0);
        self.total = (self.total + delta).max(0.0);
        Some(RecordedHeight {
            delta,
            first_report: previous.is_none(),
        })
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.measured.clear();
        self.total = 0.0;
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("len", &self.items.len())
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_source_indexes() {
        let mut column = Column::new();
        assert_eq!(column.push("a", 0), 0);
        assert_eq!(column.push("b", 4), 1);
        let indexes: Vec<usize> = column.items().iter().map(PlacedItem::source_index).collect();
        assert_eq!(indexes, vec![0, 4]);
    }

    #[test]
    fn height_accumulates_from_reports() {
        let mut column = Column::new();
        column.push("a", 0);
        column.push("b", 1);
        assert_eq!(column.column_height(), 0.0);
        assert_eq!(column.unmeasured_len(), 2);

        let first = column.record_height(0, 12.0).unwrap();
        assert!(first.first_report);
        assert_eq!(first.delta, 12.0);
        assert_eq!(column.column_height(), 12.0);
        assert_eq!(column.unmeasured_len(), 1);
    }

    #[test]
    fn re_report_applies_a_delta() {
        let mut column = Column::new();
        column.push("a", 0);
        column.record_height(0, 40.0).unwrap();

        let second = column.record_height(0, 25.0).unwrap();
        assert!(!second.first_report);
        assert_eq!(second.delta, -15.0);
        assert_eq!(column.column_height(), 25.0);
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let mut column: Column<&str> = Column::new();
        assert!(column.record_height(0, 10.0).is_none());
    }

    #[test]
    fn clear_drops_items_and_heights() {
        let mut column = Column::new();
        column.push("a", 0);
        column.record_height(0, 8.0).unwrap();
        column.clear();
        assert!(column.is_empty());
        assert_eq!(column.column_height(), 0.0);
        assert!(column.record_height(0, 1.0).is_none());
    }
}
