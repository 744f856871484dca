//! Controller state for the staggered list engine.
//!
//! [`StaggeredListState`] owns the backlog, the columns, the placement
//! policy, and the measurement feedback path. All mutable state lives behind
//! one `Rc<RefCell<..>>`, so the type is cheap to clone into callbacks and
//! every transition happens on the single logical event queue of the
//! embedding application.
//!
//! # Advance protocol
//!
//! After an item is placed the engine prefers to wait for that item's height
//! report before placing the next one, so greedy decisions see real data.
//! The wait is bounded: a fallback callback scheduled through [`Scheduler`]
//! forces the next placement when a report does not arrive in time (content
//! can render at zero height and never produce a layout pass). Both the
//! fallback and late measurement reports are generation-guarded so nothing
//! from a pre-reset batch can touch post-reset state.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use web_time::Duration;

use crate::scheduler::{ScheduleHandle, Scheduler};

use super::column::{Column, PlacedItem};
use super::height_tracker::HeightTracker;
use super::measurement::{sanitize_height, MeasureAggregate, MeasureResult};
use super::placement_queue::{Advance, BatchPhase, PlacementQueue};
use super::policy::{ColumnAssigner, PlacementPolicy};

/// Upper bound on the wait for the previous item's height report.
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(100);

/// Configuration for the placement engine.
#[derive(Clone, Debug)]
pub struct StaggeredConfig {
    /// Number of columns; must be at least 1.
    pub columns: usize,
    /// Column assignment strategy.
    pub policy: PlacementPolicy,
    /// Upper bound on the wait for the previous item's measurement.
    pub fallback_delay: Duration,
}

impl Default for StaggeredConfig {
    fn default() -> Self {
        Self {
            columns: 2,
            policy: PlacementPolicy::default(),
            fallback_delay: DEFAULT_FALLBACK_DELAY,
        }
    }
}

impl StaggeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn policy(mut self, policy: PlacementPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 {
            return Err(ConfigError::NoColumns);
        }
        Ok(())
    }
}

/// Fatal configuration problems, surfaced at construction and never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `columns` was 0.
    NoColumns,
    /// No item render function was provided.
    MissingRenderItem,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoColumns => write!(f, "columns must be at least 1"),
            Self::MissingRenderItem => write!(f, "an item render function is required"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Passthrough scroll signal from the embedding scroll service.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollEvent {
    /// Vertical content offset, in layout-resolved pixels.
    pub offset_y: f32,
}

struct StateInner<T> {
    config: StaggeredConfig,
    scheduler: Rc<dyn Scheduler>,
    columns: Vec<Column<T>>,
    tracker: HeightTracker,
    assigner: ColumnAssigner,
    queue: PlacementQueue<T>,
    aggregate: MeasureAggregate,
    /// Bumped on every reset; callbacks carrying an older value are stale.
    generation: u64,
    /// Slot of the most recently placed item. Placement waits (bounded) for
    /// its height report before advancing.
    awaiting: Option<(usize, usize)>,
    /// Placed items whose first height report has not arrived.
    outstanding: usize,
    fallback: Option<ScheduleHandle>,
    declared_height_of: Option<Rc<dyn Fn(&T) -> Option<f32>>>,
    on_load_complete: Option<Rc<dyn Fn()>>,
    on_measure: Option<Rc<dyn Fn(&MeasureResult)>>,
    on_scroll: Option<Rc<dyn Fn(ScrollEvent)>>,
    on_refresh: Option<Rc<dyn Fn()>>,
    on_end_reached: Option<Rc<dyn Fn(f32)>>,
}

enum PumpStep {
    /// An item was placed; arm the fallback and stop pumping.
    Placed,
    /// An absent entry was passed over; keep pumping.
    Skipped,
    /// Waiting on the previous item's report, or nothing left to place.
    Hold,
}

/// State object orchestrating placement for one staggered list.
///
/// Clones share the same underlying state.
pub struct StaggeredListState<T> {
    inner: Rc<RefCell<StateInner<T>>>,
}

impl<T> Clone for StaggeredListState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> StaggeredListState<T> {
    pub fn new(config: StaggeredConfig, scheduler: Rc<dyn Scheduler>) -> Result<Self, ConfigError> {
        config.validate()?;
        let columns = (0..config.columns).map(|_| Column::new()).collect();
        let tracker = HeightTracker::new(config.columns);
        let assigner = ColumnAssigner::new(config.policy, config.columns);
        Ok(Self {
            inner: Rc::new(RefCell::new(StateInner {
                config,
                scheduler,
                columns,
                tracker,
                assigner,
                queue: PlacementQueue::new(),
                aggregate: MeasureAggregate::default(),
                generation: 0,
                awaiting: None,
                outstanding: 0,
                fallback: None,
                declared_height_of: None,
                on_load_complete: None,
                on_measure: None,
                on_scroll: None,
                on_refresh: None,
                on_end_reached: None,
            })),
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Data input
    // ─────────────────────────────────────────────────────────────────────

    /// Appends one item to the backlog and kicks placement.
    pub fn push(&self, item: T) {
        self.push_optional(Some(item));
    }

    /// Appends a backlog entry that may be absent.
    ///
    /// Data sources with gaps (a page slot that failed to decode) push
    /// `None`; the cursor passes over it without touching assignment state.
    pub fn push_optional(&self, item: Option<T>) {
        self.inner.borrow_mut().queue.push(item);
        self.pump();
    }

    /// Appends a whole page of items, then kicks placement once.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        {
            let mut inner = self.inner.borrow_mut();
            for item in items {
                inner.queue.push(Some(item));
            }
        }
        self.pump();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Clears the backlog cursor, every column, and all measured heights,
    /// atomically from the caller's perspective, and returns to `Idle`.
    ///
    /// In-flight fallback callbacks and measurement reports from before the
    /// reset are invalidated by the generation bump. Header and footer
    /// heights survive: those views are not torn down by a refresh.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.generation = inner.generation.wrapping_add(1);
        inner.fallback = None;
        inner.awaiting = None;
        inner.outstanding = 0;
        inner.queue.reset();
        for column in &mut inner.columns {
            column.clear();
        }
        inner.tracker.clear();
        inner.assigner.reset();
    }

    /// User-requested reload: fires `on_refresh`, then resets.
    pub fn notify_refresh(&self) {
        let callback = self.inner.borrow().on_refresh.clone();
        if let Some(callback) = callback {
            callback();
        }
        self.reset();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Measurement feedback
    // ─────────────────────────────────────────────────────────────────────

    /// Reports a rendered height for a placed item.
    ///
    /// `generation` must be the value of [`Self::generation`] at the time
    /// the item's view was created; reports from a cleared batch are dropped
    /// silently. Repeated reports for the same slot replace the previous
    /// value. Negative or non-finite heights are dropped and logged.
    pub fn report_item_height(&self, generation: u64, column: usize, local_index: usize, height: f32) {
        let Some(height) = sanitize_height(height) else {
            return;
        };
        let mut changed = None;
        let mut resume = false;
        {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            if inner.generation != generation {
                // Stale callback from before a reset.
                return;
            }
            let Some(target) = inner.columns.get_mut(column) else {
                log::warn!("measurement for unknown column {column}");
                return;
            };
            let Some(recorded) = target.record_height(local_index, height) else {
                log::warn!("measurement for unknown slot {local_index} in column {column}");
                return;
            };
            inner.tracker.set(column, target.column_height());
            if recorded.first_report {
                inner.outstanding = inner.outstanding.saturating_sub(1);
            }
            if recorded.delta != 0.0 {
                changed = Some(inner.aggregate.snapshot(inner.tracker.heights()));
            }
            if inner.awaiting == Some((column, local_index)) {
                inner.awaiting = None;
                inner.fallback = None;
                resume = inner.queue.phase() == BatchPhase::Placing;
            }
            if inner.queue.phase() == BatchPhase::Draining && inner.outstanding == 0 {
                inner.queue.mark_complete();
            }
        }
        if let Some(result) = changed {
            self.fire_measure(&result);
        }
        if resume {
            self.pump();
        }
    }

    /// Reports the header's rendered height. May re-fire on re-layout.
    pub fn report_header_height(&self, height: f32) {
        let Some(height) = sanitize_height(height) else {
            return;
        };
        let changed = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            inner
                .aggregate
                .set_header(height)
                .then(|| inner.aggregate.snapshot(inner.tracker.heights()))
        };
        if let Some(result) = changed {
            self.fire_measure(&result);
        }
    }

    /// Reports the footer's rendered height. May re-fire on re-layout.
    pub fn report_footer_height(&self, height: f32) {
        let Some(height) = sanitize_height(height) else {
            return;
        };
        let changed = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            inner
                .aggregate
                .set_footer(height)
                .then(|| inner.aggregate.snapshot(inner.tracker.heights()))
        };
        if let Some(result) = changed {
            self.fire_measure(&result);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Passthrough events
    // ─────────────────────────────────────────────────────────────────────

    /// Forwards a scroll signal from the embedding scroll service.
    pub fn dispatch_scroll(&self, event: ScrollEvent) {
        let callback = self.inner.borrow().on_scroll.clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    /// End-of-content signal from the scroll service.
    ///
    /// Suppressed while no data has been pushed: a freshly mounted list
    /// reports end-reached before the first page arrives.
    pub fn notify_end_reached(&self, distance_from_end: f32) {
        let callback = {
            let inner = self.inner.borrow();
            if inner.queue.backlog_len() == 0 {
                None
            } else {
                inner.on_end_reached.clone()
            }
        };
        if let Some(callback) = callback {
            callback(distance_from_end);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    pub fn phase(&self) -> BatchPhase {
        self.inner.borrow().queue.phase()
    }

    /// Current generation token; measurement reports must carry it.
    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    pub fn column_count(&self) -> usize {
        self.inner.borrow().columns.len()
    }

    /// Sum of one column's measured heights.
    pub fn column_height(&self, column: usize) -> f32 {
        self.inner
            .borrow()
            .columns
            .get(column)
            .map(Column::column_height)
            .unwrap_or(0.0)
    }

    /// Measured totals for every column, index-aligned.
    pub fn heights(&self) -> Vec<f32> {
        self.inner.borrow().tracker.heights().to_vec()
    }

    pub fn measure_result(&self) -> MeasureResult {
        let inner = self.inner.borrow();
        inner.aggregate.snapshot(inner.tracker.heights())
    }

    /// Runs `f` against one column's placed items.
    ///
    /// The closure must not call back into this state object.
    pub fn with_column<R>(&self, column: usize, f: impl FnOnce(&Column<T>) -> R) -> Option<R> {
        self.inner.borrow().columns.get(column).map(f)
    }

    /// Runs `f` against all columns.
    ///
    /// The closure must not call back into this state object.
    pub fn with_columns<R>(&self, f: impl FnOnce(&[Column<T>]) -> R) -> R {
        f(&self.inner.borrow().columns)
    }

    /// Source indexes of one column's items, in placement order.
    pub fn column_source_indexes(&self, column: usize) -> Vec<usize> {
        self.with_column(column, |col| {
            col.items().iter().map(PlacedItem::source_index).collect()
        })
        .unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Callbacks
    // ─────────────────────────────────────────────────────────────────────

    /// Fired once per backlog batch, when every item has been placed.
    pub fn set_on_load_complete(&self, callback: impl Fn() + 'static) {
        self.inner.borrow_mut().on_load_complete = Some(Rc::new(callback));
    }

    /// Fired on every aggregate measurement change.
    pub fn set_on_measure(&self, callback: impl Fn(&MeasureResult) + 'static) {
        self.inner.borrow_mut().on_measure = Some(Rc::new(callback));
    }

    pub fn set_on_scroll(&self, callback: impl Fn(ScrollEvent) + 'static) {
        self.inner.borrow_mut().on_scroll = Some(Rc::new(callback));
    }

    /// Fired by [`Self::notify_refresh`] before the reset happens.
    pub fn set_on_refresh(&self, callback: impl Fn() + 'static) {
        self.inner.borrow_mut().on_refresh = Some(Rc::new(callback));
    }

    /// Fired with `distance_from_end` when the scroll service signals the
    /// end of content and data is present.
    pub fn set_on_end_reached(&self, callback: impl Fn(f32) + 'static) {
        self.inner.borrow_mut().on_end_reached = Some(Rc::new(callback));
    }

    /// Extractor for heights items declare up front; consulted only by
    /// [`PlacementPolicy::PresortedByKnownDimensions`].
    pub fn set_declared_heights(&self, f: impl Fn(&T) -> Option<f32> + 'static) {
        self.inner.borrow_mut().declared_height_of = Some(Rc::new(f));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Placement engine
    // ─────────────────────────────────────────────────────────────────────

    /// Places backlog items until the engine must wait for the previous
    /// item's height report or the backlog runs dry.
    fn pump(&self) {
        loop {
            let notify;
            let step = {
                let mut guard = self.inner.borrow_mut();
                let inner = &mut *guard;
                let step = if inner.awaiting.is_some() {
                    PumpStep::Hold
                } else {
                    Self::advance_one(inner)
                };
                notify = inner.queue.take_completion_notice();
                if inner.queue.phase() == BatchPhase::Draining && inner.outstanding == 0 {
                    inner.queue.mark_complete();
                }
                step
            };
            if notify {
                self.fire_load_complete();
            }
            match step {
                PumpStep::Placed => {
                    self.arm_fallback();
                    break;
                }
                PumpStep::Skipped => continue,
                PumpStep::Hold => break,
            }
        }
    }

    /// Moves the cursor by one entry and places the item, if any.
    fn advance_one(inner: &mut StateInner<T>) -> PumpStep {
        let remaining = inner.queue.remaining();
        match inner.queue.advance() {
            Advance::Placed(item, source_index) => {
                let declared = inner
                    .declared_height_of
                    .as_ref()
                    .and_then(|extract| extract(&item));
                let column = inner.assigner.assign(remaining, &inner.tracker, declared);
                let local_index = inner.columns[column].push(item, source_index);
                inner.awaiting = Some((column, local_index));
                inner.outstanding += 1;
                PumpStep::Placed
            }
            Advance::Skipped(_) => PumpStep::Skipped,
            Advance::Exhausted => PumpStep::Hold,
        }
    }

    /// Arms the bounded wait for the just-placed item's height report.
    fn arm_fallback(&self) {
        let (delay, generation, scheduler) = {
            let inner = self.inner.borrow();
            (
                inner.config.fallback_delay,
                inner.generation,
                Rc::clone(&inner.scheduler),
            )
        };
        let weak = Rc::downgrade(&self.inner);
        let handle = scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let state = StaggeredListState { inner };
                    state.on_fallback(generation);
                }
            }),
        );
        self.inner.borrow_mut().fallback = Some(handle);
    }

    /// The fallback fired: stop waiting for the previous item's report.
    fn on_fallback(&self, generation: u64) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.generation != generation {
                // Armed before a reset; drop it.
                return;
            }
            inner.fallback = None;
            if inner.awaiting.take().is_none() {
                return;
            }
        }
        self.pump();
    }

    fn fire_load_complete(&self) {
        let callback = self.inner.borrow().on_load_complete.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn fire_measure(&self, result: &MeasureResult) {
        let callback = self.inner.borrow().on_measure.clone();
        if let Some(callback) = callback {
            callback(result);
        }
    }
}
