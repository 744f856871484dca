//! StaggeredList widget: configuration spec, builder, and host wiring.
//!
//! The widget owns a [`StaggeredListState`] and a render function, exposes
//! imperative operations to the embedding application, and receives the
//! callbacks the external scroll and measurement services deliver.

use std::cell::RefCell;
use std::rc::Rc;

use web_time::Duration;

use stagger_foundation::{
    BatchPhase, ConfigError, MeasureResult, PlacementPolicy, ScrollEvent, Scheduler,
    StaggeredConfig, StaggeredListState, DEFAULT_FALLBACK_DELAY,
};

use crate::host::{ScrollHost, ScrollHostProps, ScrollToOffset};

/// Configuration surface for [`StaggeredList`].
///
/// `columns`, `policy`, and `fallback_delay` feed the placement engine; the
/// remaining knobs are passed through to the external scroll service
/// untouched.
#[derive(Clone, Debug)]
pub struct StaggeredListSpec {
    pub columns: usize,
    pub policy: PlacementPolicy,
    pub fallback_delay: Duration,
    pub on_end_reached_threshold: f32,
    pub scroll_event_throttle: u32,
    pub shows_vertical_scroll_indicator: bool,
    pub refreshing: bool,
    pub bounces: bool,
    pub remove_clipped_subviews: bool,
}

impl Default for StaggeredListSpec {
    fn default() -> Self {
        Self {
            columns: 2,
            policy: PlacementPolicy::default(),
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            on_end_reached_threshold: 0.2,
            scroll_event_throttle: 100,
            shows_vertical_scroll_indicator: false,
            refreshing: false,
            bounces: true,
            remove_clipped_subviews: true,
        }
    }
}

impl StaggeredListSpec {
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

    pub fn on_end_reached_threshold(mut self, threshold: f32) -> Self {
        self.on_end_reached_threshold = threshold;
        self
    }

    pub fn scroll_event_throttle(mut self, millis: u32) -> Self {
        self.scroll_event_throttle = millis;
        self
    }

    pub fn shows_vertical_scroll_indicator(mut self, shows: bool) -> Self {
        self.shows_vertical_scroll_indicator = shows;
        self
    }

    pub fn refreshing(mut self, refreshing: bool) -> Self {
        self.refreshing = refreshing;
        self
    }

    pub fn bounces(mut self, bounces: bool) -> Self {
        self.bounces = bounces;
        self
    }

    pub fn remove_clipped_subviews(mut self, remove: bool) -> Self {
        self.remove_clipped_subviews = remove;
        self
    }

    /// The subset of the spec the placement engine consumes.
    pub fn engine_config(&self) -> StaggeredConfig {
        StaggeredConfig::new()
            .columns(self.columns)
            .policy(self.policy)
            .fallback_delay(self.fallback_delay)
    }

    /// The subset of the spec the scroll service consumes.
    pub fn scroll_props(&self) -> ScrollHostProps {
        ScrollHostProps {
            on_end_reached_threshold: self.on_end_reached_threshold,
            scroll_event_throttle: self.scroll_event_throttle,
            shows_vertical_scroll_indicator: self.shows_vertical_scroll_indicator,
            refreshing: self.refreshing,
            bounces: self.bounces,
            remove_clipped_subviews: self.remove_clipped_subviews,
        }
    }
}

type RenderFn<T, R> = Rc<dyn Fn(&T) -> R>;

/// Builder for [`StaggeredList`].
///
/// The render function is mandatory; [`Self::build`] fails without one.
pub struct StaggeredListBuilder<T, R> {
    spec: StaggeredListSpec,
    scheduler: Rc<dyn Scheduler>,
    render_item: Option<RenderFn<T, R>>,
    header: Option<R>,
    footer: Option<R>,
    declared_heights: Option<Rc<dyn Fn(&T) -> Option<f32>>>,
}

impl<T: 'static, R> StaggeredListBuilder<T, R> {
    pub fn render_item(mut self, render: impl Fn(&T) -> R + 'static) -> Self {
        self.render_item = Some(Rc::new(render));
        self
    }

    pub fn header(mut self, header: R) -> Self {
        self.header = Some(header);
        self
    }

    pub fn footer(mut self, footer: R) -> Self {
        self.footer = Some(footer);
        self
    }

    /// Height extractor for
    /// [`PlacementPolicy::PresortedByKnownDimensions`] data sources.
    pub fn declared_heights(mut self, extract: impl Fn(&T) -> Option<f32> + 'static) -> Self {
        self.declared_heights = Some(Rc::new(extract));
        self
    }

    pub fn build(self) -> Result<StaggeredList<T, R>, ConfigError> {
        let render_item = self.render_item.ok_or(ConfigError::MissingRenderItem)?;
        let state = StaggeredListState::new(self.spec.engine_config(), self.scheduler)?;
        if let Some(extract) = self.declared_heights {
            state.set_declared_heights(move |item| extract(item));
        }
        Ok(StaggeredList {
            state,
            spec: self.spec,
            render_item,
            header: self.header,
            footer: self.footer,
            scroll_host: None,
        })
    }
}

/// A multi-column list whose columns stay balanced as pages stream in.
pub struct StaggeredList<T, R> {
    state: StaggeredListState<T>,
    spec: StaggeredListSpec,
    render_item: RenderFn<T, R>,
    header: Option<R>,
    footer: Option<R>,
    scroll_host: Option<Rc<RefCell<dyn ScrollHost>>>,
}

impl<T: 'static, R> StaggeredList<T, R> {
    pub fn builder(spec: StaggeredListSpec, scheduler: Rc<dyn Scheduler>) -> StaggeredListBuilder<T, R> {
        StaggeredListBuilder {
            spec,
            scheduler,
            render_item: None,
            header: None,
            footer: None,
            declared_heights: None,
        }
    }

    /// The shared engine state. Callbacks are registered here.
    pub fn state(&self) -> &StaggeredListState<T> {
        &self.state
    }

    pub fn spec(&self) -> &StaggeredListSpec {
        &self.spec
    }

    /// Passthrough configuration for the scroll service.
    pub fn scroll_props(&self) -> ScrollHostProps {
        self.spec.scroll_props()
    }

    pub fn header(&self) -> Option<&R> {
        self.header.as_ref()
    }

    pub fn footer(&self) -> Option<&R> {
        self.footer.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Application-facing operations
    // ─────────────────────────────────────────────────────────────────────

    pub fn push(&self, item: T) {
        self.state.push(item);
    }

    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        self.state.extend(items);
    }

    pub fn reset(&self) {
        self.state.reset();
    }

    pub fn phase(&self) -> BatchPhase {
        self.state.phase()
    }

    /// Generation token measurement callbacks must carry.
    pub fn generation(&self) -> u64 {
        self.state.generation()
    }

    pub fn column_height(&self, column: usize) -> f32 {
        self.state.column_height(column)
    }

    pub fn measure_result(&self) -> MeasureResult {
        self.state.measure_result()
    }

    /// Renders one column's items, in placement order.
    ///
    /// The render function must not call back into the list state.
    pub fn compose_column(&self, column: usize) -> Vec<R> {
        self.state
            .with_column(column, |col| {
                col.items()
                    .iter()
                    .map(|placed| (self.render_item)(placed.item()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn attach_scroll_host(&mut self, host: Rc<RefCell<dyn ScrollHost>>) {
        self.scroll_host = Some(host);
    }

    /// Forwards an imperative scroll request to the attached scroll service.
    pub fn scroll_to_offset(&self, params: ScrollToOffset) {
        match &self.scroll_host {
            Some(host) => host.borrow_mut().scroll_to_offset(params),
            None => log::warn!("scroll_to_offset with no scroll host attached"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Host-facing entry points
    // ─────────────────────────────────────────────────────────────────────

    /// Scroll signal from the scroll service. Throttling is the service's
    /// concern (`scroll_event_throttle` is passed through to it).
    pub fn scrolled(&self, event: ScrollEvent) {
        self.state.dispatch_scroll(event);
    }

    /// End-of-content signal from the scroll service.
    pub fn end_reached(&self, distance_from_end: f32) {
        self.state.notify_end_reached(distance_from_end);
    }

    /// The user pulled the refresh control.
    pub fn refresh_requested(&self) {
        self.state.notify_refresh();
    }

    /// Layout completed for a placed item's view.
    pub fn item_measured(&self, generation: u64, column: usize, local_index: usize, height: f32) {
        self.state
            .report_item_height(generation, column, local_index, height);
    }

    /// Layout completed for the header view.
    pub fn header_measured(&self, height: f32) {
        self.state.report_header_height(height);
    }

    /// Layout completed for the footer view.
    pub fn footer_measured(&self, height: f32) {
        self.state.report_footer_height(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagger_foundation::ManualScheduler;
    use std::cell::Cell;

    fn build_list(spec: StaggeredListSpec) -> (StaggeredList<u32, String>, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        let list = StaggeredList::builder(spec, Rc::new(scheduler.clone()))
            .render_item(|item: &u32| format!("cell {item}"))
            .build()
            .expect("valid widget");
        (list, scheduler)
    }

    #[test]
    fn missing_render_function_is_fatal() {
        let scheduler: Rc<dyn Scheduler> = Rc::new(ManualScheduler::new());
        let result = StaggeredList::<u32, String>::builder(StaggeredListSpec::default(), scheduler)
            .build();
        assert!(matches!(result, Err(ConfigError::MissingRenderItem)));
    }

    #[test]
    fn zero_columns_is_fatal() {
        let scheduler: Rc<dyn Scheduler> = Rc::new(ManualScheduler::new());
        let result =
            StaggeredList::<u32, String>::builder(StaggeredListSpec::default().columns(0), scheduler)
                .render_item(|item: &u32| item.to_string())
                .build();
        assert!(matches!(result, Err(ConfigError::NoColumns)));
    }

    #[test]
    fn spec_defaults_match_the_documented_surface() {
        let spec = StaggeredListSpec::default();
        assert_eq!(spec.columns, 2);
        assert_eq!(spec.on_end_reached_threshold, 0.2);
        assert_eq!(spec.scroll_event_throttle, 100);
        assert!(!spec.shows_vertical_scroll_indicator);
        assert!(!spec.refreshing);
        assert!(spec.bounces);
        assert!(spec.remove_clipped_subviews);

        let props = spec.scroll_props();
        assert_eq!(props.scroll_event_throttle, 100);
        assert!(props.bounces);
    }

    #[test]
    fn compose_column_renders_in_placement_order() {
        let (list, scheduler) = build_list(StaggeredListSpec::default().columns(2));
        list.extend([1, 2, 3]);
        scheduler.run_until_idle();

        let rendered: Vec<Vec<String>> = (0..2).map(|c| list.compose_column(c)).collect();
        let total: usize = rendered.iter().map(Vec::len).sum();
        assert_eq!(total, 3);
        assert!(rendered.iter().flatten().any(|cell| cell == "cell 1"));
    }

    #[test]
    fn header_and_footer_measurements_surface_in_the_result() {
        let scheduler = ManualScheduler::new();
        let list = StaggeredList::builder(StaggeredListSpec::default(), Rc::new(scheduler))
            .render_item(|item: &u32| item.to_string())
            .header("header".to_string())
            .footer("footer".to_string())
            .build()
            .unwrap();

        assert_eq!(list.header().map(String::as_str), Some("header"));
        list.header_measured(48.0);
        list.footer_measured(32.0);

        let result = list.measure_result();
        assert_eq!(result.header, 48.0);
        assert_eq!(result.footer, 32.0);
    }

    #[test]
    fn scroll_to_offset_reaches_the_attached_host() {
        struct RecordingHost {
            last: Option<ScrollToOffset>,
        }
        impl ScrollHost for RecordingHost {
            fn scroll_to_offset(&mut self, params: ScrollToOffset) {
                self.last = Some(params);
            }
        }

        let (mut list, _scheduler) = build_list(StaggeredListSpec::default());
        // without a host this is a logged no-op
        list.scroll_to_offset(ScrollToOffset::default());

        let host = Rc::new(RefCell::new(RecordingHost { last: None }));
        list.attach_scroll_host(host.clone());
        list.scroll_to_offset(ScrollToOffset {
            y: 120.0,
            animated: true,
        });

        let seen = host.borrow().last;
        assert_eq!(
            seen,
            Some(ScrollToOffset {
                y: 120.0,
                animated: true
            })
        );
    }

    #[test]
    fn refresh_clears_every_column() {
        let (list, scheduler) = build_list(StaggeredListSpec::default());
        list.extend([1, 2, 3, 4]);
        scheduler.run_until_idle();
        assert!(list.compose_column(0).len() + list.compose_column(1).len() > 0);

        let refreshed = Rc::new(Cell::new(false));
        let r = Rc::clone(&refreshed);
        list.state().set_on_refresh(move || r.set(true));
        list.refresh_requested();

        assert!(refreshed.get());
        assert_eq!(list.phase(), BatchPhase::Idle);
        assert!(list.compose_column(0).is_empty());
        assert!(list.compose_column(1).is_empty());
    }
}
