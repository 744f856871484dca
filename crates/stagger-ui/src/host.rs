//! Boundary traits for the embedding application's external services.
//!
//! Scrolling, view recycling, and height measurement are not implemented
//! here; the widget talks to them through these interfaces and forwards the
//! configuration knobs they expect.

/// Parameters for the imperative scroll-to-offset operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollToOffset {
    pub y: f32,
    pub animated: bool,
}

impl Default for ScrollToOffset {
    fn default() -> Self {
        Self {
            y: 0.0,
            animated: false,
        }
    }
}

/// External scroll service the widget delegates actual scrolling to.
///
/// Implementations also deliver scroll, refresh, and end-reached signals
/// back into the widget; see the `scrolled`, `refresh_requested`, and
/// `end_reached` entry points on the widget.
pub trait ScrollHost {
    fn scroll_to_offset(&mut self, params: ScrollToOffset);
}

/// Knobs forwarded verbatim to the scroll service. None of them is engine
/// logic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollHostProps {
    /// How far from the bottom (as a fraction of visible length) the
    /// end-reached signal should fire.
    pub on_end_reached_threshold: f32,
    /// Minimum milliseconds between scroll events.
    pub scroll_event_throttle: u32,
    pub shows_vertical_scroll_indicator: bool,
    /// Whether the refresh control is currently spinning.
    pub refreshing: bool,
    /// Whether the scroll view bounces past its edges.
    pub bounces: bool,
    /// Whether off-screen subviews are detached from the native hierarchy.
    pub remove_clipped_subviews: bool,
}
