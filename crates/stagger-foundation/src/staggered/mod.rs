//! Staggered ("masonry") placement engine.
//!
//! Items of variable, often unknown height are distributed across N columns
//! so the columns stay visually balanced as data streams in page by page.
//! Rendered heights arrive asynchronously and out of order; the engine feeds
//! them back into placement decisions.
//!
//! # Architecture
//!
//! - [`HeightTracker`] — per-column measured totals; answers "which column
//!   is currently shortest"
//! - [`ColumnAssigner`] / [`PlacementPolicy`] — destination column for the
//!   next item
//! - [`PlacementQueue`] — resumable cursor over the pending backlog
//! - [`Column`] — one vertical stream of placed items and their heights
//! - [`StaggeredListState`] — the controller tying the above together with
//!   the measurement feedback path and the batch lifecycle
//!
//! # Example
//!
//! ```rust,ignore
//! use stagger_foundation::{ManualScheduler, StaggeredConfig, StaggeredListState};
//!
//! let scheduler = ManualScheduler::new();
//! let state = StaggeredListState::new(
//!     StaggeredConfig::new().columns(2),
//!     Rc::new(scheduler.clone()),
//! )?;
//! state.set_on_load_complete(|| println!("page placed"));
//! state.extend(fetch_page());
//! // the embedding renderer reports heights as layout completes:
//! state.report_item_height(state.generation(), 0, 0, 120.0);
//! ```

mod column;
mod controller;
mod height_tracker;
mod measurement;
mod placement_queue;
mod policy;

pub use column::*;
pub use controller::*;
pub use height_tracker::*;
pub use measurement::*;
pub use placement_queue::*;
pub use policy::*;
