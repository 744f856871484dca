//! Foundation elements for Stagger: the column-balancing placement engine
//! behind a multi-column ("masonry") list.

pub mod scheduler;
pub mod staggered;

// Re-export commonly used items
pub use scheduler::*;
pub use staggered::*;

pub mod prelude {
    pub use crate::scheduler::{ManualScheduler, ScheduleHandle, Scheduler};
    pub use crate::staggered::{
        BatchPhase, Column, ConfigError, HeightTracker, MeasureResult, PlacedItem,
        PlacementPolicy, ScrollEvent, StaggeredConfig, StaggeredListState,
    };
}
