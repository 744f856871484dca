//! Widget surface for staggered lists.
//!
//! The engine in `stagger-foundation` is rendering-agnostic; this crate adds
//! the pieces an embedding application wires up: the [`StaggeredListSpec`]
//! configuration surface, the render-function plumbing, and the boundary
//! traits for the external scroll and measurement services.

pub mod host;
pub mod widgets;

pub use host::*;
pub use widgets::*;
