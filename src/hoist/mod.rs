//! The hoisting engine: five cooperating components operating over one
//! arena-allocated working graph, leaves first.
//!
//! [`input`] and [`work`] hold the data model (components A's output and
//! input), [`ancestors`] builds the popularity index (component B),
//! [`candidates`] and [`apply`] are the fixed-point core (components C and
//! D), and [`check`]/[`shrink`] are the two halves of component E.
//! [`hoister`] and [`render`] wire everything together behind the public
//! façade.

mod ancestors;
mod apply;
mod candidates;
mod check;
mod hoister;
mod input;
mod render;
mod shrink;
mod work;

/// A stable handle into a [`WorkTree`]'s or [`InputTree`]'s node arena.
/// Cycles in the source graph are the same handle reused, never expanded.
pub type NodeId = usize;

pub use hoister::{hoist, HoistOptions, Hoister};
pub use input::{InputNode, InputTree};
pub use render::TreeRenderer;
pub use shrink::{OutputNode, OutputTree};
pub use work::{WorkNode, WorkTree};
