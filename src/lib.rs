#![deny(unused_crate_dependencies)]

//! A dependency hoisting engine for flat `node_modules`-style install layouts.
//!
//! Given a (possibly cyclic) graph of packages with regular and peer
//! dependencies, [`hoist`] promotes duplicate package instances as close to
//! the root as the two correctness promises in [`primitives`] allow:
//! a package's regular dependencies always resolve to the exact instance it
//! declared, and its peer dependencies always resolve to whatever its parent
//! sees.

pub mod error;
pub mod hoist;
pub mod primitives;

pub use error::HoistError;
pub use hoist::{
    hoist, HoistOptions, Hoister, InputNode, InputTree, NodeId, OutputNode, OutputTree,
    TreeRenderer, WorkNode, WorkTree,
};
