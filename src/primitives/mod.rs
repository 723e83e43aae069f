//! The identity types the hoisting engine reasons about.
//!
//! These are deliberately thin compared to a full package manager's
//! `Ident`/`Locator`/`Reference` types (no semver ranges, no fetch
//! protocols, no git/tarball variants) — the engine only needs to compare
//! and render identities, never resolve them.

mod ident;
mod locator;
mod name;
mod reference;

pub use ident::Ident;
pub use locator::Locator;
pub use name::PackageName;
pub use reference::Reference;
