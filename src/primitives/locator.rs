use std::fmt;

use super::{PackageName, Reference};

/// Identifies a package instance *including* virtualization: `name@reference`.
///
/// Unlike [`super::Ident`], two [`Locator`]s with the same name but
/// differently-decorated references are distinct.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(String);

impl Locator {
    pub fn new(name: &PackageName, reference: &Reference) -> Locator {
        Locator(format!("{name}@{reference}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
