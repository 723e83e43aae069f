use std::fmt;

use super::{PackageName, Reference};

/// Identifies a package instance *modulo* virtualization: `name@real_reference`.
///
/// Two nodes with the same [`Ident`] are interchangeable for hoisting
/// purposes even if they carry different [`Reference`]s (e.g. one virtual,
/// one not) — see invariant 4 in the data model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: &PackageName, reference: &Reference) -> Ident {
        Ident(format!("{name}@{}", reference.real()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_and_physical_references_share_an_ident() {
        let name = PackageName::new("react");
        let physical = Reference::new("npm:18.0.0");
        let virt = Reference::new("virtual:deadbeef#npm:18.0.0");

        assert_eq!(Ident::new(&name, &physical), Ident::new(&name, &virt));
    }
}
