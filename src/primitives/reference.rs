use std::fmt;

/// An opaque version/resolution string.
///
/// A reference may carry a `#`-delimited virtual decoration, e.g.
/// `virtual:deadbeef#npm:1.2.3` — the part before `#` identifies *which*
/// peer-resolution context produced this instance, the part after `#` (or
/// the whole string, if there is no `#`) is the "real" reference that
/// matters for identity comparisons.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference(String);

impl Reference {
    pub fn new<S: Into<String>>(reference: S) -> Reference {
        Reference(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reference stripped of any virtual decoration, used to compute
    /// [`crate::primitives::Ident`].
    pub fn real(&self) -> &str {
        match self.0.find('#') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.0.starts_with("virtual")
    }
}

impl From<&str> for Reference {
    fn from(reference: &str) -> Reference {
        Reference::new(reference)
    }
}

impl From<String> for Reference {
    fn from(reference: String) -> Reference {
        Reference::new(reference)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
