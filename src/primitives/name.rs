use std::fmt;

/// A human-visible package name, e.g. `lodash` or `@scope/pkg`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    pub fn new<S: Into<String>>(name: S) -> PackageName {
        PackageName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(name: &str) -> PackageName {
        PackageName::new(name)
    }
}

impl From<String> for PackageName {
    fn from(name: String) -> PackageName {
        PackageName::new(name)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
