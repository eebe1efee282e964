// Names from
// https://packaging.python.org/en/latest/specifications/name-normalization/

use std::borrow::Borrow;
use std::fmt;

/// A package name folded to its comparable form, e.g. `Zope.Interface` and
/// `zope_interface` both become `zope-interface`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageName(String);

impl PackageName {
  pub fn new(name: &str) -> Self {
    Self(normalize(name))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for PackageName {
  fn from(name: &str) -> Self {
    Self::new(name)
  }
}

impl Borrow<str> for PackageName {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for PackageName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl serde::Serialize for PackageName {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.0)
  }
}

/// Lowercase the name and collapse every run of `-`, `_` and `.` into a single `-`.
pub fn normalize(name: &str) -> String {
  let mut normalized = String::with_capacity(name.len());
  let mut in_separator = false;
  for c in name.trim().chars() {
    if matches!(c, '-' | '_' | '.') {
      in_separator = true;
      continue;
    }
    if in_separator && !normalized.is_empty() {
      normalized.push('-');
    }
    in_separator = false;
    normalized.push(c.to_ascii_lowercase());
  }
  normalized
}
