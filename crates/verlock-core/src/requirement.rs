use std::fmt;
use std::str::FromStr;

use crate::error::RequirementParseError;
use crate::name::PackageName;
use crate::version::Version;
use crate::version_set::VersionSet;

/// A dependency on a package: `name[extra, ...] version-set ; marker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
  /// The name as written
  pub name: String,
  pub extras: Vec<String>,
  pub version_set: VersionSet,
  /// Environment marker, kept verbatim and never evaluated
  pub marker: Option<String>,
}

impl Requirement {
  pub fn parse(input: &str) -> Result<Self, RequirementParseError> {
    crate::parse::parse_requirement(input)
  }

  pub fn new(name: impl Into<String>, version_set: VersionSet) -> Self {
    Self {
      name: name.into(),
      extras: Vec::new(),
      version_set,
      marker: None,
    }
  }

  #[must_use]
  pub fn with_extras(mut self, extras: impl IntoIterator<Item = impl Into<String>>) -> Self {
    self.extras = extras.into_iter().map(Into::into).collect();
    self
  }

  pub fn package_name(&self) -> PackageName {
    PackageName::new(&self.name)
  }

  pub fn is_satisfied_by(&self, version: &Version) -> bool {
    self.version_set.contains(version)
  }
}

impl fmt::Display for Requirement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name)?;
    if !self.extras.is_empty() {
      write!(f, "[{}]", self.extras.join(","))?;
    }
    if !self.version_set.is_any() {
      write!(f, " {}", self.version_set)?;
    }
    if let Some(marker) = &self.marker {
      write!(f, " ; {marker}")?;
    }
    Ok(())
  }
}

impl FromStr for Requirement {
  type Err = RequirementParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}
