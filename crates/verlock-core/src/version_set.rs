use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::str::FromStr;

use crate::error::VersionSetParseError;
use crate::version::Version;

/// A predicate over versions, e.g. `>=1.0 & <2.0 | 3.0`.
///
/// Sets are plain expression trees: combining two sets never simplifies or
/// normalizes them, so membership is always decided by walking the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum VersionSet {
  /// Matches nothing
  None,
  /// Matches everything
  #[default]
  Any,
  Eq(Version),
  NotEq(Version),
  Gt(Version),
  GtEq(Version),
  Lt(Version),
  LtEq(Version),
  /// Intersection of every member
  All(Vec<VersionSet>),
  /// Union of every member
  AnyOf(Vec<VersionSet>),
  /// Complement
  Not(Box<VersionSet>),
}

impl VersionSet {
  pub fn parse(input: &str) -> Result<Self, VersionSetParseError> {
    crate::parse::parse_version_set(input)
  }

  /// Intersection of `sets`. A single set is returned as-is, no sets at all
  /// allow every version.
  pub fn all(sets: impl IntoIterator<Item = Self>) -> Self {
    let mut sets: Vec<Self> = sets.into_iter().collect();
    match sets.len() {
      0 => Self::Any,
      1 => sets.remove(0),
      _ => Self::All(sets),
    }
  }

  /// Union of `sets`. A single set is returned as-is, no sets at all allow
  /// no version.
  pub fn any(sets: impl IntoIterator<Item = Self>) -> Self {
    let mut sets: Vec<Self> = sets.into_iter().collect();
    match sets.len() {
      0 => Self::None,
      1 => sets.remove(0),
      _ => Self::AnyOf(sets),
    }
  }

  pub fn contains(&self, version: &Version) -> bool {
    match self {
      Self::None => false,
      Self::Any => true,
      Self::Eq(v) => version == v,
      Self::NotEq(v) => version != v,
      Self::Gt(v) => version > v,
      Self::GtEq(v) => version >= v,
      Self::Lt(v) => version < v,
      Self::LtEq(v) => version <= v,
      Self::All(sets) => sets.iter().all(|set| set.contains(version)),
      Self::AnyOf(sets) => sets.iter().any(|set| set.contains(version)),
      Self::Not(set) => !set.contains(version),
    }
  }

  #[must_use]
  pub fn union(&self, other: &Self) -> Self {
    match self {
      Self::AnyOf(sets) => {
        let mut sets = sets.clone();
        sets.push(other.clone());
        Self::AnyOf(sets)
      }
      _ => Self::AnyOf(vec![self.clone(), other.clone()]),
    }
  }

  #[must_use]
  pub fn intersection(&self, other: &Self) -> Self {
    match self {
      Self::All(sets) => {
        let mut sets = sets.clone();
        sets.push(other.clone());
        Self::All(sets)
      }
      _ => Self::All(vec![self.clone(), other.clone()]),
    }
  }

  #[must_use]
  pub fn complement(&self) -> Self {
    Self::Not(Box::new(self.clone()))
  }

  /// Versions in `self` that are not in `other`.
  #[must_use]
  pub fn difference(&self, other: &Self) -> Self {
    self.intersection(&other.complement())
  }

  /// The versions from `versions` this set allows, in their original order.
  pub fn filter_allowed<'a>(&self, versions: impl IntoIterator<Item = &'a Version>) -> Vec<Version> {
    versions
      .into_iter()
      .filter(|version| self.contains(version))
      .cloned()
      .collect()
  }

  pub const fn is_any(&self) -> bool {
    matches!(self, Self::Any)
  }
}

impl BitOr for VersionSet {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self {
    self.union(&rhs)
  }
}

impl BitAnd for VersionSet {
  type Output = Self;

  fn bitand(self, rhs: Self) -> Self {
    self.intersection(&rhs)
  }
}

impl Not for VersionSet {
  type Output = Self;

  fn not(self) -> Self {
    Self::Not(Box::new(self))
  }
}

impl From<Version> for VersionSet {
  fn from(version: Version) -> Self {
    Self::Eq(version)
  }
}

impl FromStr for VersionSet {
  type Err = VersionSetParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

fn write_joined(f: &mut fmt::Formatter<'_>, sets: &[VersionSet], separator: &str) -> fmt::Result {
  f.write_str("(")?;
  for (i, set) in sets.iter().enumerate() {
    if i > 0 {
      f.write_str(separator)?;
    }
    write!(f, "{set}")?;
  }
  f.write_str(")")
}

impl fmt::Display for VersionSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::None => f.write_str("none"),
      Self::Any => f.write_str("any"),
      Self::Eq(v) => write!(f, "{v}"),
      Self::NotEq(v) => write!(f, "!={v}"),
      Self::Gt(v) => write!(f, ">{v}"),
      Self::GtEq(v) => write!(f, ">={v}"),
      Self::Lt(v) => write!(f, "<{v}"),
      Self::LtEq(v) => write!(f, "<={v}"),
      Self::All(sets) => write_joined(f, sets, " & "),
      Self::AnyOf(sets) => write_joined(f, sets, " | "),
      Self::Not(set) => write!(f, "!{set}"),
    }
  }
}

impl serde::Serialize for VersionSet {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}
