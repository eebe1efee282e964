use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::VersionParseError;

/// Rank of the qualifiers we know how to order. Anything missing from this
/// table sorts below every known qualifier.
const QUALIFIERS: &[(&str, u8)] = &[
  ("alpha", 0),
  ("a", 0),
  ("beta", 1),
  ("b", 1),
  ("milestone", 2),
  ("m", 2),
  ("rc", 3),
  ("cr", 3),
  ("c", 3),
  ("", 4),
  ("snapshot", 5),
  ("dev", 5),
  ("final", 6),
  ("ga", 6),
  ("post", 7),
  ("sp", 7),
];

/// The rank a missing component compares as.
const RELEASE_RANK: u8 = 4;

fn qualifier_rank(qualifier: &str) -> Option<u8> {
  let lowered = qualifier.to_ascii_lowercase();
  QUALIFIERS
    .iter()
    .find(|(name, _)| *name == lowered)
    .map(|(_, rank)| *rank)
}

/// One run of a version string.
///
/// `1.2.0rc1-SNAPSHOT` is made of `Numeric([1, 2, 0])`, `Qualifier("rc")`,
/// `Numeric([1])` and `Qualifier("SNAPSHOT")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
  /// Dot-separated integers, e.g. `1.2.0`
  Numeric(Vec<u64>),
  /// A word such as `alpha`, `rc`, `SNAPSHOT`
  Qualifier(String),
}

impl Component {
  /// Compare against a component the other version does not have.
  fn cmp_missing(&self) -> Ordering {
    match self {
      Self::Numeric(_) => Ordering::Greater,
      Self::Qualifier(word) => {
        qualifier_rank(word).map_or(Ordering::Less, |rank| rank.cmp(&RELEASE_RANK))
      }
    }
  }

  fn cmp_component(&self, other: &Self) -> Ordering {
    match (self, other) {
      (Self::Numeric(a), Self::Numeric(b)) => {
        let len = a.len().max(b.len());
        (0..len)
          .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
          })
          .find(|ordering| ordering.is_ne())
          .unwrap_or(Ordering::Equal)
      }
      (Self::Numeric(_), Self::Qualifier(_)) => Ordering::Greater,
      (Self::Qualifier(_), Self::Numeric(_)) => Ordering::Less,
      (Self::Qualifier(a), Self::Qualifier(b)) => match (qualifier_rank(a), qualifier_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
      },
    }
  }
}

impl fmt::Display for Component {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Numeric(items) => {
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            f.write_str(".")?;
          }
          write!(f, "{item}")?;
        }
        Ok(())
      }
      Self::Qualifier(word) => f.write_str(word),
    }
  }
}

/// A parsed version.
///
/// Keeps the string it was parsed from so that displaying a version never
/// changes how the user wrote it; comparisons only look at the components.
#[derive(Debug, Clone)]
pub struct Version {
  original: String,
  components: Vec<Component>,
}

impl Version {
  pub fn parse(input: &str) -> Result<Self, VersionParseError> {
    crate::parse::parse_version(input)
  }

  pub(crate) fn from_parts(original: String, components: Vec<Component>) -> Self {
    Self {
      original,
      components,
    }
  }

  /// Build a version out of release numbers, e.g. `[2, 0]` for `2.0`.
  pub fn from_release(release: &[u64]) -> Self {
    let original = release
      .iter()
      .map(u64::to_string)
      .collect::<Vec<_>>()
      .join(".");
    Self {
      original,
      components: vec![Component::Numeric(release.to_vec())],
    }
  }

  pub fn as_str(&self) -> &str {
    &self.original
  }

  pub fn components(&self) -> &[Component] {
    &self.components
  }

  /// The leading numbers of the version, e.g. `[1, 2, 3]` for `1.2.3rc1`.
  /// Empty when the version starts with a qualifier.
  pub fn release(&self) -> &[u64] {
    match self.components.first() {
      Some(Component::Numeric(items)) => items,
      _ => &[],
    }
  }
}

impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    let len = self.components.len().max(other.components.len());
    for i in 0..len {
      let ordering = match (self.components.get(i), other.components.get(i)) {
        (Some(a), Some(b)) => a.cmp_component(b),
        (Some(a), None) => a.cmp_missing(),
        (None, Some(b)) => b.cmp_missing().reverse(),
        (None, None) => Ordering::Equal,
      };
      if ordering.is_ne() {
        return ordering;
      }
    }
    Ordering::Equal
  }
}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other).is_eq()
  }
}

impl Eq for Version {}

impl Hash for Version {
  fn hash<H: Hasher>(&self, state: &mut H) {
    // Equal versions only differ in trailing zeros and qualifier spelling.
    for component in &self.components {
      match component {
        Component::Numeric(items) => {
          0u8.hash(state);
          let end = items.iter().rposition(|item| *item != 0).map_or(0, |i| i + 1);
          items[..end].hash(state);
        }
        Component::Qualifier(word) => match qualifier_rank(word) {
          Some(rank) => {
            1u8.hash(state);
            rank.hash(state);
          }
          None => {
            2u8.hash(state);
            word.to_ascii_lowercase().hash(state);
          }
        },
      }
    }
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.original)
  }
}

impl FromStr for Version {
  type Err = VersionParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl serde::Serialize for Version {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.original)
  }
}

impl<'de> serde::Deserialize<'de> for Version {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Self::parse(&s).map_err(serde::de::Error::custom)
  }
}
