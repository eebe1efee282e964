use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HashDigestError;
use crate::package::Artifact;
use crate::version::Version;

/// Lock format versions written by released Poetry versions.
pub const KNOWN_LOCK_VERSIONS: &[&str] = &["1.0", "1.1", "2.0", "2.1"];

/// The `[metadata]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
  #[serde(rename = "lock-version", default = "default_lock_version")]
  pub lock_version: String,

  /// Interpreter constraint of the whole project, e.g. `^3.8`
  #[serde(rename = "python-versions", default = "default_python_versions")]
  pub python_versions: String,

  /// sha256 of the `pyproject.toml` the lock was generated from
  #[serde(rename = "content-hash", default)]
  pub content_hash: String,

  /// `[metadata.files]` entries of a 1.x lock that matched no package
  #[serde(skip)]
  pub orphan_files: BTreeMap<String, Vec<Artifact>>,

  #[serde(flatten)]
  pub extra: BTreeMap<String, toml::Value>,
}

/// Poetry reads a lock without a version as the oldest format.
fn default_lock_version() -> String {
  "1.0".to_string()
}

pub(crate) fn default_python_versions() -> String {
  "*".to_string()
}

impl Default for Metadata {
  fn default() -> Self {
    Self {
      lock_version: default_lock_version(),
      python_versions: default_python_versions(),
      content_hash: String::new(),
      orphan_files: BTreeMap::new(),
      extra: BTreeMap::new(),
    }
  }
}

impl Metadata {
  /// Lock format 2.0 moved the artifact list from `[metadata.files]` onto each
  /// package. Unparsable versions are treated as the newer layout.
  pub fn has_inline_files(&self) -> bool {
    !Version::parse(&self.lock_version).is_ok_and(|v| v < Version::from_release(&[2]))
  }

  pub fn is_known_lock_version(&self) -> bool {
    KNOWN_LOCK_VERSIONS.contains(&self.lock_version.as_str())
  }

  #[must_use]
  pub fn with_lock_version(mut self, lock_version: &str) -> Self {
    self.lock_version = lock_version.to_string();
    self
  }

  #[must_use]
  pub fn with_python_versions(mut self, python_versions: &str) -> Self {
    self.python_versions = python_versions.to_string();
    self
  }

  #[must_use]
  pub fn with_content_hash(mut self, content_hash: &str) -> Self {
    self.content_hash = content_hash.to_string();
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
  Md5,
  Sha256,
  Sha384,
  Sha512,
}

impl HashAlgorithm {
  /// Number of hex characters in a digest of this algorithm
  pub const fn hex_len(self) -> usize {
    match self {
      Self::Md5 => 32,
      Self::Sha256 => 64,
      Self::Sha384 => 96,
      Self::Sha512 => 128,
    }
  }

  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Md5 => "md5",
      Self::Sha256 => "sha256",
      Self::Sha384 => "sha384",
      Self::Sha512 => "sha512",
    }
  }
}

impl FromStr for HashAlgorithm {
  type Err = HashDigestError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "md5" => Ok(Self::Md5),
      "sha256" => Ok(Self::Sha256),
      "sha384" => Ok(Self::Sha384),
      "sha512" => Ok(Self::Sha512),
      _ => Err(HashDigestError::UnknownAlgorithm(s.to_string())),
    }
  }
}

impl fmt::Display for HashAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A well-formed `algorithm:hexdigest` artifact hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HashDigest {
  pub algorithm: HashAlgorithm,
  pub digest: String,
}

impl HashDigest {
  pub fn parse(input: &str) -> Result<Self, HashDigestError> {
    let (algorithm, digest) = input
      .split_once(':')
      .ok_or_else(|| HashDigestError::MissingAlgorithm(input.to_string()))?;
    let algorithm: HashAlgorithm = algorithm.parse()?;

    if digest.len() != algorithm.hex_len() || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
      return Err(HashDigestError::InvalidDigest {
        algorithm: algorithm.to_string(),
        expected: algorithm.hex_len(),
        digest: digest.to_string(),
      });
    }

    Ok(Self {
      algorithm,
      digest: digest.to_string(),
    })
  }
}

impl FromStr for HashDigest {
  type Err = HashDigestError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for HashDigest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.algorithm, self.digest)
  }
}

/// Whether `hash` looks like the hex sha256 Poetry stores as `content-hash`.
pub fn is_content_hash(hash: &str) -> bool {
  hash.len() == HashAlgorithm::Sha256.hex_len() && hash.chars().all(|c| c.is_ascii_hexdigit())
}
