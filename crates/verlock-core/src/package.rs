use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HashDigestError, VersionParseError, VersionSetParseError};
use crate::metadata::{HashDigest, default_python_versions};
use crate::name::PackageName;
use crate::version::Version;
use crate::version_set::VersionSet;

/// Dependency group a package was locked for. Newer Poetry versions no longer
/// write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Main,
  Dev,
}

impl Category {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Main => "main",
      Self::Dev => "dev",
    }
  }
}

/// A downloadable distribution of a package and its hash,
/// e.g. `{file = "attrs-22.1.0.tar.gz", hash = "sha256:..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
  pub file: String,
  pub hash: String,
  #[serde(flatten)]
  pub extra: BTreeMap<String, toml::Value>,
}

impl Artifact {
  pub fn new(file: &str, hash: &str) -> Self {
    Self {
      file: file.to_string(),
      hash: hash.to_string(),
      extra: BTreeMap::new(),
    }
  }

  pub fn digest(&self) -> Result<HashDigest, HashDigestError> {
    HashDigest::parse(&self.hash)
  }
}

/// Where a package that does not come from PyPI was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSource {
  /// `git`, `directory`, `file`, `url` or `legacy`
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reference: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub resolved_reference: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subdirectory: Option<String>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, toml::Value>,
}

impl PackageSource {
  pub fn new(kind: &str, url: &str) -> Self {
    Self {
      kind: kind.to_string(),
      url: url.to_string(),
      reference: None,
      resolved_reference: None,
      subdirectory: None,
      extra: BTreeMap::new(),
    }
  }
}

/// The inline-table form of a dependency,
/// e.g. `{version = ">=1.0", markers = "python_version < \"3.8\""}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyDetail {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub python: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub markers: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub optional: Option<bool>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub extras: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub develop: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub git: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub branch: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tag: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rev: Option<String>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, toml::Value>,
}

impl DependencyDetail {
  pub fn is_optional(&self) -> bool {
    self.optional.unwrap_or(false)
  }

  /// Directly referenced dependencies (git, path, url) carry no version.
  fn version_set(&self) -> Result<VersionSet, VersionSetParseError> {
    self
      .version
      .as_deref()
      .map_or(Ok(VersionSet::Any), VersionSet::parse)
  }
}

/// The right-hand side of an entry in `[package.dependencies]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
  /// `requests = ">=2.0"`
  Simple(String),
  /// `requests = {version = ">=2.0", optional = true}`
  Detailed(DependencyDetail),
  /// One table per marker branch:
  /// `numpy = [{version = ">=1.21", markers = "..."}, {version = ">=1.23", markers = "..."}]`
  Multiple(Vec<DependencyDetail>),
}

impl DependencySpec {
  pub fn details(&self) -> &[DependencyDetail] {
    match self {
      Self::Simple(_) => &[],
      Self::Detailed(detail) => std::slice::from_ref(detail),
      Self::Multiple(details) => details,
    }
  }

  pub fn constraints(&self) -> Vec<&str> {
    match self {
      Self::Simple(constraint) => vec![constraint.as_str()],
      _ => self
        .details()
        .iter()
        .filter_map(|detail| detail.version.as_deref())
        .collect(),
    }
  }

  /// True when every branch is optional
  pub fn is_optional(&self) -> bool {
    match self {
      Self::Simple(_) => false,
      Self::Detailed(detail) => detail.is_optional(),
      Self::Multiple(details) => !details.is_empty() && details.iter().all(DependencyDetail::is_optional),
    }
  }

  /// The versions this dependency accepts; marker branches are combined.
  pub fn version_set(&self) -> Result<VersionSet, VersionSetParseError> {
    match self {
      Self::Simple(constraint) => VersionSet::parse(constraint),
      Self::Detailed(detail) => detail.version_set(),
      Self::Multiple(details) => Ok(VersionSet::any(
        details
          .iter()
          .map(DependencyDetail::version_set)
          .collect::<Result<Vec<_>, _>>()?,
      )),
    }
  }

  /// Extras requested on the dependency by any branch, without duplicates
  pub fn extras(&self) -> Vec<String> {
    let mut extras: Vec<String> = Vec::new();
    for extra in self.details().iter().flat_map(|detail| &detail.extras) {
      if !extras.contains(extra) {
        extras.push(extra.clone());
      }
    }
    extras
  }
}

impl From<&str> for DependencySpec {
  fn from(constraint: &str) -> Self {
    Self::Simple(constraint.to_string())
  }
}

impl From<DependencyDetail> for DependencySpec {
  fn from(detail: DependencyDetail) -> Self {
    Self::Detailed(detail)
  }
}

/// One `[[package]]` entry of a lock file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
  /// Name as written, see [`Package::normalized_name`] for comparisons
  pub name: String,

  /// The pinned version, kept verbatim
  pub version: String,

  #[serde(default)]
  pub description: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<Category>,

  #[serde(default)]
  pub optional: bool,

  #[serde(rename = "python-versions", default = "default_python_versions")]
  pub python_versions: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub develop: Option<bool>,

  /// Inline since lock format 2.0, moved here from `[metadata.files]` for older locks
  #[serde(default)]
  pub files: Vec<Artifact>,

  /// Poetry writes these sorted by name, which is also the iteration order here
  #[serde(default)]
  pub dependencies: BTreeMap<String, DependencySpec>,

  /// Extra name to the requirement strings it pulls in
  #[serde(default)]
  pub extras: BTreeMap<String, Vec<String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<PackageSource>,

  /// Keys this model does not know about, written back untouched
  #[serde(flatten)]
  pub extra: BTreeMap<String, toml::Value>,
}

impl Package {
  pub fn new(name: &str, version: &str) -> Self {
    Self {
      name: name.to_string(),
      version: version.to_string(),
      description: String::new(),
      category: None,
      optional: false,
      python_versions: default_python_versions(),
      develop: None,
      files: Vec::new(),
      dependencies: BTreeMap::new(),
      extras: BTreeMap::new(),
      source: None,
      extra: BTreeMap::new(),
    }
  }

  pub fn normalized_name(&self) -> PackageName {
    PackageName::new(&self.name)
  }

  pub fn parsed_version(&self) -> Result<Version, VersionParseError> {
    Version::parse(&self.version)
  }

  pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
    self.dependencies.keys().map(String::as_str)
  }

  /// The dependency entry for `name`, compared by normalized name
  pub fn dependency(&self, name: &str) -> Option<&DependencySpec> {
    let wanted = PackageName::new(name);
    self
      .dependencies
      .iter()
      .find(|(dep, _)| PackageName::new(dep) == wanted)
      .map(|(_, spec)| spec)
  }

  pub fn depends_on(&self, name: &PackageName) -> bool {
    self
      .dependencies
      .keys()
      .any(|dep| PackageName::new(dep) == *name)
  }

  #[must_use]
  pub fn with_description(mut self, description: &str) -> Self {
    self.description = description.to_string();
    self
  }

  #[must_use]
  pub fn with_category(mut self, category: Category) -> Self {
    self.category = Some(category);
    self
  }

  #[must_use]
  pub fn with_optional(mut self, optional: bool) -> Self {
    self.optional = optional;
    self
  }

  #[must_use]
  pub fn with_python_versions(mut self, python_versions: &str) -> Self {
    self.python_versions = python_versions.to_string();
    self
  }

  #[must_use]
  pub fn with_dependency(mut self, name: &str, spec: impl Into<DependencySpec>) -> Self {
    self.dependencies.insert(name.to_string(), spec.into());
    self
  }

  #[must_use]
  pub fn with_extra(mut self, extra: &str, requirements: &[&str]) -> Self {
    self.extras.insert(
      extra.to_string(),
      requirements.iter().map(ToString::to_string).collect(),
    );
    self
  }

  #[must_use]
  pub fn with_file(mut self, artifact: Artifact) -> Self {
    self.files.push(artifact);
    self
  }

  #[must_use]
  pub fn with_source(mut self, source: PackageSource) -> Self {
    self.source = Some(source);
    self
  }
}
