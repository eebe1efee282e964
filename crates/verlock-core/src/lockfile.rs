use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LockfileError;
use crate::metadata::Metadata;
use crate::name::PackageName;
use crate::package::{Artifact, Package};

/// A parsed `poetry.lock`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Lockfile {
  pub metadata: Metadata,
  /// Records in file order
  pub packages: Vec<Package>,
  /// Project extras: extra name to the package names it installs
  pub extras: BTreeMap<String, Vec<String>>,
  /// Comment lines above the first table, e.g. Poetry's `@generated` notice
  #[serde(skip_serializing_if = "Option::is_none")]
  pub header: Option<String>,
}

/// The document exactly as TOML lays it out.
#[derive(Debug, Deserialize)]
struct LockWire {
  #[serde(rename = "package", default)]
  packages: Vec<Package>,
  #[serde(default)]
  extras: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  metadata: Metadata,
}

impl TryFrom<LockWire> for Lockfile {
  type Error = LockfileError;

  fn try_from(wire: LockWire) -> Result<Self, LockfileError> {
    let LockWire {
      mut packages,
      extras,
      mut metadata,
    } = wire;

    if let Some(files) = metadata.extra.remove("files") {
      let files: BTreeMap<String, Vec<Artifact>> = files.try_into()?;
      metadata.orphan_files = attach_files(&mut packages, files);
    }

    Ok(Self {
      metadata,
      packages,
      extras,
      header: None,
    })
  }
}

/// Move `[metadata.files]` entries onto their package records. A name locked at
/// several versions gets each file whose name carries the version, the rest go
/// to the first record. Returns the entries that matched no record.
fn attach_files(
  packages: &mut [Package],
  files: BTreeMap<String, Vec<Artifact>>,
) -> BTreeMap<String, Vec<Artifact>> {
  let mut orphans = BTreeMap::new();

  for (name, artifacts) in files {
    let wanted = PackageName::new(&name);
    let indices: Vec<usize> = packages
      .iter()
      .enumerate()
      .filter(|(_, package)| package.normalized_name() == wanted)
      .map(|(i, _)| i)
      .collect();

    let Some(&first) = indices.first() else {
      warn!(package = %name, files = artifacts.len(), "[metadata.files] entry matches no package");
      orphans.insert(name, artifacts);
      continue;
    };

    for artifact in artifacts {
      let target = indices
        .iter()
        .copied()
        .find(|&i| names_version(&artifact.file, &packages[i].version))
        .unwrap_or(first);
      packages[target].files.push(artifact);
    }
  }

  orphans
}

/// Whether a distribution file name carries `version` whole: `numpy-1.2.tar.gz`
/// names `1.2`, `numpy-1.2.1.tar.gz` does not.
fn names_version(file: &str, version: &str) -> bool {
  const BOUNDARIES: &[&str] = &["-", ".tar", ".zip", ".whl", ".egg", ".exe"];
  let needle = format!("-{version}");
  file.match_indices(&needle).any(|(at, _)| {
    let rest = &file[at + needle.len()..];
    rest.is_empty() || BOUNDARIES.iter().any(|boundary| rest.starts_with(boundary))
  })
}

/// The comment block at the top of the file, without the trailing newline.
fn leading_comments(input: &str) -> Option<String> {
  let lines: Vec<&str> = input
    .lines()
    .take_while(|line| line.starts_with('#'))
    .collect();
  (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Parse the contents of a `poetry.lock`.
pub fn parse_lockfile(input: &str) -> Result<Lockfile, LockfileError> {
  let wire: LockWire = toml::from_str(input)?;
  let mut lockfile = Lockfile::try_from(wire)?;
  lockfile.header = leading_comments(input);
  debug!(
    packages = lockfile.packages.len(),
    lock_version = %lockfile.metadata.lock_version,
    "parsed lockfile"
  );
  Ok(lockfile)
}

impl Lockfile {
  pub fn new(metadata: Metadata, packages: Vec<Package>) -> Self {
    Self {
      metadata,
      packages,
      extras: BTreeMap::new(),
      header: None,
    }
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LockfileError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| LockfileError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    parse_lockfile(&contents)
  }

  /// The first record for `name`
  pub fn package(&self, name: &str) -> Option<&Package> {
    self.packages_named(name).next()
  }

  /// Every record for `name`. Poetry keeps one per version when marker
  /// branches resolved differently.
  pub fn packages_named(&self, name: &str) -> impl Iterator<Item = &Package> {
    let wanted = PackageName::new(name);
    self
      .packages
      .iter()
      .filter(move |package| package.normalized_name() == wanted)
  }

  /// Records that declare a dependency on `name`
  pub fn dependents(&self, name: &str) -> Vec<&Package> {
    let wanted = PackageName::new(name);
    self
      .packages
      .iter()
      .filter(|package| package.depends_on(&wanted))
      .collect()
  }

  /// Records no other record depends on
  pub fn roots(&self) -> Vec<&Package> {
    self
      .packages
      .iter()
      .filter(|package| {
        let name = package.normalized_name();
        !self
          .packages
          .iter()
          .any(|other| other.normalized_name() != name && other.depends_on(&name))
      })
      .collect()
  }
}
