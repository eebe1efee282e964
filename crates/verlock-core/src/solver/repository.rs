use std::collections::BTreeMap;

use tracing::debug;

use crate::error::RepositoryError;
use crate::lockfile::Lockfile;
use crate::name::PackageName;
use crate::package::Package;
use crate::requirement::Requirement;
use crate::version::Version;

/// Where the solver learns which versions exist and what they depend on.
pub trait Repository {
  /// Every known version of `name`, in any order. Unknown packages have none.
  fn versions(&self, name: &PackageName) -> Result<Vec<Version>, RepositoryError>;

  fn dependencies(
    &self,
    name: &PackageName,
    version: &Version,
  ) -> Result<Vec<Requirement>, RepositoryError>;

  /// The additional requirements `name[extra]` brings in at `version`
  fn extra_dependencies(
    &self,
    _name: &PackageName,
    _version: &Version,
    _extra: &str,
  ) -> Result<Vec<Requirement>, RepositoryError> {
    Ok(Vec::new())
  }
}

#[derive(Debug, Clone)]
struct Release {
  version: Version,
  dependencies: Vec<Requirement>,
  extras: BTreeMap<String, Vec<Requirement>>,
}

/// A package index held in memory, e.g. loaded from JSON:
///
/// ```json
/// { "foo": { "1.0": ["bar >=1.0"], "2.0": [] }, "bar": { "1.0": [] } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
  packages: BTreeMap<PackageName, Vec<Release>>,
}

impl InMemoryRepository {
  pub fn new() -> Self {
    Self::default()
  }

  /// Decode the `name -> version -> [requirement]` JSON shape.
  pub fn from_json(input: &str) -> Result<Self, RepositoryError> {
    let index: BTreeMap<String, BTreeMap<String, Vec<String>>> = serde_json::from_str(input)?;
    let mut repository = Self::new();
    for (name, releases) in &index {
      for (version, requirements) in releases {
        let requirements: Vec<&str> = requirements.iter().map(String::as_str).collect();
        repository.add(name, version, &requirements)?;
      }
    }
    debug!(packages = repository.packages.len(), "loaded package index");
    Ok(repository)
  }

  /// Register `name` at `version`. A version that is already known is replaced.
  pub fn add(
    &mut self,
    name: &str,
    version: &str,
    requirements: &[&str],
  ) -> Result<&mut Self, RepositoryError> {
    let release = Release {
      version: Version::parse(version)?,
      dependencies: requirements
        .iter()
        .map(|requirement| Requirement::parse(requirement))
        .collect::<Result<_, _>>()?,
      extras: BTreeMap::new(),
    };

    let releases = self.packages.entry(PackageName::new(name)).or_default();
    releases.retain(|existing| existing.version != release.version);
    releases.push(release);
    Ok(self)
  }

  /// Declare what `name[extra]` requires at `version`, which must already be added.
  pub fn add_extra(
    &mut self,
    name: &str,
    version: &str,
    extra: &str,
    requirements: &[&str],
  ) -> Result<&mut Self, RepositoryError> {
    let release = self.release_mut(&PackageName::new(name), &Version::parse(version)?)?;
    let requirements = requirements
      .iter()
      .map(|requirement| Requirement::parse(requirement))
      .collect::<Result<_, _>>()?;
    release.extras.insert(extra.to_string(), requirements);
    Ok(self)
  }

  fn release(&self, name: &PackageName, version: &Version) -> Result<&Release, RepositoryError> {
    self
      .packages
      .get(name)
      .and_then(|releases| releases.iter().find(|release| release.version == *version))
      .ok_or_else(|| RepositoryError::UnknownVersion {
        name: name.to_string(),
        version: version.to_string(),
      })
  }

  fn release_mut(
    &mut self,
    name: &PackageName,
    version: &Version,
  ) -> Result<&mut Release, RepositoryError> {
    self
      .packages
      .get_mut(name)
      .and_then(|releases| releases.iter_mut().find(|release| release.version == *version))
      .ok_or_else(|| RepositoryError::UnknownVersion {
        name: name.to_string(),
        version: version.to_string(),
      })
  }
}

impl Repository for InMemoryRepository {
  fn versions(&self, name: &PackageName) -> Result<Vec<Version>, RepositoryError> {
    Ok(
      self
        .packages
        .get(name)
        .map(|releases| releases.iter().map(|release| release.version.clone()).collect())
        .unwrap_or_default(),
    )
  }

  fn dependencies(
    &self,
    name: &PackageName,
    version: &Version,
  ) -> Result<Vec<Requirement>, RepositoryError> {
    Ok(self.release(name, version)?.dependencies.clone())
  }

  fn extra_dependencies(
    &self,
    name: &PackageName,
    version: &Version,
    extra: &str,
  ) -> Result<Vec<Requirement>, RepositoryError> {
    let release = self.release(name, version)?;
    Ok(
      release
        .extras
        .iter()
        .find(|(candidate, _)| PackageName::new(candidate) == PackageName::new(extra))
        .map(|(_, requirements)| requirements.clone())
        .unwrap_or_default(),
    )
  }
}

/// Answers queries from the records of a lock file, so a lock can be
/// re-resolved without an index.
///
/// Dependencies on names that have no record are dropped: Poetry omits
/// packages whose markers never apply.
#[derive(Debug, Clone, Copy)]
pub struct LockfileRepository<'a> {
  lockfile: &'a Lockfile,
}

impl<'a> LockfileRepository<'a> {
  pub fn new(lockfile: &'a Lockfile) -> Self {
    Self { lockfile }
  }

  fn record(&self, name: &PackageName, version: &Version) -> Result<&'a Package, RepositoryError> {
    self
      .lockfile
      .packages_named(name.as_str())
      .find(|package| package.parsed_version().is_ok_and(|locked| locked == *version))
      .ok_or_else(|| RepositoryError::UnknownVersion {
        name: name.to_string(),
        version: version.to_string(),
      })
  }

  fn is_locked(&self, name: &str) -> bool {
    let locked = self.lockfile.package(name).is_some();
    if !locked {
      debug!(dependency = name, "skipping dependency without a locked record");
    }
    locked
  }
}

impl Repository for LockfileRepository<'_> {
  fn versions(&self, name: &PackageName) -> Result<Vec<Version>, RepositoryError> {
    self
      .lockfile
      .packages_named(name.as_str())
      .map(|package| package.parsed_version().map_err(RepositoryError::from))
      .collect()
  }

  fn dependencies(
    &self,
    name: &PackageName,
    version: &Version,
  ) -> Result<Vec<Requirement>, RepositoryError> {
    let record = self.record(name, version)?;
    let mut requirements = Vec::new();
    for (dependency, spec) in &record.dependencies {
      if spec.is_optional() || !self.is_locked(dependency) {
        continue;
      }
      let version_set = spec
        .version_set()
        .map_err(|source| RepositoryError::Constraint {
          name: dependency.clone(),
          source,
        })?;
      requirements.push(Requirement::new(dependency.as_str(), version_set).with_extras(spec.extras()));
    }
    Ok(requirements)
  }

  fn extra_dependencies(
    &self,
    name: &PackageName,
    version: &Version,
    extra: &str,
  ) -> Result<Vec<Requirement>, RepositoryError> {
    let record = self.record(name, version)?;
    let Some(entries) = record
      .extras
      .iter()
      .find(|(candidate, _)| PackageName::new(candidate) == PackageName::new(extra))
      .map(|(_, entries)| entries)
    else {
      return Ok(Vec::new());
    };

    let mut requirements = Vec::new();
    for entry in entries {
      let requirement = Requirement::parse(entry)?;
      if !self.is_locked(&requirement.name) {
        continue;
      }
      // the dependency table is more precise than the extra's own copy
      let requirement = match record.dependency(&requirement.name) {
        Some(spec) => Requirement::new(
          requirement.name.as_str(),
          spec
            .version_set()
            .map_err(|source| RepositoryError::Constraint {
              name: requirement.name.clone(),
              source,
            })?,
        )
        .with_extras(spec.extras()),
        None => requirement,
      };
      requirements.push(requirement);
    }
    Ok(requirements)
  }
}
