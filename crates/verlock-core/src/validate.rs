//! Structural checks of a lock file.
//!
//! Nothing here fails: every problem becomes a [`Diagnostic`] in the returned
//! [`Report`], so a single run shows everything that is wrong.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::lockfile::Lockfile;
use crate::metadata::is_content_hash;
use crate::name::{PackageName, normalize};
use crate::package::{Artifact, DependencySpec, Package};
use crate::requirement::Requirement;
use crate::version::Version;
use crate::version_set::VersionSet;

#[derive(Debug, Clone)]
pub struct ValidateOptions {
  /// Dependencies installed outside of the lock file, e.g. by the system
  pub allow_external: Vec<String>,
  /// Check pinned versions against the constraints of their dependants
  pub check_constraints: bool,
  /// Warn about artifacts whose file name does not mention the package
  pub check_file_names: bool,
}

impl Default for ValidateOptions {
  fn default() -> Self {
    Self {
      allow_external: Vec::new(),
      check_constraints: true,
      check_file_names: false,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Warning,
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Warning => f.write_str("warning"),
      Self::Error => f.write_str("error"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DiagnosticKind {
  #[error("dependency `{dependency}` is not locked")]
  UnresolvedDependency { dependency: String },
  #[error("`{file}` has a malformed hash: {reason}")]
  MalformedHash { file: String, reason: String },
  #[error("`{file}` does not look like a distribution of this package")]
  FileNameMismatch { file: String },
  #[error("version {version} is locked more than once")]
  DuplicatePackage { version: String },
  #[error("`{dependency}` is locked at {locked}, which does not satisfy `{constraint}`")]
  UnsatisfiedConstraint {
    dependency: String,
    constraint: String,
    locked: String,
  },
  #[error("cannot parse `{value}`: {reason}")]
  Unparsable { value: String, reason: String },
  #[error("unknown lock version `{version}`")]
  UnknownLockVersion { version: String },
  #[error("content-hash `{hash}` is not a sha256 hex digest")]
  MalformedContentHash { hash: String },
  #[error("extra `{extra}` lists `{member}`, which is not a dependency")]
  UnknownExtraMember { extra: String, member: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
  pub severity: Severity,
  /// The record the problem was found in, `None` for lock-wide problems
  pub package: Option<String>,
  #[serde(flatten)]
  pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.package {
      Some(package) => write!(f, "{}: {package}: {}", self.severity, self.kind),
      None => write!(f, "{}: {}", self.severity, self.kind),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
  pub diagnostics: Vec<Diagnostic>,
}

impl Report {
  /// No error-severity diagnostics. Warnings are fine.
  pub fn is_ok(&self) -> bool {
    self.errors().next().is_none()
  }

  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self
      .diagnostics
      .iter()
      .filter(|diagnostic| diagnostic.severity == Severity::Error)
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
    self
      .diagnostics
      .iter()
      .filter(|diagnostic| diagnostic.severity == Severity::Warning)
  }

  fn push(&mut self, severity: Severity, package: Option<&Package>, kind: DiagnosticKind) {
    self.diagnostics.push(Diagnostic {
      severity,
      package: package.map(|package| package.name.clone()),
      kind,
    });
  }
}

impl fmt::Display for Report {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for diagnostic in &self.diagnostics {
      writeln!(f, "{diagnostic}")?;
    }
    write!(
      f,
      "{} error(s), {} warning(s)",
      self.errors().count(),
      self.warnings().count()
    )
  }
}

/// Run every check against `lockfile`.
pub fn validate(lockfile: &Lockfile, options: &ValidateOptions) -> Report {
  let mut report = Report::default();
  let external: HashSet<PackageName> = options
    .allow_external
    .iter()
    .map(|name| PackageName::new(name))
    .collect();

  check_metadata(lockfile, &mut report);
  check_duplicates(lockfile, &mut report);

  for package in &lockfile.packages {
    for (name, spec) in &package.dependencies {
      check_dependency(lockfile, package, name, spec, &external, options, &mut report);
    }
    check_artifacts(package, &package.files, options, &mut report);
    check_extras(package, &mut report);
  }

  for (name, artifacts) in &lockfile.metadata.orphan_files {
    for artifact in artifacts {
      if let Err(err) = artifact.digest() {
        report.diagnostics.push(Diagnostic {
          severity: Severity::Error,
          package: Some(name.clone()),
          kind: DiagnosticKind::MalformedHash {
            file: artifact.file.clone(),
            reason: err.to_string(),
          },
        });
      }
    }
  }

  for (extra, members) in &lockfile.extras {
    for member in members {
      if lockfile.package(member).is_none() {
        report.push(
          Severity::Warning,
          None,
          DiagnosticKind::UnknownExtraMember {
            extra: extra.clone(),
            member: member.clone(),
          },
        );
      }
    }
  }

  debug!(
    errors = report.errors().count(),
    warnings = report.warnings().count(),
    "validated lockfile"
  );
  report
}

fn check_metadata(lockfile: &Lockfile, report: &mut Report) {
  let metadata = &lockfile.metadata;

  if !metadata.is_known_lock_version() {
    report.push(
      Severity::Warning,
      None,
      DiagnosticKind::UnknownLockVersion {
        version: metadata.lock_version.clone(),
      },
    );
  }

  if !is_content_hash(&metadata.content_hash) {
    report.push(
      Severity::Error,
      None,
      DiagnosticKind::MalformedContentHash {
        hash: metadata.content_hash.clone(),
      },
    );
  }

  if let Err(err) = VersionSet::parse(&metadata.python_versions) {
    report.push(
      Severity::Warning,
      None,
      DiagnosticKind::Unparsable {
        value: metadata.python_versions.clone(),
        reason: err.to_string(),
      },
    );
  }
}

fn check_duplicates(lockfile: &Lockfile, report: &mut Report) {
  // versions that do not parse are compared verbatim
  let mut seen: HashSet<(PackageName, Result<Version, String>)> = HashSet::new();
  for package in &lockfile.packages {
    let version = package
      .parsed_version()
      .map_err(|_| package.version.clone());
    if !seen.insert((package.normalized_name(), version)) {
      report.push(
        Severity::Error,
        Some(package),
        DiagnosticKind::DuplicatePackage {
          version: package.version.clone(),
        },
      );
    }
  }
}

fn check_dependency(
  lockfile: &Lockfile,
  package: &Package,
  name: &str,
  spec: &DependencySpec,
  external: &HashSet<PackageName>,
  options: &ValidateOptions,
  report: &mut Report,
) {
  let locked: Vec<&Package> = lockfile.packages_named(name).collect();

  if locked.is_empty() {
    let severity = if spec.is_optional() || external.contains(&PackageName::new(name)) {
      Severity::Warning
    } else {
      Severity::Error
    };
    report.push(
      severity,
      Some(package),
      DiagnosticKind::UnresolvedDependency {
        dependency: name.to_string(),
      },
    );
    return;
  }

  if !options.check_constraints {
    return;
  }

  let set = match spec.version_set() {
    Ok(set) => set,
    Err(err) => {
      report.push(
        Severity::Warning,
        Some(package),
        DiagnosticKind::Unparsable {
          value: spec.constraints().join(" || "),
          reason: err.to_string(),
        },
      );
      return;
    }
  };

  let mut versions = Vec::with_capacity(locked.len());
  for record in &locked {
    match record.parsed_version() {
      Ok(version) => versions.push(version),
      Err(err) => report.push(
        Severity::Warning,
        Some(record),
        DiagnosticKind::Unparsable {
          value: record.version.clone(),
          reason: err.to_string(),
        },
      ),
    }
  }

  if !versions.is_empty() && set.filter_allowed(&versions).is_empty() {
    report.push(
      Severity::Error,
      Some(package),
      DiagnosticKind::UnsatisfiedConstraint {
        dependency: name.to_string(),
        constraint: spec.constraints().join(" || "),
        locked: locked
          .iter()
          .map(|record| record.version.as_str())
          .collect::<Vec<_>>()
          .join(", "),
      },
    );
  }
}

fn check_artifacts(
  package: &Package,
  artifacts: &[Artifact],
  options: &ValidateOptions,
  report: &mut Report,
) {
  let name = package.normalized_name();
  for artifact in artifacts {
    if let Err(err) = artifact.digest() {
      report.push(
        Severity::Error,
        Some(package),
        DiagnosticKind::MalformedHash {
          file: artifact.file.clone(),
          reason: err.to_string(),
        },
      );
    }

    if options.check_file_names && !normalize(&artifact.file).contains(name.as_str()) {
      report.push(
        Severity::Warning,
        Some(package),
        DiagnosticKind::FileNameMismatch {
          file: artifact.file.clone(),
        },
      );
    }
  }
}

fn check_extras(package: &Package, report: &mut Report) {
  for (extra, entries) in &package.extras {
    for entry in entries {
      match Requirement::parse(entry) {
        Ok(requirement) => {
          if package.dependency(&requirement.name).is_none() {
            report.push(
              Severity::Warning,
              Some(package),
              DiagnosticKind::UnknownExtraMember {
                extra: extra.clone(),
                member: requirement.name,
              },
            );
          }
        }
        Err(err) => report.push(
          Severity::Warning,
          Some(package),
          DiagnosticKind::Unparsable {
            value: entry.clone(),
            reason: err.to_string(),
          },
        ),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::metadata::Metadata;
  use crate::package::DependencyDetail;
  use pretty_assertions::assert_eq;

  const CONTENT_HASH: &str = "0c9fe7e22f03cd6d1b4bc5ab5ae6e0e6c3a7e4b1f1a4e4c3d2b6a9c8e7f6a5b4";
  const SHA: &str = "sha256:90c1a32f1d68f940488354e36370f6cca89f0f106db09518524c88d6ed83f382";

  fn lockfile(packages: Vec<Package>) -> Lockfile {
    Lockfile::new(
      Metadata::default()
        .with_lock_version("2.0")
        .with_python_versions("^3.8")
        .with_content_hash(CONTENT_HASH),
      packages,
    )
  }

  fn kinds(report: &Report) -> Vec<(Severity, &DiagnosticKind)> {
    report
      .diagnostics
      .iter()
      .map(|diagnostic| (diagnostic.severity, &diagnostic.kind))
      .collect()
  }

  #[test]
  fn test_consistent_lockfile() {
    let lock = lockfile(vec![
      Package::new("requests", "2.28.1")
        .with_dependency("certifi", ">=2017.4.17")
        .with_extra("socks", &["certifi (>=2017)"])
        .with_file(Artifact::new("requests-2.28.1.tar.gz", SHA)),
      Package::new("certifi", "2022.9.24"),
    ]);
    let report = validate(&lock, &ValidateOptions::default());
    assert_eq!(report.diagnostics, vec![]);
    assert!(report.is_ok());
  }

  #[test]
  fn test_unresolved_dependencies() {
    let lock = lockfile(vec![
      Package::new("app", "1.0")
        .with_dependency("missing", "*")
        .with_dependency(
          "maybe",
          DependencyDetail {
            version: Some("*".to_string()),
            optional: Some(true),
            ..DependencyDetail::default()
          },
        )
        .with_dependency("Setuptools", ">=40"),
    ]);
    let options = ValidateOptions {
      allow_external: vec!["setuptools".to_string()],
      ..ValidateOptions::default()
    };
    let report = validate(&lock, &options);

    assert_eq!(
      kinds(&report),
      vec![
        (
          Severity::Warning,
          &DiagnosticKind::UnresolvedDependency {
            dependency: "Setuptools".to_string()
          }
        ),
        (
          Severity::Warning,
          &DiagnosticKind::UnresolvedDependency {
            dependency: "maybe".to_string()
          }
        ),
        (
          Severity::Error,
          &DiagnosticKind::UnresolvedDependency {
            dependency: "missing".to_string()
          }
        ),
      ]
    );
    assert!(!report.is_ok());
  }

  #[test]
  fn test_hashes_and_file_names() {
    let lock = lockfile(vec![
      Package::new("attrs", "22.1.0")
        .with_file(Artifact::new("attrs-22.1.0.tar.gz", "sha256:1234"))
        .with_file(Artifact::new("wrong-1.0.tar.gz", SHA)),
    ]);

    let report = validate(&lock, &ValidateOptions::default());
    assert_eq!(report.errors().count(), 1);
    assert_eq!(report.warnings().count(), 0);

    let options = ValidateOptions {
      check_file_names: true,
      ..ValidateOptions::default()
    };
    let report = validate(&lock, &options);
    assert_eq!(
      report.warnings().map(|d| &d.kind).collect::<Vec<_>>(),
      vec![&DiagnosticKind::FileNameMismatch {
        file: "wrong-1.0.tar.gz".to_string()
      }]
    );
  }

  #[test]
  fn test_duplicates_and_constraints() {
    let lock = lockfile(vec![
      Package::new("app", "1.0")
        .with_dependency("lib", ">=2.0")
        .with_dependency("odd", ">=1.0"),
      Package::new("lib", "1.5"),
      Package::new("Lib", "1.5.0"),
      Package::new("odd", "not a version"),
    ]);
    let report = validate(&lock, &ValidateOptions::default());

    assert_eq!(
      kinds(&report),
      vec![
        (
          Severity::Error,
          &DiagnosticKind::DuplicatePackage {
            version: "1.5.0".to_string()
          }
        ),
        (
          Severity::Error,
          &DiagnosticKind::UnsatisfiedConstraint {
            dependency: "lib".to_string(),
            constraint: ">=2.0".to_string(),
            locked: "1.5, 1.5.0".to_string(),
          }
        ),
        (
          Severity::Warning,
          &DiagnosticKind::Unparsable {
            value: "not a version".to_string(),
            reason: "invalid version `not a version`: unexpected ` a version`".to_string(),
          }
        ),
      ]
    );

    let options = ValidateOptions {
      check_constraints: false,
      ..ValidateOptions::default()
    };
    assert_eq!(validate(&lock, &options).diagnostics.len(), 1);
  }

  #[test]
  fn test_metadata_and_extras() {
    let mut lock = Lockfile::new(
      Metadata::default()
        .with_lock_version("3.0")
        .with_python_versions(">=3.8 <<")
        .with_content_hash("nope"),
      vec![Package::new("black", "22.10.0").with_extra("d", &["aiohttp (>=3.7.4)"])],
    );
    lock
      .extras
      .insert("fmt".to_string(), vec!["black".to_string(), "isort".to_string()]);

    let report = validate(&lock, &ValidateOptions::default());
    let summary: Vec<String> = report.diagnostics.iter().map(ToString::to_string).collect();
    assert_eq!(
      summary,
      vec![
        "warning: unknown lock version `3.0`".to_string(),
        "error: content-hash `nope` is not a sha256 hex digest".to_string(),
        "warning: cannot parse `>=3.8 <<`: invalid version set `>=3.8 <<`: unexpected `<<`"
          .to_string(),
        "warning: black: extra `d` lists `aiohttp`, which is not a dependency".to_string(),
        "warning: extra `fmt` lists `isort`, which is not a dependency".to_string(),
      ]
    );
  }
}
