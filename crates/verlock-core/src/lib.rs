//! # verlock
//!
//! Reads, writes and checks Poetry `poetry.lock` files, and re-resolves their
//! requirements with a small backtracking solver.
//!
//! ```
//! use verlock_core::{Requirement, Version};
//!
//! let requirement = Requirement::parse("click >=8.0, <9").unwrap();
//! assert!(requirement.is_satisfied_by(&Version::parse("8.1.3").unwrap()));
//! ```
#![deny(clippy::all)]
pub mod error;
pub mod lockfile;
pub mod metadata;
pub mod name;
pub mod package;
pub mod parse;
pub mod requirement;
mod serialize;
pub mod solver;
pub mod tree;
pub mod validate;
pub mod version;
pub mod version_set;

pub use error::{
  HashDigestError, LockfileError, RepositoryError, RequirementParseError, SolverError,
  VersionParseError, VersionSetParseError,
};
pub use lockfile::{Lockfile, parse_lockfile};
pub use metadata::{HashAlgorithm, HashDigest, Metadata};
pub use name::PackageName;
pub use package::{Artifact, Category, DependencyDetail, DependencySpec, Package, PackageSource};
pub use requirement::Requirement;
pub use solver::{
  InMemoryRepository, LockfileRepository, Repository, Resolution, ResolutionStrategy,
  SolverOptions, solve,
};
pub use validate::{Diagnostic, DiagnosticKind, Report, Severity, ValidateOptions, validate};
pub use version::Version;
pub use version_set::VersionSet;
