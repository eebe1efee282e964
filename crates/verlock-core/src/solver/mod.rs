//! A backtracking dependency solver that learns from its conflicts.
//!
//! Every requirement becomes a clause, `not (dependant == v) or dependency in
//! set`, and the solver assigns packages one at a time until every clause
//! holds. Each package may also stay unselected. When no candidate of a
//! package fits, the failing clauses are folded into a new clause about the
//! packages picked earlier and the deepest of those is undone, so the same
//! dead end is never explored twice.

mod report;
pub mod repository;
mod state;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::SolverError;
use crate::name::PackageName;
use crate::requirement::Requirement;
use crate::version::Version;
use report::Derivation;
pub use repository::{InMemoryRepository, LockfileRepository, Repository};
pub use state::PackageId;
use state::{Assignment, State};

/// Which end of the version range to try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionStrategy {
  #[default]
  Highest,
  Lowest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverOptions {
  pub strategy: ResolutionStrategy,
  /// Candidate rounds before giving up
  pub max_iterations: usize,
}

impl Default for SolverOptions {
  fn default() -> Self {
    Self {
      strategy: ResolutionStrategy::default(),
      max_iterations: 100_000,
    }
  }
}

impl SolverOptions {
  #[must_use]
  pub fn with_strategy(mut self, strategy: ResolutionStrategy) -> Self {
    self.strategy = strategy;
    self
  }

  #[must_use]
  pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
    self.max_iterations = max_iterations;
    self
  }
}

/// The selected version of every package the requirements pull in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Resolution {
  packages: BTreeMap<PackageName, Version>,
}

impl Resolution {
  pub fn get(&self, name: &str) -> Option<&Version> {
    self.packages.get(&PackageName::new(name))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&PackageName, &Version)> {
    self.packages.iter()
  }

  pub fn len(&self) -> usize {
    self.packages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }
}

impl<'a> IntoIterator for &'a Resolution {
  type Item = (&'a PackageName, &'a Version);
  type IntoIter = std::collections::btree_map::Iter<'a, PackageName, Version>;

  fn into_iter(self) -> Self::IntoIter {
    self.packages.iter()
  }
}

impl fmt::Display for Resolution {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (name, version) in &self.packages {
      writeln!(f, "{name} {version}")?;
    }
    Ok(())
  }
}

/// Find versions for everything `requirements` depend on, transitively.
pub fn solve<R: Repository + ?Sized>(
  requirements: &[Requirement],
  repository: &R,
  options: &SolverOptions,
) -> Result<Resolution, SolverError> {
  let mut state = State::new(repository, requirements);
  let mut iterations = 0;

  while !state.is_complete() {
    iterations += 1;
    if iterations > options.max_iterations {
      return Err(SolverError::IterationLimit {
        limit: options.max_iterations,
      });
    }

    if let Some(failed) = state.failed_clause() {
      debug!(iterations, "requirements conflict");
      return Err(no_solution(&state, failed));
    }

    let Some(package) = state.next_unassigned() else {
      // everything is assigned, so an unsatisfied clause is a false one
      match state.false_clause() {
        Some(failed) => return Err(no_solution(&state, failed)),
        None => break,
      }
    };

    let mut conflicts = Vec::new();
    let mut accepted = None;
    for version in state.candidates(&package, options.strategy)? {
      let candidate = Assignment {
        package: package.clone(),
        version,
      };
      state.load(&candidate)?;

      let violated = state.violated_by(&candidate);
      if violated.is_empty() {
        accepted = Some(candidate);
        break;
      }
      trace!(%candidate, violated = violated.len(), "rejected candidate");
      for id in violated {
        if !conflicts.contains(&id) {
          conflicts.push(id);
        }
      }
    }

    if let Some(candidate) = accepted {
      trace!(%candidate, "assigned");
      state.assignments.push(candidate);
      continue;
    }

    debug!(%package, conflicts = conflicts.len(), "no candidate fits");
    let learned = state.learn(package, conflicts);
    if let Some(undone) = state.backtrack(learned) {
      debug!(%undone, "undid assignment");
    }
  }

  let resolution = Resolution {
    packages: state.resolution(),
  };
  debug!(iterations, packages = resolution.len(), "resolved");
  Ok(resolution)
}

fn no_solution<R: Repository + ?Sized>(state: &State<'_, R>, failed: usize) -> SolverError {
  SolverError::NoSolution {
    derivation: Derivation::new(&state.clauses, failed).to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  type Index<'a> = &'a [(&'a str, &'a str, &'a [&'a str])];

  fn repository(index: Index<'_>) -> InMemoryRepository {
    let mut repository = InMemoryRepository::new();
    for (name, version, requirements) in index {
      repository.add(name, version, requirements).unwrap();
    }
    repository
  }

  fn requirements(roots: &[&str]) -> Vec<Requirement> {
    roots.iter().map(|root| Requirement::parse(root).unwrap()).collect()
  }

  fn resolved(resolution: &Resolution) -> Vec<String> {
    resolution
      .iter()
      .map(|(name, version)| format!("{name} {version}"))
      .collect()
  }

  const SHARED_FOO: Index<'static> = &[
    ("foo", "1.0", &["bar >=1.0 & <2.0"]),
    ("bar", "1.0", &["baz 1.0"]),
    ("bar", "2.0", &["taz 2.0"]),
    ("baz", "1.0", &[]),
    ("taz", "2.0", &[]),
  ];

  const CYCLE_BACK: Index<'static> = &[
    ("foo", "1.0", &["bar 1.0"]),
    ("bar", "1.0", &["baz 1.0"]),
    ("bar", "2.0", &["foo 1.0"]),
    ("baz", "1.0", &[]),
  ];

  const DEEP_CYCLE: Index<'static> = &[
    ("foo", "1.0", &["taz >=1.0"]),
    ("foo", "2.0", &["taz >=1.0"]),
    ("bar", "1.0", &["baz 1.0"]),
    ("bar", "2.0", &["foo 1.0"]),
    ("taz", "1.0", &["bar 1.0"]),
    ("taz", "2.0", &["bar 1.0"]),
    ("baz", "1.0", &[]),
  ];

  const DEEP_SATISFIABLE: Index<'static> = &[
    ("foo", "1.0", &["taz >=1.0"]),
    ("bar", "1.0", &["baz 1.0"]),
    ("bar", "2.0", &["foo 1.0"]),
    ("taz", "1.0", &["bar 2.0"]),
    ("taz", "2.0", &["bar 1.0"]),
    ("baz", "1.0", &[]),
  ];

  const UNSATISFIABLE: Index<'static> = &[
    ("foo", "1.0", &["bar 1.0"]),
    ("bar", "2.0", &["foo 1.0"]),
    ("baz", "1.0", &[]),
  ];

  const OPTIONAL_BRANCH: Index<'static> = &[
    ("a", "1.0", &["x >=1.0"]),
    ("b", "1.0", &["x < 2.0"]),
    ("c", "1.0", &[]),
    ("c", "2.0", &["a >= 1", "b >= 1"]),
    ("x", "0.0", &[]),
    ("x", "1.0", &["y 1.0"]),
    ("x", "2.0", &[]),
    ("y", "1.0", &[]),
    ("y", "2.0", &[]),
  ];

  const PINNED_CHAIN: Index<'static> = &[
    ("foo", "1.0", &["bar 1.0"]),
    ("foo", "2.0", &["bar 2.0"]),
    ("foo", "3.0", &["bar 3.0"]),
    ("bar", "1.0", &["baz >=1.0"]),
    ("bar", "2.0", &["foo 3.0"]),
    ("baz", "1.0", &[]),
  ];

  const SHARED_TAZ: Index<'static> = &[
    ("foo", "1.0", &["taz 1.0"]),
    ("bar", "1.0", &["taz >=1.0"]),
    ("bar", "2.0", &["taz 3.0"]),
    ("baz", "1.0", &["taz >=1.0"]),
    ("baz", "2.0", &["taz <3.0"]),
    ("taz", "1.0", &[]),
    ("taz", "2.0", &[]),
    ("taz", "3.0", &[]),
  ];

  const SKIP_MIDDLE: Index<'static> = &[
    ("foo", "1.0", &["bar 1.0"]),
    ("bar", "1.0", &["baz 1.0"]),
    ("bar", "2.0", &["baz 1.0"]),
    ("bar", "3.0", &["foo 1.0"]),
    ("baz", "1.0", &[]),
  ];

  #[rstest]
  #[case::shared_foo(SHARED_FOO, &["bar >=1.0", "foo >=1.0 & <2.0"], &["bar 1.0", "baz 1.0", "foo 1.0"])]
  #[case::cycle_back(CYCLE_BACK, &["bar >=1.0"], &["bar 1.0", "baz 1.0"])]
  #[case::deep_cycle(DEEP_CYCLE, &["bar >=1.0"], &["bar 1.0", "baz 1.0"])]
  #[case::deep_satisfiable(DEEP_SATISFIABLE, &["bar >=1.0"], &["bar 2.0", "foo 1.0", "taz 1.0"])]
  #[case::optional_branch(OPTIONAL_BRANCH, &["c >=1.0", "y >=2.0"], &["c 1.0", "y 2.0"])]
  #[case::pinned_chain(PINNED_CHAIN, &["foo >=1.0"], &["bar 1.0", "baz 1.0", "foo 1.0"])]
  #[case::shared_taz(SHARED_TAZ, &["bar >=1.0", "foo >=1.0", "baz >=1.0"], &["bar 1.0", "baz 2.0", "foo 1.0", "taz 1.0"])]
  #[case::skip_middle(SKIP_MIDDLE, &["bar >=1.0"], &["bar 2.0", "baz 1.0"])]
  fn test_solve_highest(#[case] index: Index<'_>, #[case] roots: &[&str], #[case] expected: &[&str]) {
    let resolution = solve(&requirements(roots), &repository(index), &SolverOptions::default()).unwrap();
    assert_eq!(resolved(&resolution), expected);
  }

  #[rstest]
  #[case::deep_satisfiable(DEEP_SATISFIABLE, &["bar >=1.0"], &["bar 1.0", "baz 1.0"])]
  #[case::shared_taz(SHARED_TAZ, &["bar >=1.0", "foo >=1.0", "baz >=1.0"], &["bar 1.0", "baz 1.0", "foo 1.0", "taz 1.0"])]
  #[case::skip_middle(SKIP_MIDDLE, &["bar >=1.0"], &["bar 1.0", "baz 1.0"])]
  #[case::pinned_chain(PINNED_CHAIN, &["foo >=1.0"], &["bar 1.0", "baz 1.0", "foo 1.0"])]
  fn test_solve_lowest(#[case] index: Index<'_>, #[case] roots: &[&str], #[case] expected: &[&str]) {
    let options = SolverOptions::default().with_strategy(ResolutionStrategy::Lowest);
    let resolution = solve(&requirements(roots), &repository(index), &options).unwrap();
    assert_eq!(resolved(&resolution), expected);
  }

  #[test]
  fn test_no_solution_derivation() {
    let error = solve(
      &requirements(&["bar >=1.0"]),
      &repository(UNSATISFIABLE),
      &SolverOptions::default(),
    )
    .unwrap_err();

    let SolverError::NoSolution { derivation } = error else {
      panic!("expected a conflict, got {error:?}");
    };
    let expected = "\
not root 1.0 because no versions of bar are allowed
  not root 1.0 or bar >=1.0 because root 1.0 depends on bar >=1.0
  not bar 2.0 or bar 1.0 because no versions of foo are allowed
    not bar 2.0 or foo 1.0 because bar 2.0 depends on foo 1.0
    not foo 1.0 or bar 1.0 because foo 1.0 depends on bar 1.0";
    assert_eq!(derivation, expected);
  }

  #[test]
  fn test_unknown_root_package() {
    let error = solve(
      &requirements(&["missing >=1.0"]),
      &InMemoryRepository::new(),
      &SolverOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, SolverError::NoSolution { .. }));
  }

  #[test]
  fn test_iteration_limit() {
    let options = SolverOptions::default().with_max_iterations(1);
    let error = solve(&requirements(&["bar >=1.0"]), &repository(CYCLE_BACK), &options).unwrap_err();
    assert!(matches!(error, SolverError::IterationLimit { limit: 1 }));
  }

  #[test]
  fn test_no_requirements() {
    let resolution = solve(&[], &repository(SHARED_FOO), &SolverOptions::default()).unwrap();
    assert!(resolution.is_empty());
  }

  #[test]
  fn test_extras() {
    let mut index = repository(&[
      ("app", "1.0", &["requests[socks] >=2"]),
      ("requests", "1.0", &[]),
      ("requests", "2.0", &["urllib3"]),
      ("urllib3", "1.0", &[]),
      ("pysocks", "1.0", &[]),
      ("pysocks", "1.6", &[]),
    ]);
    index
      .add_extra("requests", "2.0", "socks", &["pysocks >=1.5"])
      .unwrap();

    let resolution = solve(&requirements(&["app"]), &index, &SolverOptions::default()).unwrap();
    assert_eq!(
      resolved(&resolution),
      vec!["app 1.0", "pysocks 1.6", "requests 2.0", "urllib3 1.0"]
    );
    assert_eq!(resolution.get("PySocks").map(ToString::to_string), Some("1.6".to_string()));
  }

  #[test]
  fn test_resolution_display() {
    let resolution = solve(
      &requirements(&["foo"]),
      &repository(&[("foo", "1.0", &["Bar_Baz"]), ("bar-baz", "0.1", &[])]),
      &SolverOptions::default(),
    )
    .unwrap();
    assert_eq!(resolution.to_string(), "bar-baz 0.1\nfoo 1.0\n");
    assert_eq!(
      serde_json::to_string(&resolution).unwrap(),
      r#"{"bar-baz":"0.1","foo":"1.0"}"#
    );
  }
}
