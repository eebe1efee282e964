use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use tracing::trace;

use super::ResolutionStrategy;
use super::repository::Repository;
use crate::error::RepositoryError;
use crate::name::{PackageName, normalize};
use crate::requirement::Requirement;
use crate::version::Version;
use crate::version_set::VersionSet;

pub(crate) type ClauseId = usize;

/// Something the solver picks a version for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageId {
  /// The virtual package that depends on the root requirements
  Root,
  Named(PackageName),
  /// `name[extra]`: selected at the same version as `name`, pulls in the extra's requirements
  Extra { name: PackageName, extra: String },
}

impl fmt::Display for PackageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Root => f.write_str("root"),
      Self::Named(name) => write!(f, "{name}"),
      Self::Extra { name, extra } => write!(f, "{name}[{extra}]"),
    }
  }
}

/// A decision: `package` selected at `version`, or not selected at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Assignment {
  pub package: PackageId,
  pub version: Option<Version>,
}

impl fmt::Display for Assignment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.version {
      Some(version) => write!(f, "{} {version}", self.package),
      None => write!(f, "{} (unselected)", self.package),
    }
  }
}

/// `package ∈ set` when positive. A negative term also holds while the
/// package is not selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Term {
  pub package: PackageId,
  pub set: VersionSet,
  pub positive: bool,
}

impl Term {
  fn evaluate(&self, value: Option<Option<&Version>>) -> Option<bool> {
    match value? {
      None => Some(!self.positive),
      Some(version) => Some(self.set.contains(version) == self.positive),
    }
  }
}

impl fmt::Display for Term {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !self.positive {
      f.write_str("not ")?;
    }
    write!(f, "{} {}", self.package, self.set)
  }
}

#[derive(Debug, Clone)]
pub(crate) enum Cause {
  Root,
  Dependency {
    dependant: Assignment,
    dependency: PackageId,
    requirement: String,
  },
  NoAllowedVersions {
    package: PackageId,
    conflicts: Vec<ClauseId>,
  },
}

/// A disjunction of terms; at least one must hold in a solution.
#[derive(Debug, Clone)]
pub(crate) struct Clause {
  pub terms: Vec<Term>,
  pub cause: Cause,
}

impl Clause {
  fn evaluate<'v>(&self, lookup: impl Fn(&PackageId) -> Option<Option<&'v Version>>) -> Option<bool> {
    let mut undecided = false;
    for term in &self.terms {
      match term.evaluate(lookup(&term.package)) {
        Some(true) => return Some(true),
        Some(false) => {}
        None => undecided = true,
      }
    }
    if undecided { None } else { Some(false) }
  }

  pub fn mentions(&self, package: &PackageId) -> bool {
    self.terms.iter().any(|term| term.package == *package)
  }
}

impl fmt::Display for Clause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.terms.is_empty() {
      return f.write_str("nothing");
    }
    for (i, term) in self.terms.iter().enumerate() {
      if i > 0 {
        f.write_str(" or ")?;
      }
      write!(f, "{term}")?;
    }
    Ok(())
  }
}

pub(crate) struct State<'r, R: ?Sized> {
  repository: &'r R,
  pub clauses: Vec<Clause>,
  /// In the order they were made, the root first
  pub assignments: Vec<Assignment>,
  loaded: HashSet<(PackageId, Version)>,
  versions: HashMap<PackageId, Vec<Version>>,
}

impl<'r, R: Repository + ?Sized> State<'r, R> {
  pub fn new(repository: &'r R, requirements: &[Requirement]) -> Self {
    let root = Assignment {
      package: PackageId::Root,
      version: Some(Version::from_release(&[1, 0])),
    };

    let mut state = Self {
      repository,
      clauses: Vec::new(),
      assignments: Vec::new(),
      loaded: HashSet::new(),
      versions: HashMap::new(),
    };

    // without this the root could simply be left unselected
    state.clauses.push(Clause {
      terms: vec![Term {
        package: PackageId::Root,
        set: VersionSet::from(Version::from_release(&[1, 0])),
        positive: true,
      }],
      cause: Cause::Root,
    });
    for requirement in requirements {
      state.add_dependency(&root, requirement);
    }
    state.assignments.push(root);
    state
  }

  fn assigned(&self, package: &PackageId) -> Option<&Assignment> {
    self
      .assignments
      .iter()
      .find(|assignment| assignment.package == *package)
  }

  fn value(&self, package: &PackageId) -> Option<Option<&Version>> {
    self
      .assigned(package)
      .map(|assignment| assignment.version.as_ref())
  }

  pub fn is_complete(&self) -> bool {
    self
      .clauses
      .iter()
      .all(|clause| clause.evaluate(|package| self.value(package)) == Some(true))
  }

  /// A clause that is false no matter what is picked besides the root.
  pub fn failed_clause(&self) -> Option<ClauseId> {
    let root = self.assignments.first()?;
    self.clauses.iter().position(|clause| {
      clause.evaluate(|package| {
        (*package == root.package).then(|| root.version.as_ref())
      }) == Some(false)
    })
  }

  pub fn false_clause(&self) -> Option<ClauseId> {
    self
      .clauses
      .iter()
      .position(|clause| clause.evaluate(|package| self.value(package)) == Some(false))
  }

  /// The first package without an assignment, in clause order.
  pub fn next_unassigned(&self) -> Option<PackageId> {
    self
      .clauses
      .iter()
      .flat_map(|clause| &clause.terms)
      .map(|term| &term.package)
      .find(|package| self.assigned(package).is_none())
      .cloned()
  }

  /// "Not selected" first, then every version in strategy order.
  pub fn candidates(
    &mut self,
    package: &PackageId,
    strategy: ResolutionStrategy,
  ) -> Result<Vec<Option<Version>>, RepositoryError> {
    if !self.versions.contains_key(package) {
      let mut versions = match package {
        PackageId::Root => Vec::new(),
        PackageId::Named(name) | PackageId::Extra { name, .. } => self.repository.versions(name)?,
      };
      match strategy {
        ResolutionStrategy::Highest => versions.sort_by(|a, b| b.cmp(a)),
        ResolutionStrategy::Lowest => versions.sort(),
      }
      versions.dedup();
      self.versions.insert(package.clone(), versions);
    }

    let versions = self.versions.get(package).map(Vec::as_slice).unwrap_or_default();
    Ok(
      std::iter::once(None)
        .chain(versions.iter().cloned().map(Some))
        .collect(),
    )
  }

  /// Add the dependency clauses of `assignment` the first time it is tried.
  pub fn load(&mut self, assignment: &Assignment) -> Result<(), RepositoryError> {
    let Some(version) = &assignment.version else {
      return Ok(());
    };
    if !self.loaded.insert((assignment.package.clone(), version.clone())) {
      return Ok(());
    }

    match &assignment.package {
      PackageId::Root => {}
      PackageId::Named(name) => {
        for requirement in self.repository.dependencies(name, version)? {
          self.add_dependency(assignment, &requirement);
        }
      }
      PackageId::Extra { name, extra } => {
        let base = PackageId::Named(name.clone());
        self.clauses.push(Clause {
          terms: vec![
            negated(assignment, version),
            Term {
              package: base.clone(),
              set: VersionSet::from(version.clone()),
              positive: true,
            },
          ],
          cause: Cause::Dependency {
            dependant: assignment.clone(),
            dependency: base,
            requirement: format!("{name} {version}"),
          },
        });
        for requirement in self.repository.extra_dependencies(name, version, extra)? {
          self.add_dependency(assignment, &requirement);
        }
      }
    }
    Ok(())
  }

  /// `dependant` requires `requirement`, and every extra it names.
  fn add_dependency(&mut self, dependant: &Assignment, requirement: &Requirement) {
    let Some(version) = &dependant.version else {
      return;
    };

    let name = requirement.package_name();
    let targets = std::iter::once(PackageId::Named(name.clone())).chain(
      requirement.extras.iter().map(|extra| PackageId::Extra {
        name: name.clone(),
        extra: normalize(extra),
      }),
    );

    for target in targets {
      self.clauses.push(Clause {
        terms: vec![
          negated(dependant, version),
          Term {
            package: target.clone(),
            set: requirement.version_set.clone(),
            positive: true,
          },
        ],
        cause: Cause::Dependency {
          dependant: dependant.clone(),
          dependency: target,
          requirement: requirement.to_string(),
        },
      });
    }
  }

  /// Clauses about the candidate's package that picking it would falsify.
  pub fn violated_by(&self, candidate: &Assignment) -> Vec<ClauseId> {
    let lookup = |package: &PackageId| {
      if *package == candidate.package {
        Some(candidate.version.as_ref())
      } else {
        self.value(package)
      }
    };

    self
      .clauses
      .iter()
      .enumerate()
      .filter(|(_, clause)| clause.mentions(&candidate.package))
      .filter(|(_, clause)| clause.evaluate(&lookup) == Some(false))
      .map(|(id, _)| id)
      .collect()
  }

  /// Shortest chain of current dependants from the root to each assigned package.
  fn depths(&self) -> HashMap<&PackageId, usize> {
    let mut depths = HashMap::new();
    let Some(root) = self.assignments.first() else {
      return depths;
    };
    depths.insert(&root.package, 0);

    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
      let depth = depths.get(&current.package).copied().unwrap_or_default();
      for clause in &self.clauses {
        let Cause::Dependency {
          dependant,
          dependency,
          ..
        } = &clause.cause
        else {
          continue;
        };
        if dependant != current || depths.contains_key(dependency) {
          continue;
        }
        if let Some(assigned) = self.assigned(dependency) {
          depths.insert(&assigned.package, depth + 1);
          queue.push_back(assigned);
        }
      }
    }
    depths
  }

  /// Record that no candidate of `package` survives `conflicts`: at least one
  /// of their terms about other packages has to change.
  pub fn learn(&mut self, package: PackageId, conflicts: Vec<ClauseId>) -> ClauseId {
    let mut terms: Vec<Term> = Vec::new();
    for term in conflicts
      .iter()
      .filter_map(|id| self.clauses.get(*id))
      .flat_map(|clause| &clause.terms)
    {
      if term.package != package && !terms.contains(term) {
        terms.push(term.clone());
      }
    }

    self.clauses.push(Clause {
      terms,
      cause: Cause::NoAllowedVersions { package, conflicts },
    });
    self.clauses.len() - 1
  }

  /// Undo the deepest assignment the clause mentions. Packages no longer
  /// reachable from the root count as deepest, later assignments win ties and
  /// the root is never undone.
  pub fn backtrack(&mut self, learned: ClauseId) -> Option<Assignment> {
    let (index, depth) = {
      let mentioned: Vec<&PackageId> = self
        .clauses
        .get(learned)
        .map(|clause| clause.terms.iter().map(|term| &term.package).collect())
        .unwrap_or_default();
      let depths = self.depths();

      let mut deepest: Option<(usize, usize)> = None;
      for (index, assignment) in self.assignments.iter().enumerate() {
        if assignment.package == PackageId::Root || !mentioned.contains(&&assignment.package) {
          continue;
        }
        let depth = depths.get(&assignment.package).copied().unwrap_or(usize::MAX);
        if deepest.is_none_or(|(_, max)| depth >= max) {
          deepest = Some((index, depth));
        }
      }
      deepest?
    };

    trace!(depth, "backtracking");
    Some(self.assignments.remove(index))
  }

  /// Selected versions of real packages.
  pub fn resolution(&self) -> BTreeMap<PackageName, Version> {
    self
      .assignments
      .iter()
      .filter_map(|assignment| match (&assignment.package, &assignment.version) {
        (PackageId::Named(name), Some(version)) => Some((name.clone(), version.clone())),
        _ => None,
      })
      .collect()
  }
}

fn negated(assignment: &Assignment, version: &Version) -> Term {
  Term {
    package: assignment.package.clone(),
    set: VersionSet::from(version.clone()),
    positive: false,
  }
}
