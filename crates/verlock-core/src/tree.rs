use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::lockfile::Lockfile;
use crate::name::PackageName;
use crate::package::Package;

/// One line of a [`DependencyTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
  pub name: String,
  /// `None` when no record is locked for the name
  pub version: Option<String>,
  /// Already expanded elsewhere in the tree, children omitted
  pub repeated: bool,
  pub children: Vec<TreeNode>,
}

/// The dependency graph of a lock file unfolded from its roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyTree {
  pub roots: Vec<TreeNode>,
}

struct Builder<'a> {
  lockfile: &'a Lockfile,
  expanded: HashSet<(PackageName, &'a str)>,
}

impl<'a> Builder<'a> {
  fn node(&mut self, package: &'a Package) -> TreeNode {
    let key = (package.normalized_name(), package.version.as_str());
    if !self.expanded.insert(key) {
      return TreeNode {
        name: package.name.clone(),
        version: Some(package.version.clone()),
        repeated: true,
        children: Vec::new(),
      };
    }

    let mut children = Vec::new();
    for dependency in package.dependency_names() {
      let records: Vec<&'a Package> = self.lockfile.packages_named(dependency).collect();
      if records.is_empty() {
        children.push(TreeNode {
          name: dependency.to_string(),
          version: None,
          repeated: false,
          children: Vec::new(),
        });
      }
      for record in records {
        children.push(self.node(record));
      }
    }

    TreeNode {
      name: package.name.clone(),
      version: Some(package.version.clone()),
      repeated: false,
      children,
    }
  }
}

impl Lockfile {
  /// Unfold the dependency graph starting at [`Lockfile::roots`]. Records only
  /// reachable through a cycle become roots of their own.
  pub fn tree(&self) -> DependencyTree {
    let mut builder = Builder {
      lockfile: self,
      expanded: HashSet::new(),
    };

    let mut roots: Vec<TreeNode> = self
      .roots()
      .into_iter()
      .map(|package| builder.node(package))
      .collect();

    for package in &self.packages {
      let key = (package.normalized_name(), package.version.as_str());
      if !builder.expanded.contains(&key) {
        roots.push(builder.node(package));
      }
    }

    DependencyTree { roots }
  }
}

impl TreeNode {
  fn write(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
    for (i, child) in self.children.iter().enumerate() {
      let last = i + 1 == self.children.len();
      let (branch, indent) = if last {
        ("└── ", "    ")
      } else {
        ("├── ", "│   ")
      };
      writeln!(f, "{prefix}{branch}{}", child.label())?;
      child.write(f, &format!("{prefix}{indent}"))?;
    }
    Ok(())
  }

  fn label(&self) -> String {
    match (&self.version, self.repeated) {
      (Some(version), false) => format!("{} {version}", self.name),
      (Some(version), true) => format!("{} {version} (*)", self.name),
      (None, _) => format!("{} (unresolved)", self.name),
    }
  }
}

impl fmt::Display for DependencyTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for root in &self.roots {
      writeln!(f, "{}", root.label())?;
      root.write(f, "")?;
    }
    Ok(())
  }
}
