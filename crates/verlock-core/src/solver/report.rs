use std::collections::HashSet;
use std::fmt::{self, Write};

use super::state::{Cause, Clause, ClauseId};

/// Why a clause holds, followed by the clauses it was learned from.
pub(crate) struct Derivation<'a> {
  clauses: &'a [Clause],
  failed: ClauseId,
}

impl<'a> Derivation<'a> {
  pub fn new(clauses: &'a [Clause], failed: ClauseId) -> Self {
    Self { clauses, failed }
  }

  fn write(
    &self,
    out: &mut String,
    id: ClauseId,
    depth: usize,
    seen: &mut HashSet<ClauseId>,
  ) -> fmt::Result {
    let Some(clause) = self.clauses.get(id) else {
      return Ok(());
    };
    let indent = "  ".repeat(depth);

    if !seen.insert(id) {
      return writeln!(out, "{indent}{clause} (see above)");
    }

    match &clause.cause {
      Cause::Root => writeln!(out, "{indent}{clause} because it is the root"),
      Cause::Dependency {
        dependant,
        requirement,
        ..
      } => writeln!(
        out,
        "{indent}{clause} because {dependant} depends on {requirement}"
      ),
      Cause::NoAllowedVersions { package, conflicts } => {
        writeln!(out, "{indent}{clause} because no versions of {package} are allowed")?;
        for conflict in conflicts {
          self.write(out, *conflict, depth + 1, seen)?;
        }
        Ok(())
      }
    }
  }
}

impl fmt::Display for Derivation<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut out = String::new();
    self.write(&mut out, self.failed, 0, &mut HashSet::new())?;
    f.write_str(out.trim_end())
  }
}
