use std::path::PathBuf;

/// A version string that could not be split into components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
  #[error("empty version string")]
  Empty,
  #[error("invalid version `{input}`: unexpected `{remaining}`")]
  Syntax { input: String, remaining: String },
  #[error("invalid version `{input}`: number `{number}` is too large")]
  NumberTooLarge { input: String, number: String },
}

/// A version set expression that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionSetParseError {
  #[error("empty version set")]
  Empty,
  #[error("invalid version set `{input}`: unexpected `{remaining}`")]
  Syntax { input: String, remaining: String },
  #[error("invalid version in `{input}`")]
  Version {
    input: String,
    #[source]
    source: VersionParseError,
  },
  #[error("operator `{operator}` cannot be used with `{version}`")]
  Operator { operator: String, version: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequirementParseError {
  #[error("invalid requirement `{input}`: unexpected `{remaining}`")]
  Syntax { input: String, remaining: String },
  #[error("invalid requirement `{input}`")]
  VersionSet {
    input: String,
    #[source]
    source: VersionSetParseError,
  },
}

/// Reading, decoding or writing a `poetry.lock`.
#[derive(Debug, thiserror::Error)]
pub enum LockfileError {
  #[error("failed to read `{}`", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to decode lockfile")]
  Decode(#[from] toml::de::Error),
  #[error("failed to encode `{value}`")]
  Encode {
    value: String,
    #[source]
    source: toml_edit::TomlError,
  },
}

/// An artifact hash that is not `algorithm:hexdigest`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashDigestError {
  #[error("hash `{0}` has no `algorithm:` prefix")]
  MissingAlgorithm(String),
  #[error("unknown hash algorithm `{0}`")]
  UnknownAlgorithm(String),
  #[error("{algorithm} digest must be {expected} hex characters, found `{digest}`")]
  InvalidDigest {
    algorithm: String,
    expected: usize,
    digest: String,
  },
}

/// A package source that cannot answer a query.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
  #[error("package `{name}` has no version `{version}`")]
  UnknownVersion { name: String, version: String },
  #[error(transparent)]
  Requirement(#[from] RequirementParseError),
  #[error(transparent)]
  Version(#[from] VersionParseError),
  #[error("invalid constraint for `{name}`")]
  Constraint {
    name: String,
    #[source]
    source: VersionSetParseError,
  },
  #[error("failed to decode package index")]
  Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
  /// The requirements cannot be satisfied together. `derivation` explains why.
  #[error("no solution found:\n{derivation}")]
  NoSolution { derivation: String },
  #[error("gave up after {limit} iterations")]
  IterationLimit { limit: usize },
  #[error(transparent)]
  Repository(#[from] RepositoryError),
}
