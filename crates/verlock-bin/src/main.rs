use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use verlock_core::{
  InMemoryRepository, Lockfile, LockfileRepository, Requirement, ResolutionStrategy, SolverOptions,
  ValidateOptions, Version, VersionSet, parse_lockfile, solve, validate,
};

#[derive(Parser, Debug)]
#[command(name = "verlock")]
#[command(about = "Inspect, check, format and re-resolve Poetry lockfiles")]
struct Cli {
  /// More logging on stderr (-v debug, -vv trace). RUST_LOG takes precedence
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Parse a lockfile and dump the Rust struct
  Dump {
    #[command(flatten)]
    input: Input,
    /// Print JSON instead of the debug representation
    #[arg(long)]
    json: bool,
  },
  /// Check a lockfile for structural problems, exits 1 on errors
  Check {
    #[command(flatten)]
    input: Input,
    /// A dependency that is installed outside of the lockfile
    #[arg(long, value_name = "NAME")]
    allow_external: Vec<String>,
    /// Do not check pinned versions against their dependants' constraints
    #[arg(long)]
    no_constraints: bool,
    /// Warn about artifacts whose file name does not mention their package
    #[arg(long)]
    check_file_names: bool,
    #[arg(long)]
    json: bool,
  },
  /// Write a lockfile back out in Poetry's layout
  Fmt {
    #[command(flatten)]
    input: Input,
    /// Exit 1 when the file is not formatted, without printing it
    #[arg(long, conflicts_with = "write")]
    check: bool,
    /// Overwrite the lockfile in place
    #[arg(long)]
    write: bool,
  },
  /// Print the dependency tree of a lockfile
  Tree {
    #[command(flatten)]
    input: Input,
    #[arg(long)]
    json: bool,
  },
  /// Resolve requirements against a lockfile or a JSON package index
  Solve {
    /// Root requirements, e.g. `requests[socks] >=2.28`
    #[arg(required = true, value_name = "REQUIREMENT")]
    requirements: Vec<String>,
    /// Resolve against the records of this lockfile
    #[arg(long, value_name = "LOCKFILE", group = "source")]
    lock: Option<PathBuf>,
    /// Resolve against a `name -> version -> [requirement]` JSON index
    #[arg(long, value_name = "JSON", group = "source")]
    index: Option<PathBuf>,
    /// A bundled fixture, `.lock` files are lockfiles and anything else an index
    #[arg(short, long, value_name = "NAME", group = "source")]
    fixture: Option<String>,
    /// Prefer the lowest allowed versions
    #[arg(long)]
    lowest: bool,
    #[arg(long)]
    json: bool,
  },
  /// Compare two versions
  Compare { a: String, b: String },
  /// Check whether a version set contains a version
  Contains {
    set: String,
    version: String,
  },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
  /// Path to a lockfile
  #[arg(value_name = "LOCKFILE")]
  lockfile: Option<PathBuf>,

  /// Use a bundled fixture name instead of a path (reads from repo fixtures/)
  #[arg(short, long, value_name = "NAME")]
  fixture: Option<String>,
}

impl Input {
  fn path(&self) -> PathBuf {
    match (&self.lockfile, &self.fixture) {
      (Some(path), _) => path.clone(),
      (None, Some(fixture)) => fixtures_dir().join(fixture),
      (None, None) => PathBuf::new(),
    }
  }

  fn read(&self) -> Result<(PathBuf, String)> {
    let path = self.path();
    let contents = read_file(&path)?;
    Ok((path, contents))
  }

  fn load(&self) -> Result<Lockfile> {
    let (path, contents) = self.read()?;
    parse_lockfile(&contents).with_context(|| format!("failed to parse {}", path.display()))
  }
}

fn fixtures_dir() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("..")
    .join("..")
    .join("fixtures")
}

fn read_file(path: &Path) -> Result<String> {
  std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn setup_logging(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .without_time()
    .with_writer(std::io::stderr)
    .init();
}

fn run(command: Command) -> Result<ExitCode> {
  match command {
    Command::Dump { input, json } => {
      let lockfile = input.load()?;
      if json {
        println!("{}", serde_json::to_string_pretty(&lockfile)?);
      } else {
        println!("lockfile: {lockfile:#?}");
      }
    }

    Command::Check {
      input,
      allow_external,
      no_constraints,
      check_file_names,
      json,
    } => {
      let lockfile = input.load()?;
      let options = ValidateOptions {
        allow_external,
        check_constraints: !no_constraints,
        check_file_names,
      };
      let report = validate(&lockfile, &options);
      if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
      } else {
        println!("{report}");
      }
      if !report.is_ok() {
        return Ok(ExitCode::FAILURE);
      }
    }

    Command::Fmt {
      input,
      check,
      write,
    } => {
      let (path, contents) = input.read()?;
      let lockfile = parse_lockfile(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
      let formatted = lockfile.to_toml()?;

      if check {
        if formatted != contents {
          eprintln!("{} is not formatted", path.display());
          return Ok(ExitCode::FAILURE);
        }
      } else if write {
        std::fs::write(&path, formatted)
          .with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "rewrote lockfile");
      } else {
        print!("{formatted}");
      }
    }

    Command::Tree { input, json } => {
      let tree = input.load()?.tree();
      if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
      } else {
        print!("{tree}");
      }
    }

    Command::Solve {
      requirements,
      lock,
      index,
      fixture,
      lowest,
      json,
    } => {
      let requirements = requirements
        .iter()
        .map(|requirement| {
          Requirement::parse(requirement)
            .with_context(|| format!("invalid requirement `{requirement}`"))
        })
        .collect::<Result<Vec<_>>>()?;

      let strategy = if lowest {
        ResolutionStrategy::Lowest
      } else {
        ResolutionStrategy::Highest
      };
      let options = SolverOptions::default().with_strategy(strategy);

      let (lock, index) = match fixture {
        Some(name) if name.ends_with(".lock") => (Some(fixtures_dir().join(name)), None),
        Some(name) => (None, Some(fixtures_dir().join(name))),
        None => (lock, index),
      };

      let resolution = if let Some(path) = lock {
        let lockfile = Lockfile::from_path(&path)
          .with_context(|| format!("failed to load {}", path.display()))?;
        solve(&requirements, &LockfileRepository::new(&lockfile), &options)?
      } else if let Some(path) = index {
        let repository = InMemoryRepository::from_json(&read_file(&path)?)
          .with_context(|| format!("failed to load index {}", path.display()))?;
        solve(&requirements, &repository, &options)?
      } else {
        bail!("pass --lock, --index or --fixture to solve against");
      };

      if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
      } else {
        print!("{resolution}");
      }
    }

    Command::Compare { a, b } => {
      let left = Version::parse(&a).with_context(|| format!("invalid version `{a}`"))?;
      let right = Version::parse(&b).with_context(|| format!("invalid version `{b}`"))?;
      let symbol = match left.cmp(&right) {
        std::cmp::Ordering::Less => "<",
        std::cmp::Ordering::Equal => "==",
        std::cmp::Ordering::Greater => ">",
      };
      println!("{a} {symbol} {b}");
    }

    Command::Contains { set, version } => {
      let parsed_set = VersionSet::parse(&set).with_context(|| format!("invalid version set `{set}`"))?;
      let parsed = Version::parse(&version).with_context(|| format!("invalid version `{version}`"))?;
      if parsed_set.contains(&parsed) {
        println!("{version} is in {parsed_set}");
      } else {
        println!("{version} is not in {parsed_set}");
        return Ok(ExitCode::FAILURE);
      }
    }
  }

  Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  match run(cli.command) {
    Ok(code) => code,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::from(2)
    }
  }
}
