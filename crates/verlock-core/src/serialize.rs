//! Writing a [`Lockfile`] back out in the layout Poetry produces.
//!
//! The document is built by hand with `toml_edit` rather than through serde so
//! that keys come out in Poetry's order, dependency tables stay inline and
//! artifact lists get one entry per line. A lock file Poetry wrote comes back
//! byte for byte.

use std::collections::BTreeMap;

use toml_edit::{Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table, Value, value};
use toml_write::{ToTomlValue, TomlStringBuilder};

use crate::error::LockfileError;
use crate::lockfile::Lockfile;
use crate::name::PackageName;
use crate::package::{Artifact, DependencyDetail, DependencySpec, Package};

impl Lockfile {
  /// Render the lock file. Parsing the result yields a lock file equal to `self`.
  pub fn to_toml(&self) -> Result<String, LockfileError> {
    let inline_files = self.metadata.has_inline_files();
    let mut doc = DocumentMut::new();
    if let Some(header) = &self.header {
      doc.decor_mut().set_prefix(format!("{header}\n\n"));
    }

    let mut packages = ArrayOfTables::new();
    for package in &self.packages {
      packages.push(package_table(package, inline_files)?);
    }
    doc.insert("package", Item::ArrayOfTables(packages));

    if !self.extras.is_empty() {
      let mut extras = Table::new();
      for (extra, members) in &self.extras {
        extras.insert(extra, value(string_array(members)?));
      }
      doc.insert("extras", Item::Table(extras));
    }

    let mut metadata = Table::new();
    metadata.insert("lock-version", value(string(&self.metadata.lock_version)?));
    metadata.insert("python-versions", value(string(&self.metadata.python_versions)?));
    metadata.insert("content-hash", value(string(&self.metadata.content_hash)?));
    insert_unknown(&mut metadata, &self.metadata.extra)?;

    if !inline_files {
      // keyed by normalized name, like Poetry 1.x
      let mut files: BTreeMap<PackageName, Vec<&Artifact>> = BTreeMap::new();
      for package in &self.packages {
        files
          .entry(package.normalized_name())
          .or_default()
          .extend(&package.files);
      }
      for (name, artifacts) in &self.metadata.orphan_files {
        files.entry(PackageName::new(name)).or_default().extend(artifacts);
      }

      let mut table = Table::new();
      for (name, artifacts) in files {
        table.insert(name.as_str(), value(artifact_array(artifacts)?));
      }
      metadata.insert("files", Item::Table(table));
    }
    doc.insert("metadata", Item::Table(metadata));

    Ok(doc.to_string())
  }
}

fn package_table(package: &Package, inline_files: bool) -> Result<Table, LockfileError> {
  let mut table = Table::new();
  table.insert("name", value(string(&package.name)?));
  table.insert("version", value(string(&package.version)?));
  table.insert("description", value(string(&package.description)?));
  if let Some(category) = package.category {
    table.insert("category", value(category.as_str()));
  }
  table.insert("optional", value(package.optional));
  table.insert("python-versions", value(string(&package.python_versions)?));
  // `groups` and `markers` of newer locks sit between the interpreter and the files
  insert_unknown(&mut table, &package.extra)?;
  if inline_files {
    table.insert("files", value(artifact_array(&package.files)?));
  }
  if let Some(develop) = package.develop {
    table.insert("develop", value(develop));
  }

  if !package.dependencies.is_empty() {
    let mut sorted: Vec<_> = package.dependencies.iter().collect();
    sorted.sort_by_key(|(name, _)| PackageName::new(name));

    let mut dependencies = Table::new();
    for (name, spec) in sorted {
      dependencies.insert(name, value(dependency_value(spec)?));
    }
    table.insert("dependencies", Item::Table(dependencies));
  }

  if !package.extras.is_empty() {
    let mut extras = Table::new();
    for (extra, requirements) in &package.extras {
      extras.insert(extra, value(string_array(requirements)?));
    }
    table.insert("extras", Item::Table(extras));
  }

  if let Some(source) = &package.source {
    let mut table_source = Table::new();
    table_source.insert("type", value(string(&source.kind)?));
    table_source.insert("url", value(string(&source.url)?));
    if let Some(reference) = &source.reference {
      table_source.insert("reference", value(string(reference)?));
    }
    if let Some(resolved) = &source.resolved_reference {
      table_source.insert("resolved_reference", value(string(resolved)?));
    }
    if let Some(subdirectory) = &source.subdirectory {
      table_source.insert("subdirectory", value(string(subdirectory)?));
    }
    insert_unknown(&mut table_source, &source.extra)?;
    table.insert("source", Item::Table(table_source));
  }

  Ok(table)
}

fn dependency_value(spec: &DependencySpec) -> Result<Value, LockfileError> {
  match spec {
    DependencySpec::Simple(constraint) => string(constraint),
    DependencySpec::Detailed(detail) => Ok(Value::InlineTable(detail_table(detail)?)),
    DependencySpec::Multiple(details) => {
      let branches = details
        .iter()
        .map(|detail| detail_table(detail).map(Value::InlineTable))
        .collect::<Result<Vec<_>, _>>()?;
      Ok(Value::Array(lines_array(branches)))
    }
  }
}

/// Poetry's key order: the location or version first, then
/// `python`, `extras`, `optional` and `markers`.
fn detail_table(detail: &DependencyDetail) -> Result<InlineTable, LockfileError> {
  let mut entries: Vec<(&str, Value)> = Vec::new();
  if let Some(path) = &detail.path {
    entries.push(("path", string(path)?));
  }
  if let Some(develop) = detail.develop {
    entries.push(("develop", Value::from(develop)));
  }
  let located = [
    ("url", &detail.url),
    ("git", &detail.git),
    ("branch", &detail.branch),
    ("tag", &detail.tag),
    ("rev", &detail.rev),
    ("version", &detail.version),
    ("python", &detail.python),
  ];
  for (key, field) in located {
    if let Some(field) = field {
      entries.push((key, string(field)?));
    }
  }
  if !detail.extras.is_empty() {
    entries.push(("extras", Value::Array(string_array(&detail.extras)?)));
  }
  if let Some(optional) = detail.optional {
    entries.push(("optional", Value::from(optional)));
  }
  if let Some(markers) = &detail.markers {
    entries.push(("markers", string(markers)?));
  }
  for (key, unknown) in &detail.extra {
    entries.push((key.as_str(), unknown_value(unknown)?));
  }
  Ok(inline_table(entries))
}

fn artifact_table(artifact: &Artifact) -> Result<InlineTable, LockfileError> {
  let mut entries: Vec<(&str, Value)> = vec![
    ("file", string(&artifact.file)?),
    ("hash", string(&artifact.hash)?),
  ];
  for (key, unknown) in &artifact.extra {
    entries.push((key.as_str(), unknown_value(unknown)?));
  }
  Ok(inline_table(entries))
}

/// Keys the model does not interpret go back in as plain values.
fn insert_unknown(
  table: &mut Table,
  extra: &BTreeMap<String, toml::Value>,
) -> Result<(), LockfileError> {
  for (key, unknown) in extra {
    table.insert(key, value(unknown_value(unknown)?));
  }
  Ok(())
}

fn unknown_value(input: &toml::Value) -> Result<Value, LockfileError> {
  Ok(match input {
    toml::Value::String(text) => string(text)?,
    toml::Value::Integer(number) => Value::from(*number),
    toml::Value::Float(number) => Value::from(*number),
    toml::Value::Boolean(flag) => Value::from(*flag),
    toml::Value::Datetime(datetime) => Value::from(*datetime),
    toml::Value::Array(items) => Value::Array(
      items
        .iter()
        .map(unknown_value)
        .collect::<Result<Array, LockfileError>>()?,
    ),
    toml::Value::Table(table) => {
      let entries = table
        .iter()
        .map(|(key, item)| unknown_value(item).map(|item| (key.as_str(), item)))
        .collect::<Result<Vec<_>, LockfileError>>()?;
      Value::InlineTable(inline_table(entries))
    }
  })
}

/// A double-quoted string. Poetry never writes literal strings, while
/// `toml_edit` picks them for anything containing `"`.
fn string(text: &str) -> Result<Value, LockfileError> {
  TomlStringBuilder::new(text)
    .as_basic()
    .to_toml_value()
    .parse::<Value>()
    .map_err(|source| LockfileError::Encode {
      value: text.to_string(),
      source,
    })
}

fn string_array(items: &[String]) -> Result<Array, LockfileError> {
  items.iter().map(String::as_str).map(string).collect()
}

/// `{key = value}` with no padding inside the braces.
fn inline_table(entries: Vec<(&str, Value)>) -> InlineTable {
  let mut table = InlineTable::new();
  for (key, item) in entries {
    table.insert(key, item);
  }

  let last = table.len().saturating_sub(1);
  for (i, (mut key, item)) in table.iter_mut().enumerate() {
    if i == 0 {
      key.leaf_decor_mut().set_prefix("");
    }
    if i == last {
      item.decor_mut().set_suffix("");
    }
  }
  table
}

fn artifact_array<'a>(
  artifacts: impl IntoIterator<Item = &'a Artifact>,
) -> Result<Array, LockfileError> {
  let artifacts = artifacts
    .into_iter()
    .map(|artifact| artifact_table(artifact).map(Value::InlineTable))
    .collect::<Result<Vec<_>, _>>()?;
  Ok(lines_array(artifacts))
}

fn lines_array(values: Vec<Value>) -> Array {
  if values.is_empty() {
    return Array::new();
  }
  each_element_on_its_line_array(values.into_iter())
}

fn each_element_on_its_line_array(elements: impl Iterator<Item = impl Into<Value>>) -> Array {
  let mut array = elements
    .map(|item| {
      let mut value = item.into();
      value.decor_mut().set_prefix("\n    ");
      value
    })
    .collect::<Array>();
  array.set_trailing_comma(true);
  array.set_trailing("\n");
  array
}

#[cfg(test)]
mod tests {
  use crate::lockfile::{Lockfile, parse_lockfile};
  use crate::metadata::Metadata;
  use crate::package::{Artifact, Category, DependencyDetail, DependencySpec, Package, PackageSource};
  use pretty_assertions::assert_eq;

  fn sample(lock_version: &str) -> Lockfile {
    let mut lockfile = Lockfile::new(
      Metadata::default()
        .with_lock_version(lock_version)
        .with_python_versions("^3.8")
        .with_content_hash("0c9fe7e22f03cd6d1b4bc5ab5ae6e0e6c3a7e4b1f1a4e4c3d2b6a9c8e7f6a5b4"),
      vec![
        Package::new("black", "22.10.0")
          .with_description("The uncompromising code formatter.")
          .with_category(Category::Dev)
          .with_python_versions(">=3.7")
          .with_dependency("click", ">=8.0.0")
          .with_dependency(
            "tomli",
            DependencyDetail {
              version: Some(">=1.1.0".to_string()),
              python: Some("<3.11a7".to_string()),
              ..DependencyDetail::default()
            },
          )
          .with_dependency(
            "typing-extensions",
            DependencySpec::Multiple(vec![
              DependencyDetail {
                version: Some(">=3.10.0.0".to_string()),
                markers: Some("python_version < \"3.10\"".to_string()),
                ..DependencyDetail::default()
              },
              DependencyDetail {
                version: Some(">=4.0".to_string()),
                markers: Some("python_version >= \"3.10\"".to_string()),
                ..DependencyDetail::default()
              },
            ]),
          )
          .with_extra("d", &["aiohttp (>=3.7.4)"])
          .with_file(Artifact::new(
            "black-22.10.0.tar.gz",
            "sha256:f513588da599943e0cde4e32cc9879e825d58720d6557062d1098c5ad80080e1",
          )),
        Package::new("click", "8.1.3")
          .with_category(Category::Dev)
          .with_python_versions(">=3.7")
          .with_file(Artifact::new(
            "click-8.1.3-py3-none-any.whl",
            "sha256:bb4d8133cb15a609f44e8213d9b391b0809795062913b383c62be0ee95b1db48",
          ))
          .with_file(Artifact::new(
            "click-8.1.3.tar.gz",
            "sha256:7682dc8afb30297001674575ea00d1814d808d6a36af415a82bd481d37ba7b8e",
          )),
        Package::new("mylib", "0.1.0")
          .with_source(PackageSource::new("directory", "../mylib")),
        Package::new("tomli", "2.0.1").with_python_versions(">=3.7"),
        Package::new("typing-extensions", "4.4.0"),
      ],
    );
    lockfile
      .extras
      .insert("formatting".to_string(), vec!["black".to_string()]);
    lockfile
  }

  #[test]
  fn test_round_trip_inline_files() {
    let lockfile = sample("2.0");
    let text = lockfile.to_toml().unwrap();
    assert!(text.contains("files = [\n    {"));
    assert!(text.contains("file = \"click-8.1.3-py3-none-any.whl\""));
    assert!(!text.contains("[metadata.files]"));
    assert_eq!(parse_lockfile(&text).unwrap(), lockfile);
  }

  #[test]
  fn test_round_trip_metadata_files() {
    let mut lockfile = sample("1.1");
    lockfile.metadata.orphan_files.insert(
      "pysocks".to_string(),
      vec![Artifact::new(
        "PySocks-1.7.1.tar.gz",
        "sha256:3f8804571ebe159c380ac6de37643bb4685970655d3bba243530d6558b799aa0",
      )],
    );

    let text = lockfile.to_toml().unwrap();
    assert!(text.contains("[metadata.files]"));
    assert!(!text.contains("\nfiles = "));
    assert_eq!(parse_lockfile(&text).unwrap(), lockfile);
  }

  #[test]
  fn test_poetry_value_style() {
    let lockfile = Lockfile::new(
      Metadata::default().with_lock_version("1.1"),
      vec![
        Package::new("black", "22.10.0")
          .with_description("A \"quoted\" description")
          .with_dependency(
            "aiohttp",
            DependencyDetail {
              version: Some(">=3.7.4".to_string()),
              markers: Some("extra == \"d\"".to_string()),
              optional: Some(true),
              ..DependencyDetail::default()
            },
          )
          .with_dependency("Click", ">=8.0.0")
          .with_dependency("appdirs", "*"),
      ],
    );
    let text = lockfile.to_toml().unwrap();

    let expected_package = r#"[[package]]
name = "black"
version = "22.10.0"
description = "A \"quoted\" description"
optional = false
python-versions = "*"

[package.dependencies]
aiohttp = {version = ">=3.7.4", optional = true, markers = "extra == \"d\""}
appdirs = "*"
Click = ">=8.0.0"
"#;
    assert!(text.starts_with(expected_package), "{text}");
    assert!(!text.contains('\''), "{text}");
  }

  #[test]
  fn test_metadata_files_layout() {
    let mut lockfile = Lockfile::new(
      Metadata::default()
        .with_lock_version("1.1")
        .with_python_versions("^3.8")
        .with_content_hash("27823b7885ad8531e6d2ab346022f4f3954e74cf7d85c8ba39b27bd779bda0d0"),
      vec![
        Package::new("PySocks", "1.7.1").with_file(Artifact::new(
          "PySocks-1.7.1.tar.gz",
          "sha256:0725bbe6da3294fec58adfe39d9d096c8040a58c03566ec35ed0c8c3e9975c95",
        )),
      ],
    );
    lockfile.header = Some("# generated".to_string());

    let expected = r#"# generated

[[package]]
name = "PySocks"
version = "1.7.1"
description = ""
optional = false
python-versions = "*"

[metadata]
lock-version = "1.1"
python-versions = "^3.8"
content-hash = "27823b7885ad8531e6d2ab346022f4f3954e74cf7d85c8ba39b27bd779bda0d0"

[metadata.files]
pysocks = [
    {file = "PySocks-1.7.1.tar.gz", hash = "sha256:0725bbe6da3294fec58adfe39d9d096c8040a58c03566ec35ed0c8c3e9975c95"},
]
"#;
    assert_eq!(lockfile.to_toml().unwrap(), expected);
  }

  #[test]
  fn test_unknown_keys_keep_their_place() {
    let text = r#"[[package]]
name = "typing-extensions"
version = "4.4.0"
description = ""
optional = false
python-versions = ">=3.7"
groups = ["main"]
markers = "python_version >= \"3.8\""
files = []
develop = false

[metadata]
lock-version = "2.1"
python-versions = "^3.8"
content-hash = ""
"#;
    assert_eq!(parse_lockfile(text).unwrap().to_toml().unwrap(), text);
  }

  #[test]
  fn test_key_order() {
    let text = sample("2.0").to_toml().unwrap();
    let position = |needle: &str| {
      text
        .find(needle)
        .unwrap_or_else(|| panic!("`{needle}` missing from:\n{text}"))
    };

    assert!(position("name = \"black\"") < position("version = \"22.10.0\""));
    assert!(position("version = \"22.10.0\"") < position("category = \"dev\""));
    assert!(position("category = \"dev\"") < position("python-versions = \">=3.7\""));
    assert!(position("[package.dependencies]") < position("[package.extras]"));
    assert!(position("[package.source]") < position("[extras]"));
    assert!(position("[extras]") < position("[metadata]"));
    assert!(position("lock-version") < position("content-hash"));
  }
}
