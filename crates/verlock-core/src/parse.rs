//! Grammars for versions, version sets, requirements and Maven ranges.
//!
//! Every grammar is a small set of `nom` parsers that produce a borrowed
//! syntax tree first; turning that tree into owned values happens in a second
//! step so that semantic errors (a `^` on a non-numeric version, a wildcard
//! with `>=`) can be reported with their own messages.

use nom::{
  IResult, Parser,
  branch::alt,
  bytes::complete::{tag, tag_no_case, take_while1},
  character::complete::{char, multispace0, one_of, satisfy},
  combinator::{not, opt, rest},
  error::{Error, ErrorKind},
  multi::{many0, many1, separated_list0, separated_list1},
  sequence::{delimited, preceded, terminated},
};

use crate::error::{RequirementParseError, VersionParseError, VersionSetParseError};
use crate::requirement::Requirement;
use crate::version::{Component, Version};
use crate::version_set::VersionSet;

/// Parse a version such as `1.2.3`, `v2.0-alpha-1` or `1.0.0rc1`.
pub fn parse_version(input: &str) -> Result<Version, VersionParseError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(VersionParseError::Empty);
  }

  match (version_prefix, version_sections).parse(trimmed) {
    Ok(("", (_, components))) if !components.is_empty() => {
      Ok(Version::from_parts(trimmed.to_string(), components))
    }
    Ok((remaining, _)) => Err(VersionParseError::Syntax {
      input: input.to_string(),
      remaining: remaining.to_string(),
    }),
    Err(nom::Err::Error(e) | nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => {
      let number: String = e
        .input
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
      Err(VersionParseError::NumberTooLarge {
        input: input.to_string(),
        number,
      })
    }
    Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(VersionParseError::Syntax {
      input: input.to_string(),
      remaining: e.input.to_string(),
    }),
    Err(nom::Err::Incomplete(_)) => Err(VersionParseError::Syntax {
      input: input.to_string(),
      remaining: String::new(),
    }),
  }
}

/// `v`, `ver` and `version` are accepted (and dropped) in front of a version
fn version_prefix(input: &str) -> IResult<&str, Option<&str>> {
  opt(alt((
    tag_no_case("version"),
    tag_no_case("ver"),
    tag_no_case("v"),
  )))
  .parse(input)
}

/// One or more components, with `-`, `+` and `_` as explicit separators
fn version_sections(input: &str) -> IResult<&str, Vec<Component>> {
  let (rest, sections) = many1(alt((
    one_of("-+_").map(|_| None),
    version_component.map(Some),
  )))
  .parse(input)?;

  Ok((rest, sections.into_iter().flatten().collect()))
}

/// The longest run of either digits-and-dots or letters-and-dots.
fn version_component(input: &str) -> IResult<&str, Component> {
  let numeric: IResult<&str, &str> =
    take_while1(|c: char| c.is_ascii_digit() || c == '.').parse(input);
  let word: IResult<&str, &str> =
    take_while1(|c: char| c.is_ascii_alphabetic() || c == '.').parse(input);

  let numeric_len = numeric.as_ref().map_or(0, |(_, matched)| matched.len());
  let word_len = word.as_ref().map_or(0, |(_, matched)| matched.len());

  if numeric_len == 0 && word_len == 0 {
    return Err(nom::Err::Error(Error::new(input, ErrorKind::TakeWhile1)));
  }

  if numeric_len >= word_len {
    let (rest, matched) = numeric?;
    let items = matched
      .split('.')
      .filter(|piece| !piece.is_empty())
      .map(str::parse::<u64>)
      .collect::<Result<Vec<_>, _>>()
      .map_err(|_| nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)))?;
    Ok((rest, Component::Numeric(items)))
  } else {
    let (rest, matched) = word?;
    Ok((
      rest,
      Component::Qualifier(matched.trim_matches('.').to_string()),
    ))
  }
}

/// Borrowed syntax tree of a version set expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SetExpr<'a> {
  Specifier {
    operator: Option<&'a str>,
    version: &'a str,
  },
  And(Vec<SetExpr<'a>>),
  Or(Vec<SetExpr<'a>>),
  Not(Box<SetExpr<'a>>),
}

/// Parse a version set such as `>=1.0, <2.0`, `^1.2 || ~0.9` or `!(<=1.0 or >3.0)`.
pub fn parse_version_set(input: &str) -> Result<VersionSet, VersionSetParseError> {
  if input.trim().is_empty() {
    return Err(VersionSetParseError::Empty);
  }

  match terminated(set_or, multispace0).parse(input) {
    Ok(("", expr)) => lower_set(&expr, input),
    Ok((remaining, _)) => Err(VersionSetParseError::Syntax {
      input: input.to_string(),
      remaining: remaining.to_string(),
    }),
    Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(VersionSetParseError::Syntax {
      input: input.to_string(),
      remaining: e.input.to_string(),
    }),
    Err(nom::Err::Incomplete(_)) => Err(VersionSetParseError::Syntax {
      input: input.to_string(),
      remaining: String::new(),
    }),
  }
}

/// A word operator that must not run into the next word, e.g. `and` but not `android`
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = Error<&'a str>> {
  terminated(tag(word), not(satisfy(|c: char| c.is_ascii_alphanumeric())))
}

fn or_operator(input: &str) -> IResult<&str, &str> {
  delimited(
    multispace0,
    alt((tag("||"), tag("|"), keyword("or"))),
    multispace0,
  )
  .parse(input)
}

fn and_operator(input: &str) -> IResult<&str, &str> {
  delimited(
    multispace0,
    alt((tag("&&"), tag("&"), tag(","), keyword("and"))),
    multispace0,
  )
  .parse(input)
}

/// Lowest precedence: `a | b`
fn set_or(input: &str) -> IResult<&str, SetExpr<'_>> {
  let (rest, first) = set_and(input)?;
  let (rest, others) = many0(preceded(or_operator, set_and)).parse(rest)?;
  Ok((rest, fold(first, others, SetExpr::Or)))
}

/// `a & b`, `a, b`, `a and b`
fn set_and(input: &str) -> IResult<&str, SetExpr<'_>> {
  let (rest, first) = set_not(input)?;
  let (rest, others) = many0(preceded(and_operator, set_not)).parse(rest)?;
  Ok((rest, fold(first, others, SetExpr::And)))
}

fn fold<'a>(
  first: SetExpr<'a>,
  others: Vec<SetExpr<'a>>,
  combine: fn(Vec<SetExpr<'a>>) -> SetExpr<'a>,
) -> SetExpr<'a> {
  if others.is_empty() {
    return first;
  }
  let mut all = Vec::with_capacity(others.len() + 1);
  all.push(first);
  all.extend(others);
  combine(all)
}

/// Highest precedence: `!a`. A `!` directly followed by `=` is the `!=` operator instead.
fn set_not(input: &str) -> IResult<&str, SetExpr<'_>> {
  alt((
    preceded(
      (multispace0, char('!'), not(char('=')), multispace0),
      set_not,
    )
    .map(|expr| SetExpr::Not(Box::new(expr))),
    set_atom,
  ))
  .parse(input)
}

fn set_atom(input: &str) -> IResult<&str, SetExpr<'_>> {
  alt((
    delimited(
      (multispace0, char('(')),
      set_or,
      (multispace0, char(')')),
    ),
    specifier,
  ))
  .parse(input)
}

fn specifier_operator(input: &str) -> IResult<&str, &str> {
  alt((
    tag("==="),
    tag("=="),
    tag("!="),
    tag("~="),
    tag(">="),
    tag("<="),
    tag(">"),
    tag("<"),
    tag("^"),
    tag("~"),
    tag("="),
  ))
  .parse(input)
}

fn version_word(input: &str) -> IResult<&str, &str> {
  take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '*' | '_'))
    .parse(input)
}

/// An optional operator followed by a version, e.g. `>= 1.0`, `^2`, `1.0.*`
fn specifier(input: &str) -> IResult<&str, SetExpr<'_>> {
  let (rest, (_, operator, _, version)) = (
    multispace0,
    opt(specifier_operator),
    multispace0,
    version_word,
  )
    .parse(input)?;

  Ok((rest, SetExpr::Specifier { operator, version }))
}

fn lower_set(expr: &SetExpr<'_>, input: &str) -> Result<VersionSet, VersionSetParseError> {
  match expr {
    SetExpr::Specifier { operator, version } => lower_specifier(*operator, version, input),
    SetExpr::And(exprs) => Ok(VersionSet::all(
      exprs
        .iter()
        .map(|expr| lower_set(expr, input))
        .collect::<Result<Vec<_>, _>>()?,
    )),
    SetExpr::Or(exprs) => Ok(VersionSet::any(
      exprs
        .iter()
        .map(|expr| lower_set(expr, input))
        .collect::<Result<Vec<_>, _>>()?,
    )),
    SetExpr::Not(expr) => Ok(!lower_set(expr, input)?),
  }
}

fn lower_specifier(
  operator: Option<&str>,
  word: &str,
  input: &str,
) -> Result<VersionSet, VersionSetParseError> {
  let operator = operator.unwrap_or("==");
  let misuse = || VersionSetParseError::Operator {
    operator: operator.to_string(),
    version: word.to_string(),
  };
  let parse = |word: &str| {
    parse_version(word).map_err(|source| VersionSetParseError::Version {
      input: input.to_string(),
      source,
    })
  };

  if word == "*" {
    return match operator {
      "==" | "=" | ">=" => Ok(VersionSet::Any),
      "!=" => Ok(VersionSet::None),
      _ => Err(misuse()),
    };
  }

  if let Some(prefix) = word.strip_suffix(".*") {
    let prefix = parse(prefix)?;
    let range = bounded(&prefix, prefix.release().len().saturating_sub(1)).ok_or_else(misuse)?;
    return match operator {
      "==" | "=" | "===" => Ok(range),
      "!=" => Ok(!range),
      _ => Err(misuse()),
    };
  }

  if word.contains('*') {
    return Err(misuse());
  }

  let version = parse(word)?;
  let release_len = version.release().len();
  let set = match operator {
    "==" | "=" | "===" => VersionSet::Eq(version),
    "!=" => VersionSet::NotEq(version),
    ">" => VersionSet::Gt(version),
    ">=" => VersionSet::GtEq(version),
    "<" => VersionSet::Lt(version),
    "<=" => VersionSet::LtEq(version),
    // ^1.2.3 := >=1.2.3,<2.0.0 ; ^0.2.3 := >=0.2.3,<0.3.0 ; ^0.0.3 := >=0.0.3,<0.0.4
    "^" => {
      let index = version
        .release()
        .iter()
        .position(|n| *n != 0)
        .unwrap_or_else(|| release_len.saturating_sub(1));
      bounded(&version, index).ok_or_else(misuse)?
    }
    // ~1.2.3 := >=1.2.3,<1.3.0 ; ~1 := >=1,<2
    "~" => bounded(&version, usize::from(release_len >= 2)).ok_or_else(misuse)?,
    // ~=1.2 := >=1.2,<2 ; ~=1.2.3 := >=1.2.3,<1.3
    "~=" if release_len >= 2 => bounded(&version, release_len - 2).ok_or_else(misuse)?,
    _ => return Err(misuse()),
  };
  Ok(set)
}

/// `>=version, <bump` where `bump` is the release cut after `index` with its
/// last number incremented. `None` when the version has no release numbers.
fn bounded(version: &Version, index: usize) -> Option<VersionSet> {
  let release = version.release();
  if index >= release.len() {
    return None;
  }
  let mut upper = release[..=index].to_vec();
  upper[index] = upper[index].saturating_add(1);
  Some(VersionSet::All(vec![
    VersionSet::GtEq(version.clone()),
    VersionSet::Lt(Version::from_release(&upper)),
  ]))
}

fn requirement_name(input: &str) -> IResult<&str, &str> {
  take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')).parse(input)
}

/// `[security, socks]`
fn requirement_extras(input: &str) -> IResult<&str, Vec<&str>> {
  delimited(
    (multispace0, char('[')),
    separated_list0(
      char(','),
      delimited(multispace0, requirement_name, multispace0),
    ),
    char(']'),
  )
  .parse(input)
}

/// `; python_version >= "3.8"`, kept verbatim
fn requirement_marker(input: &str) -> IResult<&str, &str> {
  preceded((multispace0, char(';'), multispace0), rest).parse(input)
}

/// Parse a requirement such as `requests[socks] >=2.0, <3`, `bar 1.0` or
/// `pytest (>=6.0) ; extra == "test"`. A missing version set allows any version.
pub fn parse_requirement(input: &str) -> Result<Requirement, RequirementParseError> {
  let parsed = (
    multispace0,
    requirement_name,
    opt(requirement_extras),
    opt(set_or),
    opt(requirement_marker),
    multispace0,
  )
    .parse(input);

  let (name, extras, expr, marker) = match parsed {
    Ok(("", (_, name, extras, expr, marker, _))) => (name, extras, expr, marker),
    Ok((remaining, _)) => {
      return Err(RequirementParseError::Syntax {
        input: input.to_string(),
        remaining: remaining.to_string(),
      });
    }
    Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
      return Err(RequirementParseError::Syntax {
        input: input.to_string(),
        remaining: e.input.to_string(),
      });
    }
    Err(nom::Err::Incomplete(_)) => {
      return Err(RequirementParseError::Syntax {
        input: input.to_string(),
        remaining: String::new(),
      });
    }
  };

  let version_set = match expr {
    Some(expr) => lower_set(&expr, input).map_err(|source| RequirementParseError::VersionSet {
      input: input.to_string(),
      source,
    })?,
    None => VersionSet::Any,
  };

  Ok(Requirement {
    name: name.to_string(),
    extras: extras
      .unwrap_or_default()
      .into_iter()
      .map(str::to_string)
      .collect(),
    version_set,
    marker: marker
      .map(str::trim)
      .filter(|marker| !marker.is_empty())
      .map(str::to_string),
  })
}

/// A single entry of a Maven version list.
#[derive(Debug)]
enum MavenItem<'a> {
  Exact(&'a str),
  Range {
    include_min: bool,
    min: Option<&'a str>,
    max: Option<&'a str>,
    include_max: bool,
  },
}

fn maven_word(input: &str) -> IResult<&str, &str> {
  take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-')).parse(input)
}

/// `[1.0,2.0)`, `(,1.0]`, `[1.5,)`
fn maven_range(input: &str) -> IResult<&str, MavenItem<'_>> {
  let (rest, (open, _, min, _, _, _, max, _, close)) = (
    one_of("[("),
    multispace0,
    opt(maven_word),
    multispace0,
    char(','),
    multispace0,
    opt(maven_word),
    multispace0,
    one_of("])"),
  )
    .parse(input)?;

  Ok((
    rest,
    MavenItem::Range {
      include_min: open == '[',
      min,
      max,
      include_max: close == ']',
    },
  ))
}

fn maven_items(input: &str) -> IResult<&str, Vec<MavenItem<'_>>> {
  separated_list1(
    (multispace0, char(','), multispace0),
    alt((maven_range, maven_word.map(MavenItem::Exact))),
  )
  .parse(input)
}

/// Parse a Maven version list such as `(1.0-SNAPSHOT,], 2.0-alpha-1`. The result
/// is the union of every listed version and range.
pub fn parse_maven_version_set(input: &str) -> Result<VersionSet, VersionSetParseError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(VersionSetParseError::Empty);
  }

  let items = match maven_items(trimmed) {
    Ok(("", items)) => items,
    Ok((remaining, _)) => {
      return Err(VersionSetParseError::Syntax {
        input: input.to_string(),
        remaining: remaining.to_string(),
      });
    }
    Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
      return Err(VersionSetParseError::Syntax {
        input: input.to_string(),
        remaining: e.input.to_string(),
      });
    }
    Err(nom::Err::Incomplete(_)) => {
      return Err(VersionSetParseError::Syntax {
        input: input.to_string(),
        remaining: String::new(),
      });
    }
  };

  let parse = |word: &str| {
    parse_version(word).map_err(|source| VersionSetParseError::Version {
      input: input.to_string(),
      source,
    })
  };

  let mut sets = Vec::with_capacity(items.len());
  for item in items {
    let set = match item {
      MavenItem::Exact(word) => VersionSet::Eq(parse(word)?),
      MavenItem::Range {
        include_min,
        min,
        max,
        include_max,
      } => {
        let mut bounds = Vec::with_capacity(2);
        if let Some(min) = min {
          let min = parse(min)?;
          bounds.push(if include_min {
            VersionSet::GtEq(min)
          } else {
            VersionSet::Gt(min)
          });
        }
        if let Some(max) = max {
          let max = parse(max)?;
          bounds.push(if include_max {
            VersionSet::LtEq(max)
          } else {
            VersionSet::Lt(max)
          });
        }
        VersionSet::all(bounds)
      }
    };
    sets.push(set);
  }

  Ok(VersionSet::any(sets))
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn v(s: &str) -> Version {
    parse_version(s).unwrap()
  }

  #[test]
  fn test_version_components() {
    let version = v("01..00.0-alpha.beta.010a-SNAPSHOT");
    assert_eq!(
      version.components(),
      &[
        Component::Numeric(vec![1, 0, 0]),
        Component::Qualifier("alpha.beta".to_string()),
        Component::Numeric(vec![10]),
        Component::Qualifier("a".to_string()),
        Component::Qualifier("SNAPSHOT".to_string()),
      ]
    );
  }

  #[test]
  fn test_version_prefix_is_dropped() {
    assert_eq!(v("Ver2.1.0").components(), &[Component::Numeric(vec![2, 1, 0])]);
    assert_eq!(v("version1").components(), &[Component::Numeric(vec![1])]);
    assert_eq!(v("v1.0").to_string(), "v1.0");
  }

  #[test]
  fn test_version_local_segment() {
    assert_eq!(
      v("1.0+local.7").components(),
      &[
        Component::Numeric(vec![1, 0]),
        Component::Qualifier("local".to_string()),
        Component::Numeric(vec![7]),
      ]
    );
  }

  #[rstest]
  #[case("", VersionParseError::Empty)]
  #[case("1.0 beta", VersionParseError::Syntax { input: "1.0 beta".to_string(), remaining: " beta".to_string() })]
  #[case("1!2.0", VersionParseError::Syntax { input: "1!2.0".to_string(), remaining: "!2.0".to_string() })]
  #[case("99999999999999999999999", VersionParseError::NumberTooLarge { input: "99999999999999999999999".to_string(), number: "99999999999999999999999".to_string() })]
  fn test_invalid_versions(#[case] input: &str, #[case] expected: VersionParseError) {
    assert_eq!(parse_version(input).unwrap_err(), expected);
  }

  #[rstest]
  #[case("<= 1.0 | >3.0", &["1.0", "0.1"], &["2.0"])]
  #[case("<= 1.0 or >3.0", &["1.0", "3.1"], &["2.0", "3.0"])]
  #[case("(>=1.0, <3.0)", &["2.0"], &["3.0", "0.9"])]
  #[case(">=1.0 and <3.0", &["2.0"], &["3.0"])]
  #[case("!(<= 1.0 or >3.0)", &["2.0"], &["1.0"])]
  #[case(">=1.0 & < 2.0", &["1.0", "1.99"], &["2.0"])]
  #[case(">=2.7, !=3.0.*, !=3.1.*", &["2.7.18", "3.2"], &["3.0.1", "3.1", "2.6"])]
  #[case("^1.2.3", &["1.2.3", "1.9"], &["2.0.0", "1.2.2"])]
  #[case("^0.2.3", &["0.2.9"], &["0.3.0"])]
  #[case("^0.0.3", &["0.0.3"], &["0.0.4"])]
  #[case("~1.2.3", &["1.2.9"], &["1.3.0"])]
  #[case("~1", &["1.9"], &["2.0"])]
  #[case("~=1.2", &["1.9"], &["2.0"])]
  #[case("~=1.2.3", &["1.2.5"], &["1.3"])]
  #[case("==1.4.*", &["1.4", "1.4.7"], &["1.5", "1.3.9"])]
  #[case("*", &["0.0.1", "99"], &[])]
  #[case(">=3.6 || <2.0", &["3.8", "1.5"], &["2.5"])]
  #[case("1.0", &["1.0.0"], &["1.0.1"])]
  fn test_version_set_membership(
    #[case] input: &str,
    #[case] inside: &[&str],
    #[case] outside: &[&str],
  ) {
    let set = parse_version_set(input).unwrap();
    for version in inside {
      assert!(set.contains(&v(version)), "{input} should contain {version}");
    }
    for version in outside {
      assert!(!set.contains(&v(version)), "{input} should not contain {version}");
    }
  }

  #[rstest]
  #[case("")]
  #[case(">=1.0,")]
  #[case("(>=1.0")]
  #[case(">=1.0 <2.0")]
  #[case("<*")]
  #[case("^alpha")]
  #[case("~=1")]
  #[case(">1.*")]
  fn test_invalid_version_sets(#[case] input: &str) {
    assert!(parse_version_set(input).is_err(), "{input} should not parse");
  }

  #[test]
  fn test_caret_expansion_shape() {
    assert_eq!(
      parse_version_set("^1.2.3").unwrap().to_string(),
      "(>=1.2.3 & <2)"
    );
  }

  #[test]
  fn test_requirement_forms() {
    let req = parse_requirement("httpx >= 1.0 & < 2.0").unwrap();
    assert_eq!(req.name, "httpx");
    assert!(req.extras.is_empty());
    assert!(req.version_set.contains(&v("1.5")));
    assert!(!req.version_set.contains(&v("2.0")));

    let req = parse_requirement("asd[abc] >= 2.1").unwrap();
    assert_eq!(req.name, "asd");
    assert_eq!(req.extras, vec!["abc".to_string()]);
    assert!(req.version_set.contains(&v("2.2")));

    let req = parse_requirement("coverage[toml] (>=5.0.2)").unwrap();
    assert_eq!(req.name, "coverage");
    assert_eq!(req.extras, vec!["toml".to_string()]);
    assert!(req.version_set.contains(&v("5.1")));

    let req = parse_requirement("hypothesis").unwrap();
    assert_eq!(req.version_set, VersionSet::Any);

    let req = parse_requirement("bar 1.0").unwrap();
    assert_eq!(req.version_set, VersionSet::Eq(v("1.0")));

    let req = parse_requirement("pytest (>=6.0) ; extra == \"test\"").unwrap();
    assert_eq!(req.marker.as_deref(), Some("extra == \"test\""));

    let req = parse_requirement("requests[security, socks]>=2.0").unwrap();
    assert_eq!(req.extras, vec!["security".to_string(), "socks".to_string()]);
  }

  #[test]
  fn test_invalid_requirements() {
    assert!(matches!(
      parse_requirement("foo >=1.0 junk junk"),
      Err(RequirementParseError::Syntax { .. })
    ));
    assert!(matches!(
      parse_requirement("foo ^alpha"),
      Err(RequirementParseError::VersionSet { .. })
    ));
    assert!(parse_requirement("").is_err());
  }

  #[test]
  fn test_maven_version_set() {
    let set = parse_maven_version_set("(1.0-SNAPSHOT,], 2.0-alpha-1, (2.0-alpha1, 2.0-alpha-2)")
      .unwrap();
    assert!(!set.contains(&v("1.0-SNAPSHOT")));
    assert!(!set.contains(&v("0.9")));
    assert!(set.contains(&v("1.1")));
    assert!(set.contains(&v("2.0-alpha-1")));

    let set = parse_maven_version_set("[1.0,2.0)").unwrap();
    assert!(set.contains(&v("1.0")));
    assert!(set.contains(&v("1.5")));
    assert!(!set.contains(&v("2.0")));

    let set = parse_maven_version_set("(,1.0], [1.2,)").unwrap();
    assert!(set.contains(&v("0.5")));
    assert!(!set.contains(&v("1.1")));
    assert!(set.contains(&v("1.2")));

    assert!(parse_maven_version_set("[1.0,2.0").is_err());
  }
}
