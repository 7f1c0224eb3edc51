// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use monch::*;

use crate::ApiVersion;
use crate::InvalidIntervalError;
use crate::VersionInterval;

// declaration ::= version ( upper ) ?
// upper       ::= ( ' ' ) * ( '+' | '-' ( ' ' ) * version )
// version     ::= 'v' ? nr
// nr          ::= ['0'-'9'] +

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
  Exact(ApiVersion),
  Bounded(ApiVersion, ApiVersion),
  From(ApiVersion),
}

impl Declaration {
  pub fn into_interval(self) -> Result<VersionInterval, InvalidIntervalError> {
    match self {
      Declaration::Exact(version) => VersionInterval::exact(version),
      Declaration::Bounded(start, end) => VersionInterval::new(start, end),
      Declaration::From(start) => VersionInterval::from_start(start),
    }
  }
}

pub fn declaration(input: &str) -> ParseResult<Declaration> {
  let (input, start) = version(input)?;
  let (input, _) = skip_whitespace(input)?;
  let (input, upper) = maybe(or(
    map(ch('+'), |_| None),
    map(
      preceded(ch('-'), preceded(skip_whitespace, version)),
      Some,
    ),
  ))(input)?;
  Ok((
    input,
    match upper {
      None => Declaration::Exact(start),
      Some(None) => Declaration::From(start),
      Some(Some(end)) => Declaration::Bounded(start, end),
    },
  ))
}

fn version(input: &str) -> ParseResult<ApiVersion> {
  preceded(maybe(ch('v')), nr)(input)
}

// nr ::= ['0'-'9'] +
fn nr(input: &str) -> ParseResult<ApiVersion> {
  // loose parsing here so declarations like `01-03` are accepted
  let (input, result) =
    if_not_empty(substring(skip_while(|c| c.is_ascii_digit())))(input)?;
  let val = match result.parse::<ApiVersion>() {
    Ok(val) => val,
    Err(err) => {
      return ParseError::fail(
        input,
        format!("Error parsing '{result}' to a version.\n\n{err:#}"),
      )
    }
  };
  Ok((input, val))
}

/// The digits of a `v{N}` path segment.
///
/// Only backtracks so that it can run on untrusted request paths without
/// building error messages.
pub fn version_segment(input: &str) -> ParseResult<&str> {
  preceded(
    ch('v'),
    if_not_empty(substring(skip_while(|c| c.is_ascii_digit()))),
  )(input)
}

/// Reads the canonical decimal form used in `v{N}` segments.
///
/// Leading zeros are rejected because `v02` is never a registered path.
pub fn canonical_version(digits: &str) -> Option<ApiVersion> {
  if digits.len() > 1 && digits.starts_with('0') {
    return None;
  }
  digits.parse::<ApiVersion>().ok()
}
