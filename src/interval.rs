// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use std::cmp::Ordering;

use capacity_builder::CapacityDisplay;
use capacity_builder::StringAppendable;
use capacity_builder::StringBuilder;
use capacity_builder::StringType;
use monch::with_failure_handling;
use monch::ParseErrorFailureError;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::ApiVersion;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid version interval [{start}, {end}]. Intervals must start at 1 or higher and must not end before they start.")]
pub struct InvalidIntervalError {
  pub start: ApiVersion,
  pub end: UpperBound,
}

#[derive(Error, Debug, Clone)]
pub enum VersionIntervalParseError {
  #[error("Invalid version interval declaration. {0}")]
  Syntax(#[source] ParseErrorFailureError),
  #[error(transparent)]
  Invalid(#[from] InvalidIntervalError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpperBound {
  Bounded(ApiVersion),
  Unbounded, // every version from the start upward
}

impl std::fmt::Display for UpperBound {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      UpperBound::Bounded(end) => write!(f, "{end}"),
      UpperBound::Unbounded => write!(f, "*"),
    }
  }
}

/// A contiguous range of API versions.
///
/// Ordering sorts by start first, then by end with bounded intervals before
/// unbounded ones.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  CapacityDisplay,
)]
pub struct VersionInterval {
  start: ApiVersion,
  end: UpperBound,
}

impl VersionInterval {
  /// Creates the interval `[start, end]`.
  pub fn new(
    start: ApiVersion,
    end: ApiVersion,
  ) -> Result<Self, InvalidIntervalError> {
    if start == 0 || end < start {
      return Err(InvalidIntervalError {
        start,
        end: UpperBound::Bounded(end),
      });
    }
    Ok(Self {
      start,
      end: UpperBound::Bounded(end),
    })
  }

  /// Creates the interval `[start, ∞)`.
  pub fn from_start(start: ApiVersion) -> Result<Self, InvalidIntervalError> {
    if start == 0 {
      return Err(InvalidIntervalError {
        start,
        end: UpperBound::Unbounded,
      });
    }
    Ok(Self {
      start,
      end: UpperBound::Unbounded,
    })
  }

  /// Creates the interval holding only `version`.
  pub fn exact(version: ApiVersion) -> Result<Self, InvalidIntervalError> {
    Self::new(version, version)
  }

  /// Parses a declaration such as `3`, `1-3` or `4+`.
  pub fn parse(text: &str) -> Result<Self, VersionIntervalParseError> {
    let text = text.trim();
    let declaration = with_failure_handling(crate::common::declaration)(text)
      .map_err(VersionIntervalParseError::Syntax)?;
    Ok(declaration.into_interval()?)
  }

  pub(crate) fn from_parts_unchecked(
    start: ApiVersion,
    end: UpperBound,
  ) -> Self {
    debug_assert!(start > 0);
    Self { start, end }
  }

  pub fn start(&self) -> ApiVersion {
    self.start
  }

  /// The inclusive upper bound or `None` when unbounded.
  pub fn end(&self) -> Option<ApiVersion> {
    match self.end {
      UpperBound::Bounded(end) => Some(end),
      UpperBound::Unbounded => None,
    }
  }

  pub fn upper_bound(&self) -> UpperBound {
    self.end
  }

  pub fn is_unbounded(&self) -> bool {
    self.end == UpperBound::Unbounded
  }

  pub fn contains(&self, version: ApiVersion) -> bool {
    version >= self.start
      && match self.end {
        UpperBound::Bounded(end) => version <= end,
        UpperBound::Unbounded => true,
      }
  }

  /// Gets how this interval relates to `other`, with `self` as `a`.
  pub fn relation_to(&self, other: &VersionInterval) -> RelationKind {
    classify(self, other)
  }
}

impl<'a> StringAppendable<'a> for &'a VersionInterval {
  fn append_to_builder<TString: StringType>(
    self,
    builder: &mut StringBuilder<'a, TString>,
  ) {
    builder.append(self.start);
    match self.end {
      UpperBound::Unbounded => builder.append('+'),
      UpperBound::Bounded(end) => {
        if end != self.start {
          builder.append('-');
          builder.append(end);
        }
      }
    }
  }
}

impl Serialize for VersionInterval {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for VersionInterval {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let text = String::deserialize(deserializer)?;
    match VersionInterval::parse(&text) {
      Ok(interval) => Ok(interval),
      Err(err) => Err(serde::de::Error::custom(err)),
    }
  }
}

/// How interval `a` relates to interval `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
  /// `a` ends at least one version before `b` starts.
  ABeforeB,
  /// `a` ends directly before `b` starts.
  ATouchesB,
  /// `a` starts first and partially overlaps `b`.
  ACutsB,
  AContainsB,
  Equal,
  BContainsA,
  BCutsA,
  BTouchesA,
  BBeforeA,
}

impl RelationKind {
  /// Swaps the roles of `a` and `b`.
  pub fn invert(self) -> RelationKind {
    use RelationKind::*;

    match self {
      ABeforeB => BBeforeA,
      ATouchesB => BTouchesA,
      ACutsB => BCutsA,
      AContainsB => BContainsA,
      Equal => Equal,
      BContainsA => AContainsB,
      BCutsA => ACutsB,
      BTouchesA => ATouchesB,
      BBeforeA => ABeforeB,
    }
  }

  /// Whether the two intervals share at least one version.
  pub fn intersects(self) -> bool {
    use RelationKind::*;

    matches!(self, ACutsB | AContainsB | Equal | BContainsA | BCutsA)
  }

  /// Whether the two intervals can be united into a single interval.
  pub fn is_mergeable(self) -> bool {
    !matches!(self, RelationKind::ABeforeB | RelationKind::BBeforeA)
  }
}

/// Classifies how interval `a` relates to interval `b`.
pub fn classify(a: &VersionInterval, b: &VersionInterval) -> RelationKind {
  use UpperBound::*;

  match (a.end, b.end) {
    (Unbounded, Unbounded) => match a.start.cmp(&b.start) {
      Ordering::Less => RelationKind::AContainsB,
      Ordering::Equal => RelationKind::Equal,
      Ordering::Greater => RelationKind::BContainsA,
    },
    (Bounded(a_end), Unbounded) => {
      classify_bounded_unbounded(a.start, a_end, b.start)
    }
    (Unbounded, Bounded(b_end)) => {
      classify_bounded_unbounded(b.start, b_end, a.start).invert()
    }
    (Bounded(a_end), Bounded(b_end)) => {
      classify_bounded(a.start, a_end, b.start, b_end)
    }
  }
}

// bounded `a` against `[b_start, ∞)`
fn classify_bounded_unbounded(
  a_start: ApiVersion,
  a_end: ApiVersion,
  b_start: ApiVersion,
) -> RelationKind {
  if b_start <= a_start {
    return RelationKind::BContainsA;
  }
  match gap_between(a_end, b_start) {
    Ordering::Less => RelationKind::ABeforeB,
    Ordering::Equal => RelationKind::ATouchesB,
    Ordering::Greater => RelationKind::ACutsB,
  }
}

fn classify_bounded(
  a_start: ApiVersion,
  a_end: ApiVersion,
  b_start: ApiVersion,
  b_end: ApiVersion,
) -> RelationKind {
  match gap_between(a_end, b_start) {
    Ordering::Less => return RelationKind::ABeforeB,
    Ordering::Equal => return RelationKind::ATouchesB,
    Ordering::Greater => {}
  }
  match gap_between(b_end, a_start) {
    Ordering::Less => return RelationKind::BBeforeA,
    Ordering::Equal => return RelationKind::BTouchesA,
    Ordering::Greater => {}
  }
  if a_start == b_start && a_end == b_end {
    RelationKind::Equal
  } else if a_start <= b_start && a_end >= b_end {
    RelationKind::AContainsB
  } else if b_start <= a_start && b_end >= a_end {
    RelationKind::BContainsA
  } else if a_start < b_start {
    RelationKind::ACutsB
  } else {
    RelationKind::BCutsA
  }
}

// Compares `end + 1` with `start`: `Less` leaves a gap, `Equal` touches and
// `Greater` overlaps. Widened so `u32::MAX` can't overflow.
fn gap_between(end: ApiVersion, start: ApiVersion) -> Ordering {
  (u64::from(end) + 1).cmp(&u64::from(start))
}
