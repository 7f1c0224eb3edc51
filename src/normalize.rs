// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

//! Merging of interval collections into a minimal disjoint form where no two
//! intervals overlap or touch.

use thiserror::Error;

use crate::classify;
use crate::RelationKind;
use crate::UpperBound;
use crate::VersionCoverage;
use crate::VersionInterval;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Cannot unite version intervals {a} and {b} because they are disjoint ({relation:?}).")]
pub struct IncompatibleRangeError {
  pub a: VersionInterval,
  pub b: VersionInterval,
  pub relation: RelationKind,
}

/// Unites two intervals that overlap or touch.
pub fn union(
  a: &VersionInterval,
  b: &VersionInterval,
) -> Result<VersionInterval, IncompatibleRangeError> {
  let relation = classify(a, b);
  if !relation.is_mergeable() {
    return Err(IncompatibleRangeError {
      a: *a,
      b: *b,
      relation,
    });
  }
  let start = a.start().min(b.start());
  // Bounded sorts before Unbounded
  let end = a.upper_bound().max(b.upper_bound());
  Ok(VersionInterval::from_parts_unchecked(start, end))
}

/// Merges every pair of overlapping or touching intervals until none remain.
///
/// Leftovers are returned in ascending order, so the result does not depend
/// on the order of the input.
pub fn simplify(
  intervals: impl IntoIterator<Item = VersionInterval>,
) -> Result<VersionCoverage, IncompatibleRangeError> {
  Ok(VersionCoverage::from_normalized(simplify_pool(
    intervals.into_iter().collect(),
  )?))
}

/// Combines two interval collections into one normalized collection.
pub fn combine(
  a: &[VersionInterval],
  b: &[VersionInterval],
) -> Result<VersionCoverage, IncompatibleRangeError> {
  let (unbounded, bounded): (Vec<_>, Vec<_>) = a
    .iter()
    .chain(b.iter())
    .copied()
    .partition(|interval| interval.is_unbounded());

  let Some(limit) = lower_limit(unbounded) else {
    return simplify(bounded);
  };
  let (limit, remaining) = absorb_into_limit(limit, bounded);
  let mut intervals = simplify_pool(remaining)?;
  intervals.push(limit);
  Ok(VersionCoverage::from_normalized(intervals))
}

/// Folds unbounded intervals to the one with the smallest start, which
/// subsumes all others. Expects only unbounded intervals.
fn lower_limit(
  unbounded: impl IntoIterator<Item = VersionInterval>,
) -> Option<VersionInterval> {
  unbounded
    .into_iter()
    .min_by_key(|interval| interval.start())
}

/// Drops the bounded intervals that end at or after the version right below
/// the limit's start. A dropped interval that starts below the limit lowers
/// the limit to its own start, which can in turn reach further intervals.
fn absorb_into_limit(
  mut limit: VersionInterval,
  bounded: Vec<VersionInterval>,
) -> (VersionInterval, Vec<VersionInterval>) {
  let mut remaining = bounded;
  loop {
    let threshold = limit.start() - 1;
    let before = remaining.len();
    let mut start = limit.start();
    remaining.retain(|interval| {
      let absorbed = interval.end().is_some_and(|end| end >= threshold);
      if absorbed {
        start = start.min(interval.start());
      }
      !absorbed
    });
    limit =
      VersionInterval::from_parts_unchecked(start, UpperBound::Unbounded);
    if remaining.len() == before {
      return (limit, remaining);
    }
  }
}

fn simplify_pool(
  mut pool: Vec<VersionInterval>,
) -> Result<Vec<VersionInterval>, IncompatibleRangeError> {
  let mut done = Vec::with_capacity(pool.len());
  while let Some(current) = pool.pop() {
    let partner = pool
      .iter()
      .position(|other| classify(&current, other).is_mergeable());
    match partner {
      Some(index) => {
        let other = pool.swap_remove(index);
        pool.push(union(&current, &other)?);
      }
      None => done.push(current),
    }
  }
  done.sort();
  done.dedup();
  Ok(done)
}
