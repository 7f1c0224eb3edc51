// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use capacity_builder::CapacityDisplay;
use capacity_builder::StringAppendable;
use capacity_builder::StringBuilder;
use capacity_builder::StringType;
use serde::Deserialize;
use serde::Serialize;

use crate::classify;
use crate::normalize;
use crate::ApiVersion;
use crate::IncompatibleRangeError;
use crate::RelationKind;
use crate::SupportedVersionList;
use crate::UpperBound;
use crate::VersionInterval;
use crate::VersionIntervalParseError;

/// The versions through which one handler variant is reachable.
///
/// An empty collection is unconstrained and matches every supported version.
/// Intervals are kept sorted and deduplicated, but are only merged by
/// [`VersionCoverage::combine_with`] and [`normalize::simplify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, CapacityDisplay)]
pub struct VersionCoverage(Vec<VersionInterval>);

impl VersionCoverage {
  /// Coverage that matches every supported version.
  pub const fn unconstrained() -> Self {
    Self(Vec::new())
  }

  pub fn from_intervals(
    intervals: impl IntoIterator<Item = VersionInterval>,
  ) -> Self {
    let mut intervals = intervals.into_iter().collect::<Vec<_>>();
    intervals.sort();
    intervals.dedup();
    Self(intervals)
  }

  pub(crate) fn from_normalized(intervals: Vec<VersionInterval>) -> Self {
    debug_assert!(intervals.windows(2).all(|pair| pair[0] < pair[1]));
    Self(intervals)
  }

  /// Parses declarations separated by `,` or `||`, such as `1-3 || 5+`.
  ///
  /// Empty text and `*` are unconstrained.
  pub fn parse(text: &str) -> Result<Self, VersionIntervalParseError> {
    let text = text.trim();
    if text.is_empty() || text == "*" {
      return Ok(Self::unconstrained());
    }
    let mut intervals = Vec::new();
    for part in text.split("||").flat_map(|part| part.split(',')) {
      intervals.push(VersionInterval::parse(part)?);
    }
    Ok(Self::from_intervals(intervals))
  }

  pub fn is_unconstrained(&self) -> bool {
    self.0.is_empty()
  }

  pub fn intervals(&self) -> &[VersionInterval] {
    &self.0
  }

  /// Gets if `version` lies in any interval. Unconstrained coverage covers
  /// everything.
  pub fn covers(&self, version: ApiVersion) -> bool {
    self.is_unconstrained() || self.0.iter().any(|i| i.contains(version))
  }

  /// The supported versions this coverage applies to, in ascending order.
  pub fn applicable_versions(
    &self,
    supported: &SupportedVersionList,
  ) -> Vec<ApiVersion> {
    if self.is_unconstrained() {
      return supported.as_slice().to_vec();
    }
    supported
      .iter()
      .filter(|version| {
        let point = VersionInterval::from_parts_unchecked(
          *version,
          UpperBound::Bounded(*version),
        );
        self.0.iter().any(|interval| {
          matches!(
            classify(interval, &point),
            RelationKind::AContainsB | RelationKind::Equal
          )
        })
      })
      .collect()
  }

  /// Combines this coverage with the coverage declared at another scope.
  ///
  /// Unconstrained coverage on either side wins, since a scope without a
  /// declaration supports every version.
  pub fn combine_with(
    &self,
    other: &VersionCoverage,
  ) -> Result<VersionCoverage, IncompatibleRangeError> {
    if self.is_unconstrained() || other.is_unconstrained() {
      return Ok(Self::unconstrained());
    }
    normalize::combine(&self.0, &other.0)
  }

  /// Gets if both coverages share at least one version. Unconstrained
  /// coverage collides with everything.
  pub fn collides_with(&self, other: &VersionCoverage) -> bool {
    if self.is_unconstrained() || other.is_unconstrained() {
      return true;
    }
    self
      .0
      .iter()
      .any(|a| other.0.iter().any(|b| classify(a, b).intersects()))
  }
}

impl FromIterator<VersionInterval> for VersionCoverage {
  fn from_iter<T: IntoIterator<Item = VersionInterval>>(iter: T) -> Self {
    Self::from_intervals(iter)
  }
}

impl From<VersionInterval> for VersionCoverage {
  fn from(interval: VersionInterval) -> Self {
    Self(vec![interval])
  }
}

impl<'a> StringAppendable<'a> for &'a VersionCoverage {
  fn append_to_builder<TString: StringType>(
    self,
    builder: &mut StringBuilder<'a, TString>,
  ) {
    match self.0.len() {
      0 => builder.append('*'),
      _ => {
        for (i, interval) in self.0.iter().enumerate() {
          if i > 0 {
            builder.append(" || ");
          }
          builder.append(interval);
        }
      }
    }
  }
}

impl Serialize for VersionCoverage {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for VersionCoverage {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let text = String::deserialize(deserializer)?;
    match VersionCoverage::parse(&text) {
      Ok(coverage) => Ok(coverage),
      Err(err) => Err(serde::de::Error::custom(err)),
    }
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  fn coverage(text: &str) -> VersionCoverage {
    VersionCoverage::parse(text).unwrap()
  }

  fn supported(versions: &[ApiVersion]) -> SupportedVersionList {
    SupportedVersionList::new(versions.to_vec()).unwrap()
  }

  #[test]
  fn parse_and_display() {
    #[track_caller]
    fn run_test(input: &str, expected: &str) {
      let coverage = VersionCoverage::parse(input).unwrap();
      assert_eq!(coverage.to_string(), expected);
      assert_eq!(VersionCoverage::parse(expected).unwrap(), coverage);
    }

    run_test("", "*");
    run_test("*", "*");
    run_test("4+", "4+");
    run_test("1-3, 5+", "1-3 || 5+");
    run_test("5+ || 1-3", "1-3 || 5+");
    // deduplicated but not merged
    run_test("1-2 || 1-2 || 3", "1-2 || 3");
    assert_eq!(format!("<{}>", coverage("1 || 4+")), "<1 || 4+>");

    assert!(VersionCoverage::parse("1-3,").is_err());
    assert!(VersionCoverage::parse("3-1").is_err());
  }

  #[test]
  fn applicable_versions() {
    let versions = supported(&[1, 2, 3, 4, 5]);
    assert_eq!(
      VersionCoverage::unconstrained().applicable_versions(&versions),
      vec![1, 2, 3, 4, 5]
    );
    assert_eq!(coverage("1-3").applicable_versions(&versions), vec![1, 2, 3]);
    assert_eq!(coverage("4+").applicable_versions(&versions), vec![4, 5]);
    assert_eq!(
      coverage("2 || 4+").applicable_versions(&versions),
      vec![2, 4, 5]
    );
    assert_eq!(
      coverage("7+").applicable_versions(&versions),
      Vec::<ApiVersion>::new()
    );
    assert_eq!(
      coverage("2-3").applicable_versions(&supported(&[1, 3, 8])),
      vec![3]
    );
  }

  #[test]
  fn covers_version() {
    assert!(VersionCoverage::unconstrained().covers(42));
    assert!(coverage("1-3 || 6+").covers(3));
    assert!(coverage("1-3 || 6+").covers(60));
    assert!(!coverage("1-3 || 6+").covers(4));
  }

  #[test]
  fn combine_with() {
    #[track_caller]
    fn run_test(a: &str, b: &str, expected: &str) {
      let result = coverage(a).combine_with(&coverage(b)).unwrap();
      assert_eq!(result.to_string(), expected);
      // combination is symmetric
      let result = coverage(b).combine_with(&coverage(a)).unwrap();
      assert_eq!(result.to_string(), expected);
    }

    run_test("*", "1-3", "*");
    run_test("2+", "*", "*");
    run_test("1-2", "3-4", "1-4");
    run_test("1-2", "5-6", "1-2 || 5-6");
    run_test("1-2 || 4", "3", "1-4");
    run_test("2+", "4+", "2+");
    run_test("1-2 || 6+", "4+", "1-2 || 4+");
    run_test("1-5", "3+", "1+");
    run_test("7-9", "2+", "2+");
  }

  #[test]
  fn combined_coverage_keeps_every_version() {
    let versions = supported(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let a = coverage("1-2 || 6");
    let b = coverage("4+");
    let combined = a.combine_with(&b).unwrap();
    let mut expected = a.applicable_versions(&versions);
    expected.extend(b.applicable_versions(&versions));
    expected.sort();
    expected.dedup();
    assert_eq!(combined.applicable_versions(&versions), expected);
  }

  #[test]
  fn collides_with() {
    #[track_caller]
    fn run_test(a: &str, b: &str, expected: bool) {
      assert_eq!(coverage(a).collides_with(&coverage(b)), expected);
      assert_eq!(coverage(b).collides_with(&coverage(a)), expected);
    }

    run_test("*", "1-3", true);
    run_test("*", "*", true);
    run_test("1-2", "2-3", true);
    run_test("1-2", "3-4", false);
    run_test("1-3", "4+", false);
    run_test("1-3", "3+", true);
    run_test("2", "1-5", true);
    run_test("5+", "2+", true);
    run_test("1 || 3", "2 || 4+", false);
    run_test("1 || 3", "2 || 3+", true);
  }

  #[test]
  fn serialize_deserialize() {
    let coverage: VersionCoverage =
      serde_json::from_str("\"4+ || 1-2\"").unwrap();
    assert_eq!(serde_json::to_string(&coverage).unwrap(), "\"1-2 || 4+\"");
    let coverage: VersionCoverage = serde_json::from_str("\"\"").unwrap();
    assert!(coverage.is_unconstrained());
  }
}
