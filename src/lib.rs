// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

//! Routes requests for one logical endpoint to the handler variant that
//! serves the requested API version.
//!
//! Each variant declares a [`VersionCoverage`]: the intervals of API versions
//! it answers. A [`VersionRouterBuilder`] checks at boot that no two variants
//! of a path share a version, and the resulting [`VersionRouter`] resolves
//! paths like `/api/v2/courses` (or `/api/courses` for the latest version).

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

mod common;
pub mod config;
mod coverage;
mod interval;
pub mod normalize;
pub mod router;
mod string;

pub use self::config::RouterConfig;
pub use self::coverage::VersionCoverage;
pub use self::interval::classify;
pub use self::interval::InvalidIntervalError;
pub use self::interval::RelationKind;
pub use self::interval::UpperBound;
pub use self::interval::VersionInterval;
pub use self::interval::VersionIntervalParseError;
pub use self::normalize::IncompatibleRangeError;
pub use self::router::NoMatch;
pub use self::router::Resolution;
pub use self::router::RouteAmbiguityError;
pub use self::router::RouteBuildError;
pub use self::router::RouteMatch;
pub use self::router::VersionRouter;
pub use self::router::VersionRouterBuilder;
pub use self::string::RouteName;

/// A released API version number.
pub type ApiVersion = u32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupportedVersionListError {
  #[error("The supported version list must contain at least one version.")]
  Empty,
  #[error("Supported versions must be 1 or higher, but found {0}.")]
  NonPositive(ApiVersion),
  #[error("Supported versions must be strictly increasing, but {previous} is followed by {next}.")]
  NotStrictlyIncreasing {
    previous: ApiVersion,
    next: ApiVersion,
  },
}

/// The released API versions in ascending order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SupportedVersionList(Vec<ApiVersion>);

impl SupportedVersionList {
  pub fn new(
    versions: Vec<ApiVersion>,
  ) -> Result<Self, SupportedVersionListError> {
    let Some(first) = versions.first() else {
      return Err(SupportedVersionListError::Empty);
    };
    if *first == 0 {
      return Err(SupportedVersionListError::NonPositive(*first));
    }
    for pair in versions.windows(2) {
      if pair[1] <= pair[0] {
        return Err(SupportedVersionListError::NotStrictlyIncreasing {
          previous: pair[0],
          next: pair[1],
        });
      }
    }
    Ok(Self(versions))
  }

  pub fn as_slice(&self) -> &[ApiVersion] {
    &self.0
  }

  pub fn iter(&self) -> impl Iterator<Item = ApiVersion> + '_ {
    self.0.iter().copied()
  }

  /// The highest released version, targeted by unversioned requests.
  pub fn latest(&self) -> ApiVersion {
    // construction guarantees at least one version
    self.0[self.0.len() - 1]
  }

  pub fn contains(&self, version: ApiVersion) -> bool {
    self.0.binary_search(&version).is_ok()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<'de> Deserialize<'de> for SupportedVersionList {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let versions = Vec::<ApiVersion>::deserialize(deserializer)?;
    match SupportedVersionList::new(versions) {
      Ok(list) => Ok(list),
      Err(err) => Err(serde::de::Error::custom(err)),
    }
  }
}

impl fmt::Display for SupportedVersionList {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, version) in self.0.iter().enumerate() {
      if i > 0 {
        write!(f, ", ")?;
      }
      write!(f, "v{version}")?;
    }
    Ok(())
  }
}
