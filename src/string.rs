// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use std::borrow::Borrow;
use std::ops::Deref;

use serde::Deserialize;
use serde::Serialize;

/// A cheaply cloned, immutable name such as a logical route path or a
/// variant label.
///
/// Uses the stack when < 16 bytes.
#[derive(
  Debug,
  Default,
  Clone,
  PartialOrd,
  Ord,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
pub struct RouteName(ecow::EcoString);

impl RouteName {
  #[inline(always)]
  pub fn from_static(s: &'static str) -> Self {
    Self(ecow::EcoString::from(s))
  }

  /// Creates a `RouteName` from a `&str`.
  #[allow(clippy::should_implement_trait)]
  #[inline(always)]
  pub fn from_str(s: &str) -> Self {
    Self(ecow::EcoString::from(s))
  }

  /// Creates a logical path key, trimming surrounding slashes so that
  /// `/courses/` and `courses` name the same route.
  pub fn path(s: &str) -> Self {
    Self::from_str(s.trim_matches('/'))
  }

  #[inline(always)]
  pub fn as_str(&self) -> &str {
    self.0.as_str()
  }
}

impl std::fmt::Display for RouteName {
  #[inline(always)]
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

impl Deref for RouteName {
  type Target = str;

  #[inline(always)]
  fn deref(&self) -> &Self::Target {
    self.0.as_str()
  }
}

impl Borrow<str> for RouteName {
  #[inline(always)]
  fn borrow(&self) -> &str {
    self.as_str()
  }
}

impl PartialEq<str> for RouteName {
  #[inline(always)]
  fn eq(&self, other: &str) -> bool {
    self.0.as_str() == other
  }
}

impl PartialEq<&str> for RouteName {
  #[inline(always)]
  fn eq(&self, other: &&str) -> bool {
    self.0.as_str() == *other
  }
}

// Note: Do NOT implement `From<String>` in order to discourage its use
// because we shouldn't end up with a `String` in the first place.
impl From<&str> for RouteName {
  #[inline(always)]
  fn from(s: &str) -> Self {
    Self(ecow::EcoString::from(s))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn path_trims_slashes() {
    assert_eq!(RouteName::path("/courses/"), "courses");
    assert_eq!(RouteName::path("courses/{id}"), "courses/{id}");
    assert_eq!(RouteName::path("/"), "");
  }
}
