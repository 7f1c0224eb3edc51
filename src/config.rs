// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::RouteName;
use crate::SupportedVersionList;

pub const DEFAULT_API_PREFIX: &str = "api";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("The API prefix must contain at least one character other than '/'.")]
  EmptyPrefix,
  #[error("The API prefix '{0}' must be a single path segment.")]
  NestedPrefix(String),
}

/// Boot configuration for a [`crate::VersionRouter`].
///
/// ```json
/// { "api_prefix": "api", "supported_versions": [1, 2, 3] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRouterConfig")]
pub struct RouterConfig {
  api_prefix: RouteName,
  supported_versions: SupportedVersionList,
}

impl RouterConfig {
  pub fn new(
    api_prefix: &str,
    supported_versions: SupportedVersionList,
  ) -> Result<Self, ConfigError> {
    let api_prefix = RouteName::path(api_prefix);
    if api_prefix.is_empty() {
      return Err(ConfigError::EmptyPrefix);
    }
    if api_prefix.contains('/') {
      return Err(ConfigError::NestedPrefix(api_prefix.to_string()));
    }
    Ok(Self {
      api_prefix,
      supported_versions,
    })
  }

  /// Uses the default `api` prefix.
  pub fn with_default_prefix(supported_versions: SupportedVersionList) -> Self {
    Self {
      api_prefix: RouteName::from_static(DEFAULT_API_PREFIX),
      supported_versions,
    }
  }

  pub fn api_prefix(&self) -> &str {
    &self.api_prefix
  }

  pub fn supported_versions(&self) -> &SupportedVersionList {
    &self.supported_versions
  }
}

#[derive(Deserialize)]
struct RawRouterConfig {
  #[serde(default = "default_api_prefix")]
  api_prefix: String,
  supported_versions: SupportedVersionList,
}

fn default_api_prefix() -> String {
  DEFAULT_API_PREFIX.to_string()
}

impl TryFrom<RawRouterConfig> for RouterConfig {
  type Error = ConfigError;

  fn try_from(raw: RawRouterConfig) -> Result<Self, Self::Error> {
    RouterConfig::new(&raw.api_prefix, raw.supported_versions)
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  fn versions(versions: &[u32]) -> SupportedVersionList {
    SupportedVersionList::new(versions.to_vec()).unwrap()
  }

  #[test]
  fn new_trims_prefix() {
    let config = RouterConfig::new("/api/", versions(&[1])).unwrap();
    assert_eq!(config.api_prefix(), "api");
    assert_eq!(
      RouterConfig::new("//", versions(&[1])).unwrap_err(),
      ConfigError::EmptyPrefix
    );
    assert_eq!(
      RouterConfig::new("api/internal", versions(&[1])).unwrap_err(),
      ConfigError::NestedPrefix("api/internal".to_string())
    );
  }

  #[test]
  fn deserialize() {
    let config: RouterConfig = serde_json::from_str(
      r#"{ "api_prefix": "/rest", "supported_versions": [1, 2, 3] }"#,
    )
    .unwrap();
    assert_eq!(config.api_prefix(), "rest");
    assert_eq!(config.supported_versions().latest(), 3);

    let config: RouterConfig =
      serde_json::from_str(r#"{ "supported_versions": [4] }"#).unwrap();
    assert_eq!(config, RouterConfig::with_default_prefix(versions(&[4])));

    let err = serde_json::from_str::<RouterConfig>(
      r#"{ "supported_versions": [2, 1] }"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("strictly increasing"), "{err}");

    assert!(serde_json::from_str::<RouterConfig>(
      r#"{ "api_prefix": "", "supported_versions": [1] }"#,
    )
    .is_err());
  }

  #[test]
  fn serialize() {
    let config = RouterConfig::with_default_prefix(versions(&[1, 2]));
    assert_eq!(
      serde_json::to_string(&config).unwrap(),
      r#"{"api_prefix":"api","supported_versions":[1,2]}"#
    );
  }
}
