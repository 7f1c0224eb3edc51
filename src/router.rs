// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

//! Build-once route table for versioned endpoints.
//!
//! Variants are registered per logical path during boot. [`build`] rejects
//! any two variants of a path whose coverages share a version, then freezes
//! the table. [`VersionRouter::resolve`] maps `/<prefix>/[v{N}/]<path>` to at
//! most one variant without locking or allocating; unversioned requests
//! target the latest supported version.
//!
//! [`build`]: VersionRouterBuilder::build

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use url::Url;

use crate::common::canonical_version;
use crate::common::version_segment;
use crate::ApiVersion;
use crate::IncompatibleRangeError;
use crate::RouteName;
use crate::RouterConfig;
use crate::SupportedVersionList;
use crate::VersionCoverage;
use crate::VersionInterval;
use crate::VersionIntervalParseError;

/// Two variants of one path that share at least one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
  pub first: RouteName,
  pub first_coverage: VersionCoverage,
  pub second: RouteName,
  pub second_coverage: VersionCoverage,
}

impl fmt::Display for RouteConflict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "'{}' ({}) collides with '{}' ({})",
      self.first, self.first_coverage, self.second, self.second_coverage
    )
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Ambiguous versioned route '{path}': {}.", display_conflicts(.conflicts))]
pub struct RouteAmbiguityError {
  pub path: RouteName,
  pub conflicts: Vec<RouteConflict>,
}

fn display_conflicts(conflicts: &[RouteConflict]) -> String {
  conflicts
    .iter()
    .map(|conflict| conflict.to_string())
    .collect::<Vec<_>>()
    .join("; ")
}

#[derive(Error, Debug, Clone)]
pub enum RouteBuildError {
  #[error("Invalid version declaration for '{label}' on route '{path}'. {source}")]
  InvalidDeclaration {
    path: RouteName,
    label: RouteName,
    #[source]
    source: VersionIntervalParseError,
  },
  #[error(transparent)]
  IncompatibleRange(#[from] IncompatibleRangeError),
  #[error(transparent)]
  Ambiguity(#[from] RouteAmbiguityError),
}

/// One handler variant of a logical path.
#[derive(Debug, Clone)]
pub struct RouteVariant<H> {
  label: RouteName,
  coverage: VersionCoverage,
  handler: H,
}

impl<H> RouteVariant<H> {
  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn coverage(&self) -> &VersionCoverage {
    &self.coverage
  }

  pub fn handler(&self) -> &H {
    &self.handler
  }
}

/// Collects variants during boot.
#[derive(Debug)]
pub struct VersionRouterBuilder<H> {
  config: RouterConfig,
  routes: BTreeMap<RouteName, Vec<RouteVariant<H>>>,
}

impl<H> VersionRouterBuilder<H> {
  pub fn new(config: RouterConfig) -> Self {
    Self {
      config,
      routes: BTreeMap::new(),
    }
  }

  /// Registers a variant of `path` answering the versions in `coverage`.
  pub fn register(
    &mut self,
    path: &str,
    label: &str,
    coverage: VersionCoverage,
    handler: H,
  ) -> &mut Self {
    self
      .routes
      .entry(RouteName::path(path))
      .or_default()
      .push(RouteVariant {
        label: RouteName::from_str(label),
        coverage,
        handler,
      });
    self
  }

  /// Registers a variant from textual declarations such as `1-3` or `4+`.
  /// No declarations means the variant is unconstrained.
  pub fn register_declared(
    &mut self,
    path: &str,
    label: &str,
    declarations: &[&str],
    handler: H,
  ) -> Result<&mut Self, RouteBuildError> {
    let coverage = parse_declarations(path, label, declarations)?;
    Ok(self.register(path, label, coverage, handler))
  }

  /// Registers variants that inherit an enclosing declaration, such as one
  /// made for a whole group of endpoints.
  pub fn scope(&mut self, coverage: VersionCoverage) -> ScopedRegistrar<'_, H> {
    ScopedRegistrar {
      builder: self,
      coverage,
    }
  }

  /// Validates every path and freezes the route table.
  pub fn build(self) -> Result<VersionRouter<H>, RouteBuildError> {
    let supported = self.config.supported_versions();
    let mut routes = HashMap::with_capacity(self.routes.len());
    let mut variant_count = 0;
    for (path, variants) in self.routes {
      let conflicts = find_conflicts(&variants);
      if !conflicts.is_empty() {
        let err = RouteAmbiguityError { path, conflicts };
        tracing::error!("{}", err);
        return Err(err.into());
      }
      for variant in &variants {
        let versions = variant.coverage.applicable_versions(supported);
        if versions.is_empty() {
          tracing::warn!(
            path = %path,
            variant = %variant.label,
            coverage = %variant.coverage,
            "variant is not reachable through any supported version"
          );
        } else {
          tracing::debug!(
            path = %path,
            variant = %variant.label,
            coverage = %variant.coverage,
            versions = ?versions,
            "registered versioned route"
          );
        }
      }
      variant_count += variants.len();
      let latest = variants
        .iter()
        .position(|variant| variant.coverage.covers(supported.latest()));
      routes.insert(path, RoutePath { variants, latest });
    }
    tracing::info!(
      paths = routes.len(),
      variants = variant_count,
      latest = supported.latest(),
      "built versioned route table"
    );
    Ok(VersionRouter {
      config: self.config,
      routes,
    })
  }
}

/// Registers variants whose coverage is combined with an enclosing coverage.
pub struct ScopedRegistrar<'b, H> {
  builder: &'b mut VersionRouterBuilder<H>,
  coverage: VersionCoverage,
}

impl<H> ScopedRegistrar<'_, H> {
  pub fn register(
    &mut self,
    path: &str,
    label: &str,
    coverage: VersionCoverage,
    handler: H,
  ) -> Result<&mut Self, RouteBuildError> {
    let coverage = self.coverage.combine_with(&coverage)?;
    self.builder.register(path, label, coverage, handler);
    Ok(self)
  }

  pub fn register_declared(
    &mut self,
    path: &str,
    label: &str,
    declarations: &[&str],
    handler: H,
  ) -> Result<&mut Self, RouteBuildError> {
    let coverage = parse_declarations(path, label, declarations)?;
    self.register(path, label, coverage, handler)
  }
}

fn parse_declarations(
  path: &str,
  label: &str,
  declarations: &[&str],
) -> Result<VersionCoverage, RouteBuildError> {
  declarations
    .iter()
    .map(|text| VersionInterval::parse(text))
    .collect::<Result<VersionCoverage, _>>()
    .map_err(|source| RouteBuildError::InvalidDeclaration {
      path: RouteName::path(path),
      label: RouteName::from_str(label),
      source,
    })
}

fn find_conflicts<H>(variants: &[RouteVariant<H>]) -> Vec<RouteConflict> {
  let mut conflicts = Vec::new();
  for (i, first) in variants.iter().enumerate() {
    for second in &variants[i + 1..] {
      if first.coverage.collides_with(&second.coverage) {
        conflicts.push(RouteConflict {
          first: first.label.clone(),
          first_coverage: first.coverage.clone(),
          second: second.label.clone(),
          second_coverage: second.coverage.clone(),
        });
      }
    }
  }
  conflicts
}

#[derive(Debug)]
struct RoutePath<H> {
  variants: Vec<RouteVariant<H>>,
  /// The variant also reachable without a version segment.
  latest: Option<usize>,
}

/// Why a request path did not resolve to a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatch {
  /// The path does not start with the API prefix.
  OutsidePrefix,
  /// The version segment names no supported version. `None` when the
  /// segment isn't a canonical `u32`.
  UnsupportedVersion(Option<ApiVersion>),
  UnknownPath,
  /// The path exists, but none of its variants serve the version.
  NoVariant { version: ApiVersion },
}

#[derive(Debug)]
pub struct RouteMatch<'a, H> {
  /// The logical path, without prefix or version segment.
  pub path: &'a str,
  pub label: &'a str,
  pub handler: &'a H,
  pub coverage: &'a VersionCoverage,
  pub version: ApiVersion,
  /// Whether the version came from the path rather than the latest fallback.
  pub explicit_version: bool,
}

#[derive(Debug)]
pub enum Resolution<'a, H> {
  Matched(RouteMatch<'a, H>),
  NoMatch(NoMatch),
}

impl<'a, H> Resolution<'a, H> {
  pub fn is_match(&self) -> bool {
    matches!(self, Resolution::Matched(_))
  }

  pub fn handler(&self) -> Option<&'a H> {
    match self {
      Resolution::Matched(route) => Some(route.handler),
      Resolution::NoMatch(_) => None,
    }
  }

  pub fn no_match(&self) -> Option<NoMatch> {
    match self {
      Resolution::Matched(_) => None,
      Resolution::NoMatch(reason) => Some(*reason),
    }
  }
}

/// A concrete path the dispatch layer should register for a variant.
#[derive(Debug)]
pub struct RouteMapping<'a, H> {
  pub api_prefix: &'a str,
  /// `None` for the unversioned path of the latest variant.
  pub version: Option<ApiVersion>,
  pub path: &'a str,
  pub label: &'a str,
  pub handler: &'a H,
}

impl<H> fmt::Display for RouteMapping<'_, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "/{}", self.api_prefix)?;
    if let Some(version) = self.version {
      write!(f, "/v{version}")?;
    }
    if !self.path.is_empty() {
      write!(f, "/{}", self.path)?;
    }
    Ok(())
  }
}

/// Immutable route table. Share it behind an `Arc`; lookups need no locks.
#[derive(Debug)]
pub struct VersionRouter<H> {
  config: RouterConfig,
  routes: HashMap<RouteName, RoutePath<H>>,
}

impl<H> VersionRouter<H> {
  pub fn builder(config: RouterConfig) -> VersionRouterBuilder<H> {
    VersionRouterBuilder::new(config)
  }

  pub fn api_prefix(&self) -> &str {
    self.config.api_prefix()
  }

  pub fn supported_versions(&self) -> &SupportedVersionList {
    self.config.supported_versions()
  }

  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self.routes.keys().map(|path| path.as_str())
  }

  pub fn variants(&self, path: &str) -> Option<&[RouteVariant<H>]> {
    self
      .routes
      .get(path.trim_matches('/'))
      .map(|route| route.variants.as_slice())
  }

  /// Resolves a request path such as `/api/v2/courses` to a variant.
  pub fn resolve(&self, request_path: &str) -> Resolution<'_, H> {
    let resolution = self.resolve_inner(request_path);
    if let Resolution::NoMatch(reason) = &resolution {
      tracing::trace!(request_path, ?reason, "no versioned route matched");
    }
    resolution
  }

  /// Resolves using the path of `url`.
  pub fn resolve_url(&self, url: &Url) -> Resolution<'_, H> {
    self.resolve(url.path())
  }

  fn resolve_inner(&self, request_path: &str) -> Resolution<'_, H> {
    let supported = self.config.supported_versions();
    let request_path = request_path
      .split(['?', '#'])
      .next()
      .unwrap_or(request_path);
    let request_path =
      request_path.strip_prefix('/').unwrap_or(request_path);
    let Some(rest) = strip_segment(request_path, self.config.api_prefix())
    else {
      return Resolution::NoMatch(NoMatch::OutsidePrefix);
    };

    let (version, explicit_version, rest) = match version_segment(rest) {
      Ok((after, digits)) if after.is_empty() || after.starts_with('/') => {
        match canonical_version(digits) {
          Some(version) if supported.contains(version) => {
            (version, true, after)
          }
          version => {
            return Resolution::NoMatch(NoMatch::UnsupportedVersion(version))
          }
        }
      }
      _ => (supported.latest(), false, rest),
    };

    let Some((path, route)) =
      self.routes.get_key_value(rest.trim_matches('/'))
    else {
      return Resolution::NoMatch(NoMatch::UnknownPath);
    };
    let variant = if explicit_version {
      route
        .variants
        .iter()
        .find(|variant| variant.coverage.covers(version))
    } else {
      route.latest.map(|index| &route.variants[index])
    };
    match variant {
      Some(variant) => Resolution::Matched(RouteMatch {
        path: path.as_str(),
        label: variant.label.as_str(),
        handler: &variant.handler,
        coverage: &variant.coverage,
        version,
        explicit_version,
      }),
      None => Resolution::NoMatch(NoMatch::NoVariant { version }),
    }
  }

  /// Every concrete path that reaches a variant: one per applicable version
  /// plus the unversioned path for the variant serving the latest version.
  /// Sorted by logical path, then version, with unversioned paths last.
  pub fn mappings(&self) -> Vec<RouteMapping<'_, H>> {
    let supported = self.config.supported_versions();
    let mut paths = self.routes.iter().collect::<Vec<_>>();
    paths.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut mappings = Vec::new();
    for (path, route) in paths {
      let mut versioned = Vec::new();
      for variant in &route.variants {
        for version in variant.coverage.applicable_versions(supported) {
          versioned.push(self.mapping(path, variant, Some(version)));
        }
      }
      versioned.sort_by_key(|mapping| mapping.version);
      mappings.extend(versioned);
      if let Some(index) = route.latest {
        mappings.push(self.mapping(path, &route.variants[index], None));
      }
    }
    mappings
  }

  fn mapping<'a>(
    &'a self,
    path: &'a RouteName,
    variant: &'a RouteVariant<H>,
    version: Option<ApiVersion>,
  ) -> RouteMapping<'a, H> {
    RouteMapping {
      api_prefix: self.config.api_prefix(),
      version,
      path: path.as_str(),
      label: variant.label.as_str(),
      handler: &variant.handler,
    }
  }
}

// Strips `segment` when it is the whole first segment of `path`.
fn strip_segment<'a>(path: &'a str, segment: &str) -> Option<&'a str> {
  let rest = path.strip_prefix(segment)?;
  if rest.is_empty() {
    Some(rest)
  } else {
    rest.strip_prefix('/')
  }
}
