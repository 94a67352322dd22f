//! Scope matching: may the session attempt these actions on these resources?

use crate::{Effect, PolicySnapshot, PolicyStatement};
use tracing::trace;

/// One or many requested resource identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources(Vec<String>);

impl Resources {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for Resources {
    fn from(resource: &str) -> Self {
        Self(vec![resource.to_string()])
    }
}

impl From<String> for Resources {
    fn from(resource: String) -> Self {
        Self(vec![resource])
    }
}

impl From<Vec<String>> for Resources {
    fn from(resources: Vec<String>) -> Self {
        Self(resources)
    }
}

impl From<Vec<&str>> for Resources {
    fn from(resources: Vec<&str>) -> Self {
        Self(resources.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Resources {
    fn from(resources: &[&str]) -> Self {
        Self(resources.iter().map(|r| r.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Resources {
    fn from(resources: [&str; N]) -> Self {
        Self(resources.iter().map(|r| r.to_string()).collect())
    }
}

/// An access question asked of the cached policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessQuery {
    resources: Resources,
    scopes: Vec<String>,
    match_all: bool,
    contains_resource: bool,
}

impl AccessQuery {
    pub fn new<S: AsRef<str>>(resources: impl Into<Resources>, scopes: &[S]) -> Self {
        Self {
            resources: resources.into(),
            scopes: scopes.iter().map(|s| s.as_ref().to_string()).collect(),
            match_all: false,
            contains_resource: false,
        }
    }

    /// Require every scope instead of any one of them.
    pub fn match_all(mut self) -> Self {
        self.match_all = true;
        self
    }

    /// Also accept grants on sub-resources of the requested resources.
    pub fn contains_resource(mut self) -> Self {
        self.contains_resource = true;
        self
    }

    /// Append more resources to check, e.g. from [`wildcard_grants`].
    pub fn with_resources<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.0.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.resources.iter()
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    pub fn is_match_all(&self) -> bool {
        self.match_all
    }

    pub fn is_contains_resource(&self) -> bool {
        self.contains_resource
    }
}

/// Decide a query against a snapshot.
///
/// Any deny statement matching a requested (resource, scope) pair makes the
/// whole query false. Otherwise a scope is satisfied when an allow statement
/// grants it on at least one requested resource. Anything not explicitly
/// granted is denied, including queries with no resources or no scopes.
pub fn evaluate(snapshot: &PolicySnapshot, query: &AccessQuery) -> bool {
    let resources: Vec<&str> = query
        .resources()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect();
    let scopes: Vec<&str> = query
        .scopes()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if resources.is_empty() || scopes.is_empty() || snapshot.is_empty() {
        return false;
    }

    let denied = snapshot
        .statements()
        .filter(|s| s.effect() == Effect::Deny)
        .any(|stmt| {
            resources
                .iter()
                .any(|r| scopes.iter().any(|scope| stmt.applies_to(r, scope, false)))
        });
    if denied {
        trace!(?resources, ?scopes, "explicit deny");
        return false;
    }

    let granted = |scope: &&str| {
        snapshot
            .statements()
            .filter(|s| s.effect() == Effect::Allow)
            .any(|stmt| {
                resources
                    .iter()
                    .any(|r| stmt.applies_to(r, scope, query.contains_resource))
            })
    };

    if query.match_all {
        scopes.iter().all(granted)
    } else {
        scopes.iter().any(granted)
    }
}

/// Wildcard patterns of allow statements granting any of `scopes` that
/// either cover `path` or lie beneath it.
///
/// Appending these to a query's resources lets an affordance stay enabled
/// when the session may write somewhere under the current location.
pub fn wildcard_grants<S: AsRef<str>>(
    snapshot: &PolicySnapshot,
    path: &str,
    scopes: &[S],
) -> Vec<String> {
    let mut grants: Vec<String> = snapshot
        .statements()
        .filter(|s| s.effect() == Effect::Allow)
        .filter(|s| scopes.iter().any(|scope| s.covers_scope(scope.as_ref())))
        .flat_map(wildcard_patterns)
        .filter(|p| p.matches(path) || p.contains(path))
        .map(|p| p.to_string())
        .collect();
    grants.sort();
    grants.dedup();
    grants
}

fn wildcard_patterns(stmt: &PolicyStatement) -> impl Iterator<Item = &crate::ResourcePattern> {
    let patterns = match stmt.resources() {
        crate::ResourceSet::Patterns(patterns) => Some(patterns.iter()),
        crate::ResourceSet::All => None,
    };
    patterns.into_iter().flatten().filter(|p| p.is_wildcard())
}
