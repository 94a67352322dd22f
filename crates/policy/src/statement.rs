//! Policy statements granted to a console session.

use crate::scopes::RESOURCE_ARN_PREFIX;
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const WILDCARD: char = '*';

/// Whether a statement grants or revokes its actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

impl FromStr for Effect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("allow") {
            Ok(Effect::Allow)
        } else if s.eq_ignore_ascii_case("deny") {
            Ok(Effect::Deny)
        } else {
            Err(Error::Invalid(format!("unknown effect '{s}'")))
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => f.write_str("allow"),
            Effect::Deny => f.write_str("deny"),
        }
    }
}

/// An action name (`s3:GetObject`) or action wildcard (`s3:Put*`, `s3:*`, `*`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionPattern(String);

impl ActionPattern {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this pattern grants the requested scope.
    ///
    /// Action names compare ASCII case-insensitively. A trailing `*` covers
    /// every scope that starts with the text before it.
    pub fn covers(&self, scope: &str) -> bool {
        if self.0.eq_ignore_ascii_case(scope) {
            return true;
        }
        match self.0.strip_suffix(WILDCARD) {
            Some(prefix) => scope
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
            None => false,
        }
    }
}

impl fmt::Display for ActionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resource pattern: literal text with an optional trailing wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourcePattern {
    literal: String,
    wildcard: bool,
}

impl ResourcePattern {
    /// Parse a granted resource, stripping the `arn:aws:s3:::` prefix.
    ///
    /// Returns `None` for blank input or a bare `*`; the latter is
    /// [`ResourceSet::All`], not a pattern.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = normalize_resource(raw);
        if raw.is_empty() || raw == "*" {
            return None;
        }
        let (literal, wildcard) = match raw.strip_suffix(WILDCARD) {
            Some(prefix) => (prefix, true),
            None => (raw, false),
        };
        Some(Self {
            literal: literal.to_string(),
            wildcard,
        })
    }

    /// The literal text before any wildcard.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Exact or wildcard-prefix match against a requested resource.
    ///
    /// `bucket/*` also matches the bare `bucket`, so bucket-level checks see
    /// grants on the bucket's contents.
    pub fn matches(&self, resource: &str) -> bool {
        let resource = normalize_resource(resource);
        if resource.is_empty() {
            return false;
        }
        if !self.wildcard {
            return self.literal == resource;
        }
        if resource.starts_with(self.literal.as_str()) {
            return true;
        }
        self.literal
            .strip_suffix('/')
            .is_some_and(|container| container == resource)
    }

    /// Whether the requested resource is a path prefix of this pattern.
    ///
    /// `bucket1` is contained in `bucket1/photos/*`; `bucket` is not, nor
    /// is `bucket1/pho`.
    pub fn contains(&self, resource: &str) -> bool {
        let resource = normalize_resource(resource);
        if resource.is_empty() {
            return false;
        }
        match self.literal.strip_prefix(resource) {
            Some("") => true,
            Some(rest) => resource.ends_with('/') || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)?;
        if self.wildcard {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// The resources a statement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSet {
    /// Every resource (`*` or `arn:aws:s3:::*`).
    All,
    /// Only resources matched by one of these patterns.
    Patterns(BTreeSet<ResourcePattern>),
}

impl ResourceSet {
    /// Build a resource set from raw granted resources. Blank entries are
    /// skipped; a single `*` widens the whole set to [`ResourceSet::All`].
    pub fn parse<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = BTreeSet::new();
        for item in raw {
            let item = normalize_resource(item.as_ref());
            if item == "*" {
                return Ok(ResourceSet::All);
            }
            if let Some(pattern) = ResourcePattern::parse(item) {
                patterns.insert(pattern);
            }
        }
        if patterns.is_empty() {
            return Err(Error::Invalid("statement has no resources".into()));
        }
        Ok(ResourceSet::Patterns(patterns))
    }

    pub fn matches(&self, resource: &str, contains_resource: bool) -> bool {
        match self {
            ResourceSet::All => !normalize_resource(resource).is_empty(),
            ResourceSet::Patterns(patterns) => patterns.iter().any(|p| {
                p.matches(resource) || (contains_resource && p.contains(resource))
            }),
        }
    }
}

/// A single permission rule: effect, actions and resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    effect: Effect,
    actions: BTreeSet<ActionPattern>,
    resources: ResourceSet,
}

impl PolicyStatement {
    pub fn new<A, S>(effect: Effect, actions: A, resources: ResourceSet) -> Result<Self>
    where
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let actions: BTreeSet<_> = actions
            .into_iter()
            .filter_map(|a| ActionPattern::parse(a.as_ref()))
            .collect();
        if actions.is_empty() {
            return Err(Error::Invalid("statement has no actions".into()));
        }
        Ok(Self {
            effect,
            actions,
            resources,
        })
    }

    pub fn allow<A, R, S, T>(actions: A, resources: R) -> Result<Self>
    where
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
        R: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self::new(Effect::Allow, actions, ResourceSet::parse(resources)?)
    }

    pub fn deny<A, R, S, T>(actions: A, resources: R) -> Result<Self>
    where
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
        R: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self::new(Effect::Deny, actions, ResourceSet::parse(resources)?)
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionPattern> {
        self.actions.iter()
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    pub fn covers_scope(&self, scope: &str) -> bool {
        self.actions.iter().any(|a| a.covers(scope))
    }

    /// Whether this statement speaks to `scope` on `resource`, regardless
    /// of its effect.
    pub fn applies_to(&self, resource: &str, scope: &str, contains_resource: bool) -> bool {
        self.covers_scope(scope) && self.resources.matches(resource, contains_resource)
    }
}

fn normalize_resource(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix(RESOURCE_ARN_PREFIX).unwrap_or(raw)
}
