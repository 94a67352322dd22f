//! Session state as seen by evaluators.

use crate::matcher::{self, AccessQuery, Resources};
use crate::PolicyStatement;
use std::collections::HashMap;
use std::sync::Arc;

/// An authenticated console session: identity plus its granted statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: String,
    statements: HashMap<String, PolicyStatement>,
}

impl Session {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            statements: HashMap::new(),
        }
    }

    /// Add a statement under `id`, replacing any statement with the same id.
    pub fn with_statement(mut self, id: impl Into<String>, statement: PolicyStatement) -> Self {
        self.statements.insert(id.into(), statement);
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn statement(&self, id: &str) -> Option<&PolicyStatement> {
        self.statements.get(id)
    }

    pub fn statements(&self) -> impl Iterator<Item = (&str, &PolicyStatement)> {
        self.statements.iter().map(|(id, s)| (id.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Read-only view of the cached session at one point in time.
///
/// Cloning is cheap. An empty snapshot (no session) denies everything.
#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    session: Option<Arc<Session>>,
}

impl PolicySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of(session: Session) -> Self {
        Self {
            session: Some(Arc::new(session)),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.session.is_none()
    }

    /// Statements of the current session; nothing when signed out.
    pub fn statements(&self) -> impl Iterator<Item = &PolicyStatement> {
        self.session
            .iter()
            .flat_map(|s| s.statements.values())
    }

    pub fn evaluate(&self, query: &AccessQuery) -> bool {
        matcher::evaluate(self, query)
    }

    /// Shorthand for building and evaluating an [`AccessQuery`].
    pub fn has_permission<S: AsRef<str>>(
        &self,
        resources: impl Into<Resources>,
        scopes: &[S],
        match_all: bool,
        contains_resource: bool,
    ) -> bool {
        let mut query = AccessQuery::new(resources, scopes);
        if match_all {
            query = query.match_all();
        }
        if contains_resource {
            query = query.contains_resource();
        }
        self.evaluate(&query)
    }
}
