//! Session payloads as received from the console server.
//!
//! Statements are validated here, once, before they reach the cache. A
//! statement that does not validate is dropped and logged; it never grants
//! anything and never aborts the rest of the load.

use crate::{Effect, Error, PolicyStatement, ResourceSet, Result, Session};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Id prefix for statements built from the legacy `permissions` map.
const LEGACY_GRANT_PREFIX: &str = "permissions:";

/// Body of the server's session response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Opaque identity of the signed-in principal.
    #[serde(default, alias = "accessKey")]
    pub identity: Option<String>,

    /// Statement id to raw statement.
    #[serde(default)]
    pub statements: BTreeMap<String, serde_json::Value>,

    /// Legacy grant map: resource to the actions allowed on it.
    #[serde(default)]
    pub permissions: BTreeMap<String, serde_json::Value>,
}

/// A statement before validation.
#[derive(Debug, Deserialize)]
struct RawStatement {
    #[serde(alias = "Effect")]
    effect: String,
    #[serde(alias = "Action")]
    actions: OneOrMany,
    #[serde(alias = "Resource")]
    resources: OneOrMany,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

impl SessionPayload {
    /// Load a payload from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a payload from a JSON string.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Validate every statement and build the session.
    pub fn into_session(self) -> Session {
        let mut session = Session::new(self.identity.unwrap_or_default());

        for (id, value) in self.statements {
            match parse_statement(value) {
                Ok(statement) => session = session.with_statement(id, statement),
                Err(e) => warn!(statement = %id, error = %e, "dropping malformed statement"),
            }
        }

        for (resource, value) in self.permissions {
            let statement = serde_json::from_value::<OneOrMany>(value)
                .map_err(|e| Error::Parse(e.to_string()))
                .and_then(|actions| {
                    PolicyStatement::allow(actions.into_vec(), [resource.as_str()])
                });
            let id = format!("{LEGACY_GRANT_PREFIX}{resource}");
            match statement {
                Ok(_) if session.statement(&id).is_some() => {
                    warn!(statement = %id, "dropping legacy grant that shadows a statement id")
                }
                Ok(statement) => session = session.with_statement(id, statement),
                Err(e) => warn!(resource = %resource, error = %e, "dropping malformed grant"),
            }
        }

        session
    }
}

fn parse_statement(value: serde_json::Value) -> Result<PolicyStatement> {
    let raw: RawStatement =
        serde_json::from_value(value).map_err(|e| Error::Parse(e.to_string()))?;
    let effect: Effect = raw.effect.parse()?;
    let resources = ResourceSet::parse(raw.resources.into_vec())?;
    PolicyStatement::new(effect, raw.actions.into_vec(), resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_statements() {
        let payload = SessionPayload::parse(
            r#"{
                "identity": "alice",
                "statements": {
                    "stmt1": {"effect": "allow", "actions": ["s3:GetObject"], "resources": ["bucket1/*"]},
                    "stmt2": {"Effect": "Deny", "Action": "s3:DeleteObject", "Resource": "arn:aws:s3:::bucket1/locked/*"}
                }
            }"#,
        )
        .unwrap();
        let session = payload.into_session();

        assert_eq!(session.identity(), "alice");
        assert_eq!(session.len(), 2);
        assert_eq!(session.statement("stmt2").unwrap().effect(), Effect::Deny);
    }

    #[test]
    fn test_malformed_statements_are_dropped() {
        let payload: SessionPayload = serde_json::from_value(json!({
            "statements": {
                "good": {"effect": "allow", "actions": ["s3:GetObject"], "resources": ["b/*"]},
                "bad_effect": {"effect": "maybe", "actions": ["s3:GetObject"], "resources": ["b/*"]},
                "no_actions": {"effect": "allow", "actions": [], "resources": ["b/*"]},
                "no_resources": {"effect": "allow", "actions": ["s3:GetObject"], "resources": [" "]},
                "wrong_shape": {"effect": "allow", "actions": 7, "resources": ["b/*"]},
                "not_an_object": "allow everything"
            }
        }))
        .unwrap();
        let session = payload.into_session();

        assert_eq!(session.len(), 1);
        assert!(session.statement("good").is_some());
    }

    #[test]
    fn test_legacy_permissions_become_allows() {
        let payload: SessionPayload = serde_json::from_value(json!({
            "permissions": {
                "arn:aws:s3:::bucket2": ["s3:ListBucket"],
                "arn:aws:s3:::bucket2/*": ["s3:GetObject", "s3:PutObject"],
                "broken": {"nope": true}
            }
        }))
        .unwrap();
        let snapshot = crate::PolicySnapshot::of(payload.into_session());

        assert!(snapshot.has_permission("bucket2", &["s3:ListBucket"], false, false));
        assert!(snapshot.has_permission("bucket2/a", &["s3:PutObject"], false, false));
        assert!(!snapshot.has_permission("bucket2/a", &["s3:DeleteObject"], false, false));
        assert_eq!(snapshot.session().unwrap().len(), 2);
    }

    #[test]
    fn test_legacy_grant_never_replaces_statement() {
        let payload: SessionPayload = serde_json::from_value(json!({
            "statements": {
                "bucket1/*": {"effect": "deny", "actions": ["s3:DeleteObject"], "resources": ["bucket1/*"]},
                "permissions:bucket2/*": {"effect": "deny", "actions": ["s3:GetObject"], "resources": ["bucket2/*"]}
            },
            "permissions": {
                "bucket1/*": ["s3:DeleteObject"],
                "bucket2/*": ["s3:GetObject"]
            }
        }))
        .unwrap();
        let snapshot = crate::PolicySnapshot::of(payload.into_session());
        let session = snapshot.session().unwrap();

        assert_eq!(session.statement("bucket1/*").unwrap().effect(), Effect::Deny);
        assert_eq!(
            session.statement("permissions:bucket2/*").unwrap().effect(),
            Effect::Deny
        );
        assert_eq!(session.len(), 3);
        assert!(!snapshot.has_permission("bucket1/a", &["s3:DeleteObject"], false, false));
        assert!(!snapshot.has_permission("bucket2/a", &["s3:GetObject"], false, false));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(SessionPayload::parse("{"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_missing_fields_yield_empty_session() {
        let session = SessionPayload::parse("{}").unwrap().into_session();
        assert!(session.is_empty());
        assert_eq!(session.identity(), "");
    }
}
