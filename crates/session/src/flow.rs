//! Authentication flow: the only writer of the policy cache.

use policy::{PolicyCache, PolicySnapshot, SessionPayload};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Error message the server sends when a session token is no longer valid.
pub const INVALID_SESSION_MESSAGE: &str = "invalid session";

/// What the caller should do after a response was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    /// The session is gone; send the user back to the login surface.
    RedirectToLogin,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Populates the policy cache on login and clears it on logout or expiry.
#[derive(Debug, Clone)]
pub struct AuthFlow {
    cache: Arc<PolicyCache>,
}

impl AuthFlow {
    pub fn new(cache: Arc<PolicyCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<PolicyCache> {
        &self.cache
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        self.cache.get()
    }

    /// Validate the server's session payload and replace the cached policy.
    pub fn establish(&self, payload: SessionPayload) -> PolicySnapshot {
        let session = payload.into_session();
        info!(
            identity = session.identity(),
            statements = session.len(),
            "session established"
        );
        self.cache.load(session);
        self.cache.get()
    }

    pub fn end(&self) {
        info!("session ended");
        self.cache.clear();
    }

    /// Inspect an API response. An invalid-session rejection clears the
    /// cache before returning [`Signal::RedirectToLogin`].
    pub fn observe(&self, status: StatusCode, body: &str) -> Signal {
        if !is_invalid_session(status, body) {
            return Signal::Continue;
        }
        warn!("server reported an invalid session; clearing cached policy");
        self.cache.clear();
        Signal::RedirectToLogin
    }
}

/// A 403 whose error message is exactly [`INVALID_SESSION_MESSAGE`].
pub fn is_invalid_session(status: StatusCode, body: &str) -> bool {
    if status != StatusCode::FORBIDDEN {
        return false;
    }
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.message == INVALID_SESSION_MESSAGE)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::scopes::S3_GET_OBJECT;

    const PAYLOAD: &str = r#"{
        "identity": "alice",
        "statements": {
            "stmt1": {"effect": "allow", "actions": ["s3:GetObject"], "resources": ["bucket1/*"]}
        }
    }"#;

    fn established() -> AuthFlow {
        let flow = AuthFlow::new(Arc::new(PolicyCache::new()));
        flow.establish(SessionPayload::parse(PAYLOAD).unwrap());
        flow
    }

    #[test]
    fn test_establish_loads_cache() {
        let flow = established();
        let snapshot = flow.snapshot();
        assert!(snapshot.has_permission("bucket1/a.txt", &[S3_GET_OBJECT], false, false));
        assert!(!snapshot.has_permission("bucket2/a.txt", &[S3_GET_OBJECT], false, false));
    }

    #[test]
    fn test_end_clears_cache() {
        let flow = established();
        flow.end();
        assert!(!flow.snapshot().has_permission("bucket1/a.txt", &[S3_GET_OBJECT], false, false));
    }

    #[test]
    fn test_invalid_session_clears_and_redirects() {
        let flow = established();
        let signal = flow.observe(
            StatusCode::FORBIDDEN,
            r#"{"code": 403, "message": "invalid session"}"#,
        );
        assert_eq!(signal, Signal::RedirectToLogin);
        assert!(flow.snapshot().is_empty());
    }

    #[test]
    fn test_other_errors_keep_session() {
        let flow = established();
        assert_eq!(
            flow.observe(StatusCode::FORBIDDEN, r#"{"message": "Access Denied."}"#),
            Signal::Continue
        );
        assert_eq!(
            flow.observe(StatusCode::UNAUTHORIZED, r#"{"message": "invalid session"}"#),
            Signal::Continue
        );
        assert_eq!(flow.observe(StatusCode::FORBIDDEN, "not json"), Signal::Continue);
        assert!(!flow.snapshot().is_empty());
    }
}
