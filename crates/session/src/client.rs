//! HTTP client for the console server's session endpoints.

use crate::flow::{AuthFlow, Signal};
use crate::{Error, Result};
use policy::{PolicySnapshot, SessionPayload};
use reqwest::Response;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const API_PREFIX: &str = "/api/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Access key / secret key pair used to sign in.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Display for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.access_key)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    access_key: &'a str,
    secret_key: &'a str,
}

/// Builder for creating a console client.
#[derive(Debug, Clone)]
pub struct ConsoleClientBuilder {
    base_url: String,
    flow: AuthFlow,
    timeout: Duration,
}

impl ConsoleClientBuilder {
    pub fn new(base_url: impl Into<String>, flow: AuthFlow) -> Self {
        Self {
            base_url: base_url.into(),
            flow,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ConsoleClient> {
        let base = self.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(Error::Config("server url is empty".into()));
        }
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(ConsoleClient {
            http,
            api_base: format!("{base}{API_PREFIX}"),
            flow: self.flow,
        })
    }
}

/// Console API client. Keeps the session cookie between calls and routes
/// every response through the [`AuthFlow`].
pub struct ConsoleClient {
    http: reqwest::Client,
    api_base: String,
    flow: AuthFlow,
}

impl ConsoleClient {
    pub fn builder(base_url: impl Into<String>, flow: AuthFlow) -> ConsoleClientBuilder {
        ConsoleClientBuilder::new(base_url, flow)
    }

    pub fn flow(&self) -> &AuthFlow {
        &self.flow
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    /// Exchange credentials for a session cookie.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        debug!(access_key = credentials.access_key(), "logging in");
        let response = self
            .http
            .post(self.url("/login"))
            .json(&LoginRequest {
                access_key: &credentials.access_key,
                secret_key: &credentials.secret_key,
            })
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        self.check(response).await?;
        Ok(())
    }

    /// Fetch the current session and its granted statements.
    pub async fn session(&self) -> Result<SessionPayload> {
        let response = self
            .http
            .get(self.url("/session"))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let response = self.check(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(SessionPayload::parse(&body)?)
    }

    /// Log in, fetch the session and load it into the policy cache.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<PolicySnapshot> {
        self.login(credentials).await?;
        let payload = self.session().await?;
        Ok(self.flow.establish(payload))
    }

    /// End the server session. The cache is cleared even if the call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self
            .http
            .post(self.url("/logout"))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()));
        self.flow.end();
        self.check(result?).await?;
        Ok(())
    }

    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match self.flow.observe(status, &body) {
            Signal::RedirectToLogin => Err(Error::InvalidSession),
            Signal::Continue => Err(Error::Api(format!("{status}: {body}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::PolicyCache;
    use policy::scopes::{S3_GET_OBJECT, S3_LIST_BUCKET};
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SESSION_BODY: &str = r#"{
        "identity": "alice",
        "statements": {
            "stmt1": {"effect": "allow", "actions": ["s3:GetObject"], "resources": ["bucket1/*"]}
        },
        "permissions": {"arn:aws:s3:::bucket1": ["s3:ListBucket"]}
    }"#;

    fn client(base: &str) -> ConsoleClient {
        let flow = AuthFlow::new(Arc::new(PolicyCache::new()));
        ConsoleClient::builder(base, flow).build().unwrap()
    }

    #[test]
    fn credentials_hide_secret() {
        let creds = Credentials::new("alice", "hunter22");
        assert_eq!(creds.to_string(), "alice");
        assert!(!format!("{creds:?}").contains("hunter22"));
    }

    #[test]
    fn builder_rejects_empty_url() {
        let flow = AuthFlow::new(Arc::new(PolicyCache::new()));
        assert!(matches!(
            ConsoleClient::builder("  ", flow).build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn url_trims_trailing_slash() {
        let client = client("http://localhost:9090/");
        assert_eq!(client.url("/session"), "http://localhost:9090/api/v1/session");
    }

    #[tokio::test]
    async fn sign_in_loads_policy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .and(body_json(serde_json::json!({"accessKey": "alice", "secretKey": "hunter22"})))
            .respond_with(ResponseTemplate::new(204).insert_header("set-cookie", "token=abc; Path=/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/session"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SESSION_BODY))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let snapshot = client
            .sign_in(&Credentials::new("alice", "hunter22"))
            .await
            .unwrap();

        assert_eq!(snapshot.session().unwrap().identity(), "alice");
        assert!(snapshot.has_permission("bucket1/a.txt", &[S3_GET_OBJECT], false, false));
        assert!(snapshot.has_permission("bucket1", &[S3_LIST_BUCKET], false, false));
        assert!(!client.flow().snapshot().is_empty());
    }

    #[tokio::test]
    async fn invalid_session_clears_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/session"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"code": 403, "message": "invalid session"}"#),
            )
            .mount(&server)
            .await;

        let client = client(&server.uri());
        client
            .flow()
            .establish(SessionPayload::parse(SESSION_BODY).unwrap());

        let err = client.session().await.unwrap_err();
        assert!(matches!(err, Error::InvalidSession));
        assert!(client.flow().snapshot().is_empty());
    }

    #[tokio::test]
    async fn login_failure_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"message": "invalid login"}"#),
            )
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let err = client
            .login(&Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(msg) if msg.contains("invalid login")));
    }

    #[tokio::test]
    async fn logout_clears_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/logout"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        client
            .flow()
            .establish(SessionPayload::parse(SESSION_BODY).unwrap());
        client.logout().await.unwrap();
        assert!(client.flow().snapshot().is_empty());
    }
}
