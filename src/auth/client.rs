use super::error::{normalize, AuthError, Operation};
use super::pkce::PkceStore;
use super::{AuthGateway, AuthResult, Credentials, OAuthProvider};
use crate::config::Config;
use crate::logging::{debug_payload_enabled, emit_debug_payload};
use crate::util::is_local_endpoint_url;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Mutex;

const SIGN_IN_SUCCESS: &str = "Logged In Successfully";
const SIGN_UP_SUCCESS: &str = "Please check your email for confirmation";
const RESET_SUCCESS: &str = "Password reset email sent successfully";
const EXCHANGE_SUCCESS: &str = "Session established";
const SIGN_OUT_SUCCESS: &str = "Successfully signed out";
const UPDATE_PASSWORD_SUCCESS: &str = "Password updated successfully!";
const OAUTH_INITIATED: &str = "OAuth initiated";
const MISSING_CREDENTIALS: &str = "Email and password are required";
const MISSING_EMAIL: &str = "Email is required";
const MISSING_CODE: &str = "Authorization code is required";
const MISSING_PASSWORD: &str = "Password is required";
const MISSING_VERIFIER: &str = "No pending sign-in found for this link. Start the sign-in again.";
const PKCE_METHOD: &str = "plain";

#[derive(Debug, Clone)]
struct Session {
    access_token: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    user: Option<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    email: Option<String>,
}

/// Gateway against a Supabase-compatible auth REST API (`/auth/v1`).
pub struct SupabaseGateway {
    http: reqwest::Client,
    base_url: String,
    anon_key: Option<String>,
    callback_url: String,
    reset_redirect_url: String,
    session: Mutex<Option<Session>>,
    pkce: PkceStore,
}

impl SupabaseGateway {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: format!("{}/auth/v1", config.auth_url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            callback_url: config.callback_url(),
            reset_redirect_url: config.update_password_url(),
            session: Mutex::new(None),
            pkce: PkceStore::beside(config.prefs_path.as_deref()),
        })
    }

    pub fn has_session(&self) -> bool {
        self.session
            .lock()
            .map(|session| session.is_some())
            .unwrap_or(false)
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, AuthError> {
        let raw = format!("{}/{}", self.base_url, path);
        let url = if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, query)
        };
        url.with_context(|| format!("invalid auth endpoint '{raw}'"))
            .map_err(AuthError::from)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        payload: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<Value, AuthError> {
        let request_url = url.to_string();
        let mut request = self
            .http
            .request(method, url)
            .header("content-type", "application/json");

        if let Some(payload) = &payload {
            if debug_payload_enabled() {
                emit_debug_payload(&request_url, payload);
            }
            request = request.json(payload);
        }
        if let Some(anon_key) = &self.anon_key {
            request = request.header("apikey", anon_key);
        }
        if let Some(token) = bearer.or(self.anon_key.as_deref()) {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| map_request_error(error, &request_url))?;

        if !status.is_success() {
            tracing::debug!(url = %request_url, %status, "auth endpoint returned error status");
            return Err(AuthError::ProviderRejected(
                provider_message(&body).unwrap_or_default(),
            ));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .with_context(|| format!("auth endpoint '{request_url}' returned malformed JSON"))
            .map_err(AuthError::from)
    }

    fn store_session(&self, body: &Value) {
        let Ok(token) = serde_json::from_value::<TokenResponse>(body.clone()) else {
            return;
        };
        let Some(access_token) = token.access_token else {
            return;
        };
        let email = token.user.and_then(|user| user.email);
        if let Ok(mut session) = self.session.lock() {
            *session = Some(Session {
                access_token,
                email,
            });
        }
    }

    fn take_session(&self) -> Option<Session> {
        self.session.lock().ok().and_then(|mut session| session.take())
    }

    fn session_token(&self) -> Option<String> {
        self.session
            .lock()
            .ok()
            .and_then(|session| session.as_ref().map(|s| s.access_token.clone()))
    }

    async fn try_sign_in(&self, credentials: &Credentials) -> Result<AuthResult, AuthError> {
        if !credentials.is_complete() {
            return Err(AuthError::MissingField(MISSING_CREDENTIALS));
        }
        tracing::info!(email = credentials.email(), "attempting signin");
        let url = self.endpoint("token", &[("grant_type", "password")])?;
        let payload = json!({ "email": credentials.email(), "password": credentials.password() });
        let body = self.send(Method::POST, url, Some(payload), None).await?;
        self.store_session(&body);
        Ok(AuthResult::ok(SIGN_IN_SUCCESS))
    }

    async fn try_sign_up(&self, credentials: &Credentials) -> Result<AuthResult, AuthError> {
        if !credentials.is_complete() {
            return Err(AuthError::MissingField(MISSING_CREDENTIALS));
        }
        tracing::info!(email = credentials.email(), "attempting signup");
        let url = self.endpoint("signup", &[("redirect_to", self.callback_url.as_str())])?;
        let verifier = PkceStore::mint();
        self.pkce.save(&verifier)?;
        let payload = json!({
            "email": credentials.email(),
            "password": credentials.password(),
            "code_challenge": verifier,
            "code_challenge_method": PKCE_METHOD,
        });
        self.send(Method::POST, url, Some(payload), None).await?;
        Ok(AuthResult::ok(SIGN_UP_SUCCESS))
    }

    async fn try_reset(&self, email: &str) -> Result<AuthResult, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::MissingField(MISSING_EMAIL));
        }
        tracing::info!(email, "attempting password reset");
        let url = self.endpoint(
            "recover",
            &[("redirect_to", self.reset_redirect_url.as_str())],
        )?;
        self.send(Method::POST, url, Some(json!({ "email": email })), None)
            .await?;
        Ok(AuthResult::ok(RESET_SUCCESS))
    }

    fn try_oauth(&self, provider: OAuthProvider) -> Result<AuthResult, AuthError> {
        tracing::info!(%provider, "attempting OAuth sign-in");
        let verifier = PkceStore::mint();
        let url = self.endpoint(
            "authorize",
            &[
                ("provider", provider.as_str()),
                ("redirect_to", self.callback_url.as_str()),
                ("code_challenge", verifier.as_str()),
                ("code_challenge_method", PKCE_METHOD),
            ],
        )?;
        self.pkce.save(&verifier)?;
        Ok(AuthResult::redirect(OAUTH_INITIATED, url.to_string()))
    }

    async fn try_exchange(&self, code: &str) -> Result<AuthResult, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::MissingField(MISSING_CODE));
        }
        let Some(verifier) = self.pkce.take() else {
            return Err(AuthError::MissingField(MISSING_VERIFIER));
        };
        let url = self.endpoint("token", &[("grant_type", "pkce")])?;
        let payload = json!({ "auth_code": code, "code_verifier": verifier });
        let body = self.send(Method::POST, url, Some(payload), None).await?;
        self.store_session(&body);
        Ok(AuthResult::ok(EXCHANGE_SUCCESS))
    }

    async fn try_sign_out(&self) -> Result<AuthResult, AuthError> {
        let Some(session) = self.take_session() else {
            tracing::info!("sign out requested without an active session");
            return Ok(AuthResult::ok(SIGN_OUT_SUCCESS));
        };
        tracing::info!(email = session.email.as_deref().unwrap_or("<unknown>"), "attempting sign out");
        let url = self.endpoint("logout", &[])?;
        self.send(Method::POST, url, None, Some(&session.access_token))
            .await?;
        Ok(AuthResult::ok(SIGN_OUT_SUCCESS))
    }

    async fn try_update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<AuthResult, AuthError> {
        if password.is_empty() {
            return Err(AuthError::MissingField(MISSING_PASSWORD));
        }
        let url = self.endpoint("user", &[])?;
        self.send(
            Method::PUT,
            url,
            Some(json!({ "password": password })),
            Some(access_token),
        )
        .await?;
        Ok(AuthResult::ok(UPDATE_PASSWORD_SUCCESS))
    }
}

#[async_trait]
impl AuthGateway for SupabaseGateway {
    async fn sign_in_password(&self, credentials: &Credentials) -> AuthResult {
        normalize(Operation::SignIn, self.try_sign_in(credentials).await)
    }

    async fn sign_up_password(&self, credentials: &Credentials) -> AuthResult {
        normalize(Operation::SignUp, self.try_sign_up(credentials).await)
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult {
        normalize(Operation::Reset, self.try_reset(email).await)
    }

    async fn sign_in_oauth(&self, provider: OAuthProvider) -> AuthResult {
        normalize(Operation::OAuth(provider), self.try_oauth(provider))
    }

    async fn exchange_code_for_session(&self, code: &str) -> AuthResult {
        normalize(Operation::Exchange, self.try_exchange(code).await)
    }

    async fn sign_out(&self) -> AuthResult {
        normalize(Operation::SignOut, self.try_sign_out().await)
    }

    async fn update_password(&self, access_token: &str, password: &str) -> AuthResult {
        normalize(
            Operation::UpdatePassword,
            self.try_update_password(access_token, password).await,
        )
    }

    async fn current_user(&self) -> Option<String> {
        let token = self.session_token()?;
        let url = self.endpoint("user", &[]).ok()?;
        match self.send(Method::GET, url, None, Some(&token)).await {
            Ok(body) => serde_json::from_value::<UserRecord>(body)
                .ok()
                .and_then(|user| user.email),
            Err(error) => {
                tracing::warn!(%error, "failed to fetch current user");
                None
            }
        }
    }
}

/// First message-like field of a provider error body.
fn provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

fn map_request_error(error: reqwest::Error, request_url: &str) -> AuthError {
    let error = if error.is_connect() && is_local_endpoint_url(request_url) {
        anyhow!(
            "cannot reach local auth endpoint '{}': {}. Start your local server or update PORTX_AUTH_URL.",
            request_url,
            error
        )
    } else if error.is_connect() {
        anyhow!("cannot reach auth endpoint '{}': {}", request_url, error)
    } else if error.is_timeout() {
        anyhow!("auth request to '{}' timed out: {}", request_url, error)
    } else {
        anyhow!("auth request to '{}' failed: {}", request_url, error)
    };
    AuthError::Unexpected(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_config(auth_url: &str, dir: &Path) -> Config {
        Config {
            auth_url: auth_url.to_string(),
            anon_key: Some("anon".to_string()),
            site_url: "http://localhost:3000".to_string(),
            dashboard_path: "/dashboard".to_string(),
            prefs_path: Some(dir.join("prefs.json")),
            progress_interval: Duration::from_millis(300),
            request_timeout: Duration::from_secs(2),
            history_limit: 10,
            reset_code: None,
        }
    }

    #[test]
    fn test_provider_message_prefers_msg_then_description() {
        assert_eq!(
            provider_message(r#"{"code":400,"msg":"Invalid login credentials"}"#).as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            provider_message(r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#)
                .as_deref(),
            Some("Email not confirmed")
        );
        assert_eq!(provider_message(r#"{"msg":"  "}"#), None);
        assert_eq!(provider_message("<html>bad gateway</html>"), None);
    }

    #[tokio::test]
    async fn test_oauth_builds_authorize_url_without_network() {
        let dir = tempfile::tempdir().expect("temp dir");
        let gateway = SupabaseGateway::new(&test_config("https://project.supabase.co", dir.path()))
            .expect("gateway");
        let result = gateway.sign_in_oauth(OAuthProvider::Github).await;

        assert_eq!(result.success.as_deref(), Some("OAuth initiated"));
        let target = result.redirect_target.expect("redirect target");
        let url = Url::parse(&target).expect("valid url");
        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".to_string(), "github".to_string())));
        assert!(pairs.contains(&(
            "redirect_to".to_string(),
            "http://localhost:3000/auth/callback".to_string()
        )));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let dir = tempfile::tempdir().expect("temp dir");
        let gateway =
            SupabaseGateway::new(&test_config("http://127.0.0.1:9", dir.path())).expect("gateway");
        let result = gateway.sign_in_password(&Credentials::new("", "")).await;
        assert_eq!(result.error.as_deref(), Some("Email and password are required"));
        let result = gateway.send_password_reset("  ").await;
        assert_eq!(result.error.as_deref(), Some("Email is required"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_normalizes_to_generic_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let gateway =
            SupabaseGateway::new(&test_config("http://127.0.0.1:9", dir.path())).expect("gateway");
        let result = gateway
            .sign_in_password(&Credentials::new("a@b.com", "abcdef"))
            .await;
        assert_eq!(
            result.error.as_deref(),
            Some("An unexpected error occurred during signin")
        );
        assert!(!gateway.has_session());
    }

    #[tokio::test]
    async fn test_sign_out_without_session_succeeds_locally() {
        let dir = tempfile::tempdir().expect("temp dir");
        let gateway =
            SupabaseGateway::new(&test_config("http://127.0.0.1:9", dir.path())).expect("gateway");
        let result = gateway.sign_out().await;
        assert_eq!(result.success.as_deref(), Some("Successfully signed out"));
        assert_eq!(gateway.current_user().await, None);
    }

    /// Answer one request with `response_body` and hand back the request
    /// body that was received.
    async fn serve_once(response_body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut chunk = [0u8; 1024];
            let body = loop {
                let read = stream.read(&mut chunk).await.expect("read");
                raw.extend_from_slice(&chunk[..read]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some((head, body)) = text.split_once("\r\n\r\n") {
                    let length = head
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if body.len() >= length || read == 0 {
                        break body.to_string();
                    }
                }
                if read == 0 {
                    break String::new();
                }
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                response_body.len(),
                response_body
            );
            stream.write_all(response.as_bytes()).await.expect("write");
            body
        });
        (format!("http://{addr}"), handle)
    }

    fn query_value(url: &str, key: &str) -> Option<String> {
        Url::parse(url)
            .ok()?
            .query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    #[tokio::test]
    async fn test_exchange_in_a_later_process_uses_the_oauth_verifier() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (auth_url, server) =
            serve_once(r#"{"access_token":"t","user":{"email":"a@b.com"}}"#).await;
        let config = test_config(&auth_url, dir.path());

        let console_side = SupabaseGateway::new(&config).expect("gateway");
        let started = console_side.sign_in_oauth(OAuthProvider::Google).await;
        let target = started.redirect_target.expect("redirect target");
        let challenge = query_value(&target, "code_challenge").expect("code challenge");
        drop(console_side);

        let callback_side = SupabaseGateway::new(&config).expect("gateway");
        let result = callback_side.exchange_code_for_session("code-123").await;
        assert_eq!(result.success.as_deref(), Some("Session established"));
        assert!(callback_side.has_session());

        let body: Value = serde_json::from_str(&server.await.expect("server")).expect("json body");
        assert_eq!(body["auth_code"], "code-123");
        assert_eq!(body["code_verifier"].as_str(), Some(challenge.as_str()));
        assert!(!dir.path().join("pkce.json").exists());
    }

    #[tokio::test]
    async fn test_exchange_without_pending_verifier_fails_before_network() {
        let dir = tempfile::tempdir().expect("temp dir");
        let gateway =
            SupabaseGateway::new(&test_config("http://127.0.0.1:9", dir.path())).expect("gateway");
        let result = gateway.exchange_code_for_session("code-123").await;
        assert_eq!(
            result.error.as_deref(),
            Some("No pending sign-in found for this link. Start the sign-in again.")
        );
    }

    #[tokio::test]
    async fn test_sign_up_sends_a_code_challenge_and_keeps_the_verifier() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (auth_url, server) = serve_once(r#"{"id":"u1"}"#).await;
        let config = test_config(&auth_url, dir.path());

        let gateway = SupabaseGateway::new(&config).expect("gateway");
        let result = gateway
            .sign_up_password(&Credentials::new("a@b.com", "abcdefgh"))
            .await;
        assert_eq!(
            result.success.as_deref(),
            Some("Please check your email for confirmation")
        );

        let body: Value = serde_json::from_str(&server.await.expect("server")).expect("json body");
        assert_eq!(body["code_challenge_method"], "plain");
        let challenge = body["code_challenge"].as_str().expect("challenge").to_string();
        let pending = PkceStore::beside(config.prefs_path.as_deref()).take();
        assert_eq!(pending.as_deref(), Some(challenge.as_str()));
    }
}
