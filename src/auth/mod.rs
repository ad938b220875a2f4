//! Facade over the external identity provider.
//!
//! Every gateway operation resolves to an [`AuthResult`]; failures never
//! escape as `Err` or panics past the gateway boundary.

mod client;
mod error;
mod mock;
mod pkce;

pub use client::SupabaseGateway;
pub use error::{normalize, AuthError, Operation};
pub use mock::{GatewayCall, MockGateway};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Uniform result of a gateway call.
///
/// On completion exactly one of `success` / `error` is set; both are absent
/// only for [`AuthResult::idle`]. `redirect_target` is only set by OAuth
/// initiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub success: Option<String>,
    pub error: Option<String>,
    pub redirect_target: Option<String>,
}

impl AuthResult {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn redirect(message: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            success: Some(message.into()),
            error: None,
            redirect_target: Some(target.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success.is_some() && self.error.is_none()
    }

    pub fn is_idle(&self) -> bool {
        self.success.is_none() && self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "google" => Some(Self::Google),
            "github" => Some(Self::Github),
            _ => None,
        }
    }

    /// Provider id as the auth API expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Github => "GitHub",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email/password pair held only for the duration of one gateway call.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

/// A bare password, e.g. for a password update.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in_password(&self, credentials: &Credentials) -> AuthResult;
    async fn sign_up_password(&self, credentials: &Credentials) -> AuthResult;
    async fn send_password_reset(&self, email: &str) -> AuthResult;
    async fn sign_in_oauth(&self, provider: OAuthProvider) -> AuthResult;
    async fn exchange_code_for_session(&self, code: &str) -> AuthResult;
    async fn sign_out(&self) -> AuthResult;
    async fn update_password(&self, access_token: &str, password: &str) -> AuthResult;
    /// Email of the signed-in user, if a session exists and the provider confirms it.
    async fn current_user(&self) -> Option<String>;
}

/// An owned gateway call, so it can be moved onto a spawned task.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthRequest {
    SignIn(Credentials),
    SignUp(Credentials),
    Reset { email: String },
    OAuth(OAuthProvider),
    SignOut,
    UpdatePassword { access_token: String, password: Password },
}

impl AuthRequest {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SignIn(_) => "login",
            Self::SignUp(_) => "signup",
            Self::Reset { .. } => "reset",
            Self::OAuth(_) => "oauth",
            Self::SignOut => "logout",
            Self::UpdatePassword { .. } => "passwd",
        }
    }

    pub async fn dispatch(&self, gateway: &dyn AuthGateway) -> AuthResult {
        match self {
            Self::SignIn(credentials) => gateway.sign_in_password(credentials).await,
            Self::SignUp(credentials) => gateway.sign_up_password(credentials).await,
            Self::Reset { email } => gateway.send_password_reset(email).await,
            Self::OAuth(provider) => gateway.sign_in_oauth(*provider).await,
            Self::SignOut => gateway.sign_out().await,
            Self::UpdatePassword {
                access_token,
                password,
            } => {
                gateway
                    .update_password(access_token, password.expose())
                    .await
            }
        }
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignIn(credentials) | Self::SignUp(credentials) => f
                .debug_tuple(self.label())
                .field(&credentials.email())
                .finish(),
            Self::Reset { email } => f.debug_tuple(self.label()).field(email).finish(),
            Self::OAuth(provider) => f.debug_tuple(self.label()).field(provider).finish(),
            Self::SignOut | Self::UpdatePassword { .. } => f.write_str(self.label()),
        }
    }
}
