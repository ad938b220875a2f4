use super::{AuthGateway, AuthResult, Credentials, OAuthProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A recorded gateway invocation. Passwords are never recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    SignIn { email: String },
    SignUp { email: String },
    Reset { email: String },
    OAuth(OAuthProvider),
    Exchange { code: String },
    SignOut,
    UpdatePassword { access_token: String },
    CurrentUser,
}

/// Scripted gateway: hands out queued results in order and records calls.
#[derive(Clone, Default)]
pub struct MockGateway {
    responses: Arc<Mutex<VecDeque<AuthResult>>>,
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    user_email: Option<String>,
}

impl MockGateway {
    pub fn new(responses: Vec<AuthResult>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
            user_email: None,
        }
    }

    pub fn with_user(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn respond(&self, call: GatewayCall) -> AuthResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .unwrap_or_else(|| AuthResult::failed("MockGateway: no more responses configured"))
    }
}

#[async_trait]
impl AuthGateway for MockGateway {
    async fn sign_in_password(&self, credentials: &Credentials) -> AuthResult {
        self.respond(GatewayCall::SignIn {
            email: credentials.email().to_string(),
        })
    }

    async fn sign_up_password(&self, credentials: &Credentials) -> AuthResult {
        self.respond(GatewayCall::SignUp {
            email: credentials.email().to_string(),
        })
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult {
        self.respond(GatewayCall::Reset {
            email: email.to_string(),
        })
    }

    async fn sign_in_oauth(&self, provider: OAuthProvider) -> AuthResult {
        self.respond(GatewayCall::OAuth(provider))
    }

    async fn exchange_code_for_session(&self, code: &str) -> AuthResult {
        self.respond(GatewayCall::Exchange {
            code: code.to_string(),
        })
    }

    async fn sign_out(&self) -> AuthResult {
        self.respond(GatewayCall::SignOut)
    }

    async fn update_password(&self, access_token: &str, _password: &str) -> AuthResult {
        self.respond(GatewayCall::UpdatePassword {
            access_token: access_token.to_string(),
        })
    }

    async fn current_user(&self) -> Option<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(GatewayCall::CurrentUser);
        }
        self.user_email.clone()
    }
}
