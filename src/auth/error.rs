use super::{AuthResult, OAuthProvider};

/// Failure kinds inside the gateway.
///
/// All three collapse onto [`AuthResult::error`] at the boundary, so a
/// caller holding only the result cannot tell which kind occurred.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    MissingField(&'static str),
    #[error("{0}")]
    ProviderRejected(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SignIn,
    SignUp,
    Reset,
    OAuth(OAuthProvider),
    Exchange,
    SignOut,
    UpdatePassword,
}

impl Operation {
    fn rejected_message(self, provider_message: &str) -> String {
        let provider_message = provider_message.trim();
        match self {
            Self::OAuth(provider) => {
                format!("Failed to authenticate with {provider}: {provider_message}")
            }
            Self::SignOut => format!("Failed to sign out: {provider_message}"),
            _ if !provider_message.is_empty() => provider_message.to_string(),
            Self::SignUp => "Failed to create account".to_string(),
            Self::Reset => "Failed to send password reset email".to_string(),
            Self::SignIn => "Failed to sign in".to_string(),
            Self::Exchange => "Failed to exchange code for session".to_string(),
            Self::UpdatePassword => "Failed to update password".to_string(),
        }
    }

    fn unexpected_message(self) -> String {
        match self {
            Self::SignIn => "An unexpected error occurred during signin".to_string(),
            Self::SignUp => "An unexpected error occurred during signup".to_string(),
            Self::Reset => "An unexpected error occurred during password reset".to_string(),
            Self::OAuth(provider) => format!("Unexpected error during {provider} authentication"),
            Self::Exchange => "An unexpected error occurred during code exchange".to_string(),
            Self::SignOut => "Unexpected error during sign out".to_string(),
            Self::UpdatePassword => {
                "An unexpected error occurred during password update".to_string()
            }
        }
    }
}

/// Collapse an internal outcome into the boundary result, logging the detail
/// that the result itself drops.
pub fn normalize(operation: Operation, outcome: Result<AuthResult, AuthError>) -> AuthResult {
    match outcome {
        Ok(result) => {
            tracing::info!(?operation, "auth operation succeeded");
            result
        }
        Err(AuthError::MissingField(message)) => {
            tracing::warn!(?operation, missing = message, "auth operation missing input");
            AuthResult::failed(message)
        }
        Err(AuthError::ProviderRejected(message)) => {
            tracing::warn!(?operation, provider_message = %message, "provider rejected auth operation");
            AuthResult::failed(operation.rejected_message(&message))
        }
        Err(AuthError::Unexpected(error)) => {
            tracing::error!(?operation, error = %format!("{error:#}"), "auth operation failed");
            AuthResult::failed(operation.unexpected_message())
        }
    }
}
