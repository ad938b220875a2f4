use crate::auth::AuthResult;
use std::time::Instant;

pub const AUTHENTICATING: &str = "Authenticating";
pub const CREATING_ACCOUNT: &str = "Creating account";
const MAX_DOTS: usize = 3;

/// Requests that hold the console until they resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Login,
    Signup,
}

impl PendingKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
        }
    }

    pub fn progress_text(self) -> &'static str {
        match self {
            Self::Login => AUTHENTICATING,
            Self::Signup => CREATING_ACCOUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub kind: PendingKind,
    pub request_id: u64,
    pub submitted_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    Pending(PendingRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateTo(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: FlowState,
    pub effect: Option<NavigateTo>,
}

impl FlowState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        match self {
            Self::Pending(request) => Some(request),
            Self::Idle => None,
        }
    }

    pub fn begin(kind: PendingKind, request_id: u64) -> Self {
        Self::Pending(PendingRequest {
            kind,
            request_id,
            submitted_at: Instant::now(),
        })
    }

    /// Leave `Pending` on any resolution. A successful login is the only
    /// outcome that navigates.
    pub fn resolve(self, result: &AuthResult, landing_path: &str) -> Transition {
        let effect = match self {
            Self::Pending(PendingRequest {
                kind: PendingKind::Login,
                ..
            }) if result.is_success() => Some(NavigateTo(landing_path.to_string())),
            _ => None,
        };
        Transition {
            state: Self::Idle,
            effect,
        }
    }
}

/// Next frame of the progress ellipsis: 1 → 2 → 3 → 1 dots.
///
/// Returns `None` when `text` is not a progress line.
pub fn next_ellipsis_frame(text: &str) -> Option<String> {
    let base = [AUTHENTICATING, CREATING_ACCOUNT]
        .into_iter()
        .find(|prefix| text.starts_with(prefix))?;
    let dots = text[base.len()..].chars().filter(|ch| *ch == '.').count();
    let next = if dots < MAX_DOTS { dots + 1 } else { 1 };
    Some(format!("{base}{}", ".".repeat(next)))
}
