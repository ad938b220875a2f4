//! The authentication console: command interpretation, pending-request
//! tracking and the transcript a user sees.
//!
//! [`Console`] is synchronous and never performs I/O. Anything with a side
//! effect (gateway calls, theme changes, navigation, the progress ticker)
//! is handed back to the caller as a [`ConsoleEffect`].

pub mod command;
pub mod flow;
pub mod transcript;

#[cfg(test)]
mod tests;

use crate::auth::{AuthRequest, AuthResult, Credentials, OAuthProvider, Password};
use crate::config::{DEFAULT_DASHBOARD_PATH, LOGIN_PATH};
use crate::validate::{is_strong_password, is_valid_email, meets_login_password_policy};
use command::{
    echo_line, masked_password_line, parse_line, CommandKind, ParsedLine, QuickAction,
    QuickCommand, HELP_TEXT,
};
use flow::{next_ellipsis_frame, FlowState, PendingKind};
use transcript::{CommandHistory, LineKind, Transcript};

pub use command::PROMPT;
pub use flow::NavigateTo;
pub use transcript::TranscriptLine;

/// A gateway call the caller must run, tagged for correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTicket {
    pub id: u64,
    pub request: AuthRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEffect {
    Dispatch(AuthTicket),
    ToggleTheme,
    /// Start the repeating progress tick; paired with `StopProgress`.
    StartProgress,
    StopProgress,
    NavigateTo(String),
    /// Provider URL the user must open to continue an OAuth handshake.
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickOutcome {
    Ignored,
    Ran(Vec<ConsoleEffect>),
    Prefill(String),
}

#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    pub landing_path: String,
    pub history_limit: Option<usize>,
    pub reset_code: Option<String>,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            landing_path: DEFAULT_DASHBOARD_PATH.to_string(),
            history_limit: None,
            reset_code: None,
        }
    }
}

pub struct Console {
    transcript: Transcript,
    history: CommandHistory,
    flow: FlowState,
    landing_path: String,
    reset_code: Option<String>,
    password_update: Option<u64>,
    next_request_id: u64,
}

impl Console {
    pub fn new(options: ConsoleOptions) -> Self {
        let history = match options.history_limit {
            Some(limit) => CommandHistory::with_limit(limit),
            None => CommandHistory::new(),
        };
        let mut console = Self {
            transcript: Transcript::new(),
            history,
            flow: FlowState::Idle,
            landing_path: options.landing_path,
            reset_code: options.reset_code,
            password_update: None,
            next_request_id: 1,
        };
        if console.reset_code.is_some() {
            console.transcript.push(
                "Password reset token detected. Type 'passwd <new-password>' to reset.",
                LineKind::Success,
            );
        }
        console
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn flow(&self) -> &FlowState {
        &self.flow
    }

    pub fn is_pending(&self) -> bool {
        self.flow.is_pending()
    }

    /// Append a line that did not come from a command, e.g. shell notices.
    pub fn note(&mut self, text: impl Into<String>, kind: LineKind) {
        self.transcript.push(text, kind);
    }

    /// Input-layer entry point for a submitted line.
    ///
    /// Blank lines and anything submitted while a blocking request is in
    /// flight are dropped before the interpreter sees them.
    pub fn submit(&mut self, raw: &str) -> Vec<ConsoleEffect> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if self.is_pending() {
            tracing::debug!("input rejected while request pending");
            return Vec::new();
        }

        self.transcript.push(echo_line(raw), LineKind::Success);
        let effects = self.interpret(raw);
        self.history.record(raw);
        effects
    }

    pub fn quick(&mut self, command: QuickCommand) -> QuickOutcome {
        if self.is_pending() {
            return QuickOutcome::Ignored;
        }
        match command.action() {
            QuickAction::Run(name) => {
                let kind = if command == QuickCommand::Help {
                    LineKind::Success
                } else {
                    LineKind::Input
                };
                self.transcript.push(format!("{PROMPT} {name}"), kind);
                QuickOutcome::Ran(self.interpret(&name))
            }
            QuickAction::Prefill(text) => QuickOutcome::Prefill(text),
        }
    }

    /// The theme shortcut: runs `theme` without echo and without the input
    /// gate, so the pending check inside the command applies.
    pub fn toggle_theme_shortcut(&mut self) -> Vec<ConsoleEffect> {
        self.run_theme()
    }

    /// Parse and run one line. Holds no state of its own beyond what the
    /// individual commands touch.
    pub fn interpret(&mut self, raw: &str) -> Vec<ConsoleEffect> {
        match parse_line(raw) {
            ParsedLine::Empty => {
                self.error("No command entered.");
                Vec::new()
            }
            ParsedLine::Unknown { name } => {
                tracing::debug!(command = %name, "unknown command");
                self.error(format!("Unknown command: {name}"));
                Vec::new()
            }
            ParsedLine::Known { kind, args } => self.run(kind, &args),
        }
    }

    fn run(&mut self, kind: CommandKind, args: &[String]) -> Vec<ConsoleEffect> {
        match kind {
            CommandKind::Help => {
                self.transcript.push(HELP_TEXT, LineKind::Output);
                Vec::new()
            }
            CommandKind::Clear => {
                self.transcript.reset();
                Vec::new()
            }
            CommandKind::Theme => self.run_theme(),
            CommandKind::Login => self.run_login(args),
            CommandKind::Signup => self.run_signup(args),
            CommandKind::Reset => self.run_reset(args),
            CommandKind::Auth => self.run_auth(args),
            CommandKind::Logout => self.run_logout(),
            CommandKind::Passwd => self.run_passwd(args),
        }
    }

    fn run_theme(&mut self) -> Vec<ConsoleEffect> {
        if self.is_pending() {
            self.error("Cannot toggle theme while action pending.");
            return Vec::new();
        }
        self.transcript.push("Theme toggled.", LineKind::Success);
        vec![ConsoleEffect::ToggleTheme]
    }

    fn run_login(&mut self, args: &[String]) -> Vec<ConsoleEffect> {
        let [email, password, ..] = args else {
            self.error("Usage: login <email> <password>");
            return Vec::new();
        };
        if !is_valid_email(email) {
            self.error("Invalid email format.");
            return Vec::new();
        }
        if !meets_login_password_policy(password) {
            self.error("Password must be at least 6 characters.");
            return Vec::new();
        }
        self.begin_blocking(
            PendingKind::Login,
            email,
            password,
            AuthRequest::SignIn(Credentials::new(email.as_str(), password.as_str())),
        )
    }

    fn run_signup(&mut self, args: &[String]) -> Vec<ConsoleEffect> {
        let [email, password, ..] = args else {
            self.error("Usage: signup <email> <password>");
            return Vec::new();
        };
        if !is_valid_email(email) {
            self.error("Invalid email format.");
            return Vec::new();
        }
        if !is_strong_password(password) {
            self.error("Password must be at least 8 characters.");
            return Vec::new();
        }
        self.begin_blocking(
            PendingKind::Signup,
            email,
            password,
            AuthRequest::SignUp(Credentials::new(email.as_str(), password.as_str())),
        )
    }

    fn begin_blocking(
        &mut self,
        kind: PendingKind,
        email: &str,
        password: &str,
        request: AuthRequest,
    ) -> Vec<ConsoleEffect> {
        self.transcript.push(format!("Email: {email}"), LineKind::Output);
        self.transcript
            .push(masked_password_line(password), LineKind::Output);
        self.transcript
            .push(format!("{}.", kind.progress_text()), LineKind::Output);

        let id = self.allocate_request_id();
        self.flow = FlowState::begin(kind, id);
        tracing::info!(request_id = id, kind = kind.label(), "blocking request started");
        vec![
            ConsoleEffect::Dispatch(AuthTicket { id, request }),
            ConsoleEffect::StartProgress,
        ]
    }

    fn run_reset(&mut self, args: &[String]) -> Vec<ConsoleEffect> {
        let Some(email) = args.first() else {
            self.error("Usage: reset <email>");
            return Vec::new();
        };
        if !is_valid_email(email) {
            self.error("Invalid email format.");
            return Vec::new();
        }
        self.transcript
            .push(format!("Sending reset link to {email}..."), LineKind::Output);
        self.detached(AuthRequest::Reset {
            email: email.clone(),
        })
    }

    fn run_auth(&mut self, args: &[String]) -> Vec<ConsoleEffect> {
        let Some(provider) = args.first().and_then(|name| OAuthProvider::parse(name)) else {
            self.error("Usage: auth google | github");
            return Vec::new();
        };
        self.transcript.push(
            format!("Redirecting to {} OAuth...", provider.display_name()),
            LineKind::Output,
        );
        self.detached(AuthRequest::OAuth(provider))
    }

    fn run_logout(&mut self) -> Vec<ConsoleEffect> {
        self.transcript.push("Signing out...", LineKind::Output);
        self.detached(AuthRequest::SignOut)
    }

    fn run_passwd(&mut self, args: &[String]) -> Vec<ConsoleEffect> {
        let Some(access_token) = self.reset_code.clone() else {
            self.error("Invalid or expired reset link.");
            return Vec::new();
        };
        let Some(password) = args.first() else {
            self.error("Usage: passwd <new-password>");
            return Vec::new();
        };
        if !is_strong_password(password) {
            self.error("Password must be at least 8 characters.");
            return Vec::new();
        }
        self.transcript.push("Updating password...", LineKind::Output);
        let id = self.allocate_request_id();
        self.password_update = Some(id);
        self.dispatch_detached(
            id,
            AuthRequest::UpdatePassword {
                access_token,
                password: Password::new(password.as_str()),
            },
        )
    }

    /// Requests that run alongside the console without gating input.
    fn detached(&mut self, request: AuthRequest) -> Vec<ConsoleEffect> {
        let id = self.allocate_request_id();
        self.dispatch_detached(id, request)
    }

    fn dispatch_detached(&mut self, id: u64, request: AuthRequest) -> Vec<ConsoleEffect> {
        tracing::info!(request_id = id, kind = request.label(), "detached request started");
        vec![ConsoleEffect::Dispatch(AuthTicket { id, request })]
    }

    /// Apply a gateway result.
    ///
    /// Results are applied whenever they arrive; there is no staleness check.
    pub fn resolve(&mut self, request_id: u64, result: AuthResult) -> Vec<ConsoleEffect> {
        let owns_pending = self
            .flow
            .pending()
            .is_some_and(|pending| pending.request_id == request_id);

        if owns_pending {
            let transition = self.flow.resolve(&result, &self.landing_path);
            self.flow = transition.state;
            if result.is_idle() {
                self.error("Request finished without a response.");
            } else if let Some(error) = result.error {
                self.transcript.push(error, LineKind::Error);
            } else if let Some(success) = result.success {
                self.transcript.push(success, LineKind::Success);
            }
            tracing::info!(request_id, "blocking request resolved");
            let mut effects = vec![ConsoleEffect::StopProgress];
            if let Some(NavigateTo(path)) = transition.effect {
                effects.push(ConsoleEffect::NavigateTo(path));
            }
            return effects;
        }

        tracing::info!(request_id, "detached request resolved");
        let password_updated = if self.password_update == Some(request_id) {
            self.password_update = None;
            result.is_success()
        } else {
            false
        };
        if let Some(success) = result.success {
            self.transcript.push(success, LineKind::Success);
        }
        if let Some(error) = result.error {
            self.transcript.push(error, LineKind::Error);
        }
        let mut effects: Vec<ConsoleEffect> = result
            .redirect_target
            .map(ConsoleEffect::Redirect)
            .into_iter()
            .collect();
        // The reset link is spent once the new password is accepted.
        if password_updated {
            self.reset_code = None;
            effects.push(ConsoleEffect::NavigateTo(LOGIN_PATH.to_string()));
        }
        effects
    }

    /// Advance the progress ellipsis. Only the newest line is rewritten, and
    /// only while a blocking request is pending and that line is its
    /// progress line. Returns whether anything changed.
    pub fn tick(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        let Some(next) = self
            .transcript
            .last()
            .and_then(|line| next_ellipsis_frame(&line.text))
        else {
            return false;
        };
        self.transcript.replace_last_text(next);
        true
    }

    /// History recall (↑). Suppressed while pending.
    pub fn history_older(&mut self) -> Option<String> {
        if self.is_pending() {
            return None;
        }
        Some(self.history.older())
    }

    /// History recall (↓). Suppressed while pending.
    pub fn history_newer(&mut self) -> Option<String> {
        if self.is_pending() {
            return None;
        }
        Some(self.history.newer())
    }

    fn error(&mut self, message: impl Into<String>) {
        self.transcript.push(message, LineKind::Error);
    }

    fn allocate_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(ConsoleOptions::default())
    }
}
