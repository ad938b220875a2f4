use crate::util::mask_secret;

pub const PROMPT: &str = "portx:$";

pub const HELP_TEXT: &str = "Available commands:
help - show this list
login <email> <password> - login user
signup <email> <password> - create account
reset <email> - send password reset
auth google/github - authenticate with OAuth
logout - end the current session
passwd <new-password> - set a new password from a reset link
theme - toggle theme
clear - clear console";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    Clear,
    Theme,
    Login,
    Signup,
    Reset,
    Auth,
    Logout,
    Passwd,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::Help,
        CommandKind::Clear,
        CommandKind::Theme,
        CommandKind::Login,
        CommandKind::Signup,
        CommandKind::Reset,
        CommandKind::Auth,
        CommandKind::Logout,
        CommandKind::Passwd,
    ];

    /// Case-insensitive; unknown names are `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let folded = name.to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.name() == folded)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Clear => "clear",
            Self::Theme => "theme",
            Self::Login => "login",
            Self::Signup => "signup",
            Self::Reset => "reset",
            Self::Auth => "auth",
            Self::Logout => "logout",
            Self::Passwd => "passwd",
        }
    }

    /// Number of leading arguments that are secrets and must not be echoed.
    fn secret_args(self) -> Option<usize> {
        match self {
            Self::Login | Self::Signup => Some(2),
            Self::Passwd => Some(1),
            _ => None,
        }
    }
}

/// A tokenized input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Empty,
    Known { kind: CommandKind, args: Vec<String> },
    Unknown { name: String },
}

pub fn parse_line(line: &str) -> ParsedLine {
    let mut parts = line.split_whitespace();
    let Some(first) = parts.next() else {
        return ParsedLine::Empty;
    };
    let name = first.to_lowercase();
    match CommandKind::parse(&name) {
        Some(kind) => ParsedLine::Known {
            kind,
            args: parts.map(str::to_string).collect(),
        },
        None => ParsedLine::Unknown { name },
    }
}

/// The transcript echo for a submitted line, with credentials blanked out.
/// Each secret argument becomes a fixed-width placeholder.
pub fn echo_line(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut parts = trimmed.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg_count = parts.count();

    if let Some(kind) = CommandKind::parse(name) {
        if let Some(secret_args) = kind.secret_args() {
            if arg_count >= secret_args {
                let masked = vec!["********"; secret_args].join(" ");
                return format!("{PROMPT} {} {masked}", kind.name());
            }
        }
    }
    format!("{PROMPT} {raw}")
}

pub fn masked_password_line(password: &str) -> String {
    format!("Password: {}", mask_secret(password))
}

/// Shortcut buttons: some run at once, the rest pre-fill the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickCommand {
    Help,
    Login,
    Signup,
    Clear,
    Reset,
    Theme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickAction {
    Run(String),
    Prefill(String),
}

impl QuickCommand {
    pub fn kind(self) -> CommandKind {
        match self {
            Self::Help => CommandKind::Help,
            Self::Login => CommandKind::Login,
            Self::Signup => CommandKind::Signup,
            Self::Clear => CommandKind::Clear,
            Self::Reset => CommandKind::Reset,
            Self::Theme => CommandKind::Theme,
        }
    }

    pub fn action(self) -> QuickAction {
        let name = self.kind().name();
        match self {
            Self::Help | Self::Clear | Self::Theme => QuickAction::Run(name.to_string()),
            Self::Login | Self::Signup | Self::Reset => QuickAction::Prefill(format!("{name} ")),
        }
    }
}
