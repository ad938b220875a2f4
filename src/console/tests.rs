use super::transcript::{BANNER_HINT, BANNER_TITLE};
use super::*;

fn texts(console: &Console) -> Vec<&str> {
    console
        .transcript()
        .lines()
        .iter()
        .map(|line| line.text.as_str())
        .collect()
}

fn last(console: &Console) -> &TranscriptLine {
    console.transcript().last().expect("transcript never empty")
}

fn dispatched(effects: &[ConsoleEffect]) -> Vec<&AuthTicket> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            ConsoleEffect::Dispatch(ticket) => Some(ticket),
            _ => None,
        })
        .collect()
}

fn ticket_id(effects: &[ConsoleEffect]) -> u64 {
    dispatched(effects).first().expect("dispatch effect").id
}

#[test]
fn test_new_console_shows_banner_only() {
    let console = Console::default();
    assert_eq!(texts(&console), vec![BANNER_TITLE, BANNER_HINT]);
    assert!(!console.is_pending());
}

#[test]
fn test_reset_code_adds_acknowledgement() {
    let console = Console::new(ConsoleOptions {
        reset_code: Some("abc".to_string()),
        ..ConsoleOptions::default()
    });
    assert_eq!(console.transcript().len(), 3);
    assert_eq!(last(&console).kind, LineKind::Success);
    assert!(last(&console).text.starts_with("Password reset token detected."));
}

#[test]
fn test_login_end_to_end_success_navigates_to_dashboard() {
    let mut console = Console::default();
    let effects = console.submit("login a@b.com abcdef");

    assert_eq!(
        &texts(&console)[2..],
        &[
            "portx:$ login ******** ********",
            "Email: a@b.com",
            "Password: ******",
            "Authenticating.",
        ]
    );
    assert!(console.is_pending());
    assert!(effects.contains(&ConsoleEffect::StartProgress));
    let tickets = dispatched(&effects);
    assert_eq!(tickets.len(), 1);
    assert_eq!(
        tickets[0].request,
        AuthRequest::SignIn(Credentials::new("a@b.com", "abcdef"))
    );

    assert!(console.tick());
    assert_eq!(last(&console).text, "Authenticating..");
    assert!(console.tick());
    assert_eq!(last(&console).text, "Authenticating...");
    assert!(console.tick());
    assert_eq!(last(&console).text, "Authenticating.");

    let id = tickets[0].id;
    let effects = console.resolve(id, AuthResult::ok("Logged In Successfully"));
    assert_eq!(
        effects,
        vec![
            ConsoleEffect::StopProgress,
            ConsoleEffect::NavigateTo("/dashboard".to_string()),
        ]
    );
    assert!(!console.is_pending());
    assert_eq!(last(&console).text, "Logged In Successfully");
    assert_eq!(last(&console).kind, LineKind::Success);
    assert!(!console.tick());
}

#[test]
fn test_login_failure_appends_one_error_and_returns_idle() {
    let mut console = Console::default();
    let effects = console.submit("login a@b.com abcdef");
    let before = console.transcript().len();

    let effects = console.resolve(ticket_id(&effects), AuthResult::failed("Invalid login credentials"));
    assert_eq!(effects, vec![ConsoleEffect::StopProgress]);
    assert_eq!(console.transcript().len(), before + 1);
    assert_eq!(last(&console).kind, LineKind::Error);
    assert_eq!(last(&console).text, "Invalid login credentials");
    assert!(!console.is_pending());
}

#[test]
fn test_empty_result_for_pending_login_reports_error() {
    let mut console = Console::default();
    let effects = console.submit("login a@b.com abcdef");

    let effects = console.resolve(ticket_id(&effects), AuthResult::idle());
    assert_eq!(effects, vec![ConsoleEffect::StopProgress]);
    assert_eq!(last(&console).text, "Request finished without a response.");
    assert_eq!(last(&console).kind, LineKind::Error);
    assert!(!console.is_pending());
}

#[test]
fn test_login_short_password_never_dispatches() {
    let mut console = Console::default();
    let effects = console.submit("login a@b.com abcde");
    assert!(effects.is_empty());
    assert!(!console.is_pending());
    assert_eq!(last(&console).text, "Password must be at least 6 characters.");
    assert_eq!(last(&console).kind, LineKind::Error);
}

#[test]
fn test_signup_threshold_is_eight() {
    let mut console = Console::default();
    let effects = console.submit("signup x@y.com short");
    assert!(effects.is_empty());
    assert!(!console.is_pending());
    assert_eq!(last(&console).text, "Password must be at least 8 characters.");

    assert!(console.submit("signup x@y.com abcdefg").is_empty());
    assert_eq!(last(&console).text, "Password must be at least 8 characters.");

    let effects = console.submit("signup x@y.com abcdefgh");
    assert_eq!(dispatched(&effects).len(), 1);
    assert!(console.is_pending());
    assert_eq!(last(&console).text, "Creating account.");
}

#[test]
fn test_signup_success_does_not_navigate() {
    let mut console = Console::default();
    let effects = console.submit("signup x@y.com abcdefgh");
    let effects = console.resolve(
        ticket_id(&effects),
        AuthResult::ok("Please check your email for confirmation"),
    );
    assert_eq!(effects, vec![ConsoleEffect::StopProgress]);
    assert_eq!(last(&console).text, "Please check your email for confirmation");
}

#[test]
fn test_pending_rejects_second_submission() {
    let mut console = Console::default();
    console.submit("login a@b.com abcdef");
    let len = console.transcript().len();

    assert!(console.submit("signup x@y.com abcdefgh").is_empty());
    assert!(console.submit("login c@d.com abcdef").is_empty());
    assert_eq!(console.transcript().len(), len);
    assert_eq!(console.history().len(), 1);
    assert_eq!(console.history_older(), None);
    assert_eq!(console.quick(QuickCommand::Help), QuickOutcome::Ignored);
}

#[test]
fn test_theme_shortcut_refuses_while_pending() {
    let mut console = Console::default();
    console.submit("login a@b.com abcdef");
    assert!(console.toggle_theme_shortcut().is_empty());
    assert_eq!(last(&console).text, "Cannot toggle theme while action pending.");

    let mut idle = Console::default();
    assert_eq!(idle.submit("theme"), vec![ConsoleEffect::ToggleTheme]);
    assert_eq!(last(&idle).text, "Theme toggled.");
}

#[test]
fn test_tick_only_touches_progress_line() {
    let mut console = Console::default();
    console.submit("login a@b.com abcdef");
    console.note("something else", LineKind::Output);
    let snapshot: Vec<String> = texts(&console).iter().map(|s| s.to_string()).collect();

    assert!(!console.tick());
    let after: Vec<String> = texts(&console).iter().map(|s| s.to_string()).collect();
    assert_eq!(snapshot, after);
}

#[test]
fn test_clear_restores_banner() {
    let mut console = Console::default();
    console.submit("help");
    console.submit("foobar");
    console.submit("clear");
    assert_eq!(texts(&console), vec![BANNER_TITLE, BANNER_HINT]);
}

#[test]
fn test_reset_validates_email_and_runs_detached() {
    let mut console = Console::default();
    assert!(console.submit("reset bademail").is_empty());
    assert_eq!(last(&console).text, "Invalid email format.");

    assert!(console.submit("reset").is_empty());
    assert_eq!(last(&console).text, "Usage: reset <email>");

    let effects = console.submit("reset a@b.com");
    assert!(!console.is_pending());
    assert_eq!(last(&console).text, "Sending reset link to a@b.com...");
    let id = ticket_id(&effects);

    let effects = console.resolve(id, AuthResult::ok("Password reset email sent successfully"));
    assert!(effects.is_empty());
    assert_eq!(last(&console).text, "Password reset email sent successfully");
}

#[test]
fn test_unknown_command_reports_error() {
    let mut console = Console::default();
    assert!(console.submit("foobar").is_empty());
    assert_eq!(last(&console).text, "Unknown command: foobar");
    assert_eq!(last(&console).kind, LineKind::Error);
}

#[test]
fn test_auth_requires_known_provider() {
    let mut console = Console::default();
    assert!(console.submit("auth gitlab").is_empty());
    assert_eq!(last(&console).text, "Usage: auth google | github");

    let effects = console.submit("auth GitHub");
    assert_eq!(last(&console).text, "Redirecting to GitHub OAuth...");
    assert!(!console.is_pending());
    let id = ticket_id(&effects);

    let effects = console.resolve(
        id,
        AuthResult::redirect("OAuth initiated", "https://auth.example/authorize"),
    );
    assert_eq!(
        effects,
        vec![ConsoleEffect::Redirect("https://auth.example/authorize".to_string())]
    );
    assert_eq!(last(&console).text, "OAuth initiated");
}

#[test]
fn test_oauth_without_url_degrades_to_success_message() {
    let mut console = Console::default();
    let effects = console.submit("auth google");
    let effects = console.resolve(
        ticket_id(&effects),
        AuthResult::ok("Successfully initiated google authentication"),
    );
    assert!(effects.is_empty());
    assert_eq!(last(&console).text, "Successfully initiated google authentication");
}

#[test]
fn test_stale_detached_result_is_still_applied_while_pending() {
    let mut console = Console::default();
    let reset = console.submit("reset a@b.com");
    let login = console.submit("login a@b.com abcdef");

    let effects = console.resolve(ticket_id(&reset), AuthResult::failed("rate limited"));
    assert!(effects.is_empty());
    assert!(console.is_pending());
    assert_eq!(last(&console).text, "rate limited");
    assert!(!console.tick());

    console.resolve(ticket_id(&login), AuthResult::ok("Logged In Successfully"));
    assert!(!console.is_pending());
}

#[test]
fn test_passwd_requires_reset_code() {
    let mut console = Console::default();
    assert!(console.submit("passwd newpassword1").is_empty());
    assert_eq!(last(&console).text, "Invalid or expired reset link.");

    let mut console = Console::new(ConsoleOptions {
        reset_code: Some("code-123".to_string()),
        ..ConsoleOptions::default()
    });
    assert!(console.submit("passwd short").is_empty());
    assert_eq!(last(&console).text, "Password must be at least 8 characters.");

    let effects = console.submit("passwd newpassword1");
    let tickets = dispatched(&effects);
    assert_eq!(
        tickets[0].request,
        AuthRequest::UpdatePassword {
            access_token: "code-123".to_string(),
            password: Password::new("newpassword1"),
        }
    );
    assert!(texts(&console).contains(&"portx:$ passwd ********"));
}

#[test]
fn test_passwd_success_returns_to_login() {
    let mut console = Console::new(ConsoleOptions {
        reset_code: Some("code-123".to_string()),
        ..ConsoleOptions::default()
    });
    let failed = console.submit("passwd newpassword1");
    let effects = console.resolve(ticket_id(&failed), AuthResult::failed("Token has expired"));
    assert!(effects.is_empty());

    let updated = console.submit("passwd newpassword2");
    let reset = console.submit("reset a@b.com");
    let effects = console.resolve(ticket_id(&reset), AuthResult::ok("Password reset email sent successfully"));
    assert!(effects.is_empty());

    let effects = console.resolve(ticket_id(&updated), AuthResult::ok("Password updated successfully!"));
    assert_eq!(effects, vec![ConsoleEffect::NavigateTo("/Login".to_string())]);
    assert_eq!(last(&console).text, "Password updated successfully!");

    assert!(console.submit("passwd newpassword3").is_empty());
    assert_eq!(last(&console).text, "Invalid or expired reset link.");
}

#[test]
fn test_history_recall_after_help_and_clear() {
    let mut console = Console::default();
    console.submit("help");
    console.submit("clear");

    assert_eq!(console.history_older().as_deref(), Some("clear"));
    assert_eq!(console.history_older().as_deref(), Some("help"));
    assert_eq!(console.history_newer().as_deref(), Some("clear"));
    assert_eq!(console.history_newer().as_deref(), Some(""));
}

#[test]
fn test_quick_commands_echo_and_prefill() {
    let mut console = Console::default();
    let outcome = console.quick(QuickCommand::Help);
    assert_eq!(outcome, QuickOutcome::Ran(Vec::new()));
    assert!(texts(&console).contains(&"portx:$ help"));
    assert_eq!(last(&console).text, command::HELP_TEXT);

    assert_eq!(
        console.quick(QuickCommand::Signup),
        QuickOutcome::Prefill("signup ".to_string())
    );
    assert_eq!(
        console.quick(QuickCommand::Theme),
        QuickOutcome::Ran(vec![ConsoleEffect::ToggleTheme])
    );
}

#[test]
fn test_blank_submission_is_ignored() {
    let mut console = Console::default();
    assert!(console.submit("   ").is_empty());
    assert_eq!(console.transcript().len(), 2);
    assert!(console.history().is_empty());
    console.interpret("");
    assert_eq!(last(&console).text, "No command entered.");
}

#[test]
fn test_history_is_recorded_raw_including_secrets() {
    let mut console = Console::default();
    console.submit("login a@b.com abcdef");
    assert_eq!(
        console.history().entries().collect::<Vec<_>>(),
        vec!["login a@b.com abcdef"]
    );
}
