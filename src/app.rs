//! The interactive shell around [`Console`]: terminal input, rendering,
//! gateway tasks and the progress ticker.

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth::{AuthGateway, AuthResult, SupabaseGateway};
use crate::config::Config;
use crate::console::transcript::LineKind;
use crate::console::{AuthTicket, Console, ConsoleEffect, ConsoleOptions, QuickOutcome};
use crate::prefs::{PrefsStore, Theme};
use crate::terminal::{self, ConsoleTerminal, TerminalGuard};
use crate::ui::editor::{InputAction, InputEditor};
use crate::ui::layout::split_console_layout;
use crate::ui::render::{
    render_header, render_input, render_status_line, render_transcript, transcript_visual_rows,
};

const UI_TICK_INTERVAL: Duration = Duration::from_millis(50);
const SCROLL_STEP: usize = 5;
const CONSOLE_LOCATION: &str = "/";

#[derive(Debug)]
pub enum UiUpdate {
    AuthResolved { id: u64, result: AuthResult },
    ProgressTick,
    CurrentUser(Option<String>),
}

pub struct App {
    console: Console,
    prefs: PrefsStore,
    gateway: Arc<dyn AuthGateway>,
    editor: InputEditor,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
    update_rx: mpsc::UnboundedReceiver<UiUpdate>,
    progress: Option<CancellationToken>,
    progress_interval: Duration,
    location: String,
    dashboard_path: String,
    in_flight: usize,
    scroll_back: usize,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let gateway = Arc::new(SupabaseGateway::new(config)?);
        let prefs = PrefsStore::open(config.prefs_path.clone());
        Ok(Self::with_parts(config, gateway, prefs))
    }

    pub fn with_parts(config: &Config, gateway: Arc<dyn AuthGateway>, prefs: PrefsStore) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let console = Console::new(ConsoleOptions {
            landing_path: config.dashboard_path.clone(),
            history_limit: Some(config.history_limit).filter(|limit| *limit > 0),
            reset_code: config.reset_code.clone(),
        });
        Self {
            console,
            prefs,
            gateway,
            editor: InputEditor::new(),
            update_tx,
            update_rx,
            progress: None,
            progress_interval: config.progress_interval,
            location: CONSOLE_LOCATION.to_string(),
            dashboard_path: config.dashboard_path.clone(),
            in_flight: 0,
            scroll_back: 0,
            should_quit: false,
        }
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn editor(&self) -> &InputEditor {
        &self.editor
    }

    pub fn theme(&self) -> Theme {
        self.prefs.theme()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn progress_running(&self) -> bool {
        self.progress.is_some()
    }

    pub fn status_line(&self) -> String {
        let state = match self.console.flow().pending() {
            Some(pending) => format!("pending:{}", pending.kind.label()),
            None => "idle".to_string(),
        };
        let mut status = format!(
            "{state} | history:{} | requests:{}",
            self.console.history().len(),
            self.in_flight
        );
        if self.scroll_back > 0 {
            status.push_str(" | scrolled");
        }
        status
    }

    /// Submit one line as if typed and confirmed with Enter.
    pub fn submit_line(&mut self, raw: &str) {
        let effects = self.console.submit(raw);
        self.scroll_back = 0;
        self.apply_effects(effects);
    }

    pub fn handle_event(&mut self, event: Event) {
        let action = self.editor.apply_event(event, self.console.is_pending());
        self.handle_action(action);
    }

    pub fn handle_action(&mut self, action: InputAction) {
        match action {
            InputAction::None => {}
            InputAction::Submit(raw) => self.submit_line(&raw),
            InputAction::HistoryOlder => {
                if let Some(text) = self.console.history_older() {
                    self.editor.set_text(&text);
                }
            }
            InputAction::HistoryNewer => {
                if let Some(text) = self.console.history_newer() {
                    self.editor.set_text(&text);
                }
            }
            InputAction::Quick(command) => match self.console.quick(command) {
                QuickOutcome::Ignored => {}
                QuickOutcome::Ran(effects) => {
                    self.scroll_back = 0;
                    self.apply_effects(effects);
                }
                QuickOutcome::Prefill(text) => self.editor.set_text(&text),
            },
            InputAction::ToggleTheme => {
                let effects = self.console.toggle_theme_shortcut();
                self.apply_effects(effects);
            }
            InputAction::ScrollUp => {
                self.scroll_back = self.scroll_back.saturating_add(SCROLL_STEP);
            }
            InputAction::ScrollDown => {
                self.scroll_back = self.scroll_back.saturating_sub(SCROLL_STEP);
            }
            InputAction::Quit => self.should_quit = true,
        }
    }

    pub fn handle_update(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::AuthResolved { id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let effects = self.console.resolve(id, result);
                self.apply_effects(effects);
            }
            UiUpdate::ProgressTick => {
                self.console.tick();
            }
            UiUpdate::CurrentUser(email) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let greeting = match email {
                    Some(email) => format!("Welcome to Dashboard {email}"),
                    None => "Welcome to Dashboard".to_string(),
                };
                self.console.note(greeting, LineKind::Success);
            }
        }
    }

    /// Wait for the next update from a gateway task or the ticker.
    pub async fn next_update(&mut self) -> Option<UiUpdate> {
        self.update_rx.recv().await
    }

    fn apply_effects(&mut self, effects: Vec<ConsoleEffect>) {
        for effect in effects {
            match effect {
                ConsoleEffect::Dispatch(ticket) => self.dispatch(ticket),
                ConsoleEffect::ToggleTheme => match self.prefs.toggle_theme() {
                    Ok(theme) => tracing::info!(theme = theme.as_str(), "theme changed"),
                    Err(error) => {
                        tracing::warn!(error = %error, "failed to persist theme");
                        self.console
                            .note("Theme preference could not be saved.", LineKind::Error);
                    }
                },
                ConsoleEffect::StartProgress => self.start_progress(),
                ConsoleEffect::StopProgress => self.stop_progress(),
                ConsoleEffect::NavigateTo(path) => self.navigate(path),
                ConsoleEffect::Redirect(url) => {
                    tracing::info!(url = %url, "oauth redirect ready");
                    self.console
                        .note(format!("Open this URL to continue: {url}"), LineKind::Output);
                }
            }
        }
    }

    fn dispatch(&mut self, ticket: AuthTicket) {
        self.in_flight += 1;
        let gateway = Arc::clone(&self.gateway);
        let update_tx = self.update_tx.clone();
        tokio::spawn(async move {
            let AuthTicket { id, request } = ticket;
            tracing::debug!(request_id = id, request = ?request, "dispatching");
            let result = request.dispatch(gateway.as_ref()).await;
            let _ = update_tx.send(UiUpdate::AuthResolved { id, result });
        });
    }

    fn start_progress(&mut self) {
        self.stop_progress();
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let update_tx = self.update_tx.clone();
        let period = self.progress_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if update_tx.send(UiUpdate::ProgressTick).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.progress = Some(token);
    }

    fn stop_progress(&mut self) {
        if let Some(token) = self.progress.take() {
            token.cancel();
        }
    }

    fn navigate(&mut self, path: String) {
        tracing::info!(path = %path, "navigating");
        self.location = path;
        if self.location != self.dashboard_path {
            return;
        }
        self.in_flight += 1;
        let gateway = Arc::clone(&self.gateway);
        let update_tx = self.update_tx.clone();
        tokio::spawn(async move {
            let email = gateway.current_user().await;
            let _ = update_tx.send(UiUpdate::CurrentUser(email));
        });
    }

    pub async fn run(&mut self) -> Result<()> {
        let outcome = if terminal::is_interactive() {
            self.run_tui().await
        } else {
            self.run_lines().await
        };
        self.stop_progress();
        outcome
    }

    async fn run_tui(&mut self) -> Result<()> {
        let mut guard = TerminalGuard::enter()?;
        let mut tick = tokio::time::interval(UI_TICK_INTERVAL);

        while !self.should_quit {
            self.draw(guard.terminal_mut())?;
            self.process_terminal_events()?;

            tokio::select! {
                _ = tick.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
                update = self.update_rx.recv() => {
                    if let Some(update) = update {
                        self.handle_update(update);
                    }
                }
            }
        }

        Ok(())
    }

    fn process_terminal_events(&mut self) -> Result<()> {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Release => {}
                other => self.handle_event(other),
            }
        }
        Ok(())
    }

    fn draw(&mut self, terminal: &mut ConsoleTerminal) -> Result<()> {
        let size = terminal.size()?;
        let transcript_rows = size.height.saturating_sub(3) as usize;
        let max_scroll = transcript_visual_rows(self.console.transcript().lines(), size.width as usize)
            .saturating_sub(transcript_rows);
        self.scroll_back = self.scroll_back.min(max_scroll);

        let status = self.status_line();
        let theme = self.prefs.theme();
        let lines = self.console.transcript().lines();
        let location = self.location.as_str();
        let input = self.editor.buffer();
        let cursor = self.editor.cursor();
        let scroll_back = self.scroll_back;

        terminal.draw(|frame| {
            let panes = split_console_layout(frame.area());
            render_header(frame, panes.header, location, theme);
            render_transcript(frame, panes.transcript, lines, scroll_back, theme);
            render_status_line(frame, panes.status, &status, theme);
            render_input(frame, panes.input, input, cursor, theme);
        })?;
        Ok(())
    }

    /// Line-oriented mode for piped stdin: one command per line, new
    /// transcript lines printed as they appear.
    async fn run_lines(&mut self) -> Result<()> {
        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut printed = 0usize;

        while !self.should_quit {
            printed = self.flush_lines(printed)?;

            if self.in_flight > 0 {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => self.should_quit = true,
                    update = self.update_rx.recv() => {
                        if let Some(update) = update {
                            self.handle_update(update);
                        }
                    }
                }
                continue;
            }

            tokio::select! {
                _ = tokio::signal::ctrl_c() => self.should_quit = true,
                line = stdin.next_line() => match line? {
                    Some(line) => self.submit_line(&line),
                    None => self.should_quit = true,
                },
            }
        }

        self.flush_lines(printed)?;
        Ok(())
    }

    fn flush_lines(&self, printed: usize) -> Result<usize> {
        let lines = self.console.transcript().lines();
        // `clear` shrinks the transcript; print the banner again.
        let start = if lines.len() < printed { 0 } else { printed };
        let mut out = std::io::stdout().lock();
        for line in &lines[start..] {
            writeln!(out, "{}", line.text)?;
        }
        out.flush()?;
        Ok(lines.len())
    }
}
