use crate::console::command::QuickCommand;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSnapshot {
    pub buffer: String,
    pub cursor: usize,
}

/// Single-line command editor. Command history lives in the console, so
/// ↑/↓ are reported back to the caller instead of handled here.
#[derive(Default, Debug)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    undo_stack: Vec<EditorSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    None,
    Submit(String),
    HistoryOlder,
    HistoryNewer,
    Quick(QuickCommand),
    ToggleTheme,
    ScrollUp,
    ScrollDown,
    Quit,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn clamp_cursor_to_boundary_left(&self, mut idx: usize) -> usize {
        idx = idx.min(self.buffer.len());
        while idx > 0 && !self.buffer.is_char_boundary(idx) {
            idx -= 1;
        }
        idx
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let i = self.clamp_cursor_to_boundary_left(idx);
        if i == 0 {
            return 0;
        }
        let mut j = i - 1;
        while j > 0 && !self.buffer.is_char_boundary(j) {
            j -= 1;
        }
        j
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let i = self.clamp_cursor_to_boundary_left(idx);
        match self.buffer[i..].chars().next() {
            Some(ch) => i + ch.len_utf8(),
            None => self.buffer.len(),
        }
    }

    fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            buffer: self.buffer.clone(),
            cursor: self.cursor,
        }
    }

    fn push_undo(&mut self) {
        self.undo_stack.push(self.snapshot());
    }

    pub fn undo(&mut self) {
        if let Some(previous) = self.undo_stack.pop() {
            self.buffer = previous.buffer;
            self.cursor = self.clamp_cursor_to_boundary_left(previous.cursor);
        }
    }

    /// Replace the whole line, cursor at the end. Used for history recall
    /// and quick-command pre-fill.
    pub fn set_text(&mut self, value: &str) {
        self.push_undo();
        self.buffer = value.replace(['\r', '\n'], " ");
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn insert_str(&mut self, value: &str) {
        let value = value.replace(['\r', '\n'], " ");
        if value.is_empty() {
            return;
        }
        let cursor = self.clamp_cursor_to_boundary_left(self.cursor);
        self.push_undo();
        self.buffer.insert_str(cursor, &value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        let end = self.clamp_cursor_to_boundary_left(self.cursor);
        if end == 0 {
            return;
        }
        let start = self.prev_char_boundary(end);
        self.push_undo();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = self.clamp_cursor_to_boundary_left(self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        let end = self.next_char_boundary(start);
        self.push_undo();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    /// Take the line for submission. Blank lines stay in the editor.
    pub fn submit(&mut self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        let value = std::mem::take(&mut self.buffer);
        self.cursor = 0;
        self.undo_stack.clear();
        Some(value)
    }

    /// Apply a terminal event. When `locked` is set (a blocking request is
    /// in flight) edits, submissions and history keys are dropped; quit,
    /// scroll, theme and quick-command keys still pass through.
    pub fn apply_event(&mut self, event: Event, locked: bool) -> InputAction {
        match event {
            Event::Paste(text) if !locked => {
                self.insert_str(&text);
                InputAction::None
            }
            Event::Key(key) => self.apply_key(key, locked),
            _ => InputAction::None,
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent, locked: bool) -> InputAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return InputAction::Quit,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    return InputAction::Quit;
                }
            }
            KeyCode::Char('t') if ctrl => return InputAction::ToggleTheme,
            KeyCode::PageUp => return InputAction::ScrollUp,
            KeyCode::PageDown => return InputAction::ScrollDown,
            KeyCode::F(n) => {
                return match quick_command_for_key(n) {
                    Some(command) => InputAction::Quick(command),
                    None => InputAction::None,
                }
            }
            _ => {}
        }

        if locked {
            return InputAction::None;
        }

        match key.code {
            KeyCode::Char('z') if ctrl => self.undo(),
            KeyCode::Char('u') if ctrl => {
                self.push_undo();
                self.clear();
            }
            KeyCode::Enter => {
                if let Some(value) = self.submit() {
                    return InputAction::Submit(value);
                }
            }
            KeyCode::Esc => {
                if self.buffer.is_empty() {
                    return InputAction::Quit;
                }
                self.push_undo();
                self.clear();
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.prev_char_boundary(self.cursor),
            KeyCode::Right => self.cursor = self.next_char_boundary(self.cursor),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Up => return InputAction::HistoryOlder,
            KeyCode::Down => return InputAction::HistoryNewer,
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut encoded = [0u8; 4];
                self.insert_str(ch.encode_utf8(&mut encoded));
            }
            _ => {}
        }

        InputAction::None
    }
}

/// F1 help, F2 login, F3 signup, F4 reset, F5 clear, F6 theme.
pub fn quick_command_for_key(n: u8) -> Option<QuickCommand> {
    match n {
        1 => Some(QuickCommand::Help),
        2 => Some(QuickCommand::Login),
        3 => Some(QuickCommand::Signup),
        4 => Some(QuickCommand::Reset),
        5 => Some(QuickCommand::Clear),
        6 => Some(QuickCommand::Theme),
        _ => None,
    }
}
