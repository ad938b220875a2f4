use std::collections::VecDeque;

pub const BANNER_TITLE: &str = "PORTXNECT Console — version: dev";
pub const BANNER_HINT: &str = "Type \"help\" for a list of commands.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Echo of submitted input.
    Input,
    Output,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub text: String,
    pub kind: LineKind,
}

impl TranscriptLine {
    pub fn new(text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Append-only log of displayed lines; only `reset` removes anything.
#[derive(Debug, Clone)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            lines: banner_lines(),
        }
    }

    pub fn append(&mut self, line: TranscriptLine) {
        self.lines.push(line);
    }

    pub fn push(&mut self, text: impl Into<String>, kind: LineKind) {
        self.append(TranscriptLine::new(text, kind));
    }

    pub fn reset(&mut self) {
        self.lines = banner_lines();
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptLine> {
        self.lines.last()
    }

    /// Rewrite the text of the newest line. Used only by the progress
    /// indicator; every other line stays untouched.
    pub(crate) fn replace_last_text(&mut self, text: String) {
        if let Some(last) = self.lines.last_mut() {
            last.text = text;
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

fn banner_lines() -> Vec<TranscriptLine> {
    vec![
        TranscriptLine::new(BANNER_TITLE, LineKind::Success),
        TranscriptLine::new(BANNER_HINT, LineKind::Output),
    ]
}

/// Submitted command lines, most recent first, with an up/down recall cursor.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    cursor: Option<usize>,
    limit: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            limit: None,
        }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new()
        }
    }

    pub fn record(&mut self, raw: &str) {
        self.entries.push_front(raw.to_string());
        if let Some(limit) = self.limit {
            self.entries.truncate(limit);
        }
        self.cursor = None;
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Step toward older entries, clamped at the oldest.
    pub fn older(&mut self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let next = match self.cursor {
            None => 0,
            Some(idx) => (idx + 1).min(self.entries.len() - 1),
        };
        self.cursor = Some(next);
        self.entries[next].clone()
    }

    /// Step toward newer entries; past the newest the input becomes empty.
    /// After `help` then `clear`: up, up, down yields `clear`.
    pub fn newer(&mut self) -> String {
        match self.cursor {
            None | Some(0) => {
                self.cursor = None;
                String::new()
            }
            Some(idx) => {
                self.cursor = Some(idx - 1);
                self.entries[idx - 1].clone()
            }
        }
    }

}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}
