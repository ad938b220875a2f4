use crate::console::transcript::{LineKind, TranscriptLine};
use crate::console::PROMPT;
use crate::prefs::Theme;
use crate::ui::input_metrics::{display_width, truncate_to_display_width, visible_input_window};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub input: Color,
    pub success: Color,
    pub error: Color,
    pub muted: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: Color::White,
                text: Color::Black,
                input: Color::Blue,
                success: Color::Green,
                error: Color::Red,
                muted: Color::DarkGray,
            },
            Theme::Dark => Self {
                background: Color::Rgb(24, 24, 24),
                text: Color::Gray,
                input: Color::Cyan,
                success: Color::LightGreen,
                error: Color::LightRed,
                muted: Color::DarkGray,
            },
        }
    }

    pub fn line_style(&self, kind: LineKind) -> Style {
        let fg = match kind {
            LineKind::Input => self.input,
            LineKind::Output => self.text,
            LineKind::Success => self.success,
            LineKind::Error => self.error,
        };
        Style::default().fg(fg).bg(self.background)
    }
}

/// Rows a transcript occupies once wrapped to `width` columns.
pub fn transcript_visual_rows(lines: &[TranscriptLine], width: usize) -> usize {
    let width = width.max(1);
    lines
        .iter()
        .flat_map(|line| line.text.split('\n'))
        .map(|segment| display_width(segment).max(1).div_ceil(width))
        .sum()
}

pub fn render_header(frame: &mut Frame<'_>, area: Rect, location: &str, theme: Theme) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let palette = Palette::for_theme(theme);
    let text = format!(" PORTXNECT  {location}  [{}]", theme.as_str());
    frame.render_widget(
        Paragraph::new(truncate_line(&text, area.width as usize)).style(
            Style::default()
                .fg(palette.background)
                .bg(palette.input)
                .add_modifier(Modifier::BOLD),
        ),
        area,
    );
}

/// Draw the transcript bottom-anchored; `scroll_back` counts rows up from
/// the newest line.
pub fn render_transcript(
    frame: &mut Frame<'_>,
    area: Rect,
    lines: &[TranscriptLine],
    scroll_back: usize,
    theme: Theme,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let palette = Palette::for_theme(theme);
    let rendered: Vec<Line<'_>> = lines
        .iter()
        .flat_map(|line| {
            let style = palette.line_style(line.kind);
            line.text
                .split('\n')
                .map(move |segment| Line::styled(segment.to_string(), style))
        })
        .collect();

    let total = transcript_visual_rows(lines, area.width as usize);
    let top = total
        .saturating_sub(area.height as usize)
        .saturating_sub(scroll_back);

    frame.render_widget(
        Paragraph::new(rendered)
            .style(Style::default().bg(palette.background))
            .wrap(Wrap { trim: false })
            .scroll((top.min(u16::MAX as usize) as u16, 0)),
        area,
    );
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str, theme: Theme) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let palette = Palette::for_theme(theme);
    frame.render_widget(
        Paragraph::new(truncate_line(status, area.width as usize))
            .style(Style::default().fg(palette.muted).bg(palette.background)),
        area,
    );
}

pub fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    input: &str,
    cursor_byte: usize,
    theme: Theme,
) {
    let prompt = format!("{PROMPT} ");
    let prompt_width = display_width(&prompt) as u16;
    if area.height == 0 || area.width <= prompt_width {
        return;
    }
    let palette = Palette::for_theme(theme);
    let input_width = (area.width - prompt_width) as usize;
    let (window, cursor_col) = visible_input_window(input, cursor_byte, input_width);

    let line = Line::from(vec![
        Span::styled(
            prompt,
            Style::default()
                .fg(palette.success)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(window, Style::default().fg(palette.text)),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(palette.background)),
        area,
    );

    let cursor_x = area
        .x
        .saturating_add(prompt_width + cursor_col as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, area.y));
}

fn truncate_line(input: &str, width: usize) -> String {
    let width = width.max(1);
    if display_width(input) <= width {
        return input.to_string();
    }
    if width < 4 {
        return truncate_to_display_width(input, width);
    }
    let mut out = truncate_to_display_width(input, width - 3);
    out.push_str("...");
    out
}
