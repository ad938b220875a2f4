use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsoleLayout {
    pub header: Rect,
    pub transcript: Rect,
    pub status: Rect,
    pub input: Rect,
}

pub fn split_console_layout(area: Rect) -> ConsoleLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    ConsoleLayout {
        header: chunks[0],
        transcript: chunks[1],
        status: chunks[2],
        input: chunks[3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_splits_into_four_rows() {
        let area = Rect::new(0, 0, 80, 20);
        let panes = split_console_layout(area);

        assert_eq!(panes.header.height, 1);
        assert_eq!(panes.transcript.height, 17);
        assert_eq!(panes.status.height, 1);
        assert_eq!(panes.input.height, 1);
        assert_eq!(panes.transcript.y, 1);
        assert_eq!(panes.status.y, 18);
        assert_eq!(panes.input.y, 19);
    }

    #[test]
    fn layout_keeps_transcript_on_tiny_terminals() {
        let panes = split_console_layout(Rect::new(0, 0, 40, 4));
        assert_eq!(panes.transcript.height, 1);
        assert_eq!(panes.input.y, 3);
    }
}
