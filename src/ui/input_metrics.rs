use unicode_width::UnicodeWidthChar;

/// Slice of a single-line input that fits `width` columns with the cursor
/// visible, plus the cursor column inside that slice.
pub fn visible_input_window(input: &str, cursor_byte: usize, width: usize) -> (String, usize) {
    let width = width.max(1);
    let cursor_byte = clamp_to_char_boundary_left(input, cursor_byte);
    let before = &input[..cursor_byte];

    let mut skipped_width = display_width(before).saturating_sub(width - 1);
    let mut start = 0usize;
    for (idx, ch) in before.char_indices() {
        if skipped_width == 0 {
            break;
        }
        let ch_width = char_display_width(ch);
        skipped_width = skipped_width.saturating_sub(ch_width);
        start = idx + ch.len_utf8();
    }

    let window = truncate_to_display_width(&input[start..], width);
    let cursor_col = display_width(&input[start..cursor_byte]);
    (window, cursor_col)
}

pub fn truncate_to_display_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > max_width && used > 0 {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

pub fn clamp_to_char_boundary_left(input: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(input.len());
    while cursor > 0 && !input.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}
