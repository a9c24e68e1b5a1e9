//! Rustc-like source excerpts for error messages.

use annotate_snippets::{
    AnnotationKind, Level, Renderer, Snippet as AnnotateSnippet, renderer::DecorStyle,
};

use crate::location::Location;

/// Lines shown on each side of the error line.
const CONTEXT_LINES: usize = 2;

/// Render a window of `text` around `location` with a caret and `msg` as label.
///
/// Returns `None` when the location is unknown or does not fall inside `text`.
#[cold]
#[inline(never)]
pub(crate) fn render(text: &str, location: &Location, msg: &str, crop_radius: usize) -> Option<String> {
    if location == &Location::UNKNOWN || text.is_empty() {
        return None;
    }
    let offset = location.byte_offset as usize;
    if offset > text.len() || !text.is_char_boundary(offset) {
        return None;
    }

    let starts = line_starts(text);
    let row = starts.partition_point(|&s| s <= offset);
    let col = location.column as usize;
    if row == 0 || row != location.line as usize {
        return None;
    }

    let first_row = row.saturating_sub(CONTEXT_LINES).max(1);
    let last_row = row.saturating_add(CONTEXT_LINES).min(starts.len());

    let mut window = String::new();
    let mut span = 0..0;
    for r in first_row..=last_row {
        let line = line_text(text, &starts, r);
        let (rendered, caret) = crop_line(line, col, crop_radius);
        if r > first_row {
            window.push('\n');
        }
        if r == row {
            let local = byte_of_char(&rendered, caret);
            let width = rendered[local..].chars().next().map_or(0, char::len_utf8);
            span = window.len() + local..window.len() + local + width;
        }
        window.push_str(&rendered);
    }

    let report = &[Level::ERROR
        .primary_title(format!("line {row} column {col}: {msg}"))
        .element(
            AnnotateSnippet::source(&window)
                .line_start(first_row)
                .path("<input>")
                .fold(false)
                .annotation(AnnotationKind::Primary.span(span).label(msg)),
        )];

    // Plain ASCII keeps error strings free of escape sequences.
    let renderer = Renderer::plain().decor_style(DecorStyle::Ascii);
    Some(format!("{}", renderer.render(report)))
}

/// Byte offsets of every line start. A trailing newline opens one more, empty line.
fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0usize];
    starts.extend(
        source
            .bytes()
            .enumerate()
            .filter(|&(_, b)| b == b'\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

/// Text of 1-based line `row` without its line terminator.
fn line_text<'a>(source: &'a str, starts: &[usize], row: usize) -> &'a str {
    let begin = starts[row - 1];
    let end = starts.get(row).map_or(source.len(), |next| next - 1);
    let line = &source[begin..end];
    line.strip_suffix('\r').unwrap_or(line)
}

/// Sanitize one line and crop it to `crop_radius` columns around `col`.
///
/// Returns the rendered line and the character index `col` maps to in it.
fn crop_line(line: &str, col: usize, crop_radius: usize) -> (String, usize) {
    let chars: Vec<char> = line
        .chars()
        .map(|c| if c.is_control() && c != '\t' { ' ' } else { c })
        .collect();
    let caret = col.saturating_sub(1);
    let len = chars.len();

    let left = col.saturating_sub(crop_radius).max(1);
    let right = col.saturating_add(crop_radius);
    // Short context lines stay intact rather than cropping to nothing.
    if crop_radius == 0 || left > len || (left <= 1 && right >= len) {
        return (chars.into_iter().collect(), caret);
    }

    let mut out = String::new();
    if left > 1 {
        out.push('…');
    }
    out.extend(&chars[left - 1..right.min(len)]);
    if right < len {
        out.push('…');
    }
    let shift = usize::from(left > 1);
    (out, col.saturating_sub(left) + shift)
}

/// Byte offset of character index `idx` in `s`, or `s.len()` past the end.
fn byte_of_char(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str, offset: usize) -> Location {
        Location::from_offset(text.as_bytes(), offset)
    }

    #[test]
    fn renders_window_with_caret() {
        let text = "<plist>\n<dict>\n<bogus>\n</dict>\n</plist>\n";
        let offset = text.find("<bogus>").unwrap();
        let out = render(text, &at(text, offset), "unexpected tag", 64).expect("snippet");
        assert!(out.contains("line 3 column 1: unexpected tag"), "{out}");
        assert!(out.contains("<bogus>"), "{out}");
        assert!(out.contains('^'), "{out}");
    }

    #[test]
    fn window_is_limited_to_neighbouring_lines() {
        let text = "l1\nl2\nl3\nl4\nl5\nl6\nl7\n";
        let offset = text.find("l4").unwrap();
        let out = render(text, &at(text, offset), "here", 64).expect("snippet");
        assert!(out.contains("l2") && out.contains("l6"), "{out}");
        assert!(!out.contains("l1") && !out.contains("l7"), "{out}");
    }

    #[test]
    fn long_lines_are_cropped() {
        let text = format!("{}<x>{}", "a".repeat(300), "b".repeat(300));
        let out = render(&text, &at(&text, 300), "here", 10).expect("snippet");
        assert!(out.contains('…'), "{out}");
        assert!(!out.contains(&"a".repeat(20)), "{out}");
        assert!(!out.contains(&"b".repeat(20)), "{out}");
        assert!(out.contains("<x>"), "{out}");
    }

    #[test]
    fn end_of_input_is_renderable() {
        let text = "<plist>\n<dict>\n";
        let out = render(text, &at(text, text.len()), "unexpected end of input", 64);
        assert!(out.is_some());
    }

    #[test]
    fn unknown_location_renders_nothing() {
        assert!(render("<plist/>", &Location::UNKNOWN, "x", 64).is_none());
    }

    #[test]
    fn crop_line_keeps_caret_aligned() {
        let (line, caret) = crop_line("0123456789", 6, 2);
        assert_eq!(line, "…34567…");
        assert_eq!(line.chars().nth(caret), Some('5'));

        let (line, caret) = crop_line("abc", 2, 10);
        assert_eq!(line, "abc");
        assert_eq!(caret, 1);
    }
}
