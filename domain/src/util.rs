//! Shared utility functions.

/// Shorten `text` to at most `max_chars` characters for log lines.
///
/// Newlines are flattened so a preview always fits on one line; a cut is
/// marked with `...`.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(preview("hello", 10), "hello");
        assert_eq!(preview("", 10), "");
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("こんにちは", 2), "こん...");
    }

    #[test]
    fn newlines_are_flattened() {
        assert_eq!(preview("line one\nline two", 40), "line one line two");
    }
}
