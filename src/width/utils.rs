//! Display width of caption text.
//!
//! Captions may arrive with ANSI styling from upstream renderers, so escapes
//! are stripped before counting columns.

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// True when the text would render as nothing visible.
pub fn is_blank(text: &str) -> bool {
    display_width(text.trim()) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_ansi_sequences() {
        assert_eq!(display_width("\x1b[1mName\x1b[0m"), 4);
    }

    #[test]
    fn counts_wide_glyphs() {
        assert_eq!(display_width("名前"), 4);
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank("   "));
        assert!(is_blank("\x1b[0m"));
        assert!(!is_blank(" a "));
    }
}
