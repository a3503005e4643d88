//! Display width helpers. ANSI escapes are stripped before measuring so
//! styled content still pads to the zone edge.

use unicode_width::UnicodeWidthChar;

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Cut text down to at most `width` display columns. ANSI escapes are
/// stripped first, matching [`display_width`].
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    let mut used = 0;
    let mut out = String::new();
    for ch in clean_str.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}
