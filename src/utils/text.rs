// src/utils/text.rs
// Byte-offset helpers. Windows are computed in bytes and must land on char boundaries
// because OCR output routinely contains non-ASCII punctuation.

pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte range of the line containing `index` (newline excluded).
pub fn line_bounds(text: &str, index: usize) -> (usize, usize) {
    let index = floor_char_boundary(text, index);
    let start = text[..index].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[index..].find('\n').map(|i| index + i).unwrap_or(text.len());
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_skip_multibyte_chars() {
        let text = "a—b"; // em dash is 3 bytes
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(ceil_char_boundary(text, 2), 4);
        assert_eq!(floor_char_boundary(text, 99), text.len());
    }

    #[test]
    fn test_truncate_and_collapse() {
        assert_eq!(truncate_chars("Operating Forces", 9), "Operating");
        assert_eq!(truncate_chars("short", 40), "short");
        assert_eq!(collapse_whitespace("  a \n b\t c "), "a b c");
    }

    #[test]
    fn test_line_bounds() {
        let text = "first\nsecond line\nthird";
        let (s, e) = line_bounds(text, 8);
        assert_eq!(&text[s..e], "second line");
        let (s, e) = line_bounds(text, 0);
        assert_eq!(&text[s..e], "first");
    }
}
