/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Find the last complete top-level `{...}` span in free text.
///
/// Braces inside JSON strings (including escaped quotes) are ignored. A `{`
/// that never closes, whether stray prose before the object or an unterminated
/// tail, is skipped and scanning resumes at the next `{`.
pub fn last_json_object(text: &str) -> Option<&str> {
    let mut last = None;
    let mut from = 0;

    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        match balanced_end(text, start) {
            Some(end) => {
                last = Some(&text[start..=end]);
                from = end + 1;
            }
            None => from = start + 1,
        }
    }

    last
}

/// Byte index of the `}` closing the object that opens at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }

    None
}
