//! Depth-aware splitting of escaped CSS text.
//!
//! Strings, urls and comments are already placeholders when these helpers
//! run, so only bracket nesting needs tracking.

/// Splits `text` on `separator` occurring outside `()`, `[]` and `{}`.
///
/// Returned slices are untrimmed; `(offset, slice)` pairs let callers keep
/// track of positions.
pub fn split_top_level(text: &str, separator: char) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (at, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == separator && depth <= 0 => {
                parts.push((start, &text[start..at]));
                start = at + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push((start, &text[start..]));
    parts
}

/// Finds the first `needle` outside brackets and braces.
pub fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0i32;
    for (at, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == needle && depth <= 0 => return Some(at),
            _ => {}
        }
    }
    None
}

/// Whether every `{` of `text` is closed, in order.
pub fn balanced_braces(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Splits a value into words: whitespace separates words and `,` / `/` are
/// words of their own, all outside parentheses. Returns `(offset, word)`.
pub fn split_value(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut depth = 0i32;
    let mut start: Option<usize> = None;

    for (at, c) in text.char_indices() {
        match c {
            '(' => {
                depth += 1;
                start.get_or_insert(at);
            }
            ')' => {
                depth -= 1;
                start.get_or_insert(at);
            }
            c if depth <= 0 && c.is_whitespace() => {
                if let Some(begin) = start.take() {
                    words.push((begin, &text[begin..at]));
                }
            }
            ',' | '/' if depth <= 0 => {
                if let Some(begin) = start.take() {
                    words.push((begin, &text[begin..at]));
                }
                words.push((at, &text[at..at + 1]));
            }
            _ => {
                start.get_or_insert(at);
            }
        }
    }
    if let Some(begin) = start {
        words.push((begin, &text[begin..]));
    }
    words
}

/// Collapses whitespace runs into one space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Index of the `}` closing the block whose body starts at `text[0]`,
/// or `None` when the input ends first.
pub fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 1i32;
    for (at, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(at);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_outside_parentheses() {
        let parts: Vec<&str> = split_top_level("a:not(.b,.c),d", ',')
            .into_iter()
            .map(|(_, part)| part)
            .collect();
        assert_eq!(parts, vec!["a:not(.b,.c)", "d"]);
    }

    #[test]
    fn splits_values_into_words() {
        let words: Vec<&str> = split_value("12px/1.5  Arial, rgb(0, 0, 0)")
            .into_iter()
            .map(|(_, word)| word)
            .collect();
        assert_eq!(words, vec!["12px", "/", "1.5", "Arial", ",", "rgb(0, 0, 0)"]);
    }

    #[test]
    fn finds_colon_outside_braces() {
        assert_eq!(find_top_level("a:b", ':'), Some(1));
        assert_eq!(find_top_level("b{c:d", ':'), None);
        assert_eq!(find_top_level("x(a:b):c", ':'), Some(6));
    }

    #[test]
    fn checks_brace_balance() {
        assert!(balanced_braces("{ a: { b } }"));
        assert!(!balanced_braces("{b"));
        assert!(!balanced_braces("}{"));
    }

    #[test]
    fn finds_matching_brace() {
        assert_eq!(matching_brace("a{b}c}d"), Some(5));
        assert_eq!(matching_brace("a{b"), None);
    }
}
