//! Reversible placeholder store for strings, comments, urls and expressions.
//!
//! Before any structural parsing, every span whose content could confuse a
//! brace/semicolon scan is swapped for an opaque `__ESCAPED_<KIND>_<n>__`
//! word. Regular comments are dropped outright; special `/*! ... */`
//! comments are kept according to
//! [`SpecialComments`](crate::options::SpecialComments).
//!
//! While scanning, the store also records *checkpoints*: escaped offsets at
//! which the original `(source, line, column)` is known. Between two
//! checkpoints the escaped text is a verbatim copy of the original, which is
//! what lets [`Tracker`](crate::tokenizer::Tracker) map positions back.

use crate::error::Diagnostics;
use crate::options::{Options, PropertyFlags, SpecialComments};
use crate::token::Origin;

pub const PLACEHOLDER_PREFIX: &str = "__ESCAPED_";
const SOURCE_TAG: &str = "SOURCE_";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Comment,
    FreeText,
    Url,
    Expression,
}

impl Kind {
    fn tag(self) -> &'static str {
        match self {
            Kind::Comment => "COMMENT",
            Kind::FreeText => "FREE_TEXT",
            Kind::Url => "URL",
            Kind::Expression => "EXPRESSION",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "COMMENT" => Some(Kind::Comment),
            "FREE_TEXT" => Some(Kind::FreeText),
            "URL" => Some(Kind::Url),
            "EXPRESSION" => Some(Kind::Expression),
            _ => None,
        }
    }
}

/// A known original position at an escaped offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub offset: usize,
    pub origin: Origin,
}

#[derive(Clone, Debug, Default)]
pub struct EscapeStore {
    entries: Vec<(Kind, String)>,
    checkpoints: Vec<Checkpoint>,
}

impl EscapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `text` and returns the placeholder standing for it.
    pub fn store(&mut self, kind: Kind, text: impl Into<String>) -> String {
        self.entries.push((kind, text.into()));
        format!(
            "{}{}_{}__",
            PLACEHOLDER_PREFIX,
            kind.tag(),
            self.entries.len() - 1
        )
    }

    /// The original text of a placeholder, if `placeholder` is exactly one.
    pub fn lookup(&self, placeholder: &str) -> Option<&str> {
        let (kind, index, length) = parse_placeholder(placeholder)?;
        if length != placeholder.len() {
            return None;
        }
        match self.entries.get(index) {
            Some((stored, text)) if *stored == kind => Some(text),
            _ => None,
        }
    }

    /// The kind of the placeholder `text` starts with.
    pub fn kind_at(text: &str) -> Option<Kind> {
        parse_placeholder(text).map(|(kind, _, _)| kind)
    }

    /// Byte length of the placeholder `text` starts with.
    pub fn placeholder_len(text: &str) -> Option<usize> {
        parse_placeholder(text).map(|(_, _, length)| length)
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Replaces every placeholder in `text` by its stored content.
    pub fn restore(&self, text: &str) -> String {
        let mut restored = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(at) = rest.find(PLACEHOLDER_PREFIX) {
            restored.push_str(&rest[..at]);
            let candidate = &rest[at..];
            match parse_placeholder(candidate) {
                Some((kind, index, length)) => {
                    match self.entries.get(index) {
                        Some((stored, original)) if *stored == kind => restored.push_str(original),
                        _ => restored.push_str(&candidate[..length]),
                    }
                    rest = &candidate[length..];
                }
                None => {
                    restored.push_str(PLACEHOLDER_PREFIX);
                    rest = &candidate[PLACEHOLDER_PREFIX.len()..];
                }
            }
        }
        restored.push_str(rest);
        restored
    }
}

/// Parses `__ESCAPED_<KIND>_<n>__` at the start of `text`, returning the
/// kind, index and byte length.
fn parse_placeholder(text: &str) -> Option<(Kind, usize, usize)> {
    let body = text.strip_prefix(PLACEHOLDER_PREFIX)?;
    let digits_at = body.find(|c: char| c.is_ascii_digit())?;
    let tag = body[..digits_at].strip_suffix('_')?;
    let kind = Kind::from_tag(tag)?;
    let digits = &body[digits_at..];
    let digits_len = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if !digits[digits_len..].starts_with("__") {
        return None;
    }
    let index = digits[..digits_len].parse().ok()?;
    Some((
        kind,
        index,
        PLACEHOLDER_PREFIX.len() + digits_at + digits_len + 2,
    ))
}

/// The marker opening source `index` in a joined multi-source input.
pub fn source_marker(index: usize) -> String {
    format!("{}{}{}__", PLACEHOLDER_PREFIX, SOURCE_TAG, index)
}

/// Parses a source marker at the start of `text`: `(index, length)`.
pub fn parse_source_marker(text: &str) -> Option<(usize, usize)> {
    let body = text.strip_prefix(PLACEHOLDER_PREFIX)?.strip_prefix(SOURCE_TAG)?;
    let digits_len = body.find(|c: char| !c.is_ascii_digit())?;
    if digits_len == 0 || !body[digits_len..].starts_with("__") {
        return None;
    }
    let index = body[..digits_len].parse().ok()?;
    Some((
        index,
        PLACEHOLDER_PREFIX.len() + SOURCE_TAG.len() + digits_len + 2,
    ))
}

/// Scanner state while escaping.
struct Escaper<'a> {
    input: &'a str,
    at: usize,
    output: String,
    store: EscapeStore,
    origin: Origin,
    keep: SpecialComments,
    kept_special: usize,
    url_quotes: bool,
}

/// Escapes `input`, returning the escaped text and the store needed to
/// restore it.
pub fn escape(
    input: &str,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> (String, EscapeStore) {
    let mut escaper = Escaper {
        input,
        at: 0,
        output: String::with_capacity(input.len()),
        store: EscapeStore::new(),
        origin: Origin::new(0, 1, 0),
        keep: options.keep_special_comments,
        kept_special: 0,
        url_quotes: options
            .compatibility
            .properties
            .contains(PropertyFlags::URL_QUOTES),
    };
    escaper.checkpoint();
    escaper.run(diagnostics);
    (escaper.output, escaper.store)
}

impl Escaper<'_> {
    fn checkpoint(&mut self) {
        self.store.checkpoints.push(Checkpoint {
            offset: self.output.len(),
            origin: self.origin,
        });
    }

    fn advance_origin(&mut self, consumed: &str) {
        for c in consumed.chars() {
            if c == '\n' {
                self.origin.line += 1;
                self.origin.column = 0;
            } else {
                self.origin.column += 1;
            }
        }
    }

    /// Copies `length` bytes verbatim.
    fn copy(&mut self, length: usize) {
        let end = self.at + length;
        let text = &self.input[self.at..end];
        self.output.push_str(text);
        self.advance_origin(text);
        self.at = end;
    }

    /// Consumes `length` bytes, writing `replacement` instead.
    fn replace(&mut self, length: usize, replacement: &str) {
        let end = self.at + length;
        let consumed = &self.input[self.at..end];
        self.advance_origin(consumed);
        self.output.push_str(replacement);
        self.at = end;
        self.checkpoint();
    }

    fn run(&mut self, diagnostics: &mut Diagnostics) {
        while self.at < self.input.len() {
            let rest = &self.input[self.at..];

            let next = rest
                .find(['/', '"', '\'', '_', 'u', 'U', 'e', 'E'])
                .unwrap_or(rest.len());
            if next > 0 {
                self.copy(next);
                continue;
            }

            if let Some((index, length)) = parse_source_marker(rest) {
                self.output.push_str(&rest[..length]);
                self.at += length;
                self.origin = Origin::new(index, 1, 0);
                self.checkpoint();
            } else if rest.starts_with("/*") {
                self.comment(rest, diagnostics);
            } else if rest.starts_with('"') || rest.starts_with('\'') {
                self.free_text(rest, diagnostics);
            } else if self.is_function_start(rest, "url(") {
                self.url(rest, diagnostics);
            } else if self.is_function_start(rest, "expression(") {
                self.expression(rest, diagnostics);
            } else {
                let length = rest.chars().next().map_or(1, char::len_utf8);
                self.copy(length);
            }
        }
    }

    fn is_function_start(&self, rest: &str, name: &str) -> bool {
        let starts = rest
            .get(..name.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(name));
        let boundary = self.input[..self.at]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '-' || c == '_'));
        starts && boundary
    }

    fn comment(&mut self, rest: &str, diagnostics: &mut Diagnostics) {
        let Some(end) = rest[2..].find("*/").map(|at| at + 4) else {
            diagnostics.warn(format!(
                "Broken comment: '{}'.",
                rest.chars().take(40).collect::<String>()
            ));
            self.copy(rest.len());
            return;
        };

        let text = &rest[..end];
        let keep = text.starts_with("/*!")
            && match self.keep {
                SpecialComments::All => true,
                SpecialComments::First => self.kept_special == 0,
                SpecialComments::None => false,
            };

        if keep {
            self.kept_special += 1;
            let placeholder = self.store.store(Kind::Comment, text);
            self.replace(end, &placeholder);
        } else {
            // `1px/**/2px` must not collapse into one word.
            let glued = self.output.chars().next_back().is_some_and(ends_word)
                && rest[end..].chars().next().is_some_and(starts_word);
            self.replace(end, if glued { " " } else { "" });
        }
    }

    fn free_text(&mut self, rest: &str, diagnostics: &mut Diagnostics) {
        match string_end(rest) {
            Some(end) => {
                let placeholder = self.store.store(Kind::FreeText, &rest[..end]);
                self.replace(end, &placeholder);
            }
            None => {
                diagnostics.warn(format!(
                    "Broken string: '{}'.",
                    rest.chars().take(40).collect::<String>()
                ));
                let end = bad_string_end(rest);
                let quote = &rest[..1];
                let closed = format!("{}{quote}", &rest[..end]);
                let placeholder = self.store.store(Kind::FreeText, closed);
                self.replace(end, &placeholder);
            }
        }
    }

    fn url(&mut self, rest: &str, diagnostics: &mut Diagnostics) {
        let Some(end) = closing_paren(rest) else {
            diagnostics.warn(format!(
                "Broken URL declaration: '{}'.",
                rest.chars().take(40).collect::<String>()
            ));
            self.copy(4);
            return;
        };

        let inner = rest[4..end - 1].trim();
        let normalized = format!("url({})", normalize_url(inner, self.url_quotes));
        let placeholder = self.store.store(Kind::Url, normalized);
        self.replace(end, &placeholder);
    }

    fn expression(&mut self, rest: &str, diagnostics: &mut Diagnostics) {
        match closing_paren(rest) {
            Some(end) => {
                let placeholder = self.store.store(Kind::Expression, &rest[..end]);
                self.replace(end, &placeholder);
            }
            None => {
                diagnostics.warn("Broken expression declaration.");
                self.copy(rest.len());
            }
        }
    }
}

/// End (exclusive) of the quoted string `text` starts with. `None` when an
/// unescaped line break or the end of input comes first.
fn string_end(text: &str) -> Option<usize> {
    let quote = text.chars().next()?;
    let mut escaped = false;
    for (at, c) in text.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return Some(at + 1),
            '\n' | '\r' | '\x0c' if !escaped => return None,
            _ => escaped = false,
        }
    }
    None
}

/// End of an unterminated string: the next unescaped line break, or the
/// end of input.
fn bad_string_end(text: &str) -> usize {
    let mut escaped = false;
    for (at, c) in text.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '\n' | '\r' | '\x0c' if !escaped => return at,
            _ => escaped = false,
        }
    }
    text.len()
}

fn ends_word(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '%' | ')')
}

fn starts_word(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '#')
}

/// End (exclusive) of the parenthesized call `text` starts with, skipping
/// quoted strings and nested parentheses.
fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut at = 0;
    while at < text.len() {
        let rest = &text[at..];
        let c = rest.chars().next()?;
        match c {
            '"' | '\'' => {
                at += string_end(rest)?;
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(at + 1);
                }
            }
            _ => {}
        }
        at += c.len_utf8();
    }
    None
}

/// Drops quotes around a url when the result stays a valid unquoted url.
fn normalize_url(inner: &str, keep_quotes: bool) -> String {
    let quoted = inner.len() >= 2
        && ((inner.starts_with('"') && inner.ends_with('"'))
            || (inner.starts_with('\'') && inner.ends_with('\'')));
    if !quoted || keep_quotes {
        return inner.to_string();
    }

    let unquoted = &inner[1..inner.len() - 1];
    let safe = !unquoted.is_empty()
        && !unquoted
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')' | '\\'));
    if safe {
        unquoted.to_string()
    } else {
        inner.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> (String, EscapeStore, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let (text, store) = escape(input, &Options::default(), &mut diagnostics);
        (text, store, diagnostics)
    }

    #[test]
    fn escapes_and_restores() {
        let input = r#"a{content:"{;}";background:url( "a b.png" )}"#;
        let (text, store, diagnostics) = run(input);

        assert!(!text.contains('"'));
        assert!(text.contains("__ESCAPED_FREE_TEXT_0__"));
        assert!(text.contains("__ESCAPED_URL_1__"));
        assert_eq!(
            store.restore(&text),
            r#"a{content:"{;}";background:url("a b.png")}"#
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn drops_regular_comments_keeps_special() {
        let (text, store, _) = run("/*! keep */a{/* drop */color:red}");
        assert_eq!(text, "__ESCAPED_COMMENT_0__a{color:red}");
        assert_eq!(store.lookup("__ESCAPED_COMMENT_0__"), Some("/*! keep */"));
    }

    #[test]
    fn keeps_only_first_special_comment() {
        let options = Options {
            keep_special_comments: SpecialComments::First,
            ..Options::default()
        };
        let mut diagnostics = Diagnostics::new();
        let (text, _) = escape("/*! one *//*! two */a{}", &options, &mut diagnostics);
        assert_eq!(text, "__ESCAPED_COMMENT_0__a{}");
    }

    #[test]
    fn unquotes_safe_urls() {
        let (_, store, _) = run("a{background:url('img.png')}");
        assert_eq!(store.lookup("__ESCAPED_URL_0__"), Some("url(img.png)"));
    }

    #[test]
    fn warns_on_broken_comment() {
        let (text, _, diagnostics) = run("a{color:red}/* never closed");
        assert_eq!(text, "a{color:red}/* never closed");
        assert_eq!(diagnostics.warnings.len(), 1);
    }

    #[test]
    fn comments_between_words_leave_a_space() {
        let (text, _, _) = run("a{margin:1px/**/2px}@import/*x*/y;");
        assert_eq!(text, "a{margin:1px 2px}@import y;");
        let (text, _, _) = run("a/**/.b{color:red/* x */}");
        assert_eq!(text, "a.b{color:red}");
    }

    #[test]
    fn broken_string_ends_at_line_break() {
        let (text, store, diagnostics) = run("a{content:\"broken}\nb{color:red}");
        assert_eq!(text, "a{content:__ESCAPED_FREE_TEXT_0__\nb{color:red}");
        assert_eq!(store.lookup("__ESCAPED_FREE_TEXT_0__"), Some("\"broken}\""));
        assert_eq!(diagnostics.warnings.len(), 1);
    }

    #[test]
    fn broken_string_closes_at_end_of_input() {
        let (text, store, _) = run("a{content:'x\\\ny}");
        assert_eq!(text, "a{content:__ESCAPED_FREE_TEXT_0__");
        assert_eq!(store.lookup("__ESCAPED_FREE_TEXT_0__"), Some("'x\\\ny}'"));
    }

    #[test]
    fn records_checkpoints_after_replacements() {
        let (_, store, _) = run("a{\n/* x */\ncolor:red}");
        let last = store.checkpoints().last().unwrap();
        assert_eq!(last.origin, Origin::new(0, 2, 7));
    }

    #[test]
    fn parses_source_markers() {
        assert_eq!(parse_source_marker("__ESCAPED_SOURCE_12__a"), Some((12, 21)));
        assert_eq!(parse_source_marker("__ESCAPED_URL_1__"), None);
    }
}
