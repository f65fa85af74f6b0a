//! Turns escaped stylesheet text into a [`Token`] tree.
//!
//! The input must already have gone through [`escape`](crate::escape), so
//! braces and semicolons inside strings, urls and comments are invisible.
//! Malformed input never fails: stray text is dropped with a warning and
//! unterminated blocks are closed at the end of input.

mod properties;
mod selectors;
mod tracker;

use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::sequence::preceded;
use nom::IResult;

use crate::error::Diagnostics;
use crate::escape::{parse_source_marker, Checkpoint, EscapeStore, Kind};
use crate::split::{collapse_whitespace, matching_brace};
use crate::token::{Declaration, Fragment, Token};

pub use properties::extract_properties;
pub use selectors::extract_selectors;
pub use tracker::Tracker;

/// At-rules whose body is a declaration list rather than nested rules.
const FLAT_BLOCKS: &[&str] = &[
    "@counter-style",
    "@font-face",
    "@font-feature-values",
    "@-ms-viewport",
    "@page",
    "@viewport",
];

/// Parses the at-keyword at the start of a header, e.g. `@media`.
fn at_keyword(input: &str) -> IResult<&str, &str> {
    preceded(
        char('@'),
        take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_'),
    )(input)
}

/// Whether a block header opens a declaration-bodied at-rule.
pub fn is_flat_block(header: &str) -> bool {
    match at_keyword(header) {
        Ok((_, name)) => FLAT_BLOCKS
            .iter()
            .any(|flat| flat[1..].eq_ignore_ascii_case(name)),
        Err(_) => false,
    }
}

/// Whether a block header opens `@keyframes` (vendor prefixed or not).
pub fn is_keyframes(header: &str) -> bool {
    match at_keyword(header) {
        Ok((_, name)) => name.to_ascii_lowercase().ends_with("keyframes"),
        Err(_) => false,
    }
}

struct Tokenizer<'a, 'd> {
    text: &'a str,
    at: usize,
    tracker: Tracker<'a>,
    diagnostics: &'d mut Diagnostics,
}

/// Tokenizes escaped `text`. When `track` is set, fragments carry their
/// original position, resolved through the escape `checkpoints`.
pub fn tokenize(
    text: &str,
    checkpoints: &[Checkpoint],
    track: bool,
    diagnostics: &mut Diagnostics,
) -> Vec<Token> {
    let mut tokenizer = Tokenizer {
        text,
        at: 0,
        tracker: Tracker::new(text, checkpoints, track),
        diagnostics,
    };
    let tokens = tokenizer.tokens(false);
    log::trace!("tokenized {} top-level tokens", tokens.len());
    tokens
}

impl Tokenizer<'_, '_> {
    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.at..];
        self.at += rest.len() - rest.trim_start().len();
    }

    fn tokens(&mut self, nested: bool) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let text = self.text;
            let rest = &text[self.at..];

            if rest.is_empty() {
                if nested {
                    self.diagnostics
                        .warn("Missing '}' at the end of the stylesheet.");
                }
                return tokens;
            }

            if let Some((_, length)) = parse_source_marker(rest) {
                self.at += length;
            } else if EscapeStore::kind_at(rest) == Some(Kind::Comment) {
                let length = EscapeStore::placeholder_len(rest).unwrap_or(rest.len());
                let origin = self.tracker.origin(self.at);
                tokens.push(Token::Text {
                    text: Fragment::at(&rest[..length], origin),
                });
                self.at += length;
            } else if rest.starts_with('}') {
                self.at += 1;
                if nested {
                    return tokens;
                }
                self.diagnostics.warn("Unexpected '}' in the stylesheet.");
            } else if rest.starts_with(';') {
                self.at += 1;
            } else if rest.starts_with('@') {
                if let Some(token) = self.at_rule() {
                    tokens.push(token);
                }
            } else if let Some(token) = self.rule() {
                tokens.push(token);
            }
        }
    }

    fn at_rule(&mut self) -> Option<Token> {
        let start = self.at;
        let text = self.text;
        let rest = &text[start..];
        let origin = self.tracker.origin(start);

        let Some(end) = rest.find(['{', '}', ';']) else {
            self.at = self.text.len();
            return Some(Token::AtRule {
                text: Fragment::at(collapse_whitespace(rest), origin),
            });
        };

        let header = collapse_whitespace(&rest[..end]);
        match &rest[end..end + 1] {
            ";" => {
                self.at = start + end + 1;
                Some(Token::AtRule {
                    text: Fragment::at(header, origin),
                })
            }
            "}" => {
                self.at = start + end;
                Some(Token::AtRule {
                    text: Fragment::at(header, origin),
                })
            }
            _ => {
                let body_start = start + end + 1;
                if is_flat_block(&header) {
                    let properties = self.body(body_start, &header);
                    Some(Token::FlatBlock {
                        header: Fragment::at(header, origin),
                        properties,
                    })
                } else {
                    self.at = body_start;
                    let children = self.tokens(true);
                    Some(Token::Block {
                        header: Fragment::at(header, origin),
                        children,
                    })
                }
            }
        }
    }

    fn rule(&mut self) -> Option<Token> {
        let start = self.at;
        let text = self.text;
        let rest = &text[start..];

        let Some(end) = rest.find(['{', '}', ';']) else {
            self.diagnostics.warn(format!(
                "Invalid selector '{}' at the end of the stylesheet. Ignoring.",
                rest.trim()
            ));
            self.at = self.text.len();
            return None;
        };

        match &rest[end..end + 1] {
            "{" => {}
            "}" => {
                self.diagnostics.warn(format!(
                    "Invalid selector '{}'. Ignoring.",
                    rest[..end].trim()
                ));
                self.at = start + end;
                return None;
            }
            _ => {
                self.diagnostics.warn(format!(
                    "Unexpected ';' after '{}'. Ignoring.",
                    rest[..end].trim()
                ));
                self.at = start + end + 1;
                return None;
            }
        }

        let selectors = extract_selectors(&rest[..end], start, &mut self.tracker);
        let context = rest[..end].trim().to_string();
        let properties = self.body(start + end + 1, &context);

        if selectors.is_empty() {
            self.diagnostics
                .warn("Empty selector before '{'. Ignoring the rule.");
            return None;
        }

        Some(Token::Selector {
            selectors,
            properties,
        })
    }

    /// Extracts the declaration body opening at `body_start` and moves past
    /// its closing brace.
    fn body(&mut self, body_start: usize, context: &str) -> Vec<Declaration> {
        let text = self.text;
        let rest = &text[body_start..];
        let body = match matching_brace(rest) {
            Some(close) => {
                self.at = body_start + close + 1;
                &rest[..close]
            }
            None => {
                self.diagnostics.warn(format!(
                    "Missing '}}' after '{}'.",
                    context
                ));
                self.at = self.text.len();
                rest
            }
        };

        extract_properties(
            body,
            body_start,
            context,
            &mut self.tracker,
            self.diagnostics,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (Vec<Token>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = tokenize(text, &[], false, &mut diagnostics);
        (tokens, diagnostics)
    }

    #[test]
    fn tokenizes_rules_and_blocks() {
        let (tokens, diagnostics) =
            parse("@charset \"x\";a,b{color:red}@media print{p{margin:0}}@font-face{src:x}");
        assert!(diagnostics.is_empty());
        assert_eq!(tokens.len(), 4);
        assert!(matches!(&tokens[0], Token::AtRule { text } if text.value == "@charset \"x\""));
        assert!(matches!(&tokens[1], Token::Selector { selectors, .. } if selectors.len() == 2));
        match &tokens[2] {
            Token::Block { header, children } => {
                assert_eq!(header.value, "@media print");
                assert_eq!(children.len(), 1);
            }
            other => panic!("unexpected token {:?}", other),
        }
        assert!(matches!(&tokens[3], Token::FlatBlock { properties, .. } if properties.len() == 1));
    }

    #[test]
    fn ignores_stray_closing_brace() {
        let (tokens, diagnostics) = parse("}a{color:red}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(diagnostics.warnings, vec!["Unexpected '}' in the stylesheet."]);
    }

    #[test]
    fn closes_unterminated_block() {
        let (tokens, diagnostics) = parse("@media screen{a{color:red}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(diagnostics.warnings.len(), 1);
    }

    #[test]
    fn drops_nested_text_of_unterminated_body() {
        let (tokens, diagnostics) = parse("a{b{c:d");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(&tokens[0], Token::Selector { properties, .. } if properties.is_empty()));
        assert_eq!(
            diagnostics.warnings,
            vec![
                "Missing '}' after 'a'.",
                "Missing ':' in 'b{c:d' inside 'a'. Ignoring.",
            ]
        );
    }

    #[test]
    fn keeps_special_comment_tokens() {
        let (tokens, _) = parse("__ESCAPED_COMMENT_0__a{color:red}");
        assert!(matches!(&tokens[0], Token::Text { text } if text.value == "__ESCAPED_COMMENT_0__"));
    }

    #[test]
    fn recognizes_flat_and_keyframes_headers() {
        assert!(is_flat_block("@font-face"));
        assert!(is_flat_block("@page :first"));
        assert!(!is_flat_block("@media print"));
        assert!(is_keyframes("@-webkit-keyframes spin"));
    }
}
