//! Tree-level optimization.
//!
//! The basic pass normalizes every selector, header and body in place. The
//! advanced pass then merges, reduces and restructures rules, recursing into
//! nested blocks before working on the level that contains them.

pub mod clean_up;
pub mod media;
pub mod merge;
pub mod non_adjacent;
pub mod restructure;

use crate::options::Options;
use crate::properties::{self, Mode};
use crate::token::Token;
use crate::tokenizer::is_keyframes;

/// Runs the basic pass and, when enabled, the advanced pass.
pub fn optimize(tokens: Vec<Token>, options: &Options) -> Vec<Token> {
    let mut charset = None;
    let mut tokens = basic(tokens, options, &mut charset);
    if options.advanced {
        tokens = advanced(tokens, options, false);
    }
    let mut tokens = merge::remove_empty(tokens);
    if let Some(charset) = charset {
        tokens.insert(0, charset);
    }
    tokens
}

fn is_charset(text: &str) -> bool {
    text.get(..8)
        .is_some_and(|head| head.eq_ignore_ascii_case("@charset"))
}

/// Normalizes selectors, headers and bodies. Every `@charset` is pulled out;
/// the first one is handed back through `charset`.
fn basic(tokens: Vec<Token>, options: &Options, charset: &mut Option<Token>) -> Vec<Token> {
    let mut optimized = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Selector {
                selectors,
                properties,
            } => {
                let selectors = clean_up::selectors(selectors, &options.compatibility.selectors);
                if selectors.is_empty() {
                    continue;
                }
                optimized.push(Token::Selector {
                    selectors,
                    properties: properties::optimize(properties, options, Mode::full(options)),
                });
            }
            Token::Block { mut header, children } => {
                header.value = clean_up::block_header(&header.value);
                optimized.push(Token::Block {
                    header,
                    children: basic(children, options, charset),
                });
            }
            Token::FlatBlock {
                mut header,
                properties,
            } => {
                header.value = clean_up::block_header(&header.value);
                optimized.push(Token::FlatBlock {
                    header,
                    properties: properties::optimize(properties, options, Mode::values_only()),
                });
            }
            Token::AtRule { mut text } => {
                text.value = clean_up::at_rule(&text.value);
                if is_charset(&text.value) {
                    if charset.is_none() {
                        *charset = Some(Token::AtRule { text });
                    }
                    continue;
                }
                optimized.push(Token::AtRule { text });
            }
            text @ Token::Text { .. } => optimized.push(text),
        }
    }
    optimized
}

/// Structural optimizations of one token list. Keyframe bodies are never
/// restructured: their selectors are offsets, not element matchers.
fn advanced(tokens: Vec<Token>, options: &Options, in_keyframes: bool) -> Vec<Token> {
    let tokens: Vec<Token> = tokens
        .into_iter()
        .map(|token| match token {
            Token::Block { header, children } => {
                let keyframes = is_keyframes(&header.value);
                Token::Block {
                    children: advanced(children, options, keyframes),
                    header,
                }
            }
            other => other,
        })
        .collect();

    let mut tokens = merge::remove_duplicates(tokens);
    tokens = merge::merge_adjacent(tokens, options);
    tokens = non_adjacent::reduce_non_adjacent(tokens, options);
    tokens = non_adjacent::merge_by_selector(tokens, options);
    tokens = non_adjacent::merge_by_body(tokens, options);
    tokens = merge::remove_empty(tokens);

    if options.restructuring && !in_keyframes {
        tokens = restructure::restructure(tokens, options);
        tokens = merge::merge_adjacent(merge::remove_empty(tokens), options);
    }

    if options.media_merging {
        tokens = media::remove_duplicate_media(tokens);
        let (merged_tokens, merged) = media::merge_media_queries(tokens);
        tokens = merge::remove_empty(merged_tokens);
        if merged {
            log::debug!("merged @media blocks, optimizing again");
            return advanced(tokens, options, in_keyframes);
        }
    }

    merge::remove_empty(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::escape::escape;
    use crate::tokenizer::tokenize;

    fn optimized(source: &str, options: &Options) -> Vec<Token> {
        let mut diagnostics = Diagnostics::new();
        let (escaped, store) = escape(source, options, &mut diagnostics);
        let tokens = tokenize(&escaped, store.checkpoints(), false, &mut diagnostics);
        optimize(tokens, options)
    }

    fn headers(tokens: &[Token]) -> Vec<String> {
        tokens
            .iter()
            .map(|token| match token {
                Token::Selector { selectors, .. } => crate::token::selectors_text(selectors),
                Token::Block { header, .. } | Token::FlatBlock { header, .. } => header.value.clone(),
                Token::AtRule { text } | Token::Text { text } => text.value.clone(),
            })
            .collect()
    }

    #[test]
    fn hoists_first_charset() {
        let tokens = optimized(
            "a{color:red}@charset 'utf-8';@charset 'latin1';",
            &Options::default(),
        );
        assert_eq!(tokens.len(), 2);
        assert!(headers(&tokens)[0].starts_with("@charset"));
    }

    #[test]
    fn drops_empty_rules() {
        let tokens = optimized("a{}@media print{b{}}c{color:red}", &Options::default());
        assert_eq!(headers(&tokens), ["c"]);
    }

    #[test]
    fn merges_media_blocks() {
        let tokens = optimized(
            "@media print{a{color:red}}b{margin:0}@media print{i{width:1px}}",
            &Options::default(),
        );
        assert_eq!(headers(&tokens), ["b", "@media print"]);
    }

    #[test]
    fn basic_pass_only_without_advanced() {
        let options = Options {
            advanced: false,
            ..Options::default()
        };
        let tokens = optimized("a{color:red}a{color:blue}", &options);
        assert_eq!(headers(&tokens), ["a", "a"]);
    }
}
