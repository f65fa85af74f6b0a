//! Duplicate removal and merging of adjacent rules.

use std::collections::HashMap;

use crate::options::Options;
use crate::properties::{self, Mode};
use crate::token::{Token, body_text, selectors_text};

use super::clean_up;

/// Whether any selector of the list prevents comma merging.
pub fn is_special(token: &Token, options: &Options) -> bool {
    match token {
        Token::Selector { selectors, .. } => selectors
            .iter()
            .any(|selector| options.compatibility.selectors.is_special(&selector.value)),
        _ => true,
    }
}

/// Removes all but the last of identical rules (same selectors and body).
pub fn remove_duplicates(tokens: Vec<Token>) -> Vec<Token> {
    let mut last_seen: HashMap<String, usize> = HashMap::new();
    for (index, token) in tokens.iter().enumerate() {
        if let Token::Selector {
            selectors,
            properties,
        } = token
        {
            let key = format!("{}{{{}}}", selectors_text(selectors), body_text(properties));
            last_seen.insert(key, index);
        }
    }

    tokens
        .into_iter()
        .enumerate()
        .filter(|(index, token)| match token {
            Token::Selector {
                selectors,
                properties,
            } => {
                let key = format!("{}{{{}}}", selectors_text(selectors), body_text(properties));
                last_seen.get(&key) == Some(index)
            }
            _ => true,
        })
        .map(|(_, token)| token)
        .collect()
}

/// Folds `token` into `previous` when possible; returns it otherwise.
fn absorb(previous: &mut Token, token: Token, options: &Options) -> Option<Token> {
    let previous_special = is_special(previous, options);
    let token_special = is_special(&token, options);
    let Token::Selector {
        selectors: previous_selectors,
        properties: previous_properties,
    } = previous
    else {
        return Some(token);
    };

    match token {
        Token::Selector {
            selectors,
            properties,
        } => {
            if selectors_text(&selectors) == selectors_text(previous_selectors) {
                let mut joined = std::mem::take(previous_properties);
                joined.extend(properties);
                *previous_properties = properties::optimize(joined, options, Mode::full(options));
                return None;
            }
            if !previous_special
                && !token_special
                && body_text(&properties) == body_text(previous_properties)
            {
                let mut joined = std::mem::take(previous_selectors);
                joined.extend(selectors);
                *previous_selectors = clean_up::selectors(joined, &options.compatibility.selectors);
                return None;
            }
            Some(Token::Selector {
                selectors,
                properties,
            })
        }
        other => Some(other),
    }
}

/// Merges each rule into the previous one when they share selectors (the
/// bodies are concatenated and optimized again) or bodies (the selector
/// lists are joined).
pub fn merge_adjacent(tokens: Vec<Token>, options: &Options) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let rest = match merged.last_mut() {
            Some(previous) => absorb(previous, token, options),
            None => Some(token),
        };
        if let Some(token) = rest {
            merged.push(token);
        }
    }
    merged
}

/// Drops tokens that render to nothing, recursing into blocks.
pub fn remove_empty(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter_map(|token| {
            let token = match token {
                Token::Block { header, children } => Token::Block {
                    header,
                    children: remove_empty(children),
                },
                other => other,
            };
            (!token.is_empty()).then_some(token)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Declaration, Fragment};

    fn rule(selectors: &[&str], body: &[(&str, &str)]) -> Token {
        Token::Selector {
            selectors: selectors.iter().copied().map(Fragment::new).collect(),
            properties: body
                .iter()
                .map(|(name, value)| {
                    Declaration::new(Fragment::new(*name), vec![Fragment::new(*value)], false)
                })
                .collect(),
        }
    }

    fn render(tokens: &[Token]) -> String {
        tokens
            .iter()
            .map(|token| match token {
                Token::Selector {
                    selectors,
                    properties,
                } => format!("{}{{{}}}", selectors_text(selectors), body_text(properties)),
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn keeps_last_duplicate() {
        let tokens = vec![
            rule(&["a"], &[("color", "red")]),
            rule(&["b"], &[("color", "green")]),
            rule(&["a"], &[("color", "red")]),
        ];
        assert_eq!(render(&remove_duplicates(tokens)), "b{color:green}a{color:red}");
    }

    #[test]
    fn merges_same_selectors() {
        let options = Options::default();
        let tokens = vec![rule(&["a"], &[("color", "red")]), rule(&["a"], &[("color", "blue")])];
        assert_eq!(render(&merge_adjacent(tokens, &options)), "a{color:blue}");
    }

    #[test]
    fn merges_same_bodies() {
        let options = Options::default();
        let tokens = vec![rule(&["b"], &[("color", "red")]), rule(&["a"], &[("color", "red")])];
        assert_eq!(render(&merge_adjacent(tokens, &options)), "a,b{color:red}");
    }

    #[test]
    fn leaves_special_selectors_apart() {
        let options = Options::default();
        let tokens = vec![
            rule(&["a::-moz-selection"], &[("color", "red")]),
            rule(&["a"], &[("color", "red")]),
        ];
        assert_eq!(
            render(&merge_adjacent(tokens, &options)),
            "a::-moz-selection{color:red}a{color:red}"
        );
    }
}
