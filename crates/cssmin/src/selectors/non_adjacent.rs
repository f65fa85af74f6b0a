//! Optimizations across rules separated by other rules.
//!
//! Each pass moves declarations or selectors only when every rule in
//! between is proven reorderable with what moves.

use std::collections::HashMap;

use crate::options::Options;
use crate::properties::reorderable::{can_reorder, extract};
use crate::properties::{self, Mode};
use crate::token::{Declaration, Token, body_text, selectors_text};

use super::clean_up;
use super::merge::is_special;

/// Non-empty, non-special rules grouped by selector text, in order of first
/// appearance.
fn group_by_selectors(tokens: &[Token], options: &Options) -> Vec<Vec<usize>> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        let Token::Selector {
            selectors,
            properties,
        } = token
        else {
            continue;
        };
        if properties.is_empty() || is_special(token, options) {
            continue;
        }
        let slot = *slots.entry(selectors_text(selectors)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(index);
    }
    groups.retain(|group| group.len() > 1);
    groups
}

fn properties_of(token: &Token) -> &[Declaration] {
    match token {
        Token::Selector { properties, .. } => properties,
        _ => &[],
    }
}

fn properties_mut(token: &mut Token) -> Option<&mut Vec<Declaration>> {
    match token {
        Token::Selector { properties, .. } => Some(properties),
        _ => None,
    }
}

/// Whether the declarations of `tokens[from]` may cross every token
/// strictly between `from` and `to`, in either direction.
pub fn can_move(tokens: &[Token], from: usize, to: usize) -> bool {
    let moved = extract(&tokens[from]);
    let (low, high) = if from < to { (from, to) } else { (to, from) };
    tokens[low + 1..high]
        .iter()
        .all(|between| can_reorder(&moved, &extract(between)))
}

/// Drops declarations overridden by a later rule with the same selectors.
/// Nothing moves, so no reorder proof is needed.
pub fn reduce_non_adjacent(mut tokens: Vec<Token>, options: &Options) -> Vec<Token> {
    for group in group_by_selectors(&tokens, options) {
        let mut joined = Vec::new();
        let mut owners = Vec::new();
        for &index in &group {
            for (position, declaration) in properties_of(&tokens[index]).iter().enumerate() {
                joined.push(declaration.clone());
                owners.push((index, position));
            }
        }

        let survivors = properties::surviving(joined, options);
        if survivors.len() == owners.len() {
            continue;
        }
        let mut keep = vec![false; owners.len()];
        for survivor in survivors {
            keep[survivor] = true;
        }

        for &index in &group {
            let Some(properties) = properties_mut(&mut tokens[index]) else {
                continue;
            };
            let kept: Vec<Declaration> = std::mem::take(properties)
                .into_iter()
                .enumerate()
                .filter(|(position, _)| {
                    owners
                        .iter()
                        .zip(&keep)
                        .any(|(owner, keep)| *keep && *owner == (index, *position))
                })
                .map(|(_, declaration)| declaration)
                .collect();
            *properties = kept;
        }
    }
    tokens
}

/// Joins rules with the same selectors: the earlier body moves down into the
/// later rule, or failing that the later body moves up.
pub fn merge_by_selector(mut tokens: Vec<Token>, options: &Options) -> Vec<Token> {
    for group in group_by_selectors(&tokens, options) {
        let mut later = group[group.len() - 1];
        for &earlier in group[..group.len() - 1].iter().rev() {
            if can_move(&tokens, earlier, later) {
                let moved = properties_mut(&mut tokens[earlier]).map(std::mem::take).unwrap_or_default();
                if let Some(properties) = properties_mut(&mut tokens[later]) {
                    let mut joined = moved;
                    joined.append(properties);
                    *properties = properties::optimize(joined, options, Mode::full(options));
                }
            } else if can_move(&tokens, later, earlier) {
                let moved = properties_mut(&mut tokens[later]).map(std::mem::take).unwrap_or_default();
                if let Some(properties) = properties_mut(&mut tokens[earlier]) {
                    properties.extend(moved);
                    *properties = properties::optimize(std::mem::take(properties), options, Mode::full(options));
                }
                later = earlier;
            } else {
                later = earlier;
            }
        }
    }
    tokens
}

/// Selectors that may match the same element as many others.
fn is_unsafe(selectors: &str) -> bool {
    selectors.contains('.') || selectors.contains('*') || selectors.contains(" :")
}

/// Joins rules with identical bodies by moving the later rule's selectors
/// up into the earlier rule.
pub fn merge_by_body(mut tokens: Vec<Token>, options: &Options) -> Vec<Token> {
    let mut candidates: HashMap<String, usize> = HashMap::new();

    for index in (0..tokens.len()).rev() {
        let Token::Selector {
            selectors,
            properties,
        } = &tokens[index]
        else {
            continue;
        };
        if properties.is_empty() {
            continue;
        }
        if !options.semantic_merging && is_unsafe(&selectors_text(selectors)) {
            candidates.clear();
        }
        let body = body_text(properties);

        if let Some(&later) = candidates.get(&body) {
            if !is_special(&tokens[index], options)
                && !is_special(&tokens[later], options)
                && can_move(&tokens, later, index)
            {
                let moved = match &mut tokens[later] {
                    Token::Selector {
                        selectors,
                        properties,
                    } => {
                        properties.clear();
                        std::mem::take(selectors)
                    }
                    _ => Vec::new(),
                };
                if let Token::Selector { selectors, .. } = &mut tokens[index] {
                    let mut joined = moved;
                    joined.append(selectors);
                    *selectors = clean_up::selectors(joined, &options.compatibility.selectors);
                }
            }
        }
        candidates.insert(body, index);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Fragment;

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
            .filter_map(|token| match token {
                Token::Selector {
                    selectors,
                    properties,
                } if !properties.is_empty() => Some(format!(
                    "{}{{{}}}",
                    selectors_text(selectors),
                    body_text(properties)
                )),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn reduces_overridden_declarations() {
        let options = Options::default();
        let tokens = vec![
            rule(&["a"], &[("color", "red"), ("width", "1px")]),
            rule(&[".b"], &[("color", "green")]),
            rule(&["a"], &[("color", "blue")]),
        ];
        assert_eq!(
            render(&reduce_non_adjacent(tokens, &options)),
            "a{width:1px}.b{color:green}a{color:blue}"
        );
    }

    #[test]
    fn merges_selectors_across_reorderable_rules() {
        let options = Options::default();
        let tokens = vec![
            rule(&["a"], &[("color", "red")]),
            rule(&["b"], &[("margin", "0")]),
            rule(&["a"], &[("width", "1px")]),
        ];
        assert_eq!(
            render(&merge_by_selector(tokens, &options)),
            "b{margin:0}a{color:red;width:1px}"
        );
    }

    #[test]
    fn moves_later_body_up_when_earlier_is_pinned() {
        let options = Options::default();
        let tokens = vec![
            rule(&["a"], &[("color", "red")]),
            rule(&[".b"], &[("color", "green")]),
            rule(&["a"], &[("width", "1px")]),
        ];
        assert_eq!(
            render(&merge_by_selector(tokens, &options)),
            "a{color:red;width:1px}.b{color:green}"
        );
    }

    #[test]
    fn refuses_to_cross_conflicting_rules() {
        let options = Options::default();
        let tokens = vec![
            rule(&["a"], &[("color", "red")]),
            rule(&[".b"], &[("color", "green")]),
            rule(&["a"], &[("width", "1px"), ("color", "blue")]),
        ];
        assert_eq!(
            render(&merge_by_selector(tokens, &options)),
            "a{color:red}.b{color:green}a{width:1px;color:blue}"
        );
    }

    #[test]
    fn merges_bodies_upwards() {
        let options = Options::default();
        let tokens = vec![
            rule(&["a"], &[("color", "red")]),
            rule(&["p"], &[("margin", "0")]),
            rule(&["b"], &[("color", "red")]),
        ];
        assert_eq!(
            render(&merge_by_body(tokens, &options)),
            "a,b{color:red}p{margin:0}"
        );
    }

    #[test]
    fn unsafe_selectors_reset_body_candidates() {
        let options = Options::default();
        let tokens = vec![
            rule(&["a"], &[("color", "red")]),
            rule(&[".p"], &[("margin", "0")]),
            rule(&["b"], &[("color", "red")]),
        ];
        assert_eq!(
            render(&merge_by_body(tokens, &options)),
            "a{color:red}.p{margin:0}b{color:red}"
        );
    }
}
