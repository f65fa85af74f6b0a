//! `@media` de-duplication and merging.

use std::collections::HashMap;

use crate::token::{Token, body_text, selectors_text};

use super::non_adjacent::can_move;

fn is_media(token: &Token) -> bool {
    matches!(token, Token::Block { header, .. } if header.value.starts_with("@media"))
}

/// A comparable rendering of a token list.
fn render_key(tokens: &[Token]) -> String {
    let mut key = String::new();
    for token in tokens {
        match token {
            Token::Selector {
                selectors,
                properties,
            } => {
                key.push_str(&selectors_text(selectors));
                key.push('{');
                key.push_str(&body_text(properties));
                key.push('}');
            }
            Token::Block { header, children } => {
                key.push_str(&header.value);
                key.push('{');
                key.push_str(&render_key(children));
                key.push('}');
            }
            Token::FlatBlock { header, properties } => {
                key.push_str(&header.value);
                key.push('{');
                key.push_str(&body_text(properties));
                key.push('}');
            }
            Token::AtRule { text } | Token::Text { text } => {
                key.push_str(&text.value);
                key.push(';');
            }
        }
    }
    key
}

fn media_key(token: &Token) -> String {
    render_key(std::slice::from_ref(token))
}

/// Keeps only the last of identical `@media` blocks.
pub fn remove_duplicate_media(tokens: Vec<Token>) -> Vec<Token> {
    let mut last_seen: HashMap<String, usize> = HashMap::new();
    for (index, token) in tokens.iter().enumerate() {
        if is_media(token) {
            last_seen.insert(media_key(token), index);
        }
    }

    tokens
        .into_iter()
        .enumerate()
        .filter(|(index, token)| !is_media(token) || last_seen.get(&media_key(token)) == Some(index))
        .map(|(_, token)| token)
        .collect()
}

fn children_mut(token: &mut Token) -> Option<&mut Vec<Token>> {
    match token {
        Token::Block { children, .. } => Some(children),
        _ => None,
    }
}

/// Joins `@media` blocks with the same query: the earlier block moves down
/// into the later one, or failing that the later one moves up. Returns
/// whether anything merged, in which case the merged bodies deserve another
/// optimization round.
pub fn merge_media_queries(mut tokens: Vec<Token>) -> (Vec<Token>, bool) {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        if let Token::Block { header, children } = token {
            if is_media(token) && !children.is_empty() {
                let slot = *slots.entry(header.value.clone()).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[slot].push(index);
            }
        }
    }

    let mut merged = false;
    for group in groups.into_iter().filter(|group| group.len() > 1) {
        let mut later = group[group.len() - 1];
        for &earlier in group[..group.len() - 1].iter().rev() {
            if can_move(&tokens, earlier, later) {
                let moved = children_mut(&mut tokens[earlier]).map(std::mem::take).unwrap_or_default();
                if let Some(children) = children_mut(&mut tokens[later]) {
                    let mut joined = moved;
                    joined.append(children);
                    *children = joined;
                }
                merged = true;
            } else if can_move(&tokens, later, earlier) {
                let moved = children_mut(&mut tokens[later]).map(std::mem::take).unwrap_or_default();
                if let Some(children) = children_mut(&mut tokens[earlier]) {
                    children.extend(moved);
                }
                later = earlier;
                merged = true;
            } else {
                later = earlier;
            }
        }
    }
    (tokens, merged)
}
