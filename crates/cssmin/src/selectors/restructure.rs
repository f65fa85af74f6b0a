//! Restructuring: a declaration shared by several rules moves into one new
//! rule listing all their selectors, placed after the last of them.
//!
//! A move is applied only when it shortens the output and every rule the
//! declaration crosses is reorderable with it. Each round collects the best
//! move for every candidate position, then applies as many of them as touch
//! disjoint ranges of rules. Moves only travel a bounded number of rules and
//! rounds are capped, so the work stays proportional to the stylesheet.

use std::collections::{BTreeMap, HashMap};

use crate::options::Options;
use crate::properties::reorderable::{Extracted, can_reorder, extract, extract_body};
use crate::token::{Declaration, Fragment, Token, selectors_text};

use super::clean_up;
use super::merge::is_special;

/// How many owners a move may leave behind to become reorderable or
/// profitable.
const MAX_DROPPED: usize = 2;

/// Dropping owners is only tried for groups up to this size.
const DROP_SEARCH_LIMIT: usize = 16;

/// Furthest a declaration travels, in rules, to join a combined rule.
const MOVE_WINDOW: usize = 64;

/// Rounds of moves before restructuring gives up on further savings.
const MAX_ROUNDS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Owner {
    token: usize,
    declaration: usize,
}

#[derive(Debug)]
struct Move {
    owners: Vec<Owner>,
    selectors: Vec<Fragment>,
    declaration: Declaration,
    after: usize,
    gain: usize,
}

impl Move {
    /// First and last token the move reads or rewrites.
    fn span(&self) -> (usize, usize) {
        (self.owners.first().map_or(self.after, |owner| owner.token), self.after)
    }
}

pub fn restructure(mut tokens: Vec<Token>, options: &Options) -> Vec<Token> {
    for round in 0..MAX_ROUNDS {
        let moves = find_moves(&tokens, options);
        if moves.is_empty() {
            break;
        }
        log::trace!("restructuring round {round}: {} moves", moves.len());
        apply(&mut tokens, moves);
    }
    tokens
}

/// Hacks and custom properties never move.
fn movable(declaration: &Declaration) -> bool {
    !declaration.comment
        && !declaration.is_variable()
        && !declaration.name.value.starts_with(['*', '_'])
        && !declaration
            .value
            .iter()
            .any(|word| word.value.ends_with("\\9") || word.value.contains("!ie"))
}

/// Owners of each declaration text found in at least two rules.
fn shared_declarations(tokens: &[Token], options: &Options) -> Vec<Vec<Owner>> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<Owner>> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        let Token::Selector { properties, .. } = token else {
            continue;
        };
        if token.is_empty() || is_special(token, options) {
            continue;
        }
        for (position, declaration) in properties.iter().enumerate() {
            if !movable(declaration) {
                continue;
            }
            let slot = *slots.entry(declaration.text()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            let owners = &mut groups[slot];
            if owners.last().is_none_or(|owner: &Owner| owner.token != index) {
                owners.push(Owner {
                    token: index,
                    declaration: position,
                });
            }
        }
    }
    groups.retain(|owners| owners.len() > 1);
    groups
}

fn parts(token: &Token) -> (&[Fragment], &[Declaration]) {
    match token {
        Token::Selector {
            selectors,
            properties,
        } => (selectors, properties),
        _ => (&[], &[]),
    }
}

/// For every owner of `group`, the last token its declaration may move
/// past; `None` when it cannot even leave the rest of its own body behind.
fn reaches(tokens: &[Token], extracted: &[Vec<Extracted>], group: &[Owner]) -> Vec<Option<usize>> {
    let limit = group.last().map_or(0, |owner| owner.token);

    group
        .iter()
        .map(|&owner| {
            let (selectors, properties) = parts(&tokens[owner.token]);
            let selectors: Vec<String> =
                selectors.iter().map(|selector| selector.value.clone()).collect();
            let moved = extract_body(&properties[owner.declaration..=owner.declaration], &selectors);
            let tail = extract_body(&properties[owner.declaration + 1..], &selectors);
            if !can_reorder(&moved, &tail) {
                return None;
            }

            let end = limit.min(owner.token + MOVE_WINDOW);
            let mut reach = owner.token;
            while reach < end && can_reorder(&moved, &extracted[reach + 1]) {
                reach += 1;
            }
            Some(reach)
        })
        .collect()
}

/// Bytes saved by taking a declaration of `length` out of the owner.
fn saving(tokens: &[Token], owner: Owner, length: usize) -> usize {
    let (selectors, properties) = parts(&tokens[owner.token]);
    if properties.len() == 1 {
        selectors_text(selectors).len() + 2 + length
    } else {
        length + 1
    }
}

/// Kept positions of `count` owners, the last one always kept.
fn subsets(count: usize) -> Vec<Vec<usize>> {
    let all: Vec<usize> = (0..count).collect();
    let mut subsets = vec![all.clone()];
    if count > DROP_SEARCH_LIMIT {
        return subsets;
    }
    let droppable = count - 1;
    for first in 0..droppable {
        subsets.push(all.iter().copied().filter(|&index| index != first).collect());
        if MAX_DROPPED > 1 {
            for second in first + 1..droppable {
                subsets.push(
                    all.iter()
                        .copied()
                        .filter(|&index| index != first && index != second)
                        .collect(),
                );
            }
        }
    }
    subsets.retain(|subset| subset.len() > 1);
    subsets
}

fn is_better(candidate: &Move, best: Option<&Move>) -> bool {
    match best {
        None => true,
        Some(best) => {
            candidate.gain > best.gain
                || (candidate.gain == best.gain
                    && selectors_text(&candidate.selectors).len() < selectors_text(&best.selectors).len())
        }
    }
}

/// The most profitable move of `group` ending at each of its owners.
fn group_moves(
    tokens: &[Token],
    group: &[Owner],
    reach: &[Option<usize>],
    options: &Options,
) -> Vec<Move> {
    let first = group[0];
    let declaration = parts(&tokens[first.token]).1[first.declaration].clone();
    let length = declaration.text().len();
    let mut moves = Vec::new();

    for last in 1..group.len() {
        let after = group[last].token;
        let mut safe: Vec<Owner> = Vec::new();
        for index in (0..=last).rev() {
            let owner = group[index];
            if owner.token + MOVE_WINDOW < after {
                break;
            }
            if reach[index].is_some_and(|reach| reach >= after) {
                safe.push(owner);
            }
        }
        safe.reverse();
        if safe.len() < 2 || safe.last().is_none_or(|owner| owner.token != after) {
            continue;
        }

        let mut best: Option<Move> = None;
        for subset in subsets(safe.len()) {
            let owners: Vec<Owner> = subset.iter().map(|&index| safe[index]).collect();
            let joined: Vec<Fragment> = owners
                .iter()
                .flat_map(|owner| parts(&tokens[owner.token]).0.iter().cloned())
                .collect();
            let selectors = clean_up::selectors(joined, &options.compatibility.selectors);
            let cost = selectors_text(&selectors).len() + 2 + length;
            let savings: usize = owners.iter().map(|&owner| saving(tokens, owner, length)).sum();
            if savings <= cost {
                continue;
            }

            let candidate = Move {
                owners,
                selectors,
                declaration: declaration.clone(),
                after,
                gain: savings - cost,
            };
            if is_better(&candidate, best.as_ref()) {
                best = Some(candidate);
            }
        }
        moves.extend(best);
    }
    moves
}

/// Profitable moves over pairwise disjoint spans, best first.
fn find_moves(tokens: &[Token], options: &Options) -> Vec<Move> {
    let groups = shared_declarations(tokens, options);
    if groups.is_empty() {
        return Vec::new();
    }
    let extracted: Vec<Vec<Extracted>> = tokens.iter().map(extract).collect();

    let mut candidates: Vec<Move> = groups
        .iter()
        .flat_map(|group| {
            let reach = reaches(tokens, &extracted, group);
            group_moves(tokens, group, &reach, options)
        })
        .collect();
    candidates.sort_by(|left, right| {
        right
            .gain
            .cmp(&left.gain)
            .then_with(|| left.span().cmp(&right.span()))
    });

    // Span start to span end of every accepted move.
    let mut taken: BTreeMap<usize, usize> = BTreeMap::new();
    let mut chosen = Vec::new();
    for candidate in candidates {
        let (start, end) = candidate.span();
        let overlaps = taken
            .range(..=end)
            .next_back()
            .is_some_and(|(_, &taken_end)| taken_end >= start);
        if !overlaps {
            taken.insert(start, end);
            chosen.push(candidate);
        }
    }
    chosen
}

/// Applies moves over disjoint spans, the latest first so earlier indices
/// stay valid.
fn apply(tokens: &mut Vec<Token>, mut moves: Vec<Move>) {
    moves.sort_by(|left, right| right.after.cmp(&left.after));
    for chosen in moves {
        log::trace!(
            "restructuring '{}' into '{}' (saves {} bytes)",
            chosen.declaration.text(),
            selectors_text(&chosen.selectors),
            chosen.gain
        );
        for owner in &chosen.owners {
            if let Token::Selector { properties, .. } = &mut tokens[owner.token] {
                properties.remove(owner.declaration);
            }
        }
        tokens.insert(
            chosen.after + 1,
            Token::Selector {
                selectors: chosen.selectors,
                properties: vec![chosen.declaration],
            },
        );
    }
}
