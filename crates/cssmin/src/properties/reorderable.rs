//! Whether declarations may move across other rules.
//!
//! Moving a declaration past another rule is safe when no element can end
//! up with a different winner for any property. Every check here errs on
//! the side of "not reorderable".

use crate::token::{Declaration, Token};
use crate::values::unprefixed;

use super::compactable::overlaps;
use super::validator::vendor_prefix;

const FLEX_NAMES: &[&str] = &["align-items", "box-align", "box-pack", "flex", "justify"];

const INHERITABLE: &[&str] = &[
    "azimuth",
    "border-collapse",
    "border-spacing",
    "caption-side",
    "color",
    "cursor",
    "direction",
    "elevation",
    "empty-cells",
    "font",
    "letter-spacing",
    "line-height",
    "list-style",
    "orphans",
    "pitch",
    "quotes",
    "richness",
    "speak",
    "speech-rate",
    "stress",
    "text-align",
    "text-indent",
    "text-transform",
    "visibility",
    "voice-family",
    "volume",
    "white-space",
    "widows",
    "word-spacing",
];

/// One declaration together with the rule it lives in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extracted {
    pub name: String,
    /// Leading word of the unprefixed name: `border` for `border-top-width`.
    pub root: String,
    pub value: String,
    pub important: bool,
    pub selectors: Vec<String>,
    /// Every selector is a bare type or id selector.
    pub specific: bool,
}

fn strip_hack(name: &str) -> &str {
    name.trim_start_matches(['*', '_'])
}

fn root_of(name: &str) -> String {
    unprefixed(strip_hack(name))
        .trim_start_matches('-')
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == '-')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_type_selector(selector: &str) -> bool {
    is_identifier(selector)
}

fn is_id_selector(selector: &str) -> bool {
    selector.strip_prefix('#').is_some_and(is_identifier)
}

/// Bare type selectors, or bare id selectors: two distinct ones never
/// match the same element.
fn is_specific(selectors: &[String]) -> bool {
    !selectors.is_empty()
        && (selectors.iter().all(|selector| is_type_selector(selector))
            || selectors.iter().all(|selector| is_id_selector(selector)))
}

/// Declarations of one body owned by `selectors`.
pub fn extract_body(properties: &[Declaration], selectors: &[String]) -> Vec<Extracted> {
    let mut extracted = Vec::new();
    extract_declarations(properties, selectors, &mut extracted);
    extracted
}

fn extract_declarations(properties: &[Declaration], selectors: &[String], into: &mut Vec<Extracted>) {
    let specific = is_specific(selectors);
    for declaration in properties.iter().filter(|declaration| !declaration.comment) {
        let name = declaration.name.value.to_ascii_lowercase();
        into.push(Extracted {
            root: root_of(&name),
            name,
            value: declaration.value_text(),
            important: declaration.important,
            selectors: selectors.to_vec(),
            specific,
        });
    }
}

/// All declarations a token contributes, nested blocks included.
pub fn extract(token: &Token) -> Vec<Extracted> {
    let mut extracted = Vec::new();
    extract_into(token, &mut extracted);
    extracted
}

fn extract_into(token: &Token, into: &mut Vec<Extracted>) {
    match token {
        Token::Selector {
            selectors,
            properties,
        } => {
            let selectors: Vec<String> = selectors.iter().map(|selector| selector.value.clone()).collect();
            extract_declarations(properties, &selectors, into);
        }
        Token::FlatBlock { header, properties } => {
            extract_declarations(properties, std::slice::from_ref(&header.value), into);
        }
        Token::Block { children, .. } => {
            for child in children {
                extract_into(child, into);
            }
        }
        Token::AtRule { .. } | Token::Text { .. } => {}
    }
}

fn is_flex(name: &str) -> bool {
    FLEX_NAMES.iter().any(|flex| name.contains(flex))
}

fn is_inheritable(name: &str) -> bool {
    let name = unprefixed(strip_hack(name));
    INHERITABLE.contains(&name) || name.starts_with("font-") || name.starts_with("list-style-")
}

fn disjoint(left: &[String], right: &[String]) -> bool {
    left.iter().all(|selector| !right.contains(selector))
}

/// Whether `left` may move across `right`.
pub fn can_reorder_single(left: &Extracted, right: &Extracted) -> bool {
    let (left_name, right_name) = (strip_hack(&left.name), strip_hack(&right.name));

    if matches!((left_name, right_name), ("font", "line-height") | ("line-height", "font")) {
        return false;
    }
    if is_flex(left_name) && is_flex(right_name) {
        return false;
    }
    if left_name != right_name
        && unprefixed(left_name) == unprefixed(right_name)
        && vendor_prefix(left_name) != vendor_prefix(right_name)
    {
        return false;
    }
    if left.root != right.root {
        return true;
    }

    if left_name == right_name {
        if left.value == right.value && left.name == right.name {
            return true;
        }
    } else {
        // Within one root, the root shorthand resets everything else.
        let shorthand = |name: &str| unprefixed(name) == left.root;
        if !shorthand(left_name) && !shorthand(right_name) && !overlaps(left_name, right_name) {
            return true;
        }
    }

    left.specific
        && right.specific
        && !is_inheritable(left_name)
        && !is_inheritable(right_name)
        && disjoint(&left.selectors, &right.selectors)
}

/// Whether every declaration of `moved` may cross every one of `traversed`.
pub fn can_reorder(moved: &[Extracted], traversed: &[Extracted]) -> bool {
    moved
        .iter()
        .all(|left| traversed.iter().all(|right| can_reorder_single(left, right)))
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

    fn reorderable(left: &Token, right: &Token) -> bool {
        can_reorder(&extract(left), &extract(right))
    }

    #[test]
    fn computes_roots() {
        assert_eq!(root_of("border-top-width"), "border");
        assert_eq!(root_of("-webkit-box-shadow"), "box");
        assert_eq!(root_of("*zoom"), "zoom");
    }

    #[test]
    fn different_families_reorder() {
        assert!(reorderable(&rule(&[".a"], &[("color", "red")]), &rule(&[".b"], &[("margin", "0")])));
        assert!(reorderable(
            &rule(&[".a"], &[("margin-top", "0")]),
            &rule(&[".b"], &[("margin-left", "1px")])
        ));
    }

    #[test]
    fn conflicting_values_do_not_reorder() {
        assert!(!reorderable(&rule(&["a"], &[("color", "red")]), &rule(&["b"], &[("color", "green")])));
        assert!(!reorderable(
            &rule(&[".a"], &[("margin", "0")]),
            &rule(&[".b"], &[("margin-top", "1px")])
        ));
        assert!(!reorderable(
            &rule(&[".a"], &[("border-top", "0")]),
            &rule(&[".b"], &[("border-color", "red")])
        ));
    }

    #[test]
    fn distinct_elements_reorder_non_inheritable() {
        assert!(reorderable(&rule(&["a"], &[("width", "1px")]), &rule(&["b"], &[("width", "2px")])));
        assert!(!reorderable(&rule(&[".a"], &[("width", "1px")]), &rule(&[".b"], &[("width", "2px")])));
    }

    #[test]
    fn prefixes_and_flex_block_moves() {
        assert!(!reorderable(
            &rule(&["a"], &[("-webkit-transform", "none")]),
            &rule(&["b"], &[("transform", "none")])
        ));
        assert!(!reorderable(
            &rule(&[".a"], &[("flex", "1")]),
            &rule(&[".b"], &[("justify-content", "center")])
        ));
        assert!(!reorderable(&rule(&[".a"], &[("font", "12px a")]), &rule(&[".b"], &[("line-height", "1")])));
    }
}
