//! Textual normalization of selectors and at-rule headers.

use crate::options::SelectorCompatibility;
use crate::split::collapse_whitespace;
use crate::token::Fragment;

const COMBINATORS: &[char] = &['>', '+', '~'];

/// Selector hacks only old IE reads.
const IE7_HACKS: &[&str] = &["*+html ", "*:first-child+html "];

/// Drops spaces around combinators outside brackets.
fn tighten(selector: &str, adjacent_space: bool) -> String {
    let chars: Vec<char> = selector.chars().collect();
    let mut tightened = String::with_capacity(selector.len());
    let mut depth = 0i32;

    for (index, &c) in chars.iter().enumerate() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ' ' if depth == 0 => {
                let previous = tightened.chars().last();
                let next = chars.get(index + 1).copied();
                let after_combinator = previous.is_some_and(|previous| {
                    COMBINATORS.contains(&previous) && !(previous == '+' && adjacent_space)
                });
                let before_combinator = next.is_some_and(|next| COMBINATORS.contains(&next));
                if after_combinator || before_combinator {
                    continue;
                }
            }
            _ => {}
        }
        tightened.push(c);
    }
    tightened
}

/// `*.a` -> `.a`, `a > *:hover` -> `a>:hover`.
fn elide_universal(selector: &str) -> String {
    let chars: Vec<char> = selector.chars().collect();
    let mut elided = String::with_capacity(selector.len());
    let mut depth = 0i32;

    for (index, &c) in chars.iter().enumerate() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            '*' if depth == 0 => {
                let starts_compound = index == 0
                    || matches!(chars[index - 1], ' ' | '>' | '+' | '~');
                let qualified = chars
                    .get(index + 1)
                    .is_some_and(|next| matches!(next, '.' | '#' | '[' | ':'));
                if starts_compound && qualified {
                    continue;
                }
            }
            _ => {}
        }
        elided.push(c);
    }
    elided
}

/// Normalizes one selector; `None` drops it.
pub fn selector(text: &str, compatibility: &SelectorCompatibility) -> Option<String> {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return None;
    }
    if !compatibility.ie7_hack && IE7_HACKS.iter().any(|hack| collapsed.contains(hack)) {
        return None;
    }
    let tightened = tighten(&collapsed, compatibility.adjacent_space);
    let elided = elide_universal(&tightened);
    if elided.is_empty() {
        Some(tightened)
    } else {
        Some(elided)
    }
}

/// Normalizes, sorts and de-duplicates a selector list.
pub fn selectors(list: Vec<Fragment>, compatibility: &SelectorCompatibility) -> Vec<Fragment> {
    let mut cleaned: Vec<Fragment> = list
        .into_iter()
        .filter_map(|fragment| {
            let value = selector(&fragment.value, compatibility)?;
            Some(Fragment::at(value, fragment.origin))
        })
        .collect();
    cleaned.sort_by(|left, right| left.value.cmp(&right.value));
    cleaned.dedup_by(|right, left| left.value == right.value);
    cleaned
}

/// `@media screen and ( max-width : 100px )` -> `@media screen and (max-width:100px)`.
pub fn block_header(header: &str) -> String {
    let collapsed = collapse_whitespace(header);
    let chars: Vec<char> = collapsed.chars().collect();
    let mut cleaned = String::with_capacity(collapsed.len());

    for (index, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let previous = cleaned.chars().last();
            let next = chars.get(index + 1).copied();
            if matches!(previous, Some(',' | ':' | '(')) || matches!(next, Some(')' | ':')) {
                continue;
            }
        }
        cleaned.push(c);
    }
    cleaned
}

/// Statement at-rules: whitespace collapse only.
pub fn at_rule(text: &str) -> String {
    collapse_whitespace(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Compatibility;

    fn clean(text: &str) -> Option<String> {
        selector(text, &Compatibility::default().selectors)
    }

    #[test]
    fn tightens_combinators() {
        assert_eq!(clean("  ul   >  li  +  li ").as_deref(), Some("ul>li+li"));
        assert_eq!(clean("a ~ b").as_deref(), Some("a~b"));
        assert_eq!(clean("li:nth-child(2n + 1)").as_deref(), Some("li:nth-child(2n + 1)"));
    }

    #[test]
    fn keeps_space_after_plus_when_asked() {
        let mut compatibility = Compatibility::default().selectors;
        compatibility.adjacent_space = true;
        assert_eq!(selector("a + b", &compatibility).as_deref(), Some("a+ b"));
    }

    #[test]
    fn elides_universal_selector() {
        assert_eq!(clean("*.a").as_deref(), Some(".a"));
        assert_eq!(clean("div > *:hover").as_deref(), Some("div>:hover"));
        assert_eq!(clean("*").as_deref(), Some("*"));
        assert_eq!(clean("a *").as_deref(), Some("a *"));
    }

    #[test]
    fn drops_ie7_hacks_unless_enabled() {
        assert_eq!(clean("*+html .a"), None);
        let ie7 = Compatibility::preset("ie7").unwrap().selectors;
        assert_eq!(selector("*+html .a", &ie7).as_deref(), Some("*+html .a"));
    }

    #[test]
    fn sorts_and_dedupes() {
        let list = ["b", "a", " b "].into_iter().map(Fragment::new).collect();
        let cleaned: Vec<String> = selectors(list, &Compatibility::default().selectors)
            .into_iter()
            .map(|fragment| fragment.value)
            .collect();
        assert_eq!(cleaned, ["a", "b"]);
    }

    #[test]
    fn normalizes_media_headers() {
        assert_eq!(
            block_header("@media screen and ( max-width : 100px ),print"),
            "@media screen and (max-width:100px),print"
        );
    }
}
