//! Classification of single value words.
//!
//! Every predicate works on the escaped form: urls are `__ESCAPED_URL_n__`
//! placeholders at this point.

use crate::escape::{EscapeStore, Kind};
use crate::options::Compatibility;
use crate::values::{is_color, parse_dimension};

const POSITION_KEYWORDS: &[&str] = &["bottom", "center", "left", "right", "top"];
const REPEAT_KEYWORDS: &[&str] = &["no-repeat", "repeat", "repeat-x", "repeat-y", "round", "space"];
const ATTACHMENT_KEYWORDS: &[&str] = &["fixed", "local", "scroll"];
const BOX_KEYWORDS: &[&str] = &["border-box", "content-box", "padding-box"];
const SIZE_KEYWORDS: &[&str] = &["auto", "contain", "cover"];
const STYLE_KEYWORDS: &[&str] = &[
    "dashed", "dotted", "double", "groove", "hidden", "inset", "none", "outset", "ridge", "solid",
];
const WIDTH_KEYWORDS: &[&str] = &["medium", "thick", "thin"];
const LIST_TYPE_KEYWORDS: &[&str] = &[
    "armenian",
    "circle",
    "cjk-ideographic",
    "decimal",
    "decimal-leading-zero",
    "disc",
    "georgian",
    "hebrew",
    "hiragana",
    "hiragana-iroha",
    "katakana",
    "katakana-iroha",
    "lower-alpha",
    "lower-greek",
    "lower-latin",
    "lower-roman",
    "none",
    "square",
    "upper-alpha",
    "upper-latin",
    "upper-roman",
];
const LIST_POSITION_KEYWORDS: &[&str] = &["inside", "outside"];
const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "unset"];

fn one_of(word: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(word))
}

/// The vendor prefix of a word such as `-webkit-linear-gradient(...)`.
pub fn vendor_prefix(word: &str) -> Option<&str> {
    let rest = word.strip_prefix('-')?;
    let dash = rest.find('-')?;
    let prefix = &word[..dash + 2];
    matches!(prefix, "-webkit-" | "-moz-" | "-ms-" | "-o-").then_some(prefix)
}

/// `name(` ... `)` words, excluding placeholders.
pub fn is_function(word: &str) -> bool {
    word.find('(').is_some_and(|open| open > 0) && word.ends_with(')')
}

/// The lowercase name of a function word.
pub fn function_name(word: &str) -> Option<String> {
    is_function(word).then(|| word[..word.find('(').unwrap_or(0)].to_ascii_lowercase())
}

pub fn is_variable(word: &str) -> bool {
    word.to_ascii_lowercase().contains("var(")
}

pub fn is_url(word: &str) -> bool {
    EscapeStore::kind_at(word) == Some(Kind::Url)
}

pub fn is_global(word: &str) -> bool {
    one_of(word, GLOBAL_KEYWORDS)
}

pub fn is_inherit(word: &str) -> bool {
    word.eq_ignore_ascii_case("inherit")
}

/// A plain number or length the target understands, or `auto`.
pub fn is_unit_without_function(word: &str, compatibility: &Compatibility) -> bool {
    if word.eq_ignore_ascii_case("auto") || is_global(word) {
        return true;
    }
    match parse_dimension(word) {
        Some(dimension) => {
            let unit = dimension.unit.to_ascii_lowercase();
            unit.is_empty() || compatibility.allows_unit(&unit)
        }
        None => false,
    }
}

/// `calc()`-like functions without a vendor prefix.
pub fn is_function_without_vendor_prefix(word: &str) -> bool {
    is_function(word) && vendor_prefix(word).is_none()
}

pub fn is_named_or_hex_color(word: &str) -> bool {
    is_color(word) && !is_function(word)
}

pub fn is_translucent_color(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    lower.starts_with("rgba(") || lower.starts_with("hsla(")
}

pub fn is_image(word: &str) -> bool {
    word.eq_ignore_ascii_case("none")
        || is_url(word)
        || function_name(word).is_some_and(|name| name.contains("gradient") || name == "image-set")
}

pub fn is_position(word: &str) -> bool {
    one_of(word, POSITION_KEYWORDS) || parse_dimension(word).is_some() || is_function(word)
}

pub fn is_size(word: &str) -> bool {
    one_of(word, SIZE_KEYWORDS) || parse_dimension(word).is_some() || is_function(word)
}

pub fn is_repeat(word: &str) -> bool {
    one_of(word, REPEAT_KEYWORDS)
}

pub fn is_attachment(word: &str) -> bool {
    one_of(word, ATTACHMENT_KEYWORDS)
}

pub fn is_box(word: &str) -> bool {
    one_of(word, BOX_KEYWORDS)
}

pub fn is_style(word: &str) -> bool {
    one_of(word, STYLE_KEYWORDS)
}

pub fn is_width(word: &str) -> bool {
    one_of(word, WIDTH_KEYWORDS)
        || parse_dimension(word).is_some()
        || function_name(word).is_some_and(|name| name.ends_with("calc"))
}

pub fn is_list_style_type(word: &str) -> bool {
    one_of(word, LIST_TYPE_KEYWORDS)
}

pub fn is_list_style_position(word: &str) -> bool {
    one_of(word, LIST_POSITION_KEYWORDS)
}

/// Whether a word may appear as a color inside a shorthand.
pub fn is_shorthand_color(word: &str) -> bool {
    is_color(word) || word.eq_ignore_ascii_case("invert")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_vendor_prefixes() {
        assert_eq!(vendor_prefix("-webkit-linear-gradient(red,blue)"), Some("-webkit-"));
        assert_eq!(vendor_prefix("-1px"), None);
        assert_eq!(vendor_prefix("linear-gradient(red,blue)"), None);
    }

    #[test]
    fn classifies_units() {
        let modern = Compatibility::default();
        let ie8 = Compatibility::preset("ie8").unwrap();
        assert!(is_unit_without_function("1rem", &modern));
        assert!(!is_unit_without_function("1rem", &ie8));
        assert!(is_unit_without_function("auto", &ie8));
        assert!(!is_unit_without_function("calc(1px+2px)", &modern));
    }

    #[test]
    fn classifies_background_words() {
        assert!(is_image("__ESCAPED_URL_0__"));
        assert!(is_image("linear-gradient(red,blue)"));
        assert!(is_position("center"));
        assert!(is_repeat("no-repeat"));
        assert!(is_box("content-box"));
        assert!(!is_image("red"));
    }
}
