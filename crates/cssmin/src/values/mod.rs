//! Per-value textual rewrites.
//!
//! Runs on the final value fragments of every surviving declaration:
//! numbers and units are shortened, colors folded to their shortest form
//! (only in properties that take colors), function arguments tightened and a
//! few keyword values replaced by shorter equivalents.

pub mod color;
pub mod units;

use crate::escape::{EscapeStore, Kind, PLACEHOLDER_PREFIX};
use crate::options::{Options, PropertyFlags};
use crate::split::{collapse_whitespace, split_top_level, split_value};
use crate::token::{Fragment, join_values};

pub use color::{is_color, minify_color};
pub use units::{minify_dimension, minify_number, parse_dimension};

/// Functions whose arguments keep their internal spacing.
const VERBATIM_FUNCTIONS: &[&str] = &["calc", "-moz-calc", "-webkit-calc", "var", "env"];

/// Strips a vendor prefix: `-webkit-box-shadow` -> `box-shadow`.
pub fn unprefixed(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix('-') {
        if let Some(dash) = rest.find('-') {
            return &rest[dash + 1..];
        }
    }
    name
}

/// Whether the value of `name` may contain colors worth rewriting.
pub fn is_color_property(name: &str) -> bool {
    let name = unprefixed(name);
    name.ends_with("color")
        || matches!(
            name,
            "background"
                | "border"
                | "border-top"
                | "border-right"
                | "border-bottom"
                | "border-left"
                | "box-shadow"
                | "column-rule"
                | "fill"
                | "outline"
                | "stroke"
                | "text-decoration"
                | "text-shadow"
        )
}

/// Rewrites the value fragments of declaration `name` in place.
pub fn minify_value(name: &str, values: &mut Vec<Fragment>, options: &Options) {
    if name.starts_with("--") || unprefixed(name) == "filter" {
        return;
    }

    let colors = is_color_property(name)
        && options
            .compatibility
            .properties
            .contains(PropertyFlags::COLORS);

    for value in values.iter_mut() {
        if let Some(minified) = minify_word(name, &value.value, colors, options) {
            value.value = minified;
        }
    }

    replace_keywords(name, values);

    if !options
        .compatibility
        .properties
        .contains(PropertyFlags::SPACE_AFTER_CLOSING_BRACE)
    {
        join_after_closing_brace(values);
    }
}

/// Minifies one value word; `None` leaves it untouched.
fn minify_word(name: &str, word: &str, colors: bool, options: &Options) -> Option<String> {
    if word.contains(PLACEHOLDER_PREFIX) || matches!(word, "," | "/") {
        return None;
    }

    if let Some(minified) = units::minify_dimension(
        word,
        name,
        &options.compatibility,
        options.rounding_precision,
    ) {
        return Some(minified);
    }

    if colors {
        if let Some(minified) = color::minify_color(word, options.compatibility.colors_opacity) {
            return Some(minified);
        }
    }

    let open = word.find('(')?;
    if !word.ends_with(')') {
        return None;
    }
    let function = word[..open].to_ascii_lowercase();
    let inner = &word[open + 1..word.len() - 1];

    if VERBATIM_FUNCTIONS.contains(&function.as_str()) {
        return Some(format!("{}({})", &word[..open], collapse_whitespace(inner)));
    }

    let arguments = split_top_level(inner, ',')
        .into_iter()
        .map(|(_, argument)| {
            let words: Vec<Fragment> = split_value(argument)
                .into_iter()
                .map(|(_, atom)| {
                    Fragment::new(
                        minify_word("", atom, colors, options).unwrap_or_else(|| atom.to_string()),
                    )
                })
                .collect();
            join_values(&words)
        })
        .collect::<Vec<_>>()
        .join(",");
    Some(format!("{}({})", &word[..open], arguments))
}

/// Whole-value keyword replacements.
fn replace_keywords(name: &str, values: &mut Vec<Fragment>) {
    let [only] = values.as_mut_slice() else {
        return;
    };
    let keyword = only.value.to_ascii_lowercase();

    match (name, keyword.as_str()) {
        ("font-weight", "normal") => only.value = "400".to_string(),
        ("font-weight", "bold") => only.value = "700".to_string(),
        (
            "border" | "border-top" | "border-right" | "border-bottom" | "border-left" | "outline",
            "none",
        ) => only.value = "0".to_string(),
        ("background", "none") => {
            let origin = only.origin;
            only.value = "0".to_string();
            values.push(Fragment::at("0", origin));
        }
        _ => {}
    }
}

fn closes_with_brace(word: &str) -> bool {
    word.ends_with(')') || EscapeStore::kind_at(word) == Some(Kind::Url)
}

/// Glues a word following `)` to it: `url(a) no-repeat` -> `url(a)no-repeat`.
fn join_after_closing_brace(values: &mut Vec<Fragment>) {
    let mut joined: Vec<Fragment> = Vec::with_capacity(values.len());
    for value in values.drain(..) {
        let glue = !value.is_separator()
            && joined
                .last()
                .is_some_and(|previous| closes_with_brace(&previous.value));
        match joined.last_mut() {
            Some(previous) if glue => previous.value.push_str(&value.value),
            _ => joined.push(value),
        }
    }
    *values = joined;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(name: &str, value: &str) -> String {
        let mut values: Vec<Fragment> = split_value(value)
            .into_iter()
            .map(|(_, word)| Fragment::new(word))
            .collect();
        minify_value(name, &mut values, &Options::default());
        join_values(&values)
    }

    #[test]
    fn strips_zero_units_everywhere() {
        assert_eq!(minify("margin", "0.0px 0px"), "0 0");
        assert_eq!(minify("transform", "translate(0px, 10.50px)"), "translate(0,10.5px)");
    }

    #[test]
    fn folds_colors_in_color_properties_only() {
        assert_eq!(minify("color", "#FFFFFF"), "#fff");
        assert_eq!(minify("border", "1px solid rgb(255, 0, 0)"), "1px solid red");
        assert_eq!(minify("font-family", "white"), "white");
    }

    #[test]
    fn replaces_keywords() {
        assert_eq!(minify("font-weight", "bold"), "700");
        assert_eq!(minify("border", "none"), "0");
        assert_eq!(minify("background", "none"), "0 0");
    }

    #[test]
    fn keeps_calc_spacing() {
        assert_eq!(minify("width", "calc(100%  -  10px)"), "calc(100% - 10px)");
    }

    #[test]
    fn leaves_custom_properties_alone() {
        assert_eq!(minify("--gap", "0px"), "0px");
    }

    #[test]
    fn unprefixes_names() {
        assert_eq!(unprefixed("-webkit-box-shadow"), "box-shadow");
        assert_eq!(unprefixed("color"), "color");
    }
}
