//! Whether a later value may silently replace an earlier one.
//!
//! Each property belongs to one [`Family`]. The predicate answers: if a
//! browser understands the earlier value, is it guaranteed to understand
//! the later one as well? Only then is dropping the earlier declaration
//! safe.

use crate::options::Compatibility;
use crate::token::Fragment;

use super::validator::{
    function_name, is_function, is_function_without_vendor_prefix, is_image,
    is_named_or_hex_color, is_translucent_color, is_unit_without_function, is_url,
    is_variable, vendor_prefix,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    /// Keyword-valued properties: any later value wins.
    Always,
    /// Any later value wins unless it is a function the earlier one is not.
    AlwaysButIntoFunction,
    Color,
    /// `background-image` like values: urls, gradients, `none`.
    Image,
    /// Only an identical value may replace the earlier one.
    SameValue,
    /// Lengths, numbers and functions such as `calc()`.
    Unit,
}

/// Values with different vendor prefixes or a variable on one side only
/// are never comparable.
fn understandable(left: &str, right: &str) -> bool {
    vendor_prefix(left) == vendor_prefix(right) && is_variable(left) == is_variable(right)
}

fn same_function_or_value(left: &str, right: &str) -> bool {
    match (function_name(left), function_name(right)) {
        (Some(left), Some(right)) => left == right,
        _ => left == right,
    }
}

fn color(left: &str, right: &str, compatibility: &Compatibility) -> bool {
    if !understandable(left, right) {
        return false;
    }
    if !compatibility.colors_opacity && (is_translucent_color(left) || is_translucent_color(right))
    {
        return false;
    }
    if is_named_or_hex_color(right) {
        return true;
    }
    if is_named_or_hex_color(left) {
        return false;
    }
    same_function_or_value(left, right)
}

fn image(left: &str, right: &str) -> bool {
    if !understandable(left, right) {
        return false;
    }
    if is_url(right) || right.eq_ignore_ascii_case("none") {
        return true;
    }
    if is_url(left) || left.eq_ignore_ascii_case("none") {
        return false;
    }
    if is_image(left) && is_image(right) {
        return same_function_or_value(left, right);
    }
    left == right
}

fn always_but_into_function(left: &str, right: &str) -> bool {
    if !is_function(right) {
        return true;
    }
    understandable(left, right) && same_function_or_value(left, right)
}

fn unit(left: &str, right: &str, compatibility: &Compatibility) -> bool {
    if !understandable(left, right) && !is_unit_without_function(right, compatibility) {
        return false;
    }
    let left_plain = is_unit_without_function(left, compatibility);
    let right_plain = is_unit_without_function(right, compatibility);
    if left_plain && !right_plain && is_function(right) {
        return false;
    }
    if right_plain {
        return true;
    }
    if left_plain {
        return false;
    }
    if is_function_without_vendor_prefix(left) && is_function_without_vendor_prefix(right) {
        return true;
    }
    if !is_function(left) && !is_function(right) {
        return understandable(left, right);
    }
    same_function_or_value(left, right)
}

/// Whether the single word `right` may replace `left`.
pub fn can_override(family: Family, left: &str, right: &str, compatibility: &Compatibility) -> bool {
    match family {
        Family::Always => true,
        Family::AlwaysButIntoFunction => always_but_into_function(left, right),
        Family::Color => color(left, right, compatibility),
        Family::Image => image(left, right),
        Family::SameValue => left == right,
        Family::Unit => unit(left, right, compatibility),
    }
}

/// `can_override` for every pair of words of the two values, skipping
/// `,` and `/` separators. All pairs must agree, not just the first.
pub fn every_combination(
    family: Family,
    left: &[Fragment],
    right: &[Fragment],
    compatibility: &Compatibility,
) -> bool {
    left.iter().filter(|word| !word.is_separator()).all(|left| {
        right
            .iter()
            .filter(|word| !word.is_separator())
            .all(|right| can_override(family, &left.value, &right.value, compatibility))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(family: Family, left: &str, right: &str) -> bool {
        can_override(family, left, right, &Compatibility::default())
    }

    #[test]
    fn colors() {
        assert!(check(Family::Color, "red", "#fff"));
        assert!(check(Family::Color, "rgba(0,0,0,.5)", "red"));
        assert!(!check(Family::Color, "red", "rgba(0,0,0,.5)"));
        assert!(check(Family::Color, "rgba(0,0,0,.5)", "rgba(1,1,1,.5)"));
        assert!(!check(Family::Color, "hsla(0,0%,0%,.5)", "rgba(1,1,1,.5)"));
        let ie8 = Compatibility::preset("ie8").unwrap();
        assert!(!can_override(Family::Color, "red", "rgba(0,0,0,.5)", &ie8));
    }

    #[test]
    fn units() {
        assert!(check(Family::Unit, "calc(100% - 1px)", "1px"));
        assert!(!check(Family::Unit, "1px", "calc(100% - 1px)"));
        assert!(check(Family::Unit, "calc(1px + 1px)", "calc(2px + 2px)"));
        assert!(!check(Family::Unit, "-webkit-calc(1px)", "-moz-calc(1px)"));
        assert!(check(Family::Unit, "block", "grid"));
        assert!(!check(Family::Unit, "-webkit-box", "flex"));
        let ie8 = Compatibility::preset("ie8").unwrap();
        assert!(!can_override(Family::Unit, "1px", "1rem", &ie8));
        assert!(can_override(Family::Unit, "1rem", "1px", &ie8));
    }

    #[test]
    fn images() {
        assert!(check(Family::Image, "linear-gradient(red,blue)", "__ESCAPED_URL_1__"));
        assert!(!check(Family::Image, "__ESCAPED_URL_1__", "linear-gradient(red,blue)"));
        assert!(!check(
            Family::Image,
            "-webkit-linear-gradient(red,blue)",
            "linear-gradient(red,blue)"
        ));
    }

    #[test]
    fn every_pair_must_agree() {
        let left = vec![Fragment::new("red"), Fragment::new(","), Fragment::new("blue")];
        let right = vec![Fragment::new("rgba(0,0,0,.5)")];
        let hex = vec![Fragment::new("#000")];
        let compatibility = Compatibility::default();

        assert!(every_combination(Family::Color, &left, &hex, &compatibility));
        assert!(!every_combination(Family::Color, &left, &right, &compatibility));
    }
}
