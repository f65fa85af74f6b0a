//! Number and dimension minification.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, opt, recognize},
    sequence::{pair, tuple},
};

use crate::options::{Compatibility, PropertyFlags};

/// Units a zero length may drop.
const LENGTH_UNITS: &[&str] = &[
    "ch", "cm", "em", "ex", "in", "mm", "pc", "pt", "px", "q", "rem", "vh", "vm", "vmax", "vmin",
    "vw",
];

/// A number with an optional unit, as written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimension<'a> {
    pub number: &'a str,
    pub unit: &'a str,
    pub value: f64,
}

/// Parse a signed decimal number: `1`, `-1.5`, `.5`, `+2.`.
fn parse_number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
    )))(input)
}

fn parse_unit(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_ascii_alphabetic() || c == '%')(input)
}

/// Parses a whole word as a dimension, e.g. `10px`, `50%`, `.5`.
pub fn parse_dimension(word: &str) -> Option<Dimension<'_>> {
    let (_, (number, unit)) = all_consuming(pair(parse_number, parse_unit))(word).ok()?;
    let value = number.parse::<f64>().ok()?;
    Some(Dimension {
        number,
        unit,
        value,
    })
}

pub fn is_length_unit(unit: &str) -> bool {
    LENGTH_UNITS
        .iter()
        .any(|length| length.eq_ignore_ascii_case(unit))
}

/// Shortest textual form of a decimal number: `0.50` -> `.5`,
/// `-0.5` -> `-.5`, `10.0` -> `10`, `-0` -> `0`.
pub fn minify_number(number: &str) -> String {
    let (sign, digits) = match number.as_bytes().first() {
        Some(b'-') => ("-", &number[1..]),
        Some(b'+') => ("", &number[1..]),
        _ => ("", number),
    };

    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (digits, ""),
    };
    let integer = integer.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');

    if integer.is_empty() && fraction.is_empty() {
        return "0".to_string();
    }

    let mut text = String::with_capacity(number.len());
    text.push_str(sign);
    text.push_str(integer);
    if !fraction.is_empty() {
        text.push('.');
        text.push_str(fraction);
    }
    text
}

/// Rounds `value` to `precision` decimals when it has more.
fn round(number: &str, value: f64, precision: i32) -> Option<String> {
    let decimals = number.split_once('.').map_or(0, |(_, fraction)| fraction.len());
    if precision < 0 || decimals <= precision as usize {
        return None;
    }
    let precision = precision as usize;
    Some(format!("{:.*}", precision, value))
}

fn shortest_number(value: f64) -> String {
    minify_number(&format!("{}", value))
}

/// Minifies a dimension word of property `name`; `None` when `word` is not
/// a number.
pub fn minify_dimension(
    word: &str,
    name: &str,
    compatibility: &Compatibility,
    precision: i32,
) -> Option<String> {
    let dimension = parse_dimension(word)?;
    let unit = dimension.unit.to_ascii_lowercase();

    let number = match unit.as_str() {
        "px" => round(dimension.number, dimension.value, precision)
            .map(|rounded| minify_number(&rounded))
            .unwrap_or_else(|| minify_number(dimension.number)),
        _ => minify_number(dimension.number),
    };

    if number == "0" {
        let flex = name.ends_with("flex") || name.ends_with("flex-basis");
        if is_length_unit(&unit)
            && !flex
            && compatibility.properties.contains(PropertyFlags::ZERO_UNITS)
        {
            return Some(number);
        }
        if unit == "ms" {
            return Some("0s".to_string());
        }
        return Some(format!("{}{}", number, unit));
    }

    let minified = format!("{}{}", number, unit);

    if unit == "ms" {
        let seconds = format!("{}s", shortest_number(dimension.value / 1000.0));
        if seconds.len() < minified.len() {
            return Some(seconds);
        }
    }

    if unit == "px"
        && compatibility
            .properties
            .contains(PropertyFlags::SHORTER_LENGTH_UNITS)
    {
        if let Some(shorter) = shorter_length(dimension.value, compatibility, minified.len()) {
            return Some(shorter);
        }
    }

    Some(minified)
}

/// A whole-number `in`/`pt`/`pc` equivalent of a `px` value when shorter.
fn shorter_length(px: f64, compatibility: &Compatibility, current: usize) -> Option<String> {
    [("in", px / 96.0), ("pt", px * 3.0 / 4.0), ("pc", px / 16.0)]
        .into_iter()
        .filter(|(unit, _)| compatibility.allows_unit(unit))
        .filter(|(_, value)| (value - value.round()).abs() < 1e-9)
        .map(|(unit, value)| format!("{}{}", shortest_number(value.round()), unit))
        .filter(|candidate| candidate.len() < current)
        .min_by_key(String::len)
}
