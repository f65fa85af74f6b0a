//! Declaration extraction from a rule body.

use crate::error::Diagnostics;
use crate::escape::{EscapeStore, Kind};
use crate::split::{balanced_braces, find_top_level, split_top_level, split_value};
use crate::token::{Declaration, Fragment};

use super::tracker::Tracker;

/// Splits `body` (starting at escaped offset `base`) into declarations.
///
/// `context` names the owning selector or at-rule in warnings.
pub fn extract_properties(
    body: &str,
    base: usize,
    context: &str,
    tracker: &mut Tracker<'_>,
    diagnostics: &mut Diagnostics,
) -> Vec<Declaration> {
    let mut declarations = Vec::new();

    for (offset, part) in split_top_level(body, ';') {
        let mut start = base + offset + leading_whitespace(part);
        let mut part = part.trim();

        // Special comments stay attached to the position they were written at.
        while EscapeStore::kind_at(part) == Some(Kind::Comment) {
            let length = EscapeStore::placeholder_len(part).unwrap_or(part.len());
            declarations.push(Declaration::comment(Fragment::at(
                &part[..length],
                tracker.origin(start),
            )));
            let rest = &part[length..];
            start += length + leading_whitespace(rest);
            part = rest.trim();
        }

        if part.is_empty() {
            continue;
        }

        if part.starts_with('@') {
            diagnostics.warn(format!(
                "Invalid property '{}' inside '{}'. Ignoring.",
                part, context
            ));
            continue;
        }

        let Some(colon) = find_top_level(part, ':') else {
            diagnostics.warn(format!(
                "Missing ':' in '{}' inside '{}'. Ignoring.",
                part, context
            ));
            continue;
        };

        let raw_name = part[..colon].trim();
        let raw_value = &part[colon + 1..];
        let braced = if raw_name.starts_with("--") {
            !balanced_braces(raw_value)
        } else {
            raw_value.contains(['{', '}'])
        };
        if raw_name.contains(['{', '}']) || braced {
            diagnostics.warn(format!(
                "Invalid property '{}' inside '{}'. Ignoring.",
                part, context
            ));
            continue;
        }

        let name = if raw_name.starts_with("--") {
            raw_name.to_string()
        } else {
            raw_name.to_ascii_lowercase()
        };
        let name_fragment = Fragment::at(name.clone(), tracker.origin(start));

        let value_start = start + colon + 1 + leading_whitespace(raw_value);
        let (value_text, important) = strip_important(raw_value.trim());

        if value_text.is_empty() {
            diagnostics.warn(format!(
                "Empty property '{}' inside '{}'. Ignoring.",
                name, context
            ));
            continue;
        }

        let value = if name.starts_with("--") {
            vec![Fragment::at(value_text, tracker.origin(value_start))]
        } else {
            split_value(value_text)
                .into_iter()
                .map(|(at, word)| Fragment::at(word, tracker.origin(value_start + at)))
                .collect()
        };

        declarations.push(Declaration::new(name_fragment, value, important));
    }

    declarations
}

fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

/// Splits a trailing `!important` off a value.
fn strip_important(value: &str) -> (&str, bool) {
    let Some(bang) = value.rfind('!') else {
        return (value, false);
    };
    let flag = value[bang + 1..].trim();
    if flag.eq_ignore_ascii_case("important") {
        (value[..bang].trim_end(), true)
    } else {
        (value, false)
    }
}
