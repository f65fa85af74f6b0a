//! Conversion between tokenizer declarations and optimizer properties.

use crate::options::{Options, PropertyFlags};
use crate::token::{Declaration, Fragment};
use crate::values::minify_value;

use super::validator::is_variable;
use super::{Hack, Property};

/// Splits a legacy hack off the name or value.
fn detect_hack(name: &str, value: &mut Vec<Fragment>) -> (String, Hack) {
    if let Some(rest) = name.strip_prefix('*') {
        return (rest.to_string(), Hack::Star);
    }
    if let Some(rest) = name.strip_prefix('_') {
        return (rest.to_string(), Hack::Underscore);
    }

    let Some(last) = value.last_mut() else {
        return (name.to_string(), Hack::None);
    };
    if last.value.eq_ignore_ascii_case("!ie") {
        value.pop();
        return (name.to_string(), Hack::Bang);
    }
    if last.value.to_ascii_lowercase().ends_with("!ie") {
        let keep = last.value.len() - 3;
        last.value.truncate(keep);
        return (name.to_string(), Hack::Bang);
    }
    if let Some(rest) = last.value.strip_suffix("\\9") {
        if rest.is_empty() {
            value.pop();
        } else {
            last.value = rest.to_string();
        }
        return (name.to_string(), Hack::Backslash);
    }
    (name.to_string(), Hack::None)
}

fn hack_allowed(hack: Hack, flags: PropertyFlags) -> bool {
    match hack {
        Hack::None => true,
        Hack::Star | Hack::Underscore => flags.contains(PropertyFlags::IE_PREFIX_HACK),
        Hack::Backslash => flags.contains(PropertyFlags::IE_SUFFIX_HACK),
        Hack::Bang => flags.contains(PropertyFlags::IE_BANG_HACK),
    }
}

/// Wraps one declaration; hacks the target does not support drop it.
pub fn wrap(declaration: Declaration, position: usize, options: &Options) -> Option<Property> {
    if declaration.comment {
        let mut property = Property::new(declaration.name.value, Vec::new());
        property.name_origin = declaration.name.origin;
        property.comment = true;
        property.position = position;
        return Some(property);
    }

    let Declaration {
        name: name_fragment,
        mut value,
        important,
        ..
    } = declaration;

    let (name, hack) = detect_hack(&name_fragment.value, &mut value);
    if !hack_allowed(hack, options.compatibility.properties) {
        log::debug!("dropping unsupported hack on '{}'", name_fragment.value);
        return None;
    }
    if value.is_empty() {
        return None;
    }

    minify_value(&name, &mut value, options);

    let variable = name.starts_with("--") || value.iter().any(|word| is_variable(&word.value));
    let mut property = Property::new(name, value);
    property.name_origin = name_fragment.origin;
    property.important = important;
    property.hack = hack;
    property.variable = variable;
    property.position = position;
    Some(property)
}

pub fn wrap_all(declarations: Vec<Declaration>, options: &Options) -> Vec<Property> {
    declarations
        .into_iter()
        .enumerate()
        .filter_map(|(position, declaration)| wrap(declaration, position, options))
        .collect()
}

/// Turns a property back into a declaration, re-attaching its hack.
pub fn unwrap(property: Property) -> Declaration {
    let Property {
        name,
        name_origin,
        mut value,
        important,
        hack,
        comment,
        ..
    } = property;

    if comment {
        return Declaration::comment(Fragment::at(name, name_origin));
    }

    let name = match hack {
        Hack::Star => format!("*{name}"),
        Hack::Underscore => format!("_{name}"),
        _ => name,
    };
    match hack {
        Hack::Backslash => match value.last_mut() {
            Some(last) => last.value.push_str("\\9"),
            None => value.push(Fragment::new("\\9")),
        },
        Hack::Bang => value.push(Fragment::new("!ie")),
        _ => {}
    }

    Declaration::new(Fragment::at(name, name_origin), value, important)
}

pub fn unwrap_all(properties: Vec<Property>) -> Vec<Declaration> {
    properties.into_iter().map(unwrap).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Compatibility;

    fn declaration(name: &str, words: &[&str]) -> Declaration {
        Declaration::new(
            Fragment::new(name),
            words.iter().copied().map(Fragment::new).collect(),
            false,
        )
    }

    #[test]
    fn classifies_hacks() {
        let options = Options {
            compatibility: Compatibility::preset("ie7").unwrap(),
            ..Options::default()
        };
        let star = wrap(declaration("*zoom", &["1"]), 0, &options).unwrap();
        assert_eq!((star.name.as_str(), star.hack), ("zoom", Hack::Star));

        let suffix = wrap(declaration("color", &["red\\9"]), 0, &options).unwrap();
        assert_eq!(suffix.hack, Hack::Backslash);
        assert_eq!(suffix.value_words().collect::<Vec<_>>(), ["red"]);

        let bang = wrap(declaration("color", &["red", "!ie"]), 0, &options).unwrap();
        assert_eq!(bang.hack, Hack::Bang);
        assert_eq!(unwrap(bang).text(), "color:red !ie");
    }

    #[test]
    fn drops_hacks_the_target_does_not_support() {
        let options = Options::default();
        assert!(wrap(declaration("_height", &["1px"]), 0, &options).is_none());

        let ie7 = Options {
            compatibility: Compatibility::preset("ie7").unwrap(),
            ..Options::default()
        };
        assert!(wrap(declaration("_height", &["1px"]), 0, &ie7).is_some());
    }

    #[test]
    fn marks_variables() {
        let options = Options::default();
        let custom = wrap(declaration("--gap", &["0px"]), 0, &options).unwrap();
        assert!(custom.variable);
        let reference = wrap(declaration("margin", &["var(--gap)"]), 0, &options).unwrap();
        assert!(reference.variable);
    }
}
