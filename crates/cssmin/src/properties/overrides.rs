//! Removal of declarations a later declaration makes redundant.
//!
//! Properties are scanned right to left. For every live property, each
//! earlier live property is tested against it; the earlier one dies when the
//! later value is guaranteed to replace it. When moves are allowed, a
//! longhand following its shorthand is pulled into the shorthand instead.

use crate::options::{Options, PropertyFlags};
use crate::token::{Fragment, join_values};

use super::Property;
use super::can_override::every_combination;
use super::compactable::{covers, family};
use super::restore::restore;
use super::validator::is_function;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Keep,
    DropLeft,
    DropRight,
}

/// `background` declarations directly followed by a `filter` keep their
/// place: old IE reads the pair together.
fn bound_to_filter(properties: &[Property]) -> Vec<bool> {
    let mut bound = vec![false; properties.len()];
    for (index, property) in properties.iter().enumerate() {
        if !matches!(property.name.as_str(), "background" | "background-image") {
            continue;
        }
        let next = properties[index + 1..].iter().find(|next| !next.comment);
        bound[index] = next.is_some_and(|next| matches!(next.name.as_str(), "filter" | "-ms-filter"));
    }
    bound
}

/// The component of `shorthand` that holds the value of `name`: an exact
/// component, or a single-valued component covering it.
fn find_component<'a>(shorthand: &'a Property, name: &str) -> Option<&'a Property> {
    for component in &shorthand.components {
        if component.name == name {
            return Some(component);
        }
        if covers(&component.name, name) {
            if component.components.is_empty() {
                return Some(component);
            }
            return find_component(component, name);
        }
    }
    None
}

fn find_component_mut<'a>(shorthand: &'a mut Property, name: &str) -> Option<&'a mut Property> {
    let index = shorthand
        .components
        .iter()
        .position(|component| component.name == name || covers(&component.name, name))?;
    let component = &mut shorthand.components[index];
    if component.name == name {
        Some(component)
    } else {
        find_component_mut(component, name)
    }
}

fn same_value(left: &[Fragment], right: &[Fragment]) -> bool {
    join_values(left) == join_values(right)
}

fn has_function(value: &[Fragment]) -> bool {
    value.iter().any(|word| is_function(&word.value))
}

struct Compactor<'a> {
    options: &'a Options,
    allow_moves: bool,
}

impl Compactor<'_> {
    fn family_allows(&self, name: &str, left: &[Fragment], right: &[Fragment]) -> bool {
        every_combination(
            family(name, self.options.aggressive_merging),
            left,
            right,
            &self.options.compatibility,
        )
    }

    fn same_name(&self, left: &Property, right: &Property) -> Outcome {
        if left.important && !right.important {
            return Outcome::DropRight;
        }
        if right.important && !left.important {
            return Outcome::DropLeft;
        }
        if left.variable || right.variable {
            return if left.name.starts_with("--") || !right.variable {
                Outcome::DropLeft
            } else {
                Outcome::Keep
            };
        }

        if left.shorthand && right.shorthand {
            if !left.multiplex && right.multiplex {
                return Outcome::Keep;
            }
            let every = left
                .components
                .iter()
                .zip(&right.components)
                .all(|(left, right)| self.family_allows(&left.name, &left.value, &right.value));
            return if every && left.components.len() == right.components.len() {
                Outcome::DropLeft
            } else {
                Outcome::Keep
            };
        }

        if self.family_allows(&left.name, &left.value, &right.value) {
            Outcome::DropLeft
        } else {
            Outcome::Keep
        }
    }

    /// An earlier longhand (or smaller shorthand) under a later shorthand.
    fn shadowed_by_shorthand(&self, left: &Property, right: &Property) -> Outcome {
        if left.important && !right.important {
            return Outcome::Keep;
        }
        if left.variable {
            return Outcome::Keep;
        }
        match find_component(right, &left.name) {
            Some(component) if self.family_allows(&left.name, &left.value, &component.value) => {
                Outcome::DropLeft
            }
            _ => Outcome::Keep,
        }
    }

    /// A later longhand following its shorthand: merged into the shorthand
    /// when that is safe and not longer.
    fn pull_into_shorthand(&self, left: &mut Property, right: &Property) -> Outcome {
        if right.important && !left.important {
            return Outcome::Keep;
        }
        if left.important && !right.important {
            return Outcome::DropRight;
        }
        if !self.allow_moves || right.variable || left.multiplex || right.multiplex {
            return Outcome::Keep;
        }

        let flags = self.options.compatibility.properties;
        let merging_disabled = match right.name.as_str() {
            "background-clip" => !flags.contains(PropertyFlags::BACKGROUND_CLIP_MERGING),
            "background-origin" => !flags.contains(PropertyFlags::BACKGROUND_ORIGIN_MERGING),
            "background-size" => !flags.contains(PropertyFlags::BACKGROUND_SIZE_MERGING),
            _ => false,
        };
        if merging_disabled || !flags.contains(PropertyFlags::MERGING) && has_function(&right.value) {
            return Outcome::Keep;
        }

        let Some(component) = find_component(left, &right.name) else {
            return Outcome::Keep;
        };
        if component.name != right.name {
            return Outcome::Keep;
        }
        if !same_value(&component.value, &right.value)
            && (left.has_inherit() || right.has_inherit())
        {
            return Outcome::Keep;
        }
        if !self.family_allows(&right.name, &component.value, &right.value) {
            return Outcome::Keep;
        }

        // A nested shorthand must fit a single-valued component.
        let value = if right.shorthand {
            restore(right)
        } else {
            right.value.clone()
        };
        if right.shorthand && value.len() != 1 {
            return Outcome::Keep;
        }

        let mut merged = left.clone();
        if let Some(component) = find_component_mut(&mut merged, &right.name) {
            component.value = value;
        }
        let current = join_values(&restore(left)).len();
        if join_values(&restore(&merged)).len() > current + right.text_len() {
            return Outcome::Keep;
        }

        merged.dirty = true;
        *left = merged;
        Outcome::DropRight
    }

    fn resolve(&self, left: &mut Property, right: &Property) -> Outcome {
        if left.hack != right.hack {
            return Outcome::Keep;
        }
        if left.name == right.name {
            return self.same_name(left, right);
        }
        if right.shorthand && covers(&right.name, &left.name) {
            return self.shadowed_by_shorthand(left, right);
        }
        if left.shorthand && covers(&left.name, &right.name) {
            return self.pull_into_shorthand(left, right);
        }
        Outcome::Keep
    }
}

/// Whether a live property strictly between `left` and `right` reads or
/// writes what moving `right` into `left` would change.
fn interferes(properties: &[Property], live: &[bool], left: usize, right: usize) -> bool {
    let target = &properties[right].name;
    let shorthand = &properties[left].name;
    (left + 1..right).any(|index| {
        if !live[index] || properties[index].comment {
            return false;
        }
        let name = &properties[index].name;
        name == target
            || name == shorthand
            || covers(name, target)
            || covers(target, name)
    })
}

/// Drops overridden properties; see the module documentation.
pub fn compact_overrides(
    mut properties: Vec<Property>,
    options: &Options,
    allow_moves: bool,
) -> Vec<Property> {
    let compactor = Compactor {
        options,
        allow_moves,
    };
    let bound = bound_to_filter(&properties);
    let mut live = vec![true; properties.len()];

    for right in (0..properties.len()).rev() {
        if properties[right].comment {
            continue;
        }
        for left in (0..right).rev() {
            if !live[right] {
                break;
            }
            if !live[left] || properties[left].comment || bound[left] {
                continue;
            }
            let pulling = properties[left].shorthand
                && covers(&properties[left].name, &properties[right].name);
            if pulling && interferes(&properties, &live, left, right) {
                continue;
            }

            let (head, tail) = properties.split_at_mut(right);
            match compactor.resolve(&mut head[left], &tail[0]) {
                Outcome::Keep => {}
                Outcome::DropLeft => {
                    log::trace!("'{}' overridden by a later declaration", head[left].name);
                    live[left] = false;
                }
                Outcome::DropRight => {
                    log::trace!("'{}' merged or shadowed", tail[0].name);
                    live[right] = false;
                }
            }
        }
    }

    properties
        .into_iter()
        .zip(live)
        .filter_map(|(property, live)| live.then_some(property))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::break_up::populate_components;
    use crate::split::split_value;
    use crate::token::join_values;

    fn parse(body: &str) -> Vec<Property> {
        let properties = body
            .split(';')
            .filter_map(|part| part.split_once(':'))
            .map(|(name, value)| {
                let (value, important) = match value.strip_suffix("!important") {
                    Some(value) => (value, true),
                    None => (value, false),
                };
                let mut property = Property::new(
                    name,
                    split_value(value)
                        .into_iter()
                        .map(|(_, word)| Fragment::new(word))
                        .collect(),
                );
                property.important = important;
                property
            })
            .collect();
        populate_components(properties)
    }

    fn compact(body: &str, allow_moves: bool) -> String {
        compact_overrides(parse(body), &Options::default(), allow_moves)
            .into_iter()
            .map(|property| {
                let value = if property.dirty {
                    restore(&property)
                } else {
                    property.value.clone()
                };
                format!("{}:{}", property.name, join_values(&value))
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    #[test]
    fn same_name_overrides() {
        assert_eq!(compact("display:block;display:flex", true), "display:flex");
        assert_eq!(
            compact("width:1px;width:calc(100% - 1px)", true),
            "width:1px;width:calc(100% - 1px)"
        );
        assert_eq!(compact("width:calc(100% - 1px);width:1px", true), "width:1px");
    }

    #[test]
    fn importance_wins() {
        assert_eq!(compact("margin:0!important;margin:1px", true), "margin:0");
        assert_eq!(compact("margin-top:1px!important;margin:0", true), "margin-top:1px;margin:0");
    }

    #[test]
    fn shorthand_shadows_earlier_longhands() {
        assert_eq!(compact("margin-top:1px;margin:0", true), "margin:0");
        assert_eq!(compact("border-top-width:1px;border:0", true), "border:0");
    }

    #[test]
    fn pulls_longhands_into_shorthands() {
        assert_eq!(compact("margin:0;margin-left:5px", true), "margin:0 0 0 5px");
        assert_eq!(
            compact("margin:0;margin-left:5px", false),
            "margin:0;margin-left:5px"
        );
        assert_eq!(
            compact("margin:0;margin-left:inherit", true),
            "margin:0;margin-left:inherit"
        );
    }

    #[test]
    fn keeps_background_bound_to_filter() {
        assert_eq!(
            compact("background:red;filter:none;background:blue", true),
            "background:red;filter:none;background:blue"
        );
    }
}
