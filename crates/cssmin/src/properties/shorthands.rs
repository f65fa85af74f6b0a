//! Synthesis of shorthands from complete sets of longhands.

use std::collections::HashMap;

use crate::options::{Options, PropertyFlags};
use crate::token::{Fragment, join_values};

use super::Property;
use super::break_up::break_up;
use super::can_override::every_combination;
use super::compactable::{Shape, descriptor, family, overlaps};
use super::restore::restore;
use super::validator::is_function;

/// Compacts until no further shorthand can be built, so side longhands
/// become `border-width` and then `border`.
pub fn compact_shorthands(mut properties: Vec<Property>, options: &Options) -> Vec<Property> {
    while let Some(compacted) = compact_once(&properties, options) {
        properties = compacted;
    }
    properties
}

fn parent_of(name: &str) -> Option<&'static str> {
    descriptor(name).and_then(|descriptor| descriptor.component_of)
}

fn compact_once(properties: &[Property], options: &Options) -> Option<Vec<Property>> {
    let mut candidates: HashMap<&'static str, Vec<usize>> = HashMap::new();

    for (index, property) in properties.iter().enumerate() {
        if property.comment {
            continue;
        }
        let parent = parent_of(&property.name);
        candidates.retain(|shorthand, _| {
            Some(*shorthand) == parent || !overlaps(&property.name, shorthand)
        });

        let Some(shorthand) = parent else {
            continue;
        };
        if property.hack != super::Hack::None || property.variable {
            candidates.remove(shorthand);
            continue;
        }

        let slots = candidates.entry(shorthand).or_default();
        slots.retain(|&slot| properties[slot].name != property.name);
        slots.push(index);

        let complete = descriptor(shorthand)
            .is_some_and(|descriptor| descriptor.components.len() == slots.len());
        if complete {
            if let Some(compacted) = merge(properties, shorthand, slots, options) {
                return Some(compacted);
            }
        }
    }
    None
}

/// The value a candidate contributes to the new shorthand.
fn contributed_value(property: &Property) -> Vec<Fragment> {
    if property.shorthand {
        restore(property)
    } else {
        property.value.clone()
    }
}

fn fits_shape(shape: Shape, value: &[Fragment]) -> bool {
    let words = value.iter().filter(|word| !word.is_separator()).count();
    let separators = value.iter().any(|word| word.is_separator());
    match shape {
        Shape::FourValues | Shape::Components => words == 1 && !separators,
        Shape::BorderRadius => (1..=2).contains(&words) && !separators,
        Shape::Background => !value.iter().any(|word| word.value == ","),
        Shape::Longhand => false,
    }
}

fn background_merging_allowed(name: &str, flags: PropertyFlags) -> bool {
    match name {
        "background-clip" => flags.contains(PropertyFlags::BACKGROUND_CLIP_MERGING),
        "background-origin" => flags.contains(PropertyFlags::BACKGROUND_ORIGIN_MERGING),
        "background-size" => flags.contains(PropertyFlags::BACKGROUND_SIZE_MERGING),
        _ => true,
    }
}

/// Builds `shorthand` out of the properties at `slots`, placed where the
/// last of them was. `None` when unsafe or not shorter.
fn merge(
    properties: &[Property],
    shorthand: &'static str,
    slots: &[usize],
    options: &Options,
) -> Option<Vec<Property>> {
    let descriptor = descriptor(shorthand)?;
    let ordered: Vec<&Property> = descriptor
        .components
        .iter()
        .map(|name| {
            slots
                .iter()
                .map(|&slot| &properties[slot])
                .find(|property| property.name == *name)
        })
        .collect::<Option<_>>()?;

    let important = ordered[0].important;
    if ordered.iter().any(|property| property.important != important) {
        return None;
    }
    let inherits = ordered.iter().filter(|property| property.is_inherit()).count();
    if inherits > 0 && inherits < ordered.len() {
        return None;
    }

    let flags = options.compatibility.properties;
    let mut components = Vec::with_capacity(ordered.len());
    for property in &ordered {
        let value = contributed_value(property);
        if !fits_shape(descriptor.shape, &value) || !background_merging_allowed(&property.name, flags) {
            return None;
        }
        if !flags.contains(PropertyFlags::MERGING) && value.iter().any(|word| is_function(&word.value)) {
            return None;
        }
        let default: Vec<Fragment> = super::compactable::descriptor(&property.name)
            .map(|descriptor| descriptor.default_value.split(' ').map(Fragment::new).collect())
            .unwrap_or_default();
        if inherits == 0
            && !every_combination(
                family(&property.name, options.aggressive_merging),
                &default,
                &value,
                &options.compatibility,
            )
        {
            return None;
        }

        let mut component = Property::new(property.name.clone(), value);
        component.important = important;
        component.multiplex = descriptor.multiplex;
        components.push(component);
    }

    let last = slots.iter().copied().max()?;
    let mut merged = Property::new(shorthand, Vec::new());
    merged.name_origin = properties[last].name_origin;
    merged.important = important;
    merged.position = properties[last].position;
    merged.shorthand = true;
    merged.dirty = true;
    merged.components = components;
    merged.value = restore(&merged);

    // The synthesized value must read back as the same components.
    if inherits == 0 {
        let reread = break_up(&merged).ok()?;
        let same = reread.len() == merged.components.len()
            && reread.iter().zip(&merged.components).all(|(reread, component)| {
                join_values(&reread.value) == join_values(&component.value)
            });
        if !same {
            return None;
        }
    }

    let separate: usize = ordered.iter().map(|property| property.text_len() + 1).sum();
    if merged.text_len() >= separate.saturating_sub(1) {
        return None;
    }

    log::trace!("merging {} longhands into '{shorthand}'", ordered.len());
    let mut compacted = Vec::with_capacity(properties.len() + 1 - slots.len());
    for (index, property) in properties.iter().enumerate() {
        if index == last {
            compacted.push(merged.clone());
        } else if !slots.contains(&index) {
            compacted.push(property.clone());
        }
    }
    Some(compacted)
}
