//! Regeneration of shorthand values from their components.

use crate::options::Options;
use crate::token::{Fragment, join_values};
use crate::values::minify_value;

use super::Property;
use super::compactable::{Descriptor, Shape, descriptor};

fn text(values: &[Fragment]) -> String {
    join_values(values)
}

fn is_default(component: &Property) -> bool {
    descriptor(&component.name)
        .is_some_and(|descriptor| text(&component.value) == descriptor.default_value)
}

/// Current value of a component; nested shorthands restore first.
fn component_value(component: &Property) -> Vec<Fragment> {
    if component.shorthand && !component.components.is_empty() {
        restore(component)
    } else {
        component.value.clone()
    }
}

fn same_text(left: &[Fragment], right: &[Fragment]) -> bool {
    text(left) == text(right)
}

/// Shortest `top right bottom left` form.
fn dedupe_four(values: Vec<Vec<Fragment>>) -> Vec<Fragment> {
    let texts: Vec<String> = values.iter().map(|value| text(value)).collect();
    let mut keep = 4;
    if texts[3] == texts[1] {
        keep = 3;
        if texts[2] == texts[0] {
            keep = 2;
            if texts[1] == texts[0] {
                keep = 1;
            }
        }
    }
    values.into_iter().take(keep).flatten().collect()
}

fn four_values(property: &Property) -> Vec<Fragment> {
    let values: Vec<Vec<Fragment>> = property.components.iter().map(component_value).collect();
    if values.len() != 4 {
        return property.value.clone();
    }
    dedupe_four(values)
}

fn border_radius(property: &Property) -> Vec<Fragment> {
    if property.components.len() != 4 {
        return property.value.clone();
    }
    let horizontal: Vec<Vec<Fragment>> = property
        .components
        .iter()
        .map(|component| component.value.iter().take(1).cloned().collect())
        .collect();
    let vertical: Vec<Vec<Fragment>> = property
        .components
        .iter()
        .map(|component| {
            let words = &component.value;
            words.get(1).or_else(|| words.first()).cloned().into_iter().collect()
        })
        .collect();

    let same = horizontal
        .iter()
        .zip(&vertical)
        .all(|(horizontal, vertical)| same_text(horizontal, vertical));
    let mut value = dedupe_four(horizontal);
    if !same {
        value.push(Fragment::new("/"));
        value.extend(dedupe_four(vertical));
    }
    value
}

fn components(property: &Property, descriptor: &Descriptor) -> Vec<Fragment> {
    let mut value = Vec::new();
    for component in &property.components {
        let restored = component_value(component);
        let default = super::compactable::descriptor(&component.name)
            .map_or("", |descriptor| descriptor.default_value);
        if text(&restored) != default {
            value.extend(restored);
        }
    }
    if value.is_empty() {
        value = descriptor.empty_value.split(' ').map(Fragment::new).collect();
    }
    value
}

/// Splits a multiplexed value into its comma separated layers.
fn layers(value: &[Fragment]) -> Vec<Vec<Fragment>> {
    let mut layers = vec![Vec::new()];
    for word in value {
        if word.value == "," {
            layers.push(Vec::new());
        } else if let Some(layer) = layers.last_mut() {
            layer.push(word.clone());
        }
    }
    layers
}

fn background(property: &Property, descriptor: &Descriptor) -> Vec<Fragment> {
    let per_component: Vec<Vec<Vec<Fragment>>> = property
        .components
        .iter()
        .map(|component| layers(&component.value))
        .collect();
    let count = per_component.first().map_or(1, Vec::len);

    let layer_of = |component: usize, layer: usize| -> Vec<Fragment> {
        per_component
            .get(component)
            .and_then(|layers| layers.get(layer))
            .cloned()
            .unwrap_or_default()
    };
    let is_default_at = |component: usize, layer: usize| -> bool {
        let name = descriptor.components[component];
        let default = super::compactable::descriptor(name)
            .map_or("", |descriptor| descriptor.default_value);
        text(&layer_of(component, layer)) == default
    };

    let mut value = Vec::new();
    for layer in 0..count {
        let last = layer + 1 == count;
        let mut words: Vec<Fragment> = Vec::new();

        for component in [0, 3, 4] {
            if !is_default_at(component, layer) {
                words.extend(layer_of(component, layer));
            }
        }
        // A size needs a position in front of it.
        if !is_default_at(2, layer) {
            words.extend(layer_of(1, layer));
            words.push(Fragment::new("/"));
            words.extend(layer_of(2, layer));
        } else if !is_default_at(1, layer) {
            words.extend(layer_of(1, layer));
        }

        let origin = layer_of(5, layer);
        let clip = layer_of(6, layer);
        if same_text(&origin, &clip) {
            words.extend(origin);
        } else if !is_default_at(5, layer) || !is_default_at(6, layer) {
            words.extend(origin);
            words.extend(clip);
        }

        // The color component only exists once, on the last layer.
        if last {
            let color = per_component.get(7).and_then(|layers| layers.last()).cloned().unwrap_or_default();
            if text(&color) != "transparent" {
                words.extend(color);
            }
        }

        if words.is_empty() {
            words = if count == 1 {
                descriptor.empty_value.split(' ').map(Fragment::new).collect()
            } else {
                vec![Fragment::new("none")]
            };
        }
        if layer > 0 {
            value.push(Fragment::new(","));
        }
        value.extend(words);
    }
    value
}

/// The shortest value equivalent to the components of `property`.
pub fn restore(property: &Property) -> Vec<Fragment> {
    let Some(descriptor) = descriptor(&property.name) else {
        return property.value.clone();
    };
    if property.components.is_empty() {
        return property.value.clone();
    }
    if property.components.iter().all(Property::is_inherit) {
        return vec![Fragment::new("inherit")];
    }

    match descriptor.shape {
        Shape::Longhand => property.value.clone(),
        Shape::FourValues => four_values(property),
        Shape::BorderRadius => border_radius(property),
        Shape::Components => components(property, descriptor),
        Shape::Background => background(property, descriptor),
    }
}

/// Whether every component still has its initial value.
pub fn all_default(property: &Property) -> bool {
    property.components.iter().all(is_default)
}

/// Rewrites the value of every dirty shorthand and minifies it again.
/// `margin:0 0` and friends read back shorter even when untouched.
fn is_four_value(property: &Property) -> bool {
    property.shorthand
        && property.components.len() == 4
        && descriptor(&property.name)
            .is_some_and(|descriptor| matches!(descriptor.shape, Shape::FourValues))
}

pub fn restore_all(properties: Vec<Property>, options: &Options) -> Vec<Property> {
    properties
        .into_iter()
        .map(|mut property| {
            if property.dirty {
                let origin = property.value.first().and_then(|word| word.origin);
                let mut value = restore(&property);
                if let Some(first) = value.first_mut() {
                    first.origin = first.origin.or(origin);
                }
                minify_value(&property.name, &mut value, options);
                property.value = value;
                property.dirty = false;
            } else if is_four_value(&property) {
                let mut shortened = four_values(&property);
                if join_values(&shortened).len() < join_values(&property.value).len() {
                    if let Some(first) = shortened.first_mut() {
                        first.origin = property.value.first().and_then(|word| word.origin);
                    }
                    property.value = shortened;
                }
            }
            property
        })
        .collect()
}
