//! Decomposition of shorthand values into component properties.

use thiserror::Error;

use crate::token::Fragment;
use crate::values::{is_color, parse_dimension};

use super::Property;
use super::compactable::{Descriptor, Shape, descriptor};
use super::validator::{
    is_attachment, is_box, is_global, is_image, is_list_style_position, is_list_style_type,
    is_position, is_repeat, is_shorthand_color, is_size, is_style, is_width,
};

/// Why a shorthand value could not be decomposed. The property is kept as
/// written and takes part in same-name comparisons only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BreakUpError {
    #[error("expected 1 to 4 values, found {0}")]
    ValueCount(usize),
    #[error("unexpected separator '{0}'")]
    Separator(String),
    #[error("'{0}' does not fit any component")]
    UnknownWord(String),
    #[error("global keyword mixed with other values")]
    MixedGlobal,
}

fn words(value: &[Fragment]) -> Vec<&Fragment> {
    value.iter().filter(|word| !word.is_separator()).collect()
}

fn default_fragments(value: &str) -> Vec<Fragment> {
    value.split(' ').map(Fragment::new).collect()
}

fn component(parent: &Property, name: &str, value: Vec<Fragment>) -> Property {
    let mut component = Property::new(name, value);
    component.important = parent.important;
    component.position = parent.position;
    component.multiplex = descriptor(name).is_some_and(|descriptor| descriptor.multiplex);
    component
}

fn single_global(property: &Property) -> Option<&Fragment> {
    match property.value.as_slice() {
        [only] if is_global(&only.value) => Some(only),
        _ => None,
    }
}

fn reject_mixed_global(property: &Property) -> Result<(), BreakUpError> {
    if property.value.len() > 1 && property.value_words().any(is_global) {
        return Err(BreakUpError::MixedGlobal);
    }
    Ok(())
}

fn four_values(property: &Property, descriptor: &Descriptor) -> Result<Vec<Property>, BreakUpError> {
    if let Some(separator) = property.value.iter().find(|word| word.is_separator()) {
        return Err(BreakUpError::Separator(separator.value.clone()));
    }
    let values = &property.value;
    let (top, right, bottom, left) = match values.len() {
        1 => (0, 0, 0, 0),
        2 => (0, 1, 0, 1),
        3 => (0, 1, 2, 1),
        4 => (0, 1, 2, 3),
        count => return Err(BreakUpError::ValueCount(count)),
    };

    Ok([top, right, bottom, left]
        .into_iter()
        .zip(descriptor.components)
        .map(|(index, name)| component(property, name, vec![values[index].clone()]))
        .collect())
}

fn expand_four(words: &[&Fragment]) -> Result<[Fragment; 4], BreakUpError> {
    let pick = |index: usize| words[index].clone();
    match words.len() {
        1 => Ok([pick(0), pick(0), pick(0), pick(0)]),
        2 => Ok([pick(0), pick(1), pick(0), pick(1)]),
        3 => Ok([pick(0), pick(1), pick(2), pick(1)]),
        4 => Ok([pick(0), pick(1), pick(2), pick(3)]),
        count => Err(BreakUpError::ValueCount(count)),
    }
}

fn border_radius(property: &Property, descriptor: &Descriptor) -> Result<Vec<Property>, BreakUpError> {
    let slash = property.value.iter().position(|word| word.value == "/");
    let (horizontal, vertical) = match slash {
        Some(at) => (&property.value[..at], Some(&property.value[at + 1..])),
        None => (&property.value[..], None),
    };
    if let Some(comma) = property.value.iter().find(|word| word.value == ",") {
        return Err(BreakUpError::Separator(comma.value.clone()));
    }

    let horizontal = expand_four(&words(horizontal))?;
    let vertical = match vertical {
        Some(vertical) => Some(expand_four(&words(vertical))?),
        None => None,
    };

    Ok(descriptor
        .components
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let mut value = vec![horizontal[index].clone()];
            if let Some(vertical) = &vertical {
                value.push(vertical[index].clone());
            }
            component(property, name, value)
        })
        .collect())
}

/// Whether `word` may be the value of component `name`.
fn fits(name: &str, word: &str) -> bool {
    if name.ends_with("-width") {
        is_width(word)
    } else if name.ends_with("-style") {
        is_style(word)
    } else if name.ends_with("-color") {
        is_shorthand_color(word)
    } else {
        match name {
            "list-style-type" => is_list_style_type(word),
            "list-style-position" => is_list_style_position(word),
            "list-style-image" => is_image(word),
            _ => false,
        }
    }
}

fn components(property: &Property, descriptor: &Descriptor) -> Result<Vec<Property>, BreakUpError> {
    if let Some(separator) = property.value.iter().find(|word| word.is_separator()) {
        return Err(BreakUpError::Separator(separator.value.clone()));
    }

    let mut assigned: Vec<Option<Fragment>> = vec![None; descriptor.components.len()];
    for word in &property.value {
        // `list-style: none` is read as a type; a second `none` is the image.
        let slot = descriptor
            .components
            .iter()
            .enumerate()
            .position(|(index, name)| assigned[index].is_none() && fits(name, &word.value))
            .ok_or_else(|| BreakUpError::UnknownWord(word.value.clone()))?;
        assigned[slot] = Some(word.clone());
    }

    Ok(descriptor
        .components
        .iter()
        .zip(assigned)
        .map(|(name, word)| {
            let value = match word {
                Some(word) => vec![word],
                None => default_fragments(default_of(name)),
            };
            component(property, name, value)
        })
        .collect())
}

fn default_of(name: &str) -> &'static str {
    descriptor(name).map_or("", |descriptor| descriptor.default_value)
}

/// Values of one background layer, per component.
#[derive(Default)]
struct Layer {
    image: Option<Fragment>,
    position: Vec<Fragment>,
    size: Vec<Fragment>,
    repeat: Vec<Fragment>,
    attachment: Option<Fragment>,
    boxes: Vec<Fragment>,
    color: Option<Fragment>,
}

fn background_layer(words: &[Fragment], last: bool) -> Result<Layer, BreakUpError> {
    let mut layer = Layer::default();
    let mut index = 0;

    while index < words.len() {
        let word = &words[index];
        let text = word.value.as_str();

        if layer.image.is_none() && is_image(text) {
            layer.image = Some(word.clone());
        } else if last && layer.color.is_none() && is_color(text) {
            layer.color = Some(word.clone());
        } else if layer.repeat.len() < 2 && is_repeat(text) && repeat_continues(&layer, words, index) {
            layer.repeat.push(word.clone());
        } else if layer.attachment.is_none() && is_attachment(text) {
            layer.attachment = Some(word.clone());
        } else if layer.boxes.len() < 2 && is_box(text) {
            layer.boxes.push(word.clone());
        } else if layer.position.is_empty() && is_position(text) {
            while index < words.len() && layer.position.len() < 4 && is_position(&words[index].value) {
                layer.position.push(words[index].clone());
                index += 1;
            }
            if words.get(index).is_some_and(|word| word.value == "/") {
                index += 1;
                while index < words.len() && layer.size.len() < 2 && is_size(&words[index].value) {
                    layer.size.push(words[index].clone());
                    index += 1;
                }
                if layer.size.is_empty() {
                    return Err(BreakUpError::Separator("/".to_string()));
                }
            }
            continue;
        } else if text == "/" {
            return Err(BreakUpError::Separator("/".to_string()));
        } else {
            return Err(BreakUpError::UnknownWord(word.value.clone()));
        }
        index += 1;
    }

    Ok(layer)
}

/// Two repeat keywords must be adjacent.
fn repeat_continues(layer: &Layer, words: &[Fragment], index: usize) -> bool {
    layer.repeat.is_empty() || index > 0 && is_repeat(&words[index - 1].value)
}

fn push_layer(target: &mut Vec<Fragment>, values: Vec<Fragment>) {
    if !target.is_empty() {
        target.push(Fragment::new(","));
    }
    target.extend(values);
}

fn background(property: &Property, descriptor: &Descriptor) -> Result<Vec<Property>, BreakUpError> {
    let mut layers: Vec<Vec<Fragment>> = vec![Vec::new()];
    for word in &property.value {
        if word.value == "," {
            layers.push(Vec::new());
        } else if let Some(layer) = layers.last_mut() {
            layer.push(word.clone());
        }
    }

    let count = layers.len();
    let mut values: Vec<Vec<Fragment>> = vec![Vec::new(); descriptor.components.len()];
    for (index, words) in layers.iter().enumerate() {
        let layer = background_layer(words, index + 1 == count)?;
        let (origin, clip) = match layer.boxes.as_slice() {
            [] => (None, None),
            [both] => (Some(both.clone()), Some(both.clone())),
            [origin, clip, ..] => (Some(origin.clone()), Some(clip.clone())),
        };

        let per_component = [
            layer.image.map(|word| vec![word]),
            (!layer.position.is_empty()).then_some(layer.position),
            (!layer.size.is_empty()).then_some(layer.size),
            (!layer.repeat.is_empty()).then_some(layer.repeat),
            layer.attachment.map(|word| vec![word]),
            origin.map(|word| vec![word]),
            clip.map(|word| vec![word]),
            layer.color.map(|word| vec![word]),
        ];

        for ((target, name), value) in values.iter_mut().zip(descriptor.components).zip(per_component) {
            // Only the last layer carries a color.
            if *name == "background-color" && index + 1 != count {
                continue;
            }
            push_layer(target, value.unwrap_or_else(|| default_fragments(default_of(name))));
        }
    }

    Ok(descriptor
        .components
        .iter()
        .zip(values)
        .map(|(name, value)| component(property, name, value))
        .collect())
}

/// Decomposes `property` into components. Globals such as `inherit` apply to
/// every component.
pub fn break_up(property: &Property) -> Result<Vec<Property>, BreakUpError> {
    let Some(descriptor) = descriptor(&property.name) else {
        return Ok(Vec::new());
    };
    if descriptor.shape == Shape::Longhand {
        return Ok(Vec::new());
    }

    if let Some(global) = single_global(property) {
        return Ok(descriptor
            .components
            .iter()
            .map(|name| component(property, name, vec![global.clone()]))
            .collect());
    }
    reject_mixed_global(property)?;

    match descriptor.shape {
        Shape::Longhand => Ok(Vec::new()),
        Shape::FourValues => four_values(property, descriptor),
        Shape::BorderRadius => border_radius(property, descriptor),
        Shape::Components => components(property, descriptor),
        Shape::Background => background(property, descriptor),
    }
}

fn is_negative_padding(property: &Property) -> bool {
    property.name.starts_with("padding")
        && property.value_words().any(|word| {
            parse_dimension(word).is_some_and(|dimension| dimension.number.starts_with('-'))
        })
}

/// Fills `components` of every shorthand. Negative paddings are invalid
/// CSS and are removed.
pub fn populate_components(properties: Vec<Property>) -> Vec<Property> {
    properties
        .into_iter()
        .filter_map(|mut property| {
            if property.comment || property.variable {
                return Some(property);
            }
            if is_negative_padding(&property) {
                log::debug!("dropping negative padding '{}'", property.name);
                return None;
            }
            if property.hack != super::Hack::None {
                return Some(property);
            }
            match break_up(&property) {
                Ok(components) if components.is_empty() => {}
                Ok(components) => {
                    property.multiplex = components.iter().any(|component| {
                        component.value.iter().any(|word| word.value == ",")
                    });
                    property.components = components;
                    property.shorthand = true;
                }
                Err(error) => log::debug!("keeping '{}' as written: {error}", property.name),
            }
            Some(property)
        })
        .collect()
}
