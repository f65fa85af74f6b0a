//! Static descriptors of every property the optimizer understands.
//!
//! A descriptor says which family of [`can_override`](super::can_override)
//! applies, what the initial value is, and for shorthands how they decompose
//! into components.

use phf::phf_map;

use super::can_override::Family;

/// How a shorthand decomposes into its components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Not a shorthand.
    Longhand,
    /// `top right bottom left`, 1 to 4 values (`margin`, `border-color`).
    FourValues,
    /// `horizontal / vertical` radii per corner.
    BorderRadius,
    /// Components in any order, each identified by its value (`border`).
    Components,
    /// Comma separated layers of components.
    Background,
}

#[derive(Clone, Copy, Debug)]
pub struct Descriptor {
    pub family: Family,
    /// Initial value, space separated when it has several words.
    pub default_value: &'static str,
    pub shape: Shape,
    pub components: &'static [&'static str],
    /// The shorthand this property is synthesized into.
    pub component_of: Option<&'static str>,
    /// Value layers are comma separated.
    pub multiplex: bool,
    /// What a shorthand restores to when every component has its initial value.
    pub empty_value: &'static str,
}

const fn longhand(family: Family, default_value: &'static str, component_of: &'static str) -> Descriptor {
    Descriptor {
        family,
        default_value,
        shape: Shape::Longhand,
        components: &[],
        component_of: Some(component_of),
        multiplex: false,
        empty_value: default_value,
    }
}

const fn standalone(family: Family, default_value: &'static str) -> Descriptor {
    Descriptor {
        component_of: None,
        ..longhand(family, default_value, "")
    }
}

const fn layer(family: Family, default_value: &'static str) -> Descriptor {
    Descriptor {
        multiplex: true,
        ..longhand(family, default_value, "background")
    }
}

const fn shorthand(
    family: Family,
    default_value: &'static str,
    shape: Shape,
    components: &'static [&'static str],
    component_of: Option<&'static str>,
) -> Descriptor {
    Descriptor {
        family,
        default_value,
        shape,
        components,
        component_of,
        multiplex: false,
        empty_value: default_value,
    }
}

pub static COMPACTABLE: phf::Map<&'static str, Descriptor> = phf_map! {
    "background" => Descriptor {
        multiplex: true,
        ..shorthand(
            Family::Image,
            "0 0",
            Shape::Background,
            &[
                "background-image",
                "background-position",
                "background-size",
                "background-repeat",
                "background-attachment",
                "background-origin",
                "background-clip",
                "background-color",
            ],
            None,
        )
    },
    "background-attachment" => layer(Family::Always, "scroll"),
    "background-clip" => layer(Family::Always, "border-box"),
    "background-color" => layer(Family::Color, "transparent"),
    "background-image" => layer(Family::Image, "none"),
    "background-origin" => layer(Family::Always, "padding-box"),
    "background-position" => layer(Family::AlwaysButIntoFunction, "0 0"),
    "background-repeat" => layer(Family::Always, "repeat"),
    "background-size" => layer(Family::AlwaysButIntoFunction, "auto"),

    "border" => Descriptor {
        empty_value: "none",
        ..shorthand(
            Family::Unit,
            "none",
            Shape::Components,
            &["border-width", "border-style", "border-color"],
            None,
        )
    },
    "border-top" => side(&["border-top-width", "border-top-style", "border-top-color"]),
    "border-right" => side(&["border-right-width", "border-right-style", "border-right-color"]),
    "border-bottom" => side(&["border-bottom-width", "border-bottom-style", "border-bottom-color"]),
    "border-left" => side(&["border-left-width", "border-left-style", "border-left-color"]),

    "border-width" => shorthand(
        Family::Unit,
        "medium",
        Shape::FourValues,
        &["border-top-width", "border-right-width", "border-bottom-width", "border-left-width"],
        Some("border"),
    ),
    "border-top-width" => longhand(Family::Unit, "medium", "border-width"),
    "border-right-width" => longhand(Family::Unit, "medium", "border-width"),
    "border-bottom-width" => longhand(Family::Unit, "medium", "border-width"),
    "border-left-width" => longhand(Family::Unit, "medium", "border-width"),

    "border-style" => shorthand(
        Family::Always,
        "none",
        Shape::FourValues,
        &["border-top-style", "border-right-style", "border-bottom-style", "border-left-style"],
        Some("border"),
    ),
    "border-top-style" => longhand(Family::Always, "none", "border-style"),
    "border-right-style" => longhand(Family::Always, "none", "border-style"),
    "border-bottom-style" => longhand(Family::Always, "none", "border-style"),
    "border-left-style" => longhand(Family::Always, "none", "border-style"),

    "border-color" => shorthand(
        Family::Color,
        "none",
        Shape::FourValues,
        &["border-top-color", "border-right-color", "border-bottom-color", "border-left-color"],
        Some("border"),
    ),
    "border-top-color" => longhand(Family::Color, "none", "border-color"),
    "border-right-color" => longhand(Family::Color, "none", "border-color"),
    "border-bottom-color" => longhand(Family::Color, "none", "border-color"),
    "border-left-color" => longhand(Family::Color, "none", "border-color"),

    "border-radius" => shorthand(
        Family::Unit,
        "0",
        Shape::BorderRadius,
        &[
            "border-top-left-radius",
            "border-top-right-radius",
            "border-bottom-right-radius",
            "border-bottom-left-radius",
        ],
        None,
    ),
    "border-top-left-radius" => longhand(Family::Unit, "0", "border-radius"),
    "border-top-right-radius" => longhand(Family::Unit, "0", "border-radius"),
    "border-bottom-right-radius" => longhand(Family::Unit, "0", "border-radius"),
    "border-bottom-left-radius" => longhand(Family::Unit, "0", "border-radius"),

    "color" => standalone(Family::Color, "initial"),

    "list-style" => Descriptor {
        empty_value: "disc",
        ..shorthand(
            Family::Always,
            "none",
            Shape::Components,
            &["list-style-type", "list-style-position", "list-style-image"],
            None,
        )
    },
    "list-style-type" => longhand(Family::Always, "disc", "list-style"),
    "list-style-position" => longhand(Family::Always, "outside", "list-style"),
    "list-style-image" => longhand(Family::Image, "none", "list-style"),

    "margin" => shorthand(
        Family::Unit,
        "0",
        Shape::FourValues,
        &["margin-top", "margin-right", "margin-bottom", "margin-left"],
        None,
    ),
    "margin-top" => longhand(Family::Unit, "0", "margin"),
    "margin-right" => longhand(Family::Unit, "0", "margin"),
    "margin-bottom" => longhand(Family::Unit, "0", "margin"),
    "margin-left" => longhand(Family::Unit, "0", "margin"),

    "outline" => Descriptor {
        empty_value: "none",
        ..shorthand(
            Family::Always,
            "none",
            Shape::Components,
            &["outline-color", "outline-style", "outline-width"],
            None,
        )
    },
    "outline-color" => longhand(Family::Color, "invert", "outline"),
    "outline-style" => longhand(Family::Always, "none", "outline"),
    "outline-width" => longhand(Family::Unit, "medium", "outline"),

    "padding" => shorthand(
        Family::Unit,
        "0",
        Shape::FourValues,
        &["padding-top", "padding-right", "padding-bottom", "padding-left"],
        None,
    ),
    "padding-top" => longhand(Family::Unit, "0", "padding"),
    "padding-right" => longhand(Family::Unit, "0", "padding"),
    "padding-bottom" => longhand(Family::Unit, "0", "padding"),
    "padding-left" => longhand(Family::Unit, "0", "padding"),
};

const fn side(components: &'static [&'static str]) -> Descriptor {
    Descriptor {
        empty_value: "none",
        ..shorthand(Family::Unit, "none", Shape::Components, components, None)
    }
}

pub fn descriptor(name: &str) -> Option<&'static Descriptor> {
    COMPACTABLE.get(name)
}

/// Whether `name` is a shorthand with components.
pub fn is_shorthand(name: &str) -> bool {
    descriptor(name).is_some_and(|descriptor| descriptor.shape != Shape::Longhand)
}

/// The override family of `name`. Unknown properties compare by unit when
/// `aggressive` merging is on and by identical value otherwise.
pub fn family(name: &str, aggressive: bool) -> Family {
    match descriptor(name) {
        Some(descriptor) => descriptor.family,
        None if aggressive => Family::Unit,
        None => Family::SameValue,
    }
}

/// Whether `shorthand` controls `name`, directly or through one of its
/// shorthand components (`border` controls `border-top-width`).
pub fn covers(shorthand: &str, name: &str) -> bool {
    let Some(descriptor) = descriptor(shorthand) else {
        return false;
    };
    descriptor
        .components
        .iter()
        .any(|component| *component == name || covers(component, name))
}

/// Whether setting `left` can change anything `right` controls.
pub fn overlaps(left: &str, right: &str) -> bool {
    left == right
        || covers(left, right)
        || covers(right, left)
        || descriptor(left).is_some_and(|descriptor| {
            descriptor
                .components
                .iter()
                .any(|component| overlaps(component, right))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_descriptors() {
        assert_eq!(descriptor("margin").map(|d| d.shape), Some(Shape::FourValues));
        assert_eq!(descriptor("margin-top").and_then(|d| d.component_of), Some("margin"));
        assert!(descriptor("display").is_none());
        assert!(descriptor("background-color").is_some_and(|d| d.multiplex));
    }

    #[test]
    fn deep_coverage() {
        assert!(covers("border", "border-width"));
        assert!(covers("border", "border-top-width"));
        assert!(covers("border-top", "border-top-color"));
        assert!(!covers("border-top", "border-left-color"));
        assert!(!covers("margin", "padding-top"));
    }

    #[test]
    fn overlapping_shorthands() {
        assert!(overlaps("border-top", "border-width"));
        assert!(overlaps("border-width", "border"));
        assert!(!overlaps("border-top", "border-left-width"));
        assert!(!overlaps("margin", "padding"));
    }

    #[test]
    fn families_for_unknown_properties() {
        assert_eq!(family("display", true), Family::Unit);
        assert_eq!(family("display", false), Family::SameValue);
        assert_eq!(family("color", false), Family::Color);
        assert_eq!(family("border-top-color", false), Family::Color);
    }
}
