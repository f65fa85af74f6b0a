//! Declaration-level optimization of one rule body.
//!
//! A body goes through a fixed sequence of passes, each taking the property
//! list by value and returning the rewritten list:
//!
//! 1. [`wrap`]: classify hacks and importance, minify values
//! 2. [`break_up`]: decompose known shorthands into components
//! 3. [`overrides`]: drop declarations a later one makes redundant
//! 4. [`shorthands`]: merge complete sets of longhands into a shorthand
//! 5. [`restore`]: regenerate values of rewritten shorthands
//!
//! Passes never flag properties for later removal; a pass that drops
//! properties returns a shorter list.

pub mod break_up;
pub mod can_override;
pub mod compactable;
pub mod overrides;
pub mod reorderable;
pub mod restore;
pub mod shorthands;
pub mod validator;
pub mod wrap;

use crate::options::Options;
use crate::token::{Declaration, Fragment, Origin};

/// Legacy browser-targeting syntax carried by a declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Hack {
    #[default]
    None,
    /// `*zoom: 1`
    Star,
    /// `_height: 1px`
    Underscore,
    /// `color: red\9`
    Backslash,
    /// `color: red !ie`
    Bang,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: String,
    pub name_origin: Option<Origin>,
    pub value: Vec<Fragment>,
    pub important: bool,
    pub hack: Hack,
    /// The value must be regenerated from `components`.
    pub dirty: bool,
    /// `components` hold the decomposed value.
    pub shorthand: bool,
    pub components: Vec<Property>,
    /// The value is a comma separated list of layers.
    pub multiplex: bool,
    /// A custom property, or a value referencing one.
    pub variable: bool,
    /// A special comment kept between declarations.
    pub comment: bool,
    /// Index of the declaration in the body it came from.
    pub position: usize,
}

impl Property {
    pub fn new(name: impl Into<String>, value: Vec<Fragment>) -> Self {
        Self {
            name: name.into(),
            name_origin: None,
            value,
            important: false,
            hack: Hack::None,
            dirty: false,
            shorthand: false,
            components: Vec::new(),
            multiplex: false,
            variable: false,
            comment: false,
            position: 0,
        }
    }

    pub fn value_words(&self) -> impl Iterator<Item = &str> {
        self.value
            .iter()
            .filter(|fragment| !fragment.is_separator())
            .map(|fragment| fragment.value.as_str())
    }

    /// Every value word is `inherit`.
    pub fn is_inherit(&self) -> bool {
        let mut words = self.value_words().peekable();
        words.peek().is_some() && words.all(validator::is_inherit)
    }

    pub fn has_inherit(&self) -> bool {
        self.value_words().any(validator::is_inherit)
    }

    /// `name:value` as it would be written, used for length comparisons.
    pub fn text_len(&self) -> usize {
        let mut length = self.name.len() + 1 + crate::token::join_values(&self.value).len();
        if self.important {
            length += "!important".len();
        }
        length
    }
}

/// How far the optimizer may go on a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode {
    /// Run override and shorthand compaction at all.
    pub compact: bool,
    /// Values may move between declarations (pulling a longhand into an
    /// earlier shorthand, synthesizing shorthands). Off when bodies of
    /// non-adjacent rules are optimized together.
    pub allow_moves: bool,
}

impl Mode {
    pub fn full(options: &Options) -> Self {
        Self {
            compact: options.advanced,
            allow_moves: true,
        }
    }

    pub fn removal_only(options: &Options) -> Self {
        Self {
            compact: options.advanced,
            allow_moves: false,
        }
    }

    /// Value minification only; used for `@font-face`-like bodies where
    /// repeated declarations are fallbacks.
    pub fn values_only() -> Self {
        Self {
            compact: false,
            allow_moves: false,
        }
    }
}

/// Optimizes one declaration list.
pub fn optimize(declarations: Vec<Declaration>, options: &Options, mode: Mode) -> Vec<Declaration> {
    let properties = wrap::wrap_all(declarations, options);
    if !mode.compact {
        return wrap::unwrap_all(properties);
    }

    let properties = break_up::populate_components(properties);
    let properties = overrides::compact_overrides(properties, options, mode.allow_moves);
    let properties = if mode.allow_moves && options.shorthand_compacting {
        shorthands::compact_shorthands(properties, options)
    } else {
        properties
    };

    wrap::unwrap_all(restore::restore_all(properties, options))
}

/// Indices of the declarations that survive a removal-only pass over
/// `declarations`. Used to optimize the joint body of several rules while
/// leaving each declaration in its own rule.
pub fn surviving(declarations: Vec<Declaration>, options: &Options) -> Vec<usize> {
    let properties = break_up::populate_components(wrap::wrap_all(declarations, options));
    overrides::compact_overrides(properties, options, false)
        .into_iter()
        .map(|property| property.position)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::split_value;
    use crate::token::body_text;

    fn body(text: &str) -> Vec<Declaration> {
        text.split(';')
            .filter_map(|part| part.split_once(':'))
            .map(|(name, value)| {
                let (value, important) = match value.strip_suffix("!important") {
                    Some(value) => (value, true),
                    None => (value, false),
                };
                Declaration::new(
                    Fragment::new(name),
                    split_value(value)
                        .into_iter()
                        .map(|(_, word)| Fragment::new(word))
                        .collect(),
                    important,
                )
            })
            .collect()
    }

    fn run(text: &str) -> String {
        let options = Options::default();
        body_text(&optimize(body(text), &options, Mode::full(&options)))
    }

    #[test]
    fn later_value_overrides() {
        assert_eq!(run("color:red;color:blue"), "color:blue");
        assert_eq!(run("color:red!important;color:blue"), "color:red!important");
    }

    #[test]
    fn merges_longhands() {
        assert_eq!(
            run("margin-top:1px;margin-right:1px;margin-bottom:1px;margin-left:1px"),
            "margin:1px"
        );
        assert_eq!(
            run("margin-top:1px;margin-right:2px;margin-bottom:3px;margin-left:4px"),
            "margin:1px 2px 3px 4px"
        );
        assert_eq!(
            run("margin-top:1px;margin-right:2px;margin-bottom:1px;margin-left:2px"),
            "margin:1px 2px"
        );
    }

    #[test]
    fn shorthand_overrides_longhand() {
        assert_eq!(run("margin-top:5px;margin:0 auto"), "margin:0 auto");
        assert_eq!(run("padding:0;padding-left:5px"), "padding:0 0 0 5px");
    }

    #[test]
    fn inherit_blocks_partial_merge() {
        assert_eq!(
            run("margin-top:inherit;margin-right:inherit;margin-bottom:inherit;margin-left:inherit"),
            "margin:inherit"
        );
        assert_eq!(
            run("margin-top:inherit;margin-right:1px;margin-bottom:1px;margin-left:1px"),
            "margin-top:inherit;margin-right:1px;margin-bottom:1px;margin-left:1px"
        );
    }

    #[test]
    fn shortens_untouched_four_values() {
        assert_eq!(run("margin:0 0"), "margin:0");
        assert_eq!(run("padding:1px 2px 1px 2px"), "padding:1px 2px");
    }

    #[test]
    fn drops_negative_padding() {
        assert_eq!(run("padding:-1px 2px;color:red"), "color:red");
    }

    #[test]
    fn reports_surviving_positions() {
        let options = Options::default();
        assert_eq!(
            surviving(body("color:red;margin:0;color:blue"), &options),
            vec![1, 2]
        );
    }

    #[test]
    fn removal_only_mode_keeps_positions() {
        let options = Options::default();
        let optimized = optimize(
            body("padding:0;padding-left:5px;color:red;color:blue"),
            &options,
            Mode::removal_only(&options),
        );
        assert_eq!(body_text(&optimized), "padding:0;padding-left:5px;color:blue");
    }
}
