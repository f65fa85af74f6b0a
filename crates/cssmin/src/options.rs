//! Minifier configuration.
//!
//! [`Options`] mirrors the recognized option set of the minifier and can be
//! deserialized from a camelCase JSON document. [`Compatibility`] describes
//! which units, hacks and selector features the target browsers accept; it
//! is built from one of the `*`, `ie8`, `ie7` presets and optionally tweaked
//! with `+group.flag` / `-group.flag` entries:
//!
//! ```
//! use cssmin::options::{Compatibility, Units};
//!
//! let compatibility: Compatibility = "ie8,+units.rem".parse().unwrap();
//! assert!(compatibility.units.contains(Units::REM));
//! assert!(!compatibility.colors_opacity);
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use bitflags::bitflags;
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::ConfigError;

bitflags! {
    /// Length units the target browsers understand.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Units: u16 {
        const CH   = 1 << 0;
        const IN   = 1 << 1;
        const PC   = 1 << 2;
        const PT   = 1 << 3;
        const REM  = 1 << 4;
        const VH   = 1 << 5;
        const VM   = 1 << 6;
        const VMAX = 1 << 7;
        const VMIN = 1 << 8;
        const VW   = 1 << 9;
    }
}

bitflags! {
    /// Property-level features and hacks the target browsers rely on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyFlags: u16 {
        /// `background-clip` may be merged into `background`.
        const BACKGROUND_CLIP_MERGING   = 1 << 0;
        /// `background-origin` may be merged into `background`.
        const BACKGROUND_ORIGIN_MERGING = 1 << 1;
        /// `background-size` may be merged into `background`.
        const BACKGROUND_SIZE_MERGING   = 1 << 2;
        /// Color values may be rewritten.
        const COLORS                    = 1 << 3;
        /// `color:red !ie` declarations are kept.
        const IE_BANG_HACK              = 1 << 4;
        /// `*color` / `_color` declarations are kept.
        const IE_PREFIX_HACK            = 1 << 5;
        /// `color:red\9` declarations are kept.
        const IE_SUFFIX_HACK            = 1 << 6;
        /// Longhands with function values may be merged into shorthands.
        const MERGING                   = 1 << 7;
        /// `px` may be folded into `in`/`pt`/`pc` when shorter.
        const SHORTER_LENGTH_UNITS      = 1 << 8;
        /// A space is kept after `)` inside values.
        const SPACE_AFTER_CLOSING_BRACE = 1 << 9;
        /// Quotes inside `url()` are kept.
        const URL_QUOTES                = 1 << 10;
        /// Units are dropped from zero lengths.
        const ZERO_UNITS                = 1 << 11;
    }
}

/// Selector patterns which cannot be safely combined into comma lists
/// because some engines drop the whole rule when they see one of them.
const SPECIAL_SELECTORS: &[&str] = &[
    "-moz-",
    "-ms-",
    "-o-",
    "-webkit-",
    ":dir(",
    ":fullscreen",
    ":left",
    ":read-only",
    ":read-write",
    ":right",
    ":placeholder",
    ":host",
    "::content",
    "/deep/",
    "::shadow",
];

const LEGACY_SPECIAL_SELECTORS: &[&str] = &[
    "-moz-",
    "-ms-",
    "-o-",
    "-webkit-",
    ":dir(",
    ":fullscreen",
    ":left",
    ":read-only",
    ":read-write",
    ":right",
    ":placeholder",
    ":host",
    "::content",
    "/deep/",
    "::shadow",
    ":root",
    ":nth",
    ":checked",
    ":disabled",
    ":enabled",
    ":empty",
    ":first-of-type",
    ":last-child",
    ":last-of-type",
    ":not",
    ":only-child",
    ":only-of-type",
    ":target",
    "::selection",
];

/// Selector-level compatibility switches.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectorCompatibility {
    /// Keep the space in `+ .next` adjacent-sibling selectors.
    pub adjacent_space: bool,
    /// Keep `*+html` style selector hacks.
    pub ie7_hack: bool,
    /// Substrings marking a selector as special.
    pub special: &'static [&'static str],
}

impl SelectorCompatibility {
    /// Whether `selector` contains a pattern that prevents comma merging.
    pub fn is_special(&self, selector: &str) -> bool {
        if selector.starts_with(',') || has_first_pseudo(selector) {
            return true;
        }
        self.special.iter().any(|pattern| selector.contains(pattern))
    }
}

/// `:first` alone (the paged media pseudo-class), not `:first-child`.
fn has_first_pseudo(selector: &str) -> bool {
    selector.match_indices(":first").any(|(at, found)| {
        !selector[at + found.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '-')
    })
}

/// What the target browsers support.
#[derive(Clone, Debug, PartialEq)]
pub struct Compatibility {
    /// `rgba()`/`hsla()` colors are understood.
    pub colors_opacity: bool,
    pub properties: PropertyFlags,
    pub selectors: SelectorCompatibility,
    pub units: Units,
}

static MODERN: Lazy<Compatibility> = Lazy::new(|| Compatibility {
    colors_opacity: true,
    properties: PropertyFlags::COLORS
        | PropertyFlags::IE_SUFFIX_HACK
        | PropertyFlags::MERGING
        | PropertyFlags::SPACE_AFTER_CLOSING_BRACE
        | PropertyFlags::ZERO_UNITS,
    selectors: SelectorCompatibility {
        adjacent_space: false,
        ie7_hack: false,
        special: SPECIAL_SELECTORS,
    },
    units: Units::CH
        | Units::IN
        | Units::PC
        | Units::PT
        | Units::REM
        | Units::VH
        | Units::VMAX
        | Units::VMIN
        | Units::VW,
});

static IE8: Lazy<Compatibility> = Lazy::new(|| Compatibility {
    colors_opacity: false,
    properties: PropertyFlags::COLORS
        | PropertyFlags::IE_PREFIX_HACK
        | PropertyFlags::IE_SUFFIX_HACK
        | PropertyFlags::SPACE_AFTER_CLOSING_BRACE
        | PropertyFlags::ZERO_UNITS,
    selectors: SelectorCompatibility {
        adjacent_space: false,
        ie7_hack: false,
        special: LEGACY_SPECIAL_SELECTORS,
    },
    units: Units::IN | Units::PC | Units::PT,
});

static IE7: Lazy<Compatibility> = Lazy::new(|| Compatibility {
    properties: IE8.properties | PropertyFlags::IE_BANG_HACK,
    selectors: SelectorCompatibility {
        ie7_hack: true,
        ..IE8.selectors.clone()
    },
    ..IE8.clone()
});

impl Default for Compatibility {
    fn default() -> Self {
        MODERN.clone()
    }
}

impl Compatibility {
    /// Returns a copy of a named preset: `*` (or empty), `ie8` or `ie7`.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim() {
            "" | "*" => Ok(MODERN.clone()),
            "ie8" => Ok(IE8.clone()),
            "ie7" => Ok(IE7.clone()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    fn toggle(&mut self, flag: &str, enabled: bool) -> Result<(), ConfigError> {
        let (group, key) = flag
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownFlag(flag.to_string()))?;

        match group {
            "colors" if key == "opacity" => self.colors_opacity = enabled,
            "selectors" => match key {
                "adjacentSpace" => self.selectors.adjacent_space = enabled,
                "ie7Hack" => self.selectors.ie7_hack = enabled,
                _ => return Err(ConfigError::UnknownFlag(flag.to_string())),
            },
            "properties" => {
                let bit = property_flag(key)
                    .ok_or_else(|| ConfigError::UnknownFlag(flag.to_string()))?;
                self.properties.set(bit, enabled);
            }
            "units" => {
                let bit =
                    unit_flag(key).ok_or_else(|| ConfigError::UnknownFlag(flag.to_string()))?;
                self.units.set(bit, enabled);
            }
            _ => return Err(ConfigError::UnknownFlag(flag.to_string())),
        }
        Ok(())
    }

    /// Whether a length unit (lowercase, without the number) is usable.
    pub fn allows_unit(&self, unit: &str) -> bool {
        match unit_flag(unit) {
            Some(flag) => self.units.contains(flag),
            None => true,
        }
    }
}

fn property_flag(key: &str) -> Option<PropertyFlags> {
    let flag = match key {
        "backgroundClipMerging" => PropertyFlags::BACKGROUND_CLIP_MERGING,
        "backgroundOriginMerging" => PropertyFlags::BACKGROUND_ORIGIN_MERGING,
        "backgroundSizeMerging" => PropertyFlags::BACKGROUND_SIZE_MERGING,
        "colors" => PropertyFlags::COLORS,
        "ieBangHack" => PropertyFlags::IE_BANG_HACK,
        "iePrefixHack" => PropertyFlags::IE_PREFIX_HACK,
        "ieSuffixHack" => PropertyFlags::IE_SUFFIX_HACK,
        "merging" => PropertyFlags::MERGING,
        "shorterLengthUnits" => PropertyFlags::SHORTER_LENGTH_UNITS,
        "spaceAfterClosingBrace" => PropertyFlags::SPACE_AFTER_CLOSING_BRACE,
        "urlQuotes" => PropertyFlags::URL_QUOTES,
        "zeroUnits" => PropertyFlags::ZERO_UNITS,
        _ => return None,
    };
    Some(flag)
}

fn unit_flag(key: &str) -> Option<Units> {
    let flag = match key {
        "ch" => Units::CH,
        "in" => Units::IN,
        "pc" => Units::PC,
        "pt" => Units::PT,
        "rem" => Units::REM,
        "vh" => Units::VH,
        "vm" => Units::VM,
        "vmax" => Units::VMAX,
        "vmin" => Units::VMIN,
        "vw" => Units::VW,
        _ => return None,
    };
    Some(flag)
}

impl FromStr for Compatibility {
    type Err = ConfigError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut parts = source.split(',').map(str::trim).peekable();

        let mut compatibility = match parts.peek() {
            Some(first) if !first.starts_with('+') && !first.starts_with('-') => {
                let preset = Compatibility::preset(first)?;
                parts.next();
                preset
            }
            _ => Compatibility::default(),
        };

        for part in parts.filter(|part| !part.is_empty()) {
            if let Some(flag) = part.strip_prefix('+') {
                compatibility.toggle(flag, true)?;
            } else if let Some(flag) = part.strip_prefix('-') {
                compatibility.toggle(flag, false)?;
            } else {
                return Err(ConfigError::InvalidEntry(part.to_string()));
            }
        }

        Ok(compatibility)
    }
}

impl TryFrom<String> for Compatibility {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which `/*! ... */` comments survive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SpecialCommentsSetting")]
pub enum SpecialComments {
    #[default]
    All,
    First,
    None,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpecialCommentsSetting {
    Number(u8),
    Text(String),
}

impl TryFrom<SpecialCommentsSetting> for SpecialComments {
    type Error = ConfigError;

    fn try_from(value: SpecialCommentsSetting) -> Result<Self, Self::Error> {
        match value {
            SpecialCommentsSetting::Number(0) => Ok(SpecialComments::None),
            SpecialCommentsSetting::Number(1) => Ok(SpecialComments::First),
            SpecialCommentsSetting::Number(other) => {
                Err(ConfigError::InvalidSpecialComments(other.to_string()))
            }
            SpecialCommentsSetting::Text(text) => text.parse(),
        }
    }
}

impl FromStr for SpecialComments {
    type Err = ConfigError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        match source {
            "*" => Ok(SpecialComments::All),
            "1" => Ok(SpecialComments::First),
            "0" => Ok(SpecialComments::None),
            other => Err(ConfigError::InvalidSpecialComments(other.to_string())),
        }
    }
}

/// Source map generation mode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "SourceMapSetting")]
pub enum SourceMapOption {
    #[default]
    Disabled,
    Enabled,
    /// Enabled, with the given JSON source map describing the input string.
    Input(String),
}

impl SourceMapOption {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SourceMapOption::Disabled)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceMapSetting {
    Flag(bool),
    Input(String),
}

impl From<SourceMapSetting> for SourceMapOption {
    fn from(value: SourceMapSetting) -> Self {
        match value {
            SourceMapSetting::Flag(true) => SourceMapOption::Enabled,
            SourceMapSetting::Flag(false) => SourceMapOption::Disabled,
            SourceMapSetting::Input(map) => SourceMapOption::Input(map),
        }
    }
}

/// Options accepted by [`minify`](crate::minify).
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Enable property compaction, selector merging and restructuring.
    pub advanced: bool,
    /// Let later declarations of unknown properties replace earlier ones.
    pub aggressive_merging: bool,
    #[serde(deserialize_with = "deserialize_compatibility")]
    pub compatibility: Compatibility,
    /// Emit a line break after every rule.
    pub keep_breaks: bool,
    pub keep_special_comments: SpecialComments,
    /// Merge `@media` blocks with identical queries.
    pub media_merging: bool,
    /// Inline `@import`s before minifying (used by the import phase).
    pub process_import: bool,
    /// Rewrite relative `url()`s of imported files.
    pub rebase: bool,
    pub root: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub relative_to: Option<PathBuf>,
    /// Move declarations shared by several rules into combined rules.
    pub restructuring: bool,
    /// Decimal digits kept in `px` values; negative disables rounding.
    pub rounding_precision: i32,
    /// Allow merging by body across rules with class or pseudo selectors.
    pub semantic_merging: bool,
    /// Merge complete sets of longhands into shorthands.
    pub shorthand_compacting: bool,
    pub source_map: SourceMapOption,
    /// Embed the original sources in the generated source map.
    pub source_map_inline_sources: bool,
}

fn deserialize_compatibility<'de, D>(deserializer: D) -> Result<Compatibility, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let source = String::deserialize(deserializer)?;
    source.parse().map_err(serde::de::Error::custom)
}

impl Default for Options {
    fn default() -> Self {
        Self {
            advanced: true,
            aggressive_merging: true,
            compatibility: Compatibility::default(),
            keep_breaks: false,
            keep_special_comments: SpecialComments::All,
            media_merging: true,
            process_import: true,
            rebase: true,
            root: None,
            target: None,
            relative_to: None,
            restructuring: true,
            rounding_precision: 2,
            semantic_merging: false,
            shorthand_compacting: true,
            source_map: SourceMapOption::Disabled,
            source_map_inline_sources: false,
        }
    }
}

impl Options {
    /// Parses options from a camelCase JSON document; missing keys keep
    /// their defaults.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}
