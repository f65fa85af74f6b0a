//! # cssmin - structural CSS minifier
//!
//! A stylesheet goes through a small compiler pipeline: it is escaped so
//! strings, comments and urls cannot confuse a brace scan, tokenized into a
//! tree, optimized (declarations, then whole rules), and rendered back to
//! the shortest text that keeps the cascade intact, optionally with a
//! version 3 source map.
//!
//! ## Quick Start
//!
//! ```rust
//! use cssmin::{minify, Options};
//!
//! let output = minify("a { color: #ff0000; margin: 0px 0px }", &Options::default());
//! assert_eq!(output.styles, "a{color:red;margin:0}");
//! assert!(output.warnings.is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`escape`]: placeholder store for strings, comments, urls and expressions
//! - [`tokenizer`]: escaped text to [`Token`] tree
//! - [`properties`]: declaration-level overriding and shorthand compaction
//! - [`values`]: per-value minification (numbers, units, colors)
//! - [`selectors`]: rule-level merging and restructuring
//! - [`stringify`]: rendering, with or without mappings
//! - [`source_map`]: the v3 source map model
//! - [`options`]: configuration and compatibility profiles

pub mod error;
pub mod escape;
pub mod options;
pub mod properties;
pub mod selectors;
pub mod source_map;
pub mod split;
pub mod stringify;
pub mod token;
pub mod tokenizer;
pub mod values;

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub use error::{ConfigError, Diagnostics};
pub use options::{Compatibility, Options, SourceMapOption, SpecialComments};
pub use source_map::{InputSourceMapTracker, Mapping, SourceMap};
pub use token::{Declaration, Fragment, Origin, Token};

/// One named stylesheet of a multi-source input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub styles: String,
    /// A JSON source map describing `styles`.
    pub source_map: Option<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, styles: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            styles: styles.into(),
            source_map: None,
        }
    }
}

/// What [`minify`] accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Styles(String),
    /// Ordered sources, minified as one stylesheet.
    Sources(Vec<Source>),
}

impl From<&str> for Input {
    fn from(styles: &str) -> Self {
        Input::Styles(styles.to_string())
    }
}

impl From<String> for Input {
    fn from(styles: String) -> Self {
        Input::Styles(styles)
    }
}

impl From<Vec<Source>> for Input {
    fn from(sources: Vec<Source>) -> Self {
        Input::Sources(sources)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub original_size: usize,
    pub minified_size: usize,
    pub time_spent: Duration,
    /// `1 - minified / original`, zero for empty input.
    pub efficiency: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Output {
    pub styles: String,
    pub source_map: Option<SourceMap>,
    pub stats: Stats,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Joined text, source names and original texts of an input.
fn prepare(
    input: Input,
    options: &Options,
    inputs: &mut InputSourceMapTracker,
    diagnostics: &mut Diagnostics,
) -> (String, Vec<String>, HashMap<String, String>) {
    let mut contents = HashMap::new();
    match input {
        Input::Styles(styles) => {
            if let SourceMapOption::Input(map) = &options.source_map {
                track_input_map(inputs, 0, stringify::STDIN, map, diagnostics);
            }
            contents.insert(stringify::STDIN.to_string(), styles.clone());
            (styles, vec![stringify::STDIN.to_string()], contents)
        }
        Input::Sources(sources) => {
            let mut text = String::new();
            let mut names = Vec::with_capacity(sources.len());
            for (index, source) in sources.into_iter().enumerate() {
                if let Some(map) = &source.source_map {
                    track_input_map(inputs, index, &source.name, map, diagnostics);
                }
                text.push_str(&escape::source_marker(index));
                text.push_str(&source.styles);
                text.push('\n');
                contents.insert(source.name.clone(), source.styles);
                names.push(source.name);
            }
            (text, names, contents)
        }
    }
}

fn track_input_map(
    inputs: &mut InputSourceMapTracker,
    index: usize,
    name: &str,
    map: &str,
    diagnostics: &mut Diagnostics,
) {
    let tracked = SourceMap::from_json(map).and_then(|map| inputs.track(index, &map));
    if let Err(error) = tracked {
        diagnostics.error(format!("Broken input source map of '{name}': {error}."));
    }
}

/// Minifies `input`. Never fails: problems with the input end up in
/// [`Output::warnings`] and [`Output::errors`].
pub fn minify(input: impl Into<Input>, options: &Options) -> Output {
    let started = Instant::now();
    let mut diagnostics = Diagnostics::new();
    let mut inputs = InputSourceMapTracker::new();

    let input = input.into();
    let original_size = match &input {
        Input::Styles(styles) => styles.len(),
        Input::Sources(sources) => sources.iter().map(|source| source.styles.len()).sum(),
    };
    let (text, names, mut contents) = prepare(input, options, &mut inputs, &mut diagnostics);

    let (escaped, store) = escape::escape(&text, options, &mut diagnostics);
    let track = options.source_map.is_enabled();
    let tokens = tokenizer::tokenize(&escaped, store.checkpoints(), track, &mut diagnostics);
    log::debug!("optimizing {} top-level tokens", tokens.len());
    let tokens = selectors::optimize(tokens, options);

    let (styles, source_map) = if track {
        let (styles, mappings) = stringify::stringify_with_map(&tokens, &store, options, &names, &inputs);
        contents.extend(inputs.contents().clone());
        let embedded = options.source_map_inline_sources.then_some(&contents);
        (styles, Some(SourceMap::build(&mappings, embedded)))
    } else {
        (stringify::stringify(&tokens, &store, options), None)
    };

    let minified_size = styles.len();
    let efficiency = if original_size == 0 {
        0.0
    } else {
        1.0 - minified_size as f64 / original_size as f64
    };
    log::debug!("minified {original_size} bytes into {minified_size}");

    Output {
        styles,
        source_map,
        stats: Stats {
            original_size,
            minified_size,
            time_spent: started.elapsed(),
            efficiency,
        },
        errors: diagnostics.errors,
        warnings: diagnostics.warnings,
    }
}
