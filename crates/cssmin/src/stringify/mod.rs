//! Renders a token tree back to text.
//!
//! Both variants walk the tree the same way and only differ in their
//! [`Sink`]: the plain one restores placeholders once at the end, the mapped
//! one restores every fragment as it goes so it can follow the generated
//! line and column and record a [`Mapping`] whenever the origin changes.

use crate::escape::EscapeStore;
use crate::options::Options;
use crate::source_map::{InputSourceMapTracker, Mapping};
use crate::token::{Declaration, Fragment, Origin, Token};

/// Source name used when the input was a single string.
pub const STDIN: &str = "$stdin";

trait Sink {
    /// Structural text: braces, colons, separators.
    fn raw(&mut self, text: &str);
    /// Text that came from the input, possibly with an origin.
    fn fragment(&mut self, fragment: &Fragment);
}

struct Plain {
    output: String,
}

impl Sink for Plain {
    fn raw(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn fragment(&mut self, fragment: &Fragment) {
        self.output.push_str(&fragment.value);
    }
}

struct Mapped<'a> {
    output: String,
    line: usize,
    column: usize,
    store: &'a EscapeStore,
    sources: &'a [String],
    inputs: &'a InputSourceMapTracker,
    mappings: Vec<Mapping>,
    last_origin: Option<Origin>,
}

impl Mapped<'_> {
    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.output.push_str(text);
    }

    fn record(&mut self, origin: Origin) {
        let mapping = if self.inputs.is_tracking(origin.source) {
            let Some(original) = self
                .inputs
                .original_position(origin.source, origin.line, origin.column)
            else {
                return;
            };
            Mapping {
                generated_line: self.line,
                generated_column: self.column,
                source: original.source.clone(),
                original_line: original.original_line,
                original_column: original.original_column,
                name: original.name.clone(),
            }
        } else {
            Mapping {
                generated_line: self.line,
                generated_column: self.column,
                source: self
                    .sources
                    .get(origin.source)
                    .cloned()
                    .unwrap_or_else(|| STDIN.to_string()),
                original_line: origin.line,
                original_column: origin.column,
                name: None,
            }
        };
        self.mappings.push(mapping);
    }
}

impl Sink for Mapped<'_> {
    fn raw(&mut self, text: &str) {
        self.advance(text);
    }

    fn fragment(&mut self, fragment: &Fragment) {
        if let Some(origin) = fragment.origin {
            if self.last_origin != Some(origin) {
                self.last_origin = Some(origin);
                self.record(origin);
            }
        }
        let restored = self.store.restore(&fragment.value);
        self.advance(&restored);
    }
}

fn value<S: Sink>(values: &[Fragment], sink: &mut S) {
    let mut previous_separator = true;
    for word in values {
        let separator = word.is_separator();
        if !separator && !previous_separator {
            sink.raw(" ");
        }
        sink.fragment(word);
        previous_separator = separator;
    }
}

fn body<S: Sink>(properties: &[Declaration], sink: &mut S) {
    for (index, declaration) in properties.iter().enumerate() {
        if index > 0 && !properties[index - 1].comment {
            sink.raw(";");
        }
        sink.fragment(&declaration.name);
        if declaration.comment {
            continue;
        }
        sink.raw(":");
        value(&declaration.value, sink);
        if declaration.important {
            sink.raw("!important");
        }
    }
}

fn tokens<S: Sink>(list: &[Token], options: &Options, sink: &mut S) {
    for (index, token) in list.iter().enumerate() {
        if index > 0 && options.keep_breaks {
            sink.raw("\n");
        }
        match token {
            Token::Selector {
                selectors,
                properties,
            } => {
                for (position, selector) in selectors.iter().enumerate() {
                    if position > 0 {
                        sink.raw(",");
                    }
                    sink.fragment(selector);
                }
                sink.raw("{");
                body(properties, sink);
                sink.raw("}");
            }
            Token::Block { header, children } => {
                sink.fragment(header);
                sink.raw("{");
                tokens(children, options, sink);
                sink.raw("}");
            }
            Token::FlatBlock { header, properties } => {
                sink.fragment(header);
                sink.raw("{");
                body(properties, sink);
                sink.raw("}");
            }
            Token::AtRule { text } => {
                sink.fragment(text);
                sink.raw(";");
            }
            Token::Text { text } => sink.fragment(text),
        }
    }
}

/// Renders `list` and restores every placeholder.
pub fn stringify(list: &[Token], store: &EscapeStore, options: &Options) -> String {
    let mut sink = Plain {
        output: String::new(),
    };
    tokens(list, options, &mut sink);
    store.restore(&sink.output)
}

/// Renders `list` and collects mappings back to `sources` (by origin source
/// index), translated through `inputs` where an input map is known.
pub fn stringify_with_map(
    list: &[Token],
    store: &EscapeStore,
    options: &Options,
    sources: &[String],
    inputs: &InputSourceMapTracker,
) -> (String, Vec<Mapping>) {
    let mut sink = Mapped {
        output: String::new(),
        line: 1,
        column: 0,
        store,
        sources,
        inputs,
        mappings: Vec::new(),
        last_origin: None,
    };
    tokens(list, options, &mut sink);
    log::debug!("recorded {} source map mappings", sink.mappings.len());
    (sink.output, sink.mappings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration(name: &str, value: &[&str]) -> Declaration {
        Declaration::new(
            Fragment::new(name),
            value.iter().copied().map(Fragment::new).collect(),
            false,
        )
    }

    fn sample() -> Vec<Token> {
        vec![
            Token::AtRule {
                text: Fragment::new("@import url(a.css)"),
            },
            Token::Selector {
                selectors: vec![Fragment::new("a"), Fragment::new("b")],
                properties: vec![
                    declaration("font", &["12px", "/", "1.5", "Arial", ",", "serif"]),
                    declaration("color", &["red"]),
                ],
            },
            Token::Block {
                header: Fragment::new("@media print"),
                children: vec![Token::Selector {
                    selectors: vec![Fragment::new("a")],
                    properties: vec![declaration("margin", &["0", "auto"])],
                }],
            },
        ]
    }

    #[test]
    fn renders_compact_text() {
        let output = stringify(&sample(), &EscapeStore::new(), &Options::default());
        assert_eq!(
            output,
            "@import url(a.css);a,b{font:12px/1.5 Arial,serif;color:red}@media print{a{margin:0 auto}}"
        );
    }

    #[test]
    fn keeps_breaks_between_rules() {
        let options = Options {
            keep_breaks: true,
            ..Options::default()
        };
        let output = stringify(&sample(), &EscapeStore::new(), &options);
        assert_eq!(
            output,
            "@import url(a.css);\na,b{font:12px/1.5 Arial,serif;color:red}\n@media print{a{margin:0 auto}}"
        );
    }

    #[test]
    fn restores_placeholders() {
        let mut store = EscapeStore::new();
        let placeholder = store.store(crate::escape::Kind::FreeText, "\"x\"");
        let list = vec![Token::Selector {
            selectors: vec![Fragment::new("a:after")],
            properties: vec![declaration("content", &[&placeholder])],
        }];
        assert_eq!(stringify(&list, &store, &Options::default()), "a:after{content:\"x\"}");
    }

    #[test]
    fn maps_fragments_with_origins() {
        let list = vec![Token::Selector {
            selectors: vec![Fragment::at("a", Some(Origin::new(0, 1, 0)))],
            properties: vec![Declaration::new(
                Fragment::at("color", Some(Origin::new(0, 2, 2))),
                vec![Fragment::new("red")],
                false,
            )],
        }];
        let sources = vec!["one.css".to_string()];
        let (output, mappings) = stringify_with_map(
            &list,
            &EscapeStore::new(),
            &Options::default(),
            &sources,
            &InputSourceMapTracker::new(),
        );
        assert_eq!(output, "a{color:red}");
        assert_eq!(mappings.len(), 2);
        assert_eq!((mappings[1].generated_column, mappings[1].original_line), (2, 2));
        assert_eq!(mappings[1].source, "one.css");
    }
}
