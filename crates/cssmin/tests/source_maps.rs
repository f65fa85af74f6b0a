//! Source map generation through the public entry point.

use cssmin::{Mapping, Options, Source, SourceMap, SourceMapOption, minify};

fn with_map() -> Options {
    Options {
        source_map: SourceMapOption::Enabled,
        ..Options::default()
    }
}

fn is_monotonic(mappings: &[Mapping]) -> bool {
    mappings.windows(2).all(|pair| {
        (pair[0].generated_line, pair[0].generated_column)
            <= (pair[1].generated_line, pair[1].generated_column)
    })
}

#[test]
fn maps_single_input_to_stdin() {
    let output = minify("a {\n  color: red;\n}", &with_map());
    assert_eq!(output.styles, "a{color:red}");

    let map = output.source_map.expect("source map requested");
    assert_eq!(map.version, 3);
    assert_eq!(map.sources, ["$stdin"]);
    assert!(map.mappings.starts_with("AAAA"));

    let decoded = map.decode().unwrap();
    let color = decoded
        .iter()
        .find(|mapping| mapping.generated_column == 2)
        .expect("mapping for the property name");
    assert_eq!((color.original_line, color.original_column), (2, 2));
}

#[test]
fn no_map_unless_requested() {
    assert!(minify("a{color:red}", &Options::default()).source_map.is_none());
}

#[test]
fn mappings_never_go_backwards() {
    let source = "b { margin: 0 }\n\na { color: red }\n@media print {\n  a { color: blue }\n}\nb { color: red }";
    let output = minify(source, &with_map());
    let map = output.source_map.unwrap();
    assert!(is_monotonic(&map.decode().unwrap()));
}

#[test]
fn names_every_contributing_source() {
    let options = Options {
        source_map_inline_sources: true,
        ..with_map()
    };
    let output = minify(
        vec![Source::new("one.css", "a{color:red}"), Source::new("two.css", "b{color:red}")],
        &options,
    );
    assert_eq!(output.styles, "a,b{color:red}");

    let map = output.source_map.unwrap();
    assert!(map.sources.contains(&"one.css".to_string()));
    assert!(map.sources.contains(&"two.css".to_string()));
    let contents = map.sources_content.unwrap();
    assert!(contents.contains(&Some("b{color:red}".to_string())));
}

#[test]
fn translates_through_input_map() {
    let input = SourceMap {
        version: 3,
        file: None,
        sources: vec!["styles.scss".to_string()],
        sources_content: None,
        names: Vec::new(),
        // a{color:red} -> line 10 column 4 of styles.scss for everything.
        mappings: "AASI".to_string(),
    };
    let options = Options {
        source_map: SourceMapOption::Input(input.to_json().unwrap()),
        ..Options::default()
    };
    let output = minify("a{color:red}", &options);
    let map = output.source_map.unwrap();
    assert_eq!(map.sources, ["styles.scss"]);
    let decoded = map.decode().unwrap();
    assert!(decoded.iter().all(|mapping| mapping.original_line == 10));
}

#[test]
fn broken_input_map_is_reported() {
    let options = Options {
        source_map: SourceMapOption::Input("{".to_string()),
        ..Options::default()
    };
    let output = minify("a{color:red}", &options);
    assert_eq!(output.styles, "a{color:red}");
    assert_eq!(output.errors.len(), 1);
}
