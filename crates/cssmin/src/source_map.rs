//! Version 3 source maps: the JSON model, the base64 VLQ `mappings` codec and
//! lookups through input source maps.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const VLQ_SHIFT: u32 = 5;
const VLQ_CONTINUATION: i64 = 1 << VLQ_SHIFT;
const VLQ_MASK: i64 = VLQ_CONTINUATION - 1;

/// One generated position and the original position it came from.
///
/// Lines are 1-based, columns 0-based, as in the tokenizer's origins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: usize,
    pub generated_column: usize,
    pub source: String,
    pub original_line: usize,
    pub original_column: usize,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Builds a map from mappings already ordered by generated position.
    /// `contents` supplies `sourcesContent` by source name when given.
    pub fn build(mappings: &[Mapping], contents: Option<&HashMap<String, String>>) -> Self {
        let mut sources: Vec<String> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut encoded = String::new();

        let mut line = 1;
        let mut previous_column = 0i64;
        let mut previous_source = 0i64;
        let mut previous_original_line = 0i64;
        let mut previous_original_column = 0i64;
        let mut previous_name = 0i64;
        let mut first_on_line = true;

        for mapping in mappings {
            while line < mapping.generated_line {
                encoded.push(';');
                line += 1;
                previous_column = 0;
                first_on_line = true;
            }
            if !first_on_line {
                encoded.push(',');
            }
            first_on_line = false;

            let source = index_of(&mut sources, &mapping.source) as i64;
            let column = mapping.generated_column as i64;
            let original_line = mapping.original_line.saturating_sub(1) as i64;
            let original_column = mapping.original_column as i64;

            encode_vlq(column - previous_column, &mut encoded);
            encode_vlq(source - previous_source, &mut encoded);
            encode_vlq(original_line - previous_original_line, &mut encoded);
            encode_vlq(original_column - previous_original_column, &mut encoded);
            if let Some(name) = &mapping.name {
                let name = index_of(&mut names, name) as i64;
                encode_vlq(name - previous_name, &mut encoded);
                previous_name = name;
            }

            previous_column = column;
            previous_source = source;
            previous_original_line = original_line;
            previous_original_column = original_column;
        }

        let sources_content = contents.map(|contents| {
            sources
                .iter()
                .map(|source| contents.get(source).cloned())
                .collect()
        });

        Self {
            version: 3,
            file: None,
            sources,
            sources_content,
            names,
            mappings: encoded,
        }
    }

    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let map: SourceMap =
            serde_json::from_str(source).map_err(|error| ConfigError::InvalidSourceMap(error.to_string()))?;
        if map.version != 3 {
            return Err(ConfigError::InvalidSourceMap(format!(
                "unsupported version {}",
                map.version
            )));
        }
        Ok(map)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes `mappings` back into positions.
    pub fn decode(&self) -> Result<Vec<Mapping>, ConfigError> {
        let mut decoded = Vec::new();
        let mut source = 0i64;
        let mut original_line = 0i64;
        let mut original_column = 0i64;
        let mut name = 0i64;

        for (line, segments) in self.mappings.split(';').enumerate() {
            let mut column = 0i64;
            for segment in segments.split(',').filter(|segment| !segment.is_empty()) {
                let fields = decode_vlq(segment)?;
                if fields.len() < 4 {
                    continue;
                }
                column += fields[0];
                source += fields[1];
                original_line += fields[2];
                original_column += fields[3];
                let mapped_name = match fields.get(4) {
                    Some(delta) => {
                        name += delta;
                        self.names.get(name as usize).cloned()
                    }
                    None => None,
                };
                let Some(source_name) = self.sources.get(source as usize) else {
                    return Err(ConfigError::InvalidSourceMap(format!(
                        "source index {source} out of range"
                    )));
                };
                decoded.push(Mapping {
                    generated_line: line + 1,
                    generated_column: column.max(0) as usize,
                    source: source_name.clone(),
                    original_line: original_line.max(0) as usize + 1,
                    original_column: original_column.max(0) as usize,
                    name: mapped_name,
                });
            }
        }
        Ok(decoded)
    }
}

fn index_of(list: &mut Vec<String>, value: &str) -> usize {
    match list.iter().position(|existing| existing == value) {
        Some(index) => index,
        None => {
            list.push(value.to_string());
            list.len() - 1
        }
    }
}

fn encode_vlq(value: i64, into: &mut String) {
    let mut rest = if value < 0 { (-value << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = rest & VLQ_MASK;
        rest >>= VLQ_SHIFT;
        if rest > 0 {
            digit |= VLQ_CONTINUATION;
        }
        into.push(char::from(BASE64[digit as usize]));
        if rest == 0 {
            break;
        }
    }
}

fn decode_vlq(segment: &str) -> Result<Vec<i64>, ConfigError> {
    let mut values = Vec::new();
    let mut value = 0i64;
    let mut shift = 0u32;

    for byte in segment.bytes() {
        let Some(digit) = BASE64.iter().position(|&c| c == byte) else {
            return Err(ConfigError::InvalidSourceMap(format!(
                "invalid base64 digit '{}'",
                char::from(byte)
            )));
        };
        let digit = digit as i64;
        value += (digit & VLQ_MASK) << shift;
        if digit & VLQ_CONTINUATION != 0 {
            shift += VLQ_SHIFT;
            if shift > 60 {
                return Err(ConfigError::InvalidSourceMap("VLQ value too large".into()));
            }
        } else {
            let negative = value & 1 == 1;
            value >>= 1;
            values.push(if negative { -value } else { value });
            value = 0;
            shift = 0;
        }
    }
    if shift != 0 {
        return Err(ConfigError::InvalidSourceMap("truncated VLQ segment".into()));
    }
    Ok(values)
}

/// Translates positions of the minifier's input through source maps that
/// came with it, one per input source.
#[derive(Clone, Debug, Default)]
pub struct InputSourceMapTracker {
    maps: HashMap<usize, Vec<Mapping>>,
    contents: HashMap<String, String>,
}

impl InputSourceMapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the map describing input source `source`.
    pub fn track(&mut self, source: usize, map: &SourceMap) -> Result<(), ConfigError> {
        let mut mappings = map.decode()?;
        mappings.sort_by_key(|mapping| (mapping.generated_line, mapping.generated_column));
        if let Some(contents) = &map.sources_content {
            for (name, content) in map.sources.iter().zip(contents) {
                if let Some(content) = content {
                    self.contents.insert(name.clone(), content.clone());
                }
            }
        }
        self.maps.insert(source, mappings);
        Ok(())
    }

    pub fn is_tracking(&self, source: usize) -> bool {
        self.maps.contains_key(&source)
    }

    /// Original contents embedded in the input maps, by source name.
    pub fn contents(&self) -> &HashMap<String, String> {
        &self.contents
    }

    /// The closest original position at or before `line:column` of input
    /// source `source`, on the same line.
    pub fn original_position(&self, source: usize, line: usize, column: usize) -> Option<&Mapping> {
        let mappings = self.maps.get(&source)?;
        let end = mappings.partition_point(|mapping| {
            (mapping.generated_line, mapping.generated_column) <= (line, column)
        });
        mappings[..end]
            .last()
            .filter(|mapping| mapping.generated_line == line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(line: usize, column: usize, source: &str, original: (usize, usize)) -> Mapping {
        Mapping {
            generated_line: line,
            generated_column: column,
            source: source.to_string(),
            original_line: original.0,
            original_column: original.1,
            name: None,
        }
    }

    #[test]
    fn encodes_vlq() {
        let mut encoded = String::new();
        for value in [0, 1, -1, 15, 16, -123] {
            encode_vlq(value, &mut encoded);
            encoded.push(',');
        }
        assert_eq!(encoded, "A,C,D,e,gB,3H,");
        assert_eq!(decode_vlq("gB3H").unwrap(), [16, -123]);
    }

    #[test]
    fn builds_mappings_across_lines() {
        let map = SourceMap::build(
            &[
                mapping(1, 0, "a.css", (1, 0)),
                mapping(1, 2, "a.css", (1, 4)),
                mapping(3, 0, "b.css", (2, 0)),
            ],
            None,
        );
        assert_eq!(map.sources, ["a.css", "b.css"]);
        assert_eq!(map.mappings, "AAAA,EAAI;;ACCJ");
        assert_eq!(map.decode().unwrap()[2], mapping(3, 0, "b.css", (2, 0)));
    }

    #[test]
    fn serializes_camel_case() {
        let mut contents = HashMap::new();
        contents.insert("a.css".to_string(), "a{}".to_string());
        let map = SourceMap::build(&[mapping(1, 0, "a.css", (1, 0))], Some(&contents));
        let json = map.to_json().unwrap();
        assert!(json.contains("\"sourcesContent\":[\"a{}\"]"));
        assert!(json.contains("\"version\":3"));
    }

    #[test]
    fn looks_up_input_positions() {
        let input = SourceMap::build(
            &[mapping(1, 0, "in.less", (4, 2)), mapping(1, 10, "in.less", (9, 0))],
            None,
        );
        let mut tracker = InputSourceMapTracker::new();
        tracker.track(0, &input).unwrap();

        let found = tracker.original_position(0, 1, 12).unwrap();
        assert_eq!((found.original_line, found.original_column), (9, 0));
        assert_eq!(tracker.original_position(0, 1, 3).unwrap().original_line, 4);
        assert!(tracker.original_position(0, 2, 0).is_none());
        assert!(tracker.original_position(1, 1, 0).is_none());
    }

    #[test]
    fn rejects_malformed_maps() {
        assert!(SourceMap::from_json("{\"version\":2,\"mappings\":\"\"}").is_err());
        assert!(SourceMap::from_json("not json").is_err());
    }
}
