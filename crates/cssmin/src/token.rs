//! The stylesheet token tree.
//!
//! A stylesheet is a flat list of [`Token`]s; `@media`-like blocks nest a
//! further list. Every piece of text keeps the original position it came
//! from so the source-map stringifier can emit mappings.

use std::fmt;

/// An original position: source index, 1-based line, 0-based column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Origin {
    pub source: usize,
    pub line: usize,
    pub column: usize,
}

impl Origin {
    pub fn new(source: usize, line: usize, column: usize) -> Self {
        Self {
            source,
            line,
            column,
        }
    }
}

/// A piece of text plus the original position it starts at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub value: String,
    pub origin: Option<Origin>,
}

impl Fragment {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: None,
        }
    }

    pub fn at(value: impl Into<String>, origin: Option<Origin>) -> Self {
        Self {
            value: value.into(),
            origin,
        }
    }

    /// Whether this fragment is the `,` or `/` separator of a value list.
    pub fn is_separator(&self) -> bool {
        self.value == "," || self.value == "/"
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// One declaration of a rule body, or a special comment kept in place.
///
/// Hacks stay in their textual form here (`*zoom`, `red\9`); the property
/// optimizer classifies them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: Fragment,
    pub value: Vec<Fragment>,
    pub important: bool,
    pub comment: bool,
}

impl Declaration {
    pub fn new(name: Fragment, value: Vec<Fragment>, important: bool) -> Self {
        Self {
            name,
            value,
            important,
            comment: false,
        }
    }

    /// A special comment placeholder inside a body.
    pub fn comment(text: Fragment) -> Self {
        Self {
            name: text,
            value: Vec::new(),
            important: false,
            comment: true,
        }
    }

    /// Custom properties keep their value verbatim.
    pub fn is_variable(&self) -> bool {
        self.name.value.starts_with("--")
    }

    /// The value as written in minified output, without `!important`.
    pub fn value_text(&self) -> String {
        join_values(&self.value)
    }

    /// `name:value[!important]`, the unit used for body comparisons.
    pub fn text(&self) -> String {
        if self.comment {
            return self.name.value.clone();
        }
        let mut text = format!("{}:{}", self.name.value, self.value_text());
        if self.important {
            text.push_str("!important");
        }
        text
    }
}

/// Joins value fragments: separators stick to their neighbours, everything
/// else is separated by one space.
pub fn join_values(values: &[Fragment]) -> String {
    let mut text = String::new();
    let mut previous_separator = true;
    for value in values {
        let separator = value.is_separator();
        if !separator && !previous_separator {
            text.push(' ');
        }
        text.push_str(&value.value);
        previous_separator = separator;
    }
    text
}

/// A node of the stylesheet tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// `a, b { ... }`
    Selector {
        selectors: Vec<Fragment>,
        properties: Vec<Declaration>,
    },
    /// A nesting at-rule such as `@media`.
    Block {
        header: Fragment,
        children: Vec<Token>,
    },
    /// A declaration-bodied at-rule such as `@font-face`.
    FlatBlock {
        header: Fragment,
        properties: Vec<Declaration>,
    },
    /// A statement at-rule such as `@import` or `@charset`, without `;`.
    AtRule { text: Fragment },
    /// An escaped special comment.
    Text { text: Fragment },
}

impl Token {
    /// Whether the token renders to nothing and can be dropped.
    pub fn is_empty(&self) -> bool {
        match self {
            Token::Selector {
                selectors,
                properties,
            } => selectors.is_empty() || properties.is_empty(),
            Token::Block { children, .. } => children.is_empty(),
            Token::FlatBlock { properties, .. } => properties.is_empty(),
            Token::AtRule { text } | Token::Text { text } => text.value.is_empty(),
        }
    }
}

/// The selector list as one comparable string.
pub fn selectors_text(selectors: &[Fragment]) -> String {
    selectors
        .iter()
        .map(|selector| selector.value.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// The body as one comparable string.
pub fn body_text(properties: &[Declaration]) -> String {
    properties
        .iter()
        .map(Declaration::text)
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_values_around_separators() {
        let values: Vec<Fragment> = ["12px", "/", "1.5", "Arial", ",", "serif"]
            .into_iter()
            .map(Fragment::new)
            .collect();
        assert_eq!(join_values(&values), "12px/1.5 Arial,serif");
    }

    #[test]
    fn declaration_text() {
        let declaration = Declaration::new(
            Fragment::new("margin"),
            vec![Fragment::new("0"), Fragment::new("auto")],
            true,
        );
        assert_eq!(declaration.text(), "margin:0 auto!important");
    }

    #[test]
    fn empty_tokens() {
        let rule = Token::Selector {
            selectors: vec![Fragment::new("a")],
            properties: vec![],
        };
        assert!(rule.is_empty());
        let block = Token::Block {
            header: Fragment::new("@media print"),
            children: vec![rule],
        };
        assert!(!block.is_empty());
    }
}
