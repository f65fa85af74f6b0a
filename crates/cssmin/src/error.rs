//! Error types and the diagnostics collector.
//!
//! The minifier itself never fails: malformed input degrades to "pass the
//! text through or drop it" and a message is pushed to [`Diagnostics`].
//! Only configuration can be rejected up front, with [`ConfigError`].

use thiserror::Error;

/// Errors raised while building [`Options`](crate::Options).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A compatibility string named an unknown preset.
    #[error("unknown compatibility preset: {0}")]
    UnknownPreset(String),

    /// A `+group.flag` / `-group.flag` entry did not name a known flag.
    #[error("unknown compatibility flag: {0}")]
    UnknownFlag(String),

    /// A compatibility entry was neither a preset nor a `+`/`-` toggle.
    #[error("invalid compatibility entry: {0}")]
    InvalidEntry(String),

    /// `keepSpecialComments` only accepts `*`, `1` or `0`.
    #[error("invalid keepSpecialComments value: {0}")]
    InvalidSpecialComments(String),

    /// An input source map could not be decoded.
    #[error("invalid input source map: {0}")]
    InvalidSourceMap(String),
}

/// Non-fatal messages collected during one minification run.
///
/// Warnings describe input that was repaired or dropped; errors describe
/// collaborators that failed (a missing `@import`, a broken input map).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.errors.push(message);
    }

    /// Moves every message of `other` into `self`, keeping order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("first");
        diagnostics.error("broken");
        diagnostics.warn("second");

        assert_eq!(diagnostics.warnings, vec!["first", "second"]);
        assert_eq!(diagnostics.errors, vec!["broken"]);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn config_error_messages() {
        assert_eq!(
            ConfigError::UnknownPreset("ie6".into()).to_string(),
            "unknown compatibility preset: ie6"
        );
    }
}
