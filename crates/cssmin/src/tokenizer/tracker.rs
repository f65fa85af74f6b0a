//! Maps offsets in escaped text back to original positions.

use crate::escape::Checkpoint;
use crate::token::Origin;

/// Resolves escaped offsets to [`Origin`]s using the escape checkpoints.
///
/// Lookups usually move forward, so the last answer is cached and the next
/// lookup walks on from there instead of from the checkpoint.
pub struct Tracker<'a> {
    text: &'a str,
    checkpoints: &'a [Checkpoint],
    enabled: bool,
    cursor: Option<(usize, Origin)>,
}

impl<'a> Tracker<'a> {
    pub fn new(text: &'a str, checkpoints: &'a [Checkpoint], enabled: bool) -> Self {
        Self {
            text,
            checkpoints,
            enabled,
            cursor: None,
        }
    }

    /// A tracker that never resolves anything.
    pub fn disabled(text: &'a str) -> Self {
        Self::new(text, &[], false)
    }

    pub fn origin(&mut self, offset: usize) -> Option<Origin> {
        if !self.enabled {
            return None;
        }

        let index = self
            .checkpoints
            .partition_point(|checkpoint| checkpoint.offset <= offset);
        let checkpoint = self.checkpoints.get(index.checked_sub(1)?)?;

        let (start, mut origin) = match self.cursor {
            Some((at, origin)) if at >= checkpoint.offset && at <= offset => (at, origin),
            _ => (checkpoint.offset, checkpoint.origin),
        };

        let end = offset.min(self.text.len());
        for c in self.text.get(start..end)?.chars() {
            if c == '\n' {
                origin.line += 1;
                origin.column = 0;
            } else {
                origin.column += 1;
            }
        }

        self.cursor = Some((end, origin));
        Some(origin)
    }
}
