//! Selector list extraction.

use crate::split::split_top_level;
use crate::token::Fragment;

use super::tracker::Tracker;

/// Splits a rule header into its comma-separated selectors.
pub fn extract_selectors(header: &str, base: usize, tracker: &mut Tracker<'_>) -> Vec<Fragment> {
    split_top_level(header, ',')
        .into_iter()
        .filter_map(|(offset, selector)| {
            let trimmed = selector.trim();
            if trimmed.is_empty() {
                return None;
            }
            let start = base + offset + (selector.len() - selector.trim_start().len());
            Some(Fragment::at(trimmed, tracker.origin(start)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims() {
        let mut tracker = Tracker::disabled("");
        let selectors = extract_selectors(" a ,\n b:not(.c, .d) ,", 0, &mut tracker);
        let values: Vec<&str> = selectors.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b:not(.c, .d)"]);
    }
}
