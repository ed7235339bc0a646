//! Line-level change detection between two versions of a module.
//!
//! The changed-line set is numbered in the *new* text, since that is
//! the version whose scopes get re-analyzed. Consuming is one-shot by
//! design: an inner scope that consumes its changed lines leaves
//! nothing for the enclosing scope, which is what keeps reanalysis
//! proportional to the edit.

use similar::{ChangeTag, TextDiff};

/// Ordered set of 1-based changed line numbers in the new text.
#[derive(Debug)]
pub struct ChangeRecord {
    lines: Vec<usize>,
}

impl ChangeRecord {
    pub fn new(new_text: &str, old_text: &str) -> Self {
        let diff = TextDiff::from_lines(old_text, new_text);
        let mut lines = Vec::new();
        for change in diff.iter_all_changes() {
            if change.tag() == ChangeTag::Insert {
                if let Some(index) = change.new_index() {
                    lines.push(index + 1);
                }
            }
        }
        lines.sort_unstable();
        lines.dedup();
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn changed_lines(&self) -> &[usize] {
        &self.lines
    }

    /// Any changed line in the inclusive range `[start, end]`?
    pub fn is_changed(&self, start: usize, end: usize) -> bool {
        let (left, right) = self.range(start, end);
        left < right
    }

    /// Remove the changed lines in `[start, end]`; true if any were
    /// present. One-shot: a second call over the same range is false.
    pub fn consume_changes(&mut self, start: usize, end: usize) -> bool {
        let (left, right) = self.range(start, end);
        if left < right {
            self.lines.drain(left..right);
            true
        } else {
            false
        }
    }

    fn range(&self, start: usize, end: usize) -> (usize, usize) {
        let left = self.lines.partition_point(|&l| l < start);
        let right = self.lines.partition_point(|&l| l <= end);
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_lines_numbered_in_new_text() {
        let old = "a = 1\nb = 2\nc = 3\n";
        let new = "a = 1\nb = 20\nc = 3\n";
        let record = ChangeRecord::new(new, old);
        assert_eq!(record.changed_lines(), &[2]);
    }

    #[test]
    fn test_insertion_shifts_following_lines() {
        let old = "a = 1\nc = 3\n";
        let new = "a = 1\nb = 2\nc = 3\n";
        let record = ChangeRecord::new(new, old);
        assert_eq!(record.changed_lines(), &[2]);
    }

    #[test]
    fn test_pure_deletion_marks_nothing() {
        let old = "a = 1\nb = 2\nc = 3\n";
        let new = "a = 1\nc = 3\n";
        let record = ChangeRecord::new(new, old);
        assert!(record.is_empty());
    }

    #[test]
    fn test_consume_is_one_shot() {
        let old = "a = 1\nb = 2\n";
        let new = "a = 10\nb = 20\n";
        let mut record = ChangeRecord::new(new, old);
        assert!(record.is_changed(1, 1));
        assert!(record.consume_changes(1, 1));
        assert!(!record.consume_changes(1, 1));
        // Line 2 is still pending.
        assert!(record.is_changed(1, 2));
        assert!(record.consume_changes(2, 2));
        assert!(record.is_empty());
    }

    #[test]
    fn test_identical_texts_have_no_changes() {
        let text = "a = 1\n";
        let record = ChangeRecord::new(text, text);
        assert!(record.is_empty());
        assert!(!record.is_changed(1, 100));
    }
}
