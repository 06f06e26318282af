//! Recall buffer for recently submitted input lines.

use std::collections::VecDeque;

/// Default number of lines kept for recall.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Fixed-capacity history of submitted lines with a recall cursor.
///
/// The cursor counts steps back from the newest entry: `0` means "not
/// recalling" (an empty input buffer), `1` is the newest line, and
/// `len()` is the oldest. The length never exceeds the capacity, so the
/// cursor always stays within `[0, min(capacity, len)]`.
///
/// # Example
///
/// ```
/// use archipelago_console::history::CommandHistory;
///
/// let mut history = CommandHistory::new(10);
/// history.append("/help");
/// history.append("hello");
/// assert_eq!(history.recall_older(), Some("hello"));
/// assert_eq!(history.recall_older(), Some("/help"));
/// assert_eq!(history.recall_older(), None);
/// assert_eq!(history.recall_newer(), Some("hello"));
/// assert_eq!(history.recall_newer(), Some(""));
/// ```
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    capacity: usize,
    cursor: usize,
}

impl CommandHistory {
    /// Create an empty history. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Store a submitted line, evicting the oldest one when full.
    pub fn append(&mut self, line: impl Into<String>) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.into());
        self.cursor = 0;
    }

    /// Step one entry further into the past.
    ///
    /// Returns `None` (and leaves the cursor alone) when the history is empty
    /// or the cursor is already on the oldest entry.
    pub fn recall_older(&mut self) -> Option<&str> {
        if self.entries.is_empty() || self.cursor >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    /// Step one entry back towards the present.
    ///
    /// Returns `None` when the history is empty or the cursor is already at
    /// 0, and `Some("")` when stepping back to 0.
    pub fn recall_newer(&mut self) -> Option<&str> {
        if self.entries.is_empty() || self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    /// Entry under the cursor, or `""` when not recalling.
    fn current(&self) -> &str {
        if self.cursor == 0 {
            return "";
        }
        self.entries
            .len()
            .checked_sub(self.cursor)
            .and_then(|index| self.entries.get(index))
            .map_or("", String::as_str)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored lines, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn recall_on_empty_history_is_noop() {
        let mut history = CommandHistory::default();
        assert_eq!(history.recall_older(), None);
        assert_eq!(history.recall_newer(), None);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn append_evicts_oldest_first() {
        let mut history = CommandHistory::new(3);
        for line in ["a", "b", "c", "d", "e"] {
            history.append(line);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["c", "d", "e"]);
    }

    #[test]
    fn append_resets_cursor() {
        let mut history = CommandHistory::new(3);
        history.append("a");
        history.append("b");
        history.recall_older();
        history.recall_older();
        assert_eq!(history.cursor(), 2);

        history.append("c");
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.recall_older(), Some("c"));
    }

    #[test]
    fn recall_walks_newest_to_oldest_and_back() {
        let mut history = CommandHistory::new(10);
        history.append("first");
        history.append("second");
        history.append("third");

        assert_eq!(history.recall_older(), Some("third"));
        assert_eq!(history.recall_older(), Some("second"));
        assert_eq!(history.recall_older(), Some("first"));
        assert_eq!(history.recall_older(), None);
        assert_eq!(history.cursor(), 3);

        assert_eq!(history.recall_newer(), Some("second"));
        assert_eq!(history.recall_newer(), Some("third"));
        assert_eq!(history.recall_newer(), Some(""));
        assert_eq!(history.recall_newer(), None);
    }

    #[test]
    fn cursor_stays_in_bounds_for_any_walk() {
        let mut history = CommandHistory::new(4);
        // A fixed pseudo-random walk: true = older, false = newer.
        let mut seed: u32 = 0x2545_f491;
        for step in 0..500 {
            if step % 7 == 0 {
                history.append(format!("line {step}"));
            }
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            if seed % 2 == 0 {
                history.recall_older();
            } else {
                history.recall_newer();
            }
            assert!(history.len() <= history.capacity());
            assert!(history.cursor() <= history.len().min(history.capacity()));
        }
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = CommandHistory::new(0);
        history.append("a");
        history.append("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["b"]);
    }
}
