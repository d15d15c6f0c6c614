use std::collections::VecDeque;

use mosaic_core::AppName;

/// Default number of entries kept in the focus history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Bounded focus history, most recent last. Never holds duplicates.
#[derive(Debug, Clone)]
pub struct FocusHistory {
    entries: VecDeque<AppName>,
    capacity: usize,
}

impl Default for FocusHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl FocusHistory {
    /// Create a history holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Move `app` to the most recent position, evicting the oldest entries
    /// beyond capacity.
    pub fn touch(&mut self, app: &AppName) {
        self.remove(app);
        self.entries.push_back(app.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Remove `app` wherever it appears.
    pub fn remove(&mut self, app: &AppName) {
        self.entries.retain(|entry| entry != app);
    }

    /// The entry focused before the most recent one.
    #[must_use]
    pub fn previous(&self) -> Option<&AppName> {
        self.entries.iter().rev().nth(1)
    }

    /// The most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&AppName> {
        self.entries.back()
    }

    /// Entries from oldest to most recent.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AppName> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
