use crate::core::codec::PayloadKind;
use std::collections::VecDeque;

/// Entries kept per ring unless configured otherwise
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Bounded, newest-first, duplicate-free list of sent payloads
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<String>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a ring from a stored newest-first list.
    ///
    /// Later duplicates and entries beyond capacity are dropped.
    pub fn from_entries<I, S>(entries: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ring = Self::with_capacity(capacity);
        for entry in entries {
            let entry = entry.into();
            if ring.entries.len() >= ring.capacity {
                break;
            }
            if !ring.entries.contains(&entry) {
                ring.entries.push_back(entry);
            }
        }
        ring
    }

    /// Move `entry` to the front, evicting the oldest beyond capacity
    pub fn record(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if let Some(pos) = self.entries.iter().position(|e| *e == entry) {
            self.entries.remove(pos);
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Newest-first copy of the entries
    pub fn as_ordered_list(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    /// Stored text at `index`, unchanged
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
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

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new()
    }
}

/// The pair of rings kept by one session, one per payload kind
#[derive(Debug, Clone, Default)]
pub struct SendHistory {
    text: HistoryRing,
    hex: HistoryRing,
}

impl SendHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: HistoryRing::with_capacity(capacity),
            hex: HistoryRing::with_capacity(capacity),
        }
    }

    pub fn from_lists(text: &[String], hex: &[String], capacity: usize) -> Self {
        Self {
            text: HistoryRing::from_entries(text.iter().cloned(), capacity),
            hex: HistoryRing::from_entries(hex.iter().cloned(), capacity),
        }
    }

    pub fn record(&mut self, entry: impl Into<String>, kind: PayloadKind) {
        self.ring_mut(kind).record(entry);
    }

    pub fn as_ordered_list(&self, kind: PayloadKind) -> Vec<String> {
        self.ring(kind).as_ordered_list()
    }

    pub fn ring(&self, kind: PayloadKind) -> &HistoryRing {
        match kind {
            PayloadKind::Text => &self.text,
            PayloadKind::Hex => &self.hex,
        }
    }

    fn ring_mut(&mut self, kind: PayloadKind) -> &mut HistoryRing {
        match kind {
            PayloadKind::Text => &mut self.text,
            PayloadKind::Hex => &mut self.hex,
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.hex.clear();
    }
}
