//! Quick-string table: positional send presets with stable slot indices.

use crate::core::import::ImportedMacro;
use crate::domain::config::MacroSlot;
use crate::domain::error::{DualComError, DualComResult};

/// Slots per session unless configured otherwise
pub const DEFAULT_MACRO_CAPACITY: usize = 40;

/// Positional label of slot `index`
pub fn default_label(index: usize) -> String {
    format!("Macro {}", index + 1)
}

/// Fixed-capacity, index-addressed collection of [`MacroSlot`]s.
///
/// The table never holds fewer slots than its capacity. Editing past the
/// end grows it; deleting compacts and refills so the length is kept.
#[derive(Debug, Clone)]
pub struct MacroTable {
    slots: Vec<MacroSlot>,
    capacity: usize,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MACRO_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity).map(|i| MacroSlot::blank(default_label(i))).collect();
        Self { slots, capacity }
    }

    /// Build from stored slots, padding up to capacity
    pub fn from_slots(slots: Vec<MacroSlot>, capacity: usize) -> Self {
        let mut table = Self {
            slots: Vec::new(),
            capacity,
        };
        table.replace_all(slots);
        table
    }

    pub fn get(&self, index: usize) -> DualComResult<&MacroSlot> {
        self.slots.get(index).ok_or(DualComError::IndexOutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    /// Slot at `index`, rejected when it has nothing to send
    pub fn sendable(&self, index: usize) -> DualComResult<&MacroSlot> {
        let slot = self.get(index)?;
        if slot.is_unused() {
            return Err(DualComError::EmptyMacro { index });
        }
        Ok(slot)
    }

    /// Overwrite in place, growing the table with blanks if needed
    pub fn set(&mut self, index: usize, slot: MacroSlot) {
        while self.slots.len() <= index {
            let next = self.slots.len();
            self.slots.push(MacroSlot::blank(default_label(next)));
        }
        self.slots[index] = slot;
    }

    /// Replace the whole table; short inputs are padded with labelled blanks
    pub fn replace_all(&mut self, slots: Vec<MacroSlot>) {
        self.slots = slots;
        self.pad();
    }

    /// Remove slot `index`, shift the rest down and append a blank
    pub fn delete(&mut self, index: usize) -> DualComResult<()> {
        if index >= self.slots.len() {
            return Err(DualComError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }

        self.slots.remove(index);
        self.slots.push(MacroSlot::blank(String::new()));
        for (i, slot) in self.slots.iter_mut().enumerate().skip(index) {
            slot.label = default_label(i);
        }
        Ok(())
    }

    /// Replace the table with parsed import entries.
    ///
    /// Returns the number of entries taken; an empty import leaves the
    /// table untouched.
    pub fn apply_import(&mut self, imported: Vec<ImportedMacro>) -> usize {
        if imported.is_empty() {
            return 0;
        }
        let count = imported.len();
        let slots = imported
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let label = if entry.source_name.trim().is_empty() {
                    default_label(i)
                } else {
                    entry.source_name.trim().to_string()
                };
                MacroSlot::new(label, entry.content, entry.is_hex)
            })
            .collect();
        self.replace_all(slots);
        count
    }

    /// Slots with content, paired with their index
    pub fn visible(&self) -> impl Iterator<Item = (usize, &MacroSlot)> {
        self.slots.iter().enumerate().filter(|(_, s)| !s.is_unused())
    }

    pub fn slots(&self) -> &[MacroSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn pad(&mut self) {
        while self.slots.len() < self.capacity {
            let next = self.slots.len();
            self.slots.push(MacroSlot::blank(default_label(next)));
        }
    }
}

impl Default for MacroTable {
    fn default() -> Self {
        Self::new()
    }
}
