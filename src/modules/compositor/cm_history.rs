use super::cm_memory::MemoryBuffer;
use super::cm_state::CanvasState;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Full copy of everything undo can bring back.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub canvas: CanvasState,
    pub memory: MemoryBuffer,
}

/// Linear undo/redo list. `index` always points at a live entry.
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
    limit: usize,
}

impl History {
    pub fn new(seed: HistoryEntry, limit: usize) -> Self {
        Self { entries: vec![seed], index: 0, limit: limit.max(1) }
    }

    pub fn len(&self) -> usize { self.entries.len() }
    #[cfg(test)]
    pub fn index(&self) -> usize { self.index }
    pub fn can_undo(&self) -> bool { self.index > 0 }
    pub fn can_redo(&self) -> bool { self.index + 1 < self.entries.len() }

    /// Drops the redo branch, appends, and evicts the oldest entries past the limit.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.index + 1);
        self.entries.push(entry);
        if self.entries.len() > self.limit {
            let excess: usize = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.index = self.entries.len() - 1;
        log::debug!("history push, index {} of {}", self.index, self.entries.len());
    }

    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() { return None; }
        self.index -= 1;
        log::debug!("undo, index {}", self.index);
        Some(&self.entries[self.index])
    }

    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() { return None; }
        self.index += 1;
        log::debug!("redo, index {}", self.index);
        Some(&self.entries[self.index])
    }
}
