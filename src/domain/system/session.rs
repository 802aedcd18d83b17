use crate::domain::system::calc_task::CalcTaskId;
use crate::domain::system::transmission::TransmissionId;
use crate::domain::utils::id::NodeId;

/// A timeline mutation recorded in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEntry {
    Calc { unit: NodeId, id: CalcTaskId },
    Transmission(TransmissionId),
}

/// Ordered group of placements that can be rolled back as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    entries: Vec<SessionEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: SessionEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the entries, newest first.
    pub fn drain_reversed(&mut self) -> impl Iterator<Item = SessionEntry> + '_ {
        self.entries.drain(..).rev()
    }
}
