//! Per-field lifecycle state.

use std::fmt;

/// The synchronization state of a single field.
///
/// Every field starts out [`FieldState::Unsynced`] and moves between states
/// as it is fetched, written locally, and flushed:
///
/// - `Unsynced → Synced` after a fetch reconciles the remote value
/// - `Unsynced → Dirty` / `Synced → Dirty` after a local write
/// - `Dirty → Synced` once the remote store acknowledges a flushed write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldState {
    /// The field has never been fetched and never been written locally.
    Unsynced,
    /// The field holds a local write the remote store has not acknowledged.
    Dirty,
    /// The local value is consistent with the remote store.
    Synced,
}

impl FieldState {
    /// Returns true if the field has never been fetched or written.
    #[must_use]
    pub fn is_unsynced(self) -> bool {
        matches!(self, FieldState::Unsynced)
    }

    /// Returns true if the field holds an uncommitted local write.
    #[must_use]
    pub fn is_dirty(self) -> bool {
        matches!(self, FieldState::Dirty)
    }

    /// Returns true if the field is consistent with the remote store.
    #[must_use]
    pub fn is_synced(self) -> bool {
        matches!(self, FieldState::Synced)
    }

    /// Returns true if a read-through sync should fetch this field.
    #[must_use]
    pub fn needs_fetch(self) -> bool {
        self.is_unsynced()
    }

    /// Returns true if a flush should commit this field.
    #[must_use]
    pub fn needs_flush(self) -> bool {
        self.is_dirty()
    }
}

impl fmt::Display for FieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldState::Unsynced => "unsynced",
            FieldState::Dirty => "dirty",
            FieldState::Synced => "synced",
        };
        write!(f, "{name}")
    }
}
