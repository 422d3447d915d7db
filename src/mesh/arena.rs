//! Scene-scoped storage for mesh buffer sets.
//!
//! The GPU caches key on *identity* of a mesh buffer set, not structural
//! equality. The arena makes that identity explicit: every insert mints a
//! fresh handle, and two structurally identical sets inserted independently
//! stay distinct cache entries. The arena is torn down wholesale when the
//! owning scene unloads; nothing is removed piecemeal.

use super::data::MeshBufferSet;

/// Stable identity of a [`MeshBufferSet`] within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshBufferHandle(u32);

impl MeshBufferHandle {
    /// The raw arena index.
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Arena of mesh buffer sets, addressed by [`MeshBufferHandle`].
#[derive(Debug, Default)]
pub struct MeshBufferArena {
    sets: Vec<MeshBufferSet>,
}

impl MeshBufferArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a set, minting a new handle. Never deduplicates.
    pub fn insert(&mut self, set: MeshBufferSet) -> MeshBufferHandle {
        let handle = MeshBufferHandle(self.sets.len() as u32);
        self.sets.push(set);
        handle
    }

    /// Look up a set by handle.
    ///
    /// Handles are only minted by [`insert`](Self::insert), so a missing
    /// entry means the handle outlived its arena; that is a caller bug.
    pub fn get(&self, handle: MeshBufferHandle) -> &MeshBufferSet {
        &self.sets[handle.0 as usize]
    }

    /// Number of sets in the arena.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Drop every set. Called when the owning scene unloads; the GPU caches
    /// keyed on these handles must be cleared alongside.
    pub fn clear(&mut self) {
        self.sets.clear();
    }
}
