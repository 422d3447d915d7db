//! Scene-scoped GPU resource state.
//!
//! [`RenderResources`] bundles the mesh arena, both GPU caches and the
//! fallback texture cache under one owner with a single wholesale teardown
//! path. Everything in here is scoped to one loaded scene: nothing is
//! evicted piecemeal, and [`clear`](RenderResources::clear) drops the lot
//! when the scene unloads.

pub mod texture;

use std::sync::Arc;

use crate::backend::GpuBackend;
use crate::mesh::{GpuBufferCache, MeshBufferArena, VertexLayoutCache};

pub use texture::TextureCache;

/// The mesh arena and GPU caches for one loaded scene.
pub struct RenderResources {
    /// Mesh buffer sets, addressed by handle.
    pub meshes: MeshBufferArena,
    /// Uploaded buffers, one entry per set.
    pub buffers: GpuBufferCache,
    /// Vertex array objects, one entry per (set, shader, streams, base).
    pub layouts: VertexLayoutCache,
    /// Solid-color fallback textures.
    pub textures: TextureCache,
}

impl RenderResources {
    /// Create empty resources on a backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            meshes: MeshBufferArena::new(),
            buffers: GpuBufferCache::new(backend.clone()),
            layouts: VertexLayoutCache::new(backend.clone()),
            textures: TextureCache::new(backend),
        }
    }

    /// Tear down every arena entry and cache entry (scene unload).
    pub fn clear(&mut self) {
        self.meshes.clear();
        self.buffers.clear();
        self.layouts.clear();
        self.textures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use crate::mesh::MeshBufferSet;

    #[test]
    fn clear_tears_down_arena_and_caches() {
        let backend = Arc::new(DummyBackend::new());
        let mut resources = RenderResources::new(backend);

        let handle = resources.meshes.insert(MeshBufferSet::new());
        resources.buffers.get_or_create(&resources.meshes, handle).unwrap();
        resources.textures.solid([1.0, 1.0, 1.0, 1.0]).unwrap();

        resources.clear();
        assert!(resources.meshes.is_empty());
        assert!(resources.buffers.is_empty());
        assert!(resources.layouts.is_empty());
        assert!(resources.textures.is_empty());
    }
}
