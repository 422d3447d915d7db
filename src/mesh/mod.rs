//! Mesh buffer descriptions, arena storage and GPU caches.

pub mod arena;
pub mod cache;
pub mod data;

pub use arena::{MeshBufferArena, MeshBufferHandle};
pub use cache::{
    GpuBufferAlloc, GpuBufferCache, GpuMeshBuffers, VertexLayoutCache, VertexLayoutKey,
    VertexLayoutObject,
};
pub use data::{
    Attribute, AttributeFormat, IndexBufferDescription, IndexFormat, MeshBufferSet,
    VertexBufferDescription,
};
