//! GPU-side caches for mesh geometry.
//!
//! Two caches cooperate here:
//!
//! - [`GpuBufferCache`] uploads each mesh buffer set's raw bytes exactly
//!   once and hands out the shared [`GpuMeshBuffers`] on every later call.
//! - [`VertexLayoutCache`] builds one vertex array object per
//!   (set, shader, streams, base vertex) key. The shader is part of the key
//!   because attribute locations are resolved against a specific linked
//!   program; the same geometry bound for a different shader variant is a
//!   different object.
//!
//! Neither cache evicts. Entries live until the owning scene unloads and
//! [`clear`](GpuBufferCache::clear) tears everything down wholesale.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::backend::{
    AttributeComponentType, BufferKind, GpuBackend, GpuBuffer, GpuVertexArray,
    VertexArrayDescriptor, VertexAttributeBinding,
};
use crate::error::RenderError;
use crate::shader::{Shader, ShaderId};

use super::arena::{MeshBufferArena, MeshBufferHandle};
use super::data::AttributeFormat;

/// One uploaded buffer plus the allocation size the device reported.
#[derive(Debug, Clone)]
pub struct GpuBufferAlloc {
    /// Backend buffer handle.
    pub buffer: GpuBuffer,
    /// Device-reported size in bytes.
    pub size: u64,
}

/// The uploaded vertex and index buffers for one mesh buffer set.
#[derive(Debug)]
pub struct GpuMeshBuffers {
    /// Vertex buffers in stream order.
    pub vertex: Vec<GpuBufferAlloc>,
    /// Index buffers in stream order.
    pub index: Vec<GpuBufferAlloc>,
}

/// Uploads mesh buffer sets to the GPU exactly once per handle.
pub struct GpuBufferCache {
    backend: Arc<dyn GpuBackend>,
    entries: HashMap<MeshBufferHandle, Arc<GpuMeshBuffers>>,
}

impl GpuBufferCache {
    /// Create an empty cache on a backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            backend,
            entries: HashMap::new(),
        }
    }

    /// Get the uploaded buffers for a set, uploading on first use.
    ///
    /// Later calls for the same handle return the identical `Arc` without
    /// touching the GPU.
    pub fn get_or_create(
        &mut self,
        arena: &MeshBufferArena,
        handle: MeshBufferHandle,
    ) -> Result<Arc<GpuMeshBuffers>, RenderError> {
        if let Some(existing) = self.entries.get(&handle) {
            return Ok(existing.clone());
        }

        let set = arena.get(handle);
        let mut vertex = Vec::with_capacity(set.vertex_buffers.len());
        for description in &set.vertex_buffers {
            let buffer = self
                .backend
                .create_buffer(BufferKind::Vertex, &description.data)?;
            let size = self.backend.buffer_size(&buffer);
            vertex.push(GpuBufferAlloc { buffer, size });
        }

        let mut index = Vec::with_capacity(set.index_buffers.len());
        for description in &set.index_buffers {
            let buffer = self
                .backend
                .create_buffer(BufferKind::Index, &description.data)?;
            let size = self.backend.buffer_size(&buffer);
            index.push(GpuBufferAlloc { buffer, size });
        }

        log::debug!(
            "uploaded mesh buffer set {:?}: {} vertex / {} index streams",
            handle,
            vertex.len(),
            index.len()
        );

        let buffers = Arc::new(GpuMeshBuffers { vertex, index });
        self.entries.insert(handle, buffers.clone());
        Ok(buffers)
    }

    /// Number of uploaded sets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been uploaded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (scene unload).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Composite key of a cached vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayoutKey {
    /// Identity of the mesh buffer set.
    pub mesh: MeshBufferHandle,
    /// Identity of the shader variant the attribute locations were
    /// resolved against.
    pub shader: ShaderId,
    /// Vertex stream index within the set.
    pub vertex_stream: u32,
    /// Index stream index within the set.
    pub index_stream: u32,
    /// Base-vertex byte offset folded into every attribute offset.
    pub base_vertex_offset: u32,
}

/// A cached GPU vertex array object.
#[derive(Debug)]
pub struct VertexLayoutObject {
    /// The key this object was built for.
    pub key: VertexLayoutKey,
    /// Backend binding object.
    pub vertex_array: GpuVertexArray,
}

/// Builds and caches vertex array objects per [`VertexLayoutKey`].
pub struct VertexLayoutCache {
    backend: Arc<dyn GpuBackend>,
    entries: HashMap<VertexLayoutKey, Arc<VertexLayoutObject>>,
}

impl VertexLayoutCache {
    /// Create an empty cache on a backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            backend,
            entries: HashMap::new(),
        }
    }

    /// Get the vertex array object for a key, building it on first use.
    ///
    /// Ensures the set's buffers are uploaded, then resolves each attribute
    /// of the selected vertex stream against `shader`'s program by input
    /// name. Attributes the program doesn't consume are skipped; shader
    /// variants routinely ignore inputs, so this is not an error.
    #[allow(clippy::too_many_arguments)]
    pub fn get_or_create(
        &mut self,
        buffers: &mut GpuBufferCache,
        arena: &MeshBufferArena,
        handle: MeshBufferHandle,
        shader: &Shader,
        vertex_stream: u32,
        index_stream: u32,
        base_vertex_offset: u32,
    ) -> Result<Arc<VertexLayoutObject>, RenderError> {
        let gpu_buffers = buffers.get_or_create(arena, handle)?;

        let key = VertexLayoutKey {
            mesh: handle,
            shader: shader.id(),
            vertex_stream,
            index_stream,
            base_vertex_offset,
        };
        if let Some(existing) = self.entries.get(&key) {
            return Ok(existing.clone());
        }

        let set = arena.get(handle);
        let description = &set.vertex_buffers[vertex_stream as usize];

        let mut bindings: SmallVec<[VertexAttributeBinding; 8]> = SmallVec::new();
        for attribute in &description.attributes {
            let input_name = attribute.shader_input_name();
            let Some(location) = self
                .backend
                .attribute_location(shader.program(), &input_name)
            else {
                log::debug!(
                    "shader {} has no input {input_name}; attribute skipped",
                    shader.name()
                );
                continue;
            };
            let (components, component_type, normalized, integer) =
                format_binding(attribute.format);
            bindings.push(VertexAttributeBinding {
                location,
                components,
                component_type,
                normalized,
                integer,
                offset: base_vertex_offset + attribute.offset,
            });
        }

        let vertex_array = self.backend.create_vertex_array(&VertexArrayDescriptor {
            label: Some(shader.name()),
            vertex_buffer: &gpu_buffers.vertex[vertex_stream as usize].buffer,
            index_buffer: &gpu_buffers.index[index_stream as usize].buffer,
            stride: description.element_size,
            attributes: &bindings,
        })?;

        let object = Arc::new(VertexLayoutObject { key, vertex_array });
        self.entries.insert(key, object.clone());
        Ok(object)
    }

    /// Number of cached layout objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (scene unload).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The fixed format-to-binding table: component count, component type,
/// normalized, integer.
fn format_binding(format: AttributeFormat) -> (u8, AttributeComponentType, bool, bool) {
    match format {
        AttributeFormat::Float32x3 => (3, AttributeComponentType::Float32, false, false),
        AttributeFormat::Unorm8x4 => (4, AttributeComponentType::Uint8, true, false),
        AttributeFormat::Float32x2 => (2, AttributeComponentType::Float32, false, false),
        AttributeFormat::Float16x2 => (2, AttributeComponentType::Float16, false, false),
        AttributeFormat::Float32x4 => (4, AttributeComponentType::Float32, false, false),
        AttributeFormat::Uint8x4 => (4, AttributeComponentType::Uint8, false, false),
        AttributeFormat::Sint16x2 => (2, AttributeComponentType::Sint16, false, true),
        AttributeFormat::Sint16x4 => (4, AttributeComponentType::Sint16, false, true),
        AttributeFormat::Snorm16x2 => (2, AttributeComponentType::Sint16, true, false),
        AttributeFormat::Unorm16x2 => (2, AttributeComponentType::Uint16, true, false),
    }
}
