//! CPU-side mesh buffer descriptions.
//!
//! These types describe one mesh's geometry as it arrives from the asset
//! pipeline: raw vertex/index bytes plus per-stream attribute metadata.
//! Nothing here touches the GPU; upload happens through the caches in
//! [`crate::mesh::cache`].

use crate::error::RenderError;

/// Format of a vertex attribute, as the fixed table of formats the asset
/// pipeline can produce.
///
/// Anything outside this table is unsupported asset data; see
/// [`AttributeFormat::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeFormat {
    /// Three 32-bit floats.
    Float32x3,
    /// Four 8-bit unsigned integers normalized to 0.0-1.0.
    Unorm8x4,
    /// Two 32-bit floats.
    Float32x2,
    /// Two 16-bit floats.
    Float16x2,
    /// Four 32-bit floats.
    Float32x4,
    /// Four 8-bit unsigned integers, converted to float without
    /// normalization.
    Uint8x4,
    /// Two 16-bit signed integers, bound as integer input.
    Sint16x2,
    /// Four 16-bit signed integers, bound as integer input.
    Sint16x4,
    /// Two 16-bit signed integers normalized to -1.0-1.0.
    Snorm16x2,
    /// Two 16-bit unsigned integers normalized to 0.0-1.0.
    Unorm16x2,
}

impl AttributeFormat {
    /// Map an asset-level format code to the format table.
    ///
    /// Unknown codes are a fatal error: they indicate corrupt or
    /// unsupported asset data, not something to patch over.
    pub fn from_raw(code: u32) -> Result<Self, RenderError> {
        match code {
            0 => Ok(Self::Float32x3),
            1 => Ok(Self::Unorm8x4),
            2 => Ok(Self::Float32x2),
            3 => Ok(Self::Float16x2),
            4 => Ok(Self::Float32x4),
            5 => Ok(Self::Uint8x4),
            6 => Ok(Self::Sint16x2),
            7 => Ok(Self::Sint16x4),
            8 => Ok(Self::Snorm16x2),
            9 => Ok(Self::Unorm16x2),
            other => Err(RenderError::UnsupportedAttributeFormat(other)),
        }
    }

    /// Get the size in bytes of this format.
    pub fn size(&self) -> u32 {
        match self {
            Self::Float32x3 => 12,
            Self::Float32x4 => 16,
            Self::Float32x2 => 8,
            Self::Sint16x4 => 8,
            Self::Float16x2 | Self::Sint16x2 | Self::Snorm16x2 | Self::Unorm16x2 => 4,
            Self::Unorm8x4 | Self::Uint8x4 => 4,
        }
    }
}

/// A single vertex attribute within a vertex stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Semantic name, e.g. `"Position"`, `"TexCoord"`, `"Color"`.
    pub semantic: String,
    /// Occurrence index of this semantic within the stream: 0 for the
    /// first channel, 1 for the second and so on. The second and later
    /// channels append this index to the shader input name.
    pub semantic_index: u32,
    /// Data format.
    pub format: AttributeFormat,
    /// Byte offset within a vertex element.
    pub offset: u32,
}

impl Attribute {
    /// Create a first-channel attribute.
    pub fn new(semantic: impl Into<String>, format: AttributeFormat, offset: u32) -> Self {
        Self {
            semantic: semantic.into(),
            semantic_index: 0,
            format,
            offset,
        }
    }

    /// Set the semantic occurrence index.
    pub fn with_semantic_index(mut self, index: u32) -> Self {
        self.semantic_index = index;
        self
    }

    /// The shader input name this attribute binds to: `"v" + semantic`,
    /// with the occurrence index appended from the second channel on
    /// (`vTexCoord`, `vTexCoord1`).
    pub fn shader_input_name(&self) -> String {
        if self.semantic_index == 0 {
            format!("v{}", self.semantic)
        } else {
            format!("v{}{}", self.semantic, self.semantic_index)
        }
    }
}

/// One vertex stream: raw bytes plus the attributes laid out in them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferDescription {
    /// Number of vertex elements.
    pub element_count: u32,
    /// Size in bytes of one element (the stream stride).
    pub element_size: u32,
    /// Raw vertex bytes (`element_count * element_size`).
    pub data: Vec<u8>,
    /// Attributes in element order.
    pub attributes: Vec<Attribute>,
}

impl VertexBufferDescription {
    /// Create a vertex stream description.
    pub fn new(element_count: u32, element_size: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len() as u32,
            element_count * element_size,
            "vertex data length must match element count * size"
        );
        Self {
            element_count,
            element_size,
            data,
            attributes: Vec::new(),
        }
    }

    /// Create a vertex stream from a typed element slice.
    pub fn from_typed<T: bytemuck::Pod>(elements: &[T]) -> Self {
        Self::new(
            elements.len() as u32,
            std::mem::size_of::<T>() as u32,
            bytemuck::cast_slice(elements).to_vec(),
        )
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// One index stream: raw bytes and the element width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBufferDescription {
    /// Number of indices.
    pub element_count: u32,
    /// Size in bytes of one index; only 2 and 4 are drawable.
    pub element_size: u32,
    /// Raw index bytes.
    pub data: Vec<u8>,
}

impl IndexBufferDescription {
    /// Create an index stream description.
    pub fn new(element_count: u32, element_size: u32, data: Vec<u8>) -> Self {
        Self {
            element_count,
            element_size,
            data,
        }
    }

    /// Create a 16-bit index stream.
    pub fn from_u16(indices: &[u16]) -> Self {
        Self::new(indices.len() as u32, 2, bytemuck::cast_slice(indices).to_vec())
    }

    /// Create a 32-bit index stream.
    pub fn from_u32(indices: &[u32]) -> Self {
        Self::new(indices.len() as u32, 4, bytemuck::cast_slice(indices).to_vec())
    }
}

/// The vertex and index streams identifying one mesh's geometry.
///
/// Sets live in a [`crate::mesh::MeshBufferArena`] and are addressed by
/// handle; the handle is the cache identity, so two structurally identical
/// sets inserted separately upload separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshBufferSet {
    /// Vertex streams in stream-index order.
    pub vertex_buffers: Vec<VertexBufferDescription>,
    /// Index streams in stream-index order.
    pub index_buffers: Vec<IndexBufferDescription>,
}

impl MeshBufferSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex stream.
    pub fn with_vertex_buffer(mut self, buffer: VertexBufferDescription) -> Self {
        self.vertex_buffers.push(buffer);
        self
    }

    /// Add an index stream.
    pub fn with_index_buffer(mut self, buffer: IndexBufferDescription) -> Self {
        self.index_buffers.push(buffer);
        self
    }
}

/// Width of index buffer elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices.
    Uint16,
    /// 32-bit indices.
    Uint32,
}

impl IndexFormat {
    /// Derive the index format from an index stream's element size.
    ///
    /// Anything but 2 or 4 bytes is a fatal error (unsupported asset data).
    pub fn from_element_size(size: u32) -> Result<Self, RenderError> {
        match size {
            2 => Ok(Self::Uint16),
            4 => Ok(Self::Uint32),
            other => Err(RenderError::UnsupportedIndexElementSize(other)),
        }
    }

    /// Size in bytes of one index.
    pub fn size(&self) -> u32 {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}
