//! Generic scene draw-call records.
//!
//! A [`DrawRecord`] is one already-parsed draw-call entry from a scene
//! object: stream selectors, index addressing and an optional tint. The
//! asset reader that produces these is out of scope; this crate never
//! parses raw asset bytes.

use glam::Vec4;

use crate::backend::PrimitiveType;
use crate::error::RenderError;

/// Byte code scene records use for a triangle list.
pub const TRIANGLE_LIST_CODE: u8 = 4;

/// Primitive type as it appears in a scene record: either the enumerated
/// byte code or the string form, depending on the asset generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveTypeField {
    /// Enumerated byte code.
    Code(u8),
    /// String form, matched case-insensitively.
    Name(String),
}

impl PrimitiveTypeField {
    /// Resolve the field to a supported primitive type.
    ///
    /// Only triangle lists are supported; anything else means corrupt or
    /// unsupported asset data and fails the mesh load.
    pub fn resolve(&self) -> Result<PrimitiveType, RenderError> {
        match self {
            Self::Code(TRIANGLE_LIST_CODE) => Ok(PrimitiveType::Triangles),
            Self::Code(code) => Err(RenderError::UnsupportedPrimitiveType(code.to_string())),
            Self::Name(name) if name.eq_ignore_ascii_case("triangles") => {
                Ok(PrimitiveType::Triangles)
            }
            Self::Name(name) => Err(RenderError::UnsupportedPrimitiveType(name.clone())),
        }
    }
}

/// One generic scene draw-call record.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Declared primitive type.
    pub primitive: PrimitiveTypeField,
    /// Vertex stream index within the mesh buffer set.
    pub vertex_stream: u32,
    /// Index stream index within the mesh buffer set.
    pub index_stream: u32,
    /// First index of the range, in elements.
    pub start_index: u32,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Base vertex the indices are relative to, in elements.
    pub base_vertex: u32,
    /// Optional per-draw-call tint color.
    pub tint: Option<Vec4>,
}

impl DrawRecord {
    /// Create a triangle-list record over the given index range.
    pub fn triangles(start_index: u32, index_count: u32) -> Self {
        Self {
            primitive: PrimitiveTypeField::Code(TRIANGLE_LIST_CODE),
            vertex_stream: 0,
            index_stream: 0,
            start_index,
            index_count,
            base_vertex: 0,
            tint: None,
        }
    }

    /// Select the vertex and index streams.
    pub fn with_streams(mut self, vertex_stream: u32, index_stream: u32) -> Self {
        self.vertex_stream = vertex_stream;
        self.index_stream = index_stream;
        self
    }

    /// Set the base vertex.
    pub fn with_base_vertex(mut self, base_vertex: u32) -> Self {
        self.base_vertex = base_vertex;
        self
    }

    /// Set the tint color.
    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = Some(tint);
        self
    }
}
