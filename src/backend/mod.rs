//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the graphics device,
//! allowing the renderer to work with different GPU APIs.
//!
//! # Available Backends
//!
//! - `dummy` (default): No-op recording backend for testing and development
//! - `glow-backend`: OpenGL backend using glow
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait, which provides:
//! - Buffer and texture upload
//! - Program compilation and name-based attribute/uniform location lookup
//! - Vertex array construction
//! - Render state toggles and indexed draws
//!
//! The renderer is single-threaded by design: every cache lookup and draw
//! executes on the thread owning the device context, so the trait carries no
//! `Send`/`Sync` bounds.

#[cfg(feature = "glow-backend")]
pub mod glow_backend;

#[cfg(feature = "dummy")]
pub mod dummy;

mod error;

pub use error::BackendError;

use glam::{Mat4, Vec3, Vec4};

use crate::mesh::IndexFormat;

/// Handle to a GPU buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuBuffer {
    /// Dummy backend (no GPU allocation).
    #[cfg(feature = "dummy")]
    Dummy { id: u64 },
    /// glow backend buffer.
    #[cfg(feature = "glow-backend")]
    Glow(glow::Buffer),
}

/// Handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuTexture {
    /// Dummy backend (no GPU allocation).
    #[cfg(feature = "dummy")]
    Dummy { id: u64 },
    /// glow backend texture.
    #[cfg(feature = "glow-backend")]
    Glow(glow::Texture),
}

impl GpuTexture {
    /// The dummy id of this texture, if it belongs to the dummy backend.
    #[cfg(feature = "dummy")]
    pub fn dummy_id(&self) -> Option<u64> {
        match self {
            Self::Dummy { id } => Some(*id),
            #[cfg(feature = "glow-backend")]
            Self::Glow(_) => None,
        }
    }
}

/// Handle to a linked GPU shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuProgram {
    /// Dummy backend program.
    #[cfg(feature = "dummy")]
    Dummy { id: u64 },
    /// glow backend program.
    #[cfg(feature = "glow-backend")]
    Glow(glow::Program),
}

/// Handle to a GPU vertex array (attribute binding) object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuVertexArray {
    /// Dummy backend vertex array.
    #[cfg(feature = "dummy")]
    Dummy { id: u64 },
    /// glow backend vertex array.
    #[cfg(feature = "glow-backend")]
    Glow(glow::VertexArray),
}

impl GpuVertexArray {
    /// The dummy id of this vertex array, if it belongs to the dummy backend.
    #[cfg(feature = "dummy")]
    pub fn dummy_id(&self) -> Option<u64> {
        match self {
            Self::Dummy { id } => Some(*id),
            #[cfg(feature = "glow-backend")]
            Self::Glow(_) => None,
        }
    }
}

/// Resolved location of a uniform within a linked program.
///
/// `None` from [`GpuBackend::uniform_location`] means the program does not
/// use that input; callers skip the set rather than treating it as an error.
#[derive(Debug, Clone)]
pub enum UniformLocation {
    /// Dummy backend location. Carries the uniform name so the recording
    /// backend can log sets by name.
    #[cfg(feature = "dummy")]
    Dummy { name: String },
    /// glow backend location.
    #[cfg(feature = "glow-backend")]
    Glow(glow::UniformLocation),
}

/// What a buffer will be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Vertex data.
    Vertex,
    /// Index data.
    Index,
}

/// Primitive assembly mode for draws.
///
/// Scene records only ever declare triangle lists; anything else is rejected
/// during draw-call assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Independent triangles.
    Triangles,
}

/// Blend factor for the fixed-function blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// 0.0
    Zero,
    /// 1.0
    One,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
}

/// Source/destination blend factor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Source factor.
    pub src: BlendFactor,
    /// Destination factor.
    pub dst: BlendFactor,
}

impl BlendState {
    /// Standard alpha blending (src-alpha over one-minus-src-alpha).
    pub fn alpha() -> Self {
        Self {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::OneMinusSrcAlpha,
        }
    }

    /// Additive blending (src-alpha onto one).
    pub fn additive() -> Self {
        Self {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::One,
        }
    }
}

/// Component type of a vertex attribute binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeComponentType {
    /// 32-bit float.
    Float32,
    /// 16-bit float.
    Float16,
    /// Unsigned byte.
    Uint8,
    /// Signed 16-bit integer.
    Sint16,
    /// Unsigned 16-bit integer.
    Uint16,
}

/// One enabled attribute within a vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeBinding {
    /// Attribute location resolved against the program.
    pub location: u32,
    /// Number of components (1-4).
    pub components: u8,
    /// Component type.
    pub component_type: AttributeComponentType,
    /// Whether integer data is normalized to [0,1] / [-1,1].
    pub normalized: bool,
    /// Whether the attribute is bound as an integer input (no conversion).
    pub integer: bool,
    /// Byte offset of the attribute from the start of a vertex element,
    /// plus the draw call's base-vertex byte offset.
    pub offset: u32,
}

/// Descriptor for creating a vertex array object.
#[derive(Debug, Clone, Copy)]
pub struct VertexArrayDescriptor<'a> {
    /// Debug label.
    pub label: Option<&'a str>,
    /// The vertex buffer all attributes read from.
    pub vertex_buffer: &'a GpuBuffer,
    /// The index buffer bound into the object.
    pub index_buffer: &'a GpuBuffer,
    /// Stride in bytes between consecutive vertex elements.
    pub stride: u32,
    /// The enabled attributes.
    pub attributes: &'a [VertexAttributeBinding],
}

/// Descriptor for compiling and linking a program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDescriptor<'a> {
    /// Debug label (usually the shader name).
    pub label: &'a str,
    /// Vertex stage source.
    pub vertex_source: &'a str,
    /// Fragment stage source.
    pub fragment_source: &'a str,
}

/// GPU backend trait abstracting the graphics device.
pub trait GpuBackend {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Upload a raw byte buffer to the GPU.
    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> Result<GpuBuffer, BackendError>;

    /// The allocation size the device reports for a buffer.
    fn buffer_size(&self, buffer: &GpuBuffer) -> u64;

    /// Upload an RGBA8 texture.
    fn create_texture_rgba8(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<GpuTexture, BackendError>;

    /// Compile and link a program from vertex and fragment sources.
    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<GpuProgram, BackendError>;

    /// Resolve a vertex attribute location by name, if the program uses it.
    fn attribute_location(&self, program: &GpuProgram, name: &str) -> Option<u32>;

    /// Resolve a uniform location by name, if the program uses it.
    fn uniform_location(&self, program: &GpuProgram, name: &str) -> Option<UniformLocation>;

    /// Build a vertex array object binding buffers and attributes together.
    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<GpuVertexArray, BackendError>;

    /// Bind a program for subsequent uniform sets and draws.
    fn use_program(&self, program: &GpuProgram);

    /// Bind a texture to a texture unit.
    fn bind_texture(&self, unit: u32, texture: &GpuTexture);

    /// Set a 4x4 matrix uniform.
    fn set_uniform_mat4(&self, location: &UniformLocation, value: &Mat4);

    /// Set a vec3 uniform.
    fn set_uniform_vec3(&self, location: &UniformLocation, value: Vec3);

    /// Set a vec4 uniform.
    fn set_uniform_vec4(&self, location: &UniformLocation, value: Vec4);

    /// Set a float uniform.
    fn set_uniform_f32(&self, location: &UniformLocation, value: f32);

    /// Set a signed integer uniform (also used for sampler units).
    fn set_uniform_i32(&self, location: &UniformLocation, value: i32);

    /// Set an unsigned integer uniform.
    fn set_uniform_u32(&self, location: &UniformLocation, value: u32);

    /// Enable or disable depth testing.
    fn set_depth_test(&self, enabled: bool);

    /// Enable or disable depth writes.
    fn set_depth_write(&self, enabled: bool);

    /// Enable blending with the given factors, or disable it.
    fn set_blend(&self, blend: Option<BlendState>);

    /// Enable or disable backface culling.
    fn set_cull_face(&self, enabled: bool);

    /// Issue an indexed draw through a vertex array object.
    ///
    /// `start_offset` is a byte offset into the bound index buffer.
    fn draw_indexed(
        &self,
        vertex_array: &GpuVertexArray,
        primitive: PrimitiveType,
        index_count: u32,
        index_format: IndexFormat,
        start_offset: u64,
    );
}
