//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations but provides a valid
//! implementation for exercising the renderer without GPU hardware. Every
//! call is recorded in an operation log, which is what the cache and
//! batching tests assert against (upload counts, draw order, state pairing).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use glam::{Mat4, Vec3, Vec4};

use crate::mesh::IndexFormat;

use super::{
    BackendError, BlendState, BufferKind, GpuBackend, GpuBuffer, GpuProgram, GpuTexture,
    GpuVertexArray, PrimitiveType, ProgramDescriptor, UniformLocation, VertexArrayDescriptor,
};

/// A recorded backend operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuOp {
    /// A buffer was uploaded.
    CreateBuffer { id: u64, kind: BufferKind, size: u64 },
    /// A texture was uploaded. `first_texel` holds the leading RGBA bytes.
    CreateTexture {
        id: u64,
        width: u32,
        height: u32,
        first_texel: [u8; 4],
    },
    /// A program was linked.
    CreateProgram { id: u64 },
    /// A vertex array object was built.
    CreateVertexArray { id: u64, attribute_count: usize },
    /// A program was bound.
    UseProgram { id: u64 },
    /// A texture was bound to a unit.
    BindTexture { unit: u32, id: u64 },
    /// A uniform was set, recorded by name.
    SetUniform { name: String, value: UniformValue },
    /// Depth testing was toggled.
    SetDepthTest(bool),
    /// Depth writes were toggled.
    SetDepthWrite(bool),
    /// Blending was enabled with factors, or disabled.
    SetBlend(Option<BlendState>),
    /// Backface culling was toggled.
    SetCullFace(bool),
    /// An indexed draw was issued.
    DrawIndexed {
        vertex_array: u64,
        index_count: u32,
        index_format: IndexFormat,
        start_offset: u64,
    },
}

/// Recorded value of a uniform set.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Mat4([f32; 16]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    F32(f32),
    I32(i32),
    U32(u32),
}

/// Per-program name tables for the dummy backend.
///
/// `None` means every name resolves, which is the default for programs
/// created through the trait. Tests that exercise the skip paths register
/// programs with restricted tables via
/// [`DummyBackend::create_program_with_bindings`].
#[derive(Debug, Default)]
struct DummyProgram {
    attributes: Option<Vec<String>>,
    uniforms: Option<Vec<String>>,
    attribute_slots: HashMap<String, u32>,
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    next_id: Cell<u64>,
    ops: RefCell<Vec<GpuOp>>,
    programs: RefCell<HashMap<u64, DummyProgram>>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn record(&self, op: GpuOp) {
        self.ops.borrow_mut().push(op);
    }

    /// Snapshot of the operation log.
    pub fn ops(&self) -> Vec<GpuOp> {
        self.ops.borrow().clone()
    }

    /// Clear the operation log (typically between test phases).
    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    /// Number of buffer uploads recorded so far.
    pub fn upload_count(&self) -> usize {
        self.ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, GpuOp::CreateBuffer { .. }))
            .count()
    }

    /// Recorded indexed draws, in issue order.
    pub fn draws(&self) -> Vec<GpuOp> {
        self.ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, GpuOp::DrawIndexed { .. }))
            .cloned()
            .collect()
    }

    /// Create a program that only resolves the listed attribute and uniform
    /// names. Everything else returns "not found", exercising the silent
    /// skip paths.
    pub fn create_program_with_bindings(
        &self,
        attributes: &[&str],
        uniforms: &[&str],
    ) -> GpuProgram {
        let id = self.mint_id();
        self.programs.borrow_mut().insert(
            id,
            DummyProgram {
                attributes: Some(attributes.iter().map(|s| s.to_string()).collect()),
                uniforms: Some(uniforms.iter().map(|s| s.to_string()).collect()),
                attribute_slots: HashMap::new(),
            },
        );
        self.record(GpuOp::CreateProgram { id });
        GpuProgram::Dummy { id }
    }

    fn program_id(program: &GpuProgram) -> u64 {
        match program {
            GpuProgram::Dummy { id } => *id,
            #[cfg(feature = "glow-backend")]
            GpuProgram::Glow(_) => panic!("glow program handed to dummy backend"),
        }
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> Result<GpuBuffer, BackendError> {
        let id = self.mint_id();
        log::trace!("DummyBackend: creating {kind:?} buffer (size: {})", data.len());
        self.record(GpuOp::CreateBuffer {
            id,
            kind,
            size: data.len() as u64,
        });
        Ok(GpuBuffer::Dummy { id })
    }

    fn buffer_size(&self, buffer: &GpuBuffer) -> u64 {
        match buffer {
            GpuBuffer::Dummy { id } => self
                .ops
                .borrow()
                .iter()
                .find_map(|op| match op {
                    GpuOp::CreateBuffer { id: op_id, size, .. } if op_id == id => Some(*size),
                    _ => None,
                })
                .unwrap_or(0),
            #[cfg(feature = "glow-backend")]
            GpuBuffer::Glow(_) => panic!("glow buffer handed to dummy backend"),
        }
    }

    fn create_texture_rgba8(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<GpuTexture, BackendError> {
        let id = self.mint_id();
        let mut first_texel = [0u8; 4];
        for (dst, src) in first_texel.iter_mut().zip(pixels.iter()) {
            *dst = *src;
        }
        log::trace!("DummyBackend: creating texture {width}x{height}");
        self.record(GpuOp::CreateTexture {
            id,
            width,
            height,
            first_texel,
        });
        Ok(GpuTexture::Dummy { id })
    }

    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<GpuProgram, BackendError> {
        let id = self.mint_id();
        log::trace!("DummyBackend: linking program {:?}", descriptor.label);
        self.programs.borrow_mut().insert(id, DummyProgram::default());
        self.record(GpuOp::CreateProgram { id });
        Ok(GpuProgram::Dummy { id })
    }

    fn attribute_location(&self, program: &GpuProgram, name: &str) -> Option<u32> {
        let id = Self::program_id(program);
        let mut programs = self.programs.borrow_mut();
        let entry = programs.get_mut(&id)?;
        if let Some(known) = &entry.attributes {
            if !known.iter().any(|n| n == name) {
                return None;
            }
        }
        let next = entry.attribute_slots.len() as u32;
        Some(*entry.attribute_slots.entry(name.to_string()).or_insert(next))
    }

    fn uniform_location(&self, program: &GpuProgram, name: &str) -> Option<UniformLocation> {
        let id = Self::program_id(program);
        let programs = self.programs.borrow();
        let entry = programs.get(&id)?;
        if let Some(known) = &entry.uniforms {
            if !known.iter().any(|n| n == name) {
                return None;
            }
        }
        Some(UniformLocation::Dummy {
            name: name.to_string(),
        })
    }

    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<GpuVertexArray, BackendError> {
        let id = self.mint_id();
        log::trace!(
            "DummyBackend: creating vertex array {:?} ({} attributes)",
            descriptor.label,
            descriptor.attributes.len()
        );
        self.record(GpuOp::CreateVertexArray {
            id,
            attribute_count: descriptor.attributes.len(),
        });
        Ok(GpuVertexArray::Dummy { id })
    }

    fn use_program(&self, program: &GpuProgram) {
        self.record(GpuOp::UseProgram {
            id: Self::program_id(program),
        });
    }

    fn bind_texture(&self, unit: u32, texture: &GpuTexture) {
        let id = match texture {
            GpuTexture::Dummy { id } => *id,
            #[cfg(feature = "glow-backend")]
            GpuTexture::Glow(_) => panic!("glow texture handed to dummy backend"),
        };
        self.record(GpuOp::BindTexture { unit, id });
    }

    fn set_uniform_mat4(&self, location: &UniformLocation, value: &Mat4) {
        self.record_uniform(location, UniformValue::Mat4(value.to_cols_array()));
    }

    fn set_uniform_vec3(&self, location: &UniformLocation, value: Vec3) {
        self.record_uniform(location, UniformValue::Vec3(value.to_array()));
    }

    fn set_uniform_vec4(&self, location: &UniformLocation, value: Vec4) {
        self.record_uniform(location, UniformValue::Vec4(value.to_array()));
    }

    fn set_uniform_f32(&self, location: &UniformLocation, value: f32) {
        self.record_uniform(location, UniformValue::F32(value));
    }

    fn set_uniform_i32(&self, location: &UniformLocation, value: i32) {
        self.record_uniform(location, UniformValue::I32(value));
    }

    fn set_uniform_u32(&self, location: &UniformLocation, value: u32) {
        self.record_uniform(location, UniformValue::U32(value));
    }

    fn set_depth_test(&self, enabled: bool) {
        self.record(GpuOp::SetDepthTest(enabled));
    }

    fn set_depth_write(&self, enabled: bool) {
        self.record(GpuOp::SetDepthWrite(enabled));
    }

    fn set_blend(&self, blend: Option<BlendState>) {
        self.record(GpuOp::SetBlend(blend));
    }

    fn set_cull_face(&self, enabled: bool) {
        self.record(GpuOp::SetCullFace(enabled));
    }

    fn draw_indexed(
        &self,
        vertex_array: &GpuVertexArray,
        _primitive: PrimitiveType,
        index_count: u32,
        index_format: IndexFormat,
        start_offset: u64,
    ) {
        let id = match vertex_array {
            GpuVertexArray::Dummy { id } => *id,
            #[cfg(feature = "glow-backend")]
            GpuVertexArray::Glow(_) => panic!("glow vertex array handed to dummy backend"),
        };
        self.record(GpuOp::DrawIndexed {
            vertex_array: id,
            index_count,
            index_format,
            start_offset,
        });
    }
}

impl DummyBackend {
    fn record_uniform(&self, location: &UniformLocation, value: UniformValue) {
        let name = match location {
            UniformLocation::Dummy { name } => name.clone(),
            #[cfg(feature = "glow-backend")]
            UniformLocation::Glow(_) => panic!("glow uniform location handed to dummy backend"),
        };
        self.record(GpuOp::SetUniform { name, value });
    }
}
