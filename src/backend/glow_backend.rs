//! OpenGL backend using glow.
//!
//! The backend adopts a caller-created [`glow::Context`]; context and window
//! management stay with the embedder. All calls must happen on the thread
//! owning that context.

use glam::{Mat4, Vec3, Vec4};
use glow::HasContext;

use crate::mesh::IndexFormat;

use super::{
    AttributeComponentType, BackendError, BlendFactor, BlendState, BufferKind, GpuBackend,
    GpuBuffer, GpuProgram, GpuTexture, GpuVertexArray, PrimitiveType, ProgramDescriptor,
    UniformLocation, VertexArrayDescriptor,
};

/// OpenGL backend.
pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// Wrap an existing OpenGL context.
    pub fn new(gl: glow::Context) -> Self {
        log::info!("Using OpenGL backend (glow)");
        Self { gl }
    }

    /// Access the underlying context.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn native_buffer(buffer: &GpuBuffer) -> glow::Buffer {
        match buffer {
            GpuBuffer::Glow(buffer) => *buffer,
            #[cfg(feature = "dummy")]
            GpuBuffer::Dummy { .. } => panic!("dummy buffer handed to glow backend"),
        }
    }

    fn native_program(program: &GpuProgram) -> glow::Program {
        match program {
            GpuProgram::Glow(program) => *program,
            #[cfg(feature = "dummy")]
            GpuProgram::Dummy { .. } => panic!("dummy program handed to glow backend"),
        }
    }

    fn native_location(location: &UniformLocation) -> glow::UniformLocation {
        match location {
            UniformLocation::Glow(location) => location.clone(),
            #[cfg(feature = "dummy")]
            UniformLocation::Dummy { .. } => {
                panic!("dummy uniform location handed to glow backend")
            }
        }
    }

    fn compile_stage(&self, ty: u32, source: &str) -> Result<glow::Shader, BackendError> {
        unsafe {
            let shader = self
                .gl
                .create_shader(ty)
                .map_err(BackendError::ResourceCreationFailed)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let info = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(BackendError::ShaderCompilationFailed(info));
            }
            Ok(shader)
        }
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
    }
}

fn component_type(ty: AttributeComponentType) -> u32 {
    match ty {
        AttributeComponentType::Float32 => glow::FLOAT,
        AttributeComponentType::Float16 => glow::HALF_FLOAT,
        AttributeComponentType::Uint8 => glow::UNSIGNED_BYTE,
        AttributeComponentType::Sint16 => glow::SHORT,
        AttributeComponentType::Uint16 => glow::UNSIGNED_SHORT,
    }
}

impl GpuBackend for GlowBackend {
    fn name(&self) -> &'static str {
        "OpenGL (glow)"
    }

    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> Result<GpuBuffer, BackendError> {
        let target = match kind {
            BufferKind::Vertex => glow::ARRAY_BUFFER,
            BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
        };
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(BackendError::ResourceCreationFailed)?;
            // Bind outside of any vertex array so element buffers don't
            // disturb VAO state.
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
            self.gl.bind_buffer(target, None);
            Ok(GpuBuffer::Glow(buffer))
        }
    }

    fn buffer_size(&self, buffer: &GpuBuffer) -> u64 {
        let buffer = Self::native_buffer(buffer);
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            let size = self
                .gl
                .get_buffer_parameter_i32(glow::ARRAY_BUFFER, glow::BUFFER_SIZE);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            size as u64
        }
    }

    fn create_texture_rgba8(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<GpuTexture, BackendError> {
        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(BackendError::ResourceCreationFailed)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_BASE_LEVEL, 0);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAX_LEVEL, 0);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(GpuTexture::Glow(texture))
        }
    }

    fn create_program(&self, descriptor: &ProgramDescriptor) -> Result<GpuProgram, BackendError> {
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(BackendError::ResourceCreationFailed)?;
            let vert = self.compile_stage(glow::VERTEX_SHADER, descriptor.vertex_source)?;
            let frag = match self.compile_stage(glow::FRAGMENT_SHADER, descriptor.fragment_source)
            {
                Ok(frag) => frag,
                Err(err) => {
                    self.gl.delete_shader(vert);
                    self.gl.delete_program(program);
                    return Err(err);
                }
            };

            self.gl.attach_shader(program, vert);
            self.gl.attach_shader(program, frag);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);
            let info = self.gl.get_program_info_log(program);
            self.gl.detach_shader(program, vert);
            self.gl.detach_shader(program, frag);
            self.gl.delete_shader(vert);
            self.gl.delete_shader(frag);
            if !linked {
                self.gl.delete_program(program);
                log::error!("program {:?} failed to link: {info}", descriptor.label);
                return Err(BackendError::ProgramLinkFailed(info));
            }
            Ok(GpuProgram::Glow(program))
        }
    }

    fn attribute_location(&self, program: &GpuProgram, name: &str) -> Option<u32> {
        let program = Self::native_program(program);
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(&self, program: &GpuProgram, name: &str) -> Option<UniformLocation> {
        let program = Self::native_program(program);
        unsafe {
            self.gl
                .get_uniform_location(program, name)
                .map(UniformLocation::Glow)
        }
    }

    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<GpuVertexArray, BackendError> {
        let vertex_buffer = Self::native_buffer(descriptor.vertex_buffer);
        let index_buffer = Self::native_buffer(descriptor.index_buffer);
        unsafe {
            let vao = self
                .gl
                .create_vertex_array()
                .map_err(BackendError::ResourceCreationFailed)?;
            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            for attribute in descriptor.attributes {
                self.gl.enable_vertex_attrib_array(attribute.location);
                let ty = component_type(attribute.component_type);
                if attribute.integer {
                    self.gl.vertex_attrib_pointer_i32(
                        attribute.location,
                        attribute.components as i32,
                        ty,
                        descriptor.stride as i32,
                        attribute.offset as i32,
                    );
                } else {
                    self.gl.vertex_attrib_pointer_f32(
                        attribute.location,
                        attribute.components as i32,
                        ty,
                        attribute.normalized,
                        descriptor.stride as i32,
                        attribute.offset as i32,
                    );
                }
            }
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
            Ok(GpuVertexArray::Glow(vao))
        }
    }

    fn use_program(&self, program: &GpuProgram) {
        let program = Self::native_program(program);
        unsafe {
            self.gl.use_program(Some(program));
        }
    }

    fn bind_texture(&self, unit: u32, texture: &GpuTexture) {
        let texture = match texture {
            GpuTexture::Glow(texture) => *texture,
            #[cfg(feature = "dummy")]
            GpuTexture::Dummy { .. } => panic!("dummy texture handed to glow backend"),
        };
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        }
    }

    fn set_uniform_mat4(&self, location: &UniformLocation, value: &Mat4) {
        let location = Self::native_location(location);
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&location), false, &value.to_cols_array());
        }
    }

    fn set_uniform_vec3(&self, location: &UniformLocation, value: Vec3) {
        let location = Self::native_location(location);
        unsafe {
            self.gl
                .uniform_3_f32(Some(&location), value.x, value.y, value.z);
        }
    }

    fn set_uniform_vec4(&self, location: &UniformLocation, value: Vec4) {
        let location = Self::native_location(location);
        unsafe {
            self.gl
                .uniform_4_f32(Some(&location), value.x, value.y, value.z, value.w);
        }
    }

    fn set_uniform_f32(&self, location: &UniformLocation, value: f32) {
        let location = Self::native_location(location);
        unsafe {
            self.gl.uniform_1_f32(Some(&location), value);
        }
    }

    fn set_uniform_i32(&self, location: &UniformLocation, value: i32) {
        let location = Self::native_location(location);
        unsafe {
            self.gl.uniform_1_i32(Some(&location), value);
        }
    }

    fn set_uniform_u32(&self, location: &UniformLocation, value: u32) {
        let location = Self::native_location(location);
        unsafe {
            self.gl.uniform_1_u32(Some(&location), value);
        }
    }

    fn set_depth_test(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn set_depth_write(&self, enabled: bool) {
        unsafe {
            self.gl.depth_mask(enabled);
        }
    }

    fn set_blend(&self, blend: Option<BlendState>) {
        unsafe {
            match blend {
                Some(state) => {
                    self.gl.enable(glow::BLEND);
                    self.gl
                        .blend_func(blend_factor(state.src), blend_factor(state.dst));
                }
                None => self.gl.disable(glow::BLEND),
            }
        }
    }

    fn set_cull_face(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::CULL_FACE);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
        }
    }

    fn draw_indexed(
        &self,
        vertex_array: &GpuVertexArray,
        primitive: PrimitiveType,
        index_count: u32,
        index_format: IndexFormat,
        start_offset: u64,
    ) {
        let vao = match vertex_array {
            GpuVertexArray::Glow(vao) => *vao,
            #[cfg(feature = "dummy")]
            GpuVertexArray::Dummy { .. } => panic!("dummy vertex array handed to glow backend"),
        };
        let mode = match primitive {
            PrimitiveType::Triangles => glow::TRIANGLES,
        };
        let element_type = match index_format {
            IndexFormat::Uint16 => glow::UNSIGNED_SHORT,
            IndexFormat::Uint32 => glow::UNSIGNED_INT,
        };
        unsafe {
            self.gl.bind_vertex_array(Some(vao));
            self.gl
                .draw_elements(mode, index_count as i32, element_type, start_offset as i32);
            self.gl.bind_vertex_array(None);
        }
    }
}
