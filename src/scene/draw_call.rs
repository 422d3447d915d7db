//! Draw-call assembly and per-mesh draw lists.
//!
//! Assembly turns one generic scene record plus a resolved material into a
//! fully-populated [`DrawCall`]: shader variant resolution, index/vertex
//! addressing math, default-texture fallbacks and the cached vertex layout
//! object. Completed calls land on the owning [`SceneMesh`]'s opaque or
//! blended list, which is also where render-mode switching rebuilds them.

use std::sync::Arc;

use glam::Vec4;

use crate::backend::{GpuVertexArray, PrimitiveType};
use crate::error::RenderError;
use crate::materials::Material;
use crate::mesh::{IndexFormat, MeshBufferHandle, VertexLayoutObject};
use crate::resources::RenderResources;
use crate::shader::{Shader, ShaderDefines, ShaderManager, RENDER_MODE_PREFIX};

use super::record::DrawRecord;

/// Sampler name of the tint-mask texture slot.
pub const TINT_MASK_TEXTURE: &str = "uTintMask";

/// Sampler name of the normal-map texture slot.
pub const NORMAL_MAP_TEXTURE: &str = "uNormalMap";

/// Fallback color bound when a material lacks a tint mask: solid white.
pub const TINT_MASK_FALLBACK: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Fallback color bound when a material lacks a normal map: a flat normal.
pub const NORMAL_MAP_FALLBACK: [f32; 4] = [0.5, 1.0, 0.5, 1.0];

/// The fully resolved description of one indexed draw.
#[derive(Debug, Clone)]
pub struct DrawCall {
    /// Material bound around the draw.
    pub material: Arc<Material>,
    /// Shader variant; replaced by render-mode switching.
    pub shader: Arc<Shader>,
    /// Cached layout object; rebuilt alongside the shader.
    pub layout: Arc<VertexLayoutObject>,
    /// Owning mesh buffer set.
    pub mesh: MeshBufferHandle,
    /// Vertex stream index.
    pub vertex_stream: u32,
    /// Index stream index.
    pub index_stream: u32,
    /// Primitive assembly mode.
    pub primitive: PrimitiveType,
    /// Byte offset of the first index in the index buffer.
    pub start_index_offset: u64,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Index element width.
    pub index_format: IndexFormat,
    /// Base-vertex byte offset folded into the layout key.
    pub base_vertex_offset: u32,
    /// Optional per-draw-call tint.
    pub tint: Option<Vec4>,
}

impl DrawCall {
    /// The vertex array object to draw through.
    pub fn vertex_array(&self) -> &GpuVertexArray {
        &self.layout.vertex_array
    }
}

/// The assembled draw calls of one mesh, split by pass.
pub struct SceneMesh {
    mesh: MeshBufferHandle,
    opaque: Vec<DrawCall>,
    blended: Vec<DrawCall>,
}

impl SceneMesh {
    /// Create an empty mesh over a buffer set.
    pub fn new(mesh: MeshBufferHandle) -> Self {
        Self {
            mesh,
            opaque: Vec::new(),
            blended: Vec::new(),
        }
    }

    /// The underlying buffer set.
    pub fn mesh_handle(&self) -> MeshBufferHandle {
        self.mesh
    }

    /// Draw calls of the opaque pass.
    pub fn opaque(&self) -> &[DrawCall] {
        &self.opaque
    }

    /// Draw calls of the translucent pass.
    pub fn blended(&self) -> &[DrawCall] {
        &self.blended
    }

    /// Iterate all draw calls, opaque first.
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.opaque.iter().chain(self.blended.iter())
    }

    /// Assemble one scene record into a draw call on this mesh.
    ///
    /// Overlay materials are skipped without error (the feature is
    /// intentionally unimplemented). The combined shader define set is the
    /// caller's `overrides` with the material's own derived defines
    /// applied on top; material keys win on collision.
    pub fn push_record(
        &mut self,
        record: &DrawRecord,
        material: Arc<Material>,
        overrides: &ShaderDefines,
        shaders: &mut dyn ShaderManager,
        resources: &mut RenderResources,
    ) -> Result<(), RenderError> {
        if material.is_overlay() {
            log::debug!(
                "skipping overlay material {} (not implemented)",
                material.name()
            );
            return Ok(());
        }

        let primitive = record.primitive.resolve()?;
        let defines = overrides.merged_with(&material.shader_defines());
        let shader = shaders.load_shader(material.shader_name(), &defines)?;

        let (index_format, start_index_offset, base_vertex_offset) = {
            let set = resources.meshes.get(self.mesh);
            let index_desc = &set.index_buffers[record.index_stream as usize];
            let index_format = IndexFormat::from_element_size(index_desc.element_size)?;
            let start_index_offset =
                record.start_index as u64 * index_desc.element_size as u64;
            let vertex_desc = &set.vertex_buffers[record.vertex_stream as usize];
            let base_vertex_offset = record.base_vertex * vertex_desc.element_size;
            (index_format, start_index_offset, base_vertex_offset)
        };

        if !material.has_texture(TINT_MASK_TEXTURE) {
            log::debug!("material {} lacks a tint mask; using white", material.name());
            material.set_texture(TINT_MASK_TEXTURE, resources.textures.solid(TINT_MASK_FALLBACK)?);
        }
        if !material.has_texture(NORMAL_MAP_TEXTURE) {
            log::debug!(
                "material {} lacks a normal map; using flat normal",
                material.name()
            );
            material.set_texture(NORMAL_MAP_TEXTURE, resources.textures.solid(NORMAL_MAP_FALLBACK)?);
        }

        let layout = resources.layouts.get_or_create(
            &mut resources.buffers,
            &resources.meshes,
            self.mesh,
            &shader,
            record.vertex_stream,
            record.index_stream,
            base_vertex_offset,
        )?;

        let call = DrawCall {
            material,
            shader,
            layout,
            mesh: self.mesh,
            vertex_stream: record.vertex_stream,
            index_stream: record.index_stream,
            primitive,
            start_index_offset,
            index_count: record.index_count,
            index_format,
            base_vertex_offset,
            tint: record.tint,
        };

        if call.material.is_translucent() {
            self.blended.push(call);
        } else {
            self.opaque.push(call);
        }
        Ok(())
    }

    /// Switch every draw call of this mesh to a render mode variant.
    ///
    /// Strips all `render_mode_*` defines from each call's shader, re-adds
    /// the requested mode when the shader declares support for it, then
    /// reloads the variant and rebuilds the layout object (attribute
    /// locations are program-specific). Passing `None` strips only; calling
    /// it repeatedly is idempotent.
    pub fn set_render_mode(
        &mut self,
        mode: Option<&str>,
        shaders: &mut dyn ShaderManager,
        resources: &mut RenderResources,
    ) -> Result<(), RenderError> {
        for call in self.opaque.iter_mut().chain(self.blended.iter_mut()) {
            let mut defines = call.shader.defines().clone();
            defines.remove_prefixed(RENDER_MODE_PREFIX);
            if let Some(mode) = mode {
                if call.shader.supports_render_mode(mode) {
                    defines.set(format!("{RENDER_MODE_PREFIX}{mode}"), true);
                } else {
                    log::debug!(
                        "shader {} does not support render mode {mode}",
                        call.shader.name()
                    );
                }
            }

            let shader = shaders.load_shader(call.shader.name(), &defines)?;
            call.layout = resources.layouts.get_or_create(
                &mut resources.buffers,
                &resources.meshes,
                call.mesh,
                &shader,
                call.vertex_stream,
                call.index_stream,
                call.base_vertex_offset,
            )?;
            call.shader = shader;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::{DummyBackend, GpuOp};
    use crate::materials::{MaterialFlags, ParameterizedInfo};
    use crate::mesh::{
        Attribute, AttributeFormat, IndexBufferDescription, MeshBufferSet,
        VertexBufferDescription,
    };
    use crate::scene::record::PrimitiveTypeField;
    use crate::shader::library::{ShaderSourceLoader, ShaderSourceSet, ShaderVariantLibrary};
    use rstest::rstest;

    struct StubLoader {
        modes: Vec<String>,
    }

    impl StubLoader {
        fn plain() -> Self {
            Self { modes: Vec::new() }
        }

        fn with_modes(modes: &[&str]) -> Self {
            Self {
                modes: modes.iter().map(|m| m.to_string()).collect(),
            }
        }
    }

    impl ShaderSourceLoader for StubLoader {
        fn load(&self, _name: &str) -> Result<ShaderSourceSet, RenderError> {
            Ok(ShaderSourceSet {
                vertex: String::new(),
                fragment: String::new(),
                supported_render_modes: self.modes.clone(),
            })
        }
    }

    fn test_set(index_element_size: u32) -> MeshBufferSet {
        MeshBufferSet::new()
            .with_vertex_buffer(
                VertexBufferDescription::new(4, 20, vec![0u8; 80])
                    .with_attribute(Attribute::new("Position", AttributeFormat::Float32x3, 0))
                    .with_attribute(Attribute::new("TexCoord", AttributeFormat::Float32x2, 12)),
            )
            .with_index_buffer(IndexBufferDescription::new(
                6,
                index_element_size,
                vec![0u8; (6 * index_element_size) as usize],
            ))
    }

    fn harness(
        index_element_size: u32,
        loader: StubLoader,
    ) -> (
        Arc<DummyBackend>,
        RenderResources,
        ShaderVariantLibrary<StubLoader>,
        SceneMesh,
    ) {
        let backend = Arc::new(DummyBackend::new());
        let mut resources = RenderResources::new(backend.clone());
        let handle = resources.meshes.insert(test_set(index_element_size));
        let library = ShaderVariantLibrary::new(backend.clone(), loader);
        let mesh = SceneMesh::new(handle);
        (backend, resources, library, mesh)
    }

    #[rstest]
    #[case(2, IndexFormat::Uint16)]
    #[case(4, IndexFormat::Uint32)]
    fn index_format_derives_from_element_size(
        #[case] element_size: u32,
        #[case] expected: IndexFormat,
    ) {
        let (_backend, mut resources, mut shaders, mut mesh) =
            harness(element_size, StubLoader::plain());
        let material = Arc::new(Material::fixed("wall", "model"));

        mesh.push_record(
            &DrawRecord::triangles(3, 3),
            material,
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();

        let call = &mesh.opaque()[0];
        assert_eq!(call.index_format, expected);
        assert_eq!(call.start_index_offset, 3 * element_size as u64);
    }

    #[test]
    fn odd_index_element_size_is_fatal() {
        let (_backend, mut resources, mut shaders, mut mesh) = harness(3, StubLoader::plain());
        let material = Arc::new(Material::fixed("wall", "model"));

        let err = mesh
            .push_record(
                &DrawRecord::triangles(0, 3),
                material,
                &ShaderDefines::new(),
                &mut shaders,
                &mut resources,
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedIndexElementSize(3)));
        assert!(mesh.opaque().is_empty());
    }

    #[test]
    fn unknown_primitive_type_is_fatal() {
        let (_backend, mut resources, mut shaders, mut mesh) = harness(2, StubLoader::plain());
        let material = Arc::new(Material::fixed("wall", "model"));

        let mut record = DrawRecord::triangles(0, 3);
        record.primitive = PrimitiveTypeField::Code(2);
        let err = mesh
            .push_record(&record, material, &ShaderDefines::new(), &mut shaders, &mut resources)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedPrimitiveType(_)));
    }

    #[test]
    fn base_vertex_scales_by_vertex_element_size() {
        let (_backend, mut resources, mut shaders, mut mesh) = harness(2, StubLoader::plain());
        let material = Arc::new(Material::fixed("wall", "model"));

        mesh.push_record(
            &DrawRecord::triangles(0, 3).with_base_vertex(2),
            material,
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();

        // Vertex elements are 20 bytes wide.
        assert_eq!(mesh.opaque()[0].base_vertex_offset, 40);
    }

    #[test]
    fn overlay_materials_are_skipped_entirely() {
        let (backend, mut resources, mut shaders, mut mesh) = harness(2, StubLoader::plain());
        let material = Arc::new(Material::parameterized(
            "hud",
            "model",
            ParameterizedInfo {
                flags: MaterialFlags::OVERLAY,
                ..Default::default()
            },
        ));

        mesh.push_record(
            &DrawRecord::triangles(0, 3),
            material,
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();

        assert!(mesh.opaque().is_empty());
        assert!(mesh.blended().is_empty());
        // Nothing was uploaded or compiled for the skipped record.
        assert_eq!(backend.upload_count(), 0);
    }

    #[test]
    fn missing_slot_textures_get_solid_fallbacks() {
        let (backend, mut resources, mut shaders, mut mesh) = harness(2, StubLoader::plain());
        let material = Arc::new(Material::fixed("bare", "model"));

        mesh.push_record(
            &DrawRecord::triangles(0, 3),
            material.clone(),
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();

        let ops = backend.ops();
        let texel_of = |texture: crate::backend::GpuTexture| {
            let id = texture.dummy_id().unwrap();
            ops.iter().find_map(|op| match op {
                GpuOp::CreateTexture { id: op_id, first_texel, .. } if *op_id == id => {
                    Some(*first_texel)
                }
                _ => None,
            })
        };

        let tint = material.texture(TINT_MASK_TEXTURE).unwrap();
        assert_eq!(texel_of(tint), Some([255, 255, 255, 255]));

        let normal = material.texture(NORMAL_MAP_TEXTURE).unwrap();
        assert_eq!(texel_of(normal), Some([128, 255, 128, 255]));
    }

    #[test]
    fn existing_slot_textures_are_kept() {
        let (_backend, mut resources, mut shaders, mut mesh) = harness(2, StubLoader::plain());
        let bound = crate::backend::GpuTexture::Dummy { id: 999 };
        let material =
            Arc::new(Material::fixed("painted", "model").with_texture(TINT_MASK_TEXTURE, bound));

        mesh.push_record(
            &DrawRecord::triangles(0, 3),
            material.clone(),
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();

        assert_eq!(material.texture(TINT_MASK_TEXTURE), Some(bound));
    }

    #[test]
    fn material_defines_win_over_overrides() {
        let (_backend, mut resources, mut shaders, mut mesh) = harness(2, StubLoader::plain());
        let material = Arc::new(Material::parameterized(
            "foliage",
            "model",
            ParameterizedInfo {
                int_flags: vec![("two_sided".to_string(), 0)],
                ..Default::default()
            },
        ));

        let overrides = ShaderDefines::new().with("two_sided", true).with("skinned", true);
        mesh.push_record(
            &DrawRecord::triangles(0, 3),
            material,
            &overrides,
            &mut shaders,
            &mut resources,
        )
        .unwrap();

        let defines = mesh.opaque()[0].shader.defines();
        assert_eq!(defines.get("two_sided"), Some(false));
        assert_eq!(defines.get("skinned"), Some(true));
    }

    #[test]
    fn translucent_materials_classify_to_blended() {
        let (_backend, mut resources, mut shaders, mut mesh) = harness(2, StubLoader::plain());
        let glass = Arc::new(Material::parameterized(
            "glass",
            "model",
            ParameterizedInfo {
                flags: MaterialFlags::TRANSLUCENT,
                ..Default::default()
            },
        ));
        let wall = Arc::new(Material::fixed("wall", "model"));

        mesh.push_record(
            &DrawRecord::triangles(0, 3),
            wall,
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();
        mesh.push_record(
            &DrawRecord::triangles(3, 3),
            glass,
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();

        assert_eq!(mesh.opaque().len(), 1);
        assert_eq!(mesh.blended().len(), 1);
    }

    #[test]
    fn render_mode_round_trip_restores_defines() {
        let (_backend, mut resources, mut shaders, mut mesh) =
            harness(2, StubLoader::with_modes(&["wireframe"]));
        let material = Arc::new(Material::fixed("wall", "model"));

        mesh.push_record(
            &DrawRecord::triangles(0, 3),
            material,
            &ShaderDefines::new().with("skinned", true),
            &mut shaders,
            &mut resources,
        )
        .unwrap();

        let original = mesh.opaque()[0].shader.defines().clone();
        let original_id = mesh.opaque()[0].shader.id();

        mesh.set_render_mode(Some("wireframe"), &mut shaders, &mut resources)
            .unwrap();
        let switched = &mesh.opaque()[0];
        assert_eq!(
            switched.shader.defines().get("render_mode_wireframe"),
            Some(true)
        );
        assert_ne!(switched.shader.id(), original_id);

        mesh.set_render_mode(None, &mut shaders, &mut resources).unwrap();
        let restored = &mesh.opaque()[0];
        assert_eq!(restored.shader.defines(), &original);
        assert_eq!(restored.shader.id(), original_id);

        // Stripping again is idempotent.
        mesh.set_render_mode(None, &mut shaders, &mut resources).unwrap();
        assert_eq!(mesh.opaque()[0].shader.defines(), &original);
    }

    #[test]
    fn unsupported_render_mode_changes_nothing() {
        let (_backend, mut resources, mut shaders, mut mesh) =
            harness(2, StubLoader::with_modes(&["wireframe"]));
        let material = Arc::new(Material::fixed("wall", "model"));

        mesh.push_record(
            &DrawRecord::triangles(0, 3),
            material,
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();
        let original_id = mesh.opaque()[0].shader.id();

        mesh.set_render_mode(Some("xray"), &mut shaders, &mut resources).unwrap();
        assert_eq!(mesh.opaque()[0].shader.id(), original_id);
        assert!(mesh.opaque()[0].shader.defines().is_empty());
    }

    #[test]
    fn render_mode_rebuilds_layout_for_new_program() {
        let (_backend, mut resources, mut shaders, mut mesh) =
            harness(2, StubLoader::with_modes(&["wireframe"]));
        let material = Arc::new(Material::fixed("wall", "model"));

        mesh.push_record(
            &DrawRecord::triangles(0, 3),
            material,
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .unwrap();
        let original_layout = mesh.opaque()[0].layout.clone();

        mesh.set_render_mode(Some("wireframe"), &mut shaders, &mut resources)
            .unwrap();
        let switched_layout = &mesh.opaque()[0].layout;

        // New program, new attribute locations, new layout object.
        assert!(!Arc::ptr_eq(&original_layout, switched_layout));
        assert_eq!(resources.layouts.len(), 2);
        // The underlying geometry uploaded once.
        assert_eq!(resources.buffers.len(), 1);
    }
}
