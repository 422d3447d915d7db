//! Two-phase batched rendering.
//!
//! The batch renderer is the single per-frame entry point. It consumes the
//! frame's [`BatchRequest`]s plus a [`RenderContext`] and issues draws in
//! two phases:
//!
//! Requests route to a phase by their material: translucent materials go
//! to the translucent phase, everything else to the opaque phase.
//!
//! - **Opaque**: requests group by shader, then by material, so programs
//!   bind once per group and material state switches once per sub-group.
//! - **Translucent**: requests sort by strictly descending camera distance
//!   and draw one at a time. Grouping is structurally disabled here;
//!   blending correctness needs back-to-front ordering, not per-material
//!   batching.
//!
//! Depth testing is enabled for the whole call and disabled on return.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Vec4};

use crate::backend::{GpuBackend, GpuTexture};
use crate::materials::MaterialBinding;
use crate::mesh::MeshBufferHandle;
use crate::shader::Shader;

use super::camera::Camera;
use super::draw_call::DrawCall;

/// Texture unit reserved for the per-draw animation texture. Material
/// textures start above it.
pub const ANIMATION_TEXTURE_UNIT: u32 = 0;

/// Per-group uniform names, looked up fresh each frame.
pub const UNIFORM_VIEW_PROJECTION: &str = "uViewProjection";
/// Eye position uniform (currently the camera position).
pub const UNIFORM_EYE_POSITION: &str = "uEyePosition";
/// Light position uniform (currently also the camera position).
pub const UNIFORM_LIGHT_POSITION: &str = "uLightPosition";

/// Per-draw uniform names.
pub const UNIFORM_MODEL: &str = "uModel";
/// Scene-node id of the request.
pub const UNIFORM_NODE_ID: &str = "uNodeId";
/// Mesh id of the request.
pub const UNIFORM_MESH_ID: &str = "uMeshId";
/// Animation time in seconds.
pub const UNIFORM_ANIM_TIME: &str = "uAnimTime";
/// Sampler for the animation texture on [`ANIMATION_TEXTURE_UNIT`].
pub const UNIFORM_ANIM_TEXTURE: &str = "uAnimTexture";
/// Whether an animation texture is bound this draw.
pub const UNIFORM_HAS_ANIM_TEXTURE: &str = "uHasAnimTexture";
/// Draw-call tint color.
pub const UNIFORM_TINT_COLOR: &str = "uTintColor";
/// Scene-object tint color.
pub const UNIFORM_OBJECT_TINT: &str = "uObjectTint";

/// Which pass(es) a render call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    /// Only the opaque phase.
    Opaque,
    /// Only the translucent phase.
    Translucent,
    /// Both phases, opaque first.
    Both,
}

impl RenderPass {
    fn includes_opaque(self) -> bool {
        matches!(self, Self::Opaque | Self::Both)
    }

    fn includes_translucent(self) -> bool {
        matches!(self, Self::Translucent | Self::Both)
    }
}

/// Per-frame context for a render call.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Camera the frame renders from.
    pub camera: &'a Camera,
    /// Pass selection.
    pub pass: RenderPass,
    /// When set, every request renders through this shader in one group.
    pub shader_override: Option<&'a Arc<Shader>>,
    /// Whether tools materials are visible this frame.
    pub debug_visibility: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a context rendering both passes with no override.
    pub fn new(camera: &'a Camera) -> Self {
        Self {
            camera,
            pass: RenderPass::Both,
            shader_override: None,
            debug_visibility: false,
        }
    }

    /// Select the passes to run.
    pub fn with_pass(mut self, pass: RenderPass) -> Self {
        self.pass = pass;
        self
    }

    /// Force every request through one shader.
    pub fn with_shader_override(mut self, shader: &'a Arc<Shader>) -> Self {
        self.shader_override = Some(shader);
        self
    }

    /// Show tools materials.
    pub fn with_debug_visibility(mut self, visible: bool) -> Self {
        self.debug_visibility = visible;
        self
    }
}

/// One draw request for the current frame.
///
/// Requests are ephemeral: the scene driver builds them fresh each frame
/// around the mesh-owned draw calls and discards them afterwards.
#[derive(Clone, Copy)]
pub struct BatchRequest<'a> {
    /// The assembled draw call.
    pub draw_call: &'a DrawCall,
    /// World transform of the drawn node.
    pub world: Mat4,
    /// Scene-node id.
    pub node_id: u32,
    /// Mesh id of the owning mesh.
    pub mesh_id: u32,
    /// Distance from the camera, the translucency sort key.
    pub distance: f32,
    /// Animation time in seconds.
    pub anim_time: f32,
    /// Animation texture for this draw, bound to the reserved unit.
    pub anim_texture: Option<&'a GpuTexture>,
    /// Scene-object tint.
    pub tint: Option<Vec4>,
}

impl<'a> BatchRequest<'a> {
    /// Create a request with identity transform and no animation state.
    pub fn new(draw_call: &'a DrawCall) -> Self {
        Self {
            draw_call,
            world: Mat4::IDENTITY,
            node_id: 0,
            mesh_id: 0,
            distance: 0.0,
            anim_time: 0.0,
            anim_texture: None,
            tint: None,
        }
    }

    /// Set the world transform.
    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    /// Set the node and mesh ids.
    pub fn with_ids(mut self, node_id: u32, mesh_id: u32) -> Self {
        self.node_id = node_id;
        self.mesh_id = mesh_id;
        self
    }

    /// Set the camera distance.
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    /// Set the animation state.
    pub fn with_animation(mut self, time: f32, texture: Option<&'a GpuTexture>) -> Self {
        self.anim_time = time;
        self.anim_texture = texture;
        self
    }

    /// Set the scene-object tint.
    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = Some(tint);
        self
    }

    /// The mesh buffer set this request draws from.
    pub fn mesh_handle(&self) -> MeshBufferHandle {
        self.draw_call.mesh
    }
}

/// Issues the frame's draw requests in opaque and translucent phases.
pub struct BatchRenderer {
    backend: Arc<dyn GpuBackend>,
    translucent_order: Vec<usize>,
}

impl BatchRenderer {
    /// Create a renderer on a backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            backend,
            translucent_order: Vec::new(),
        }
    }

    /// Render the frame's requests.
    ///
    /// Enables depth testing for the whole call and disables it on return.
    pub fn render(&mut self, requests: &[BatchRequest], context: &RenderContext) {
        self.backend.set_depth_test(true);
        if context.pass.includes_opaque() {
            self.render_opaque(requests, context);
        }
        if context.pass.includes_translucent() {
            self.render_translucent(requests, context);
        }
        self.backend.set_depth_test(false);
    }

    fn render_opaque(&self, requests: &[BatchRequest], context: &RenderContext) {
        for group in shader_groups(requests, context.shader_override) {
            let shader = group.shader;
            self.backend.use_program(shader.program());
            self.set_group_uniforms(shader, context.camera);

            for sub_group in material_sub_groups(requests, &group.requests) {
                let material = &requests[sub_group[0]].draw_call.material;
                if material.is_tools() && !context.debug_visibility {
                    log::trace!("skipping tools material {}", material.name());
                    continue;
                }

                let _binding = MaterialBinding::bind(&*self.backend, material, shader);
                for &index in &sub_group {
                    self.draw(&requests[index], shader);
                }
            }
        }
    }

    fn render_translucent(&mut self, requests: &[BatchRequest], context: &RenderContext) {
        self.translucent_order.clear();
        self.translucent_order.extend(
            requests
                .iter()
                .enumerate()
                .filter(|(_, request)| request.draw_call.material.is_translucent())
                .map(|(index, _)| index),
        );
        self.translucent_order
            .sort_by(|a, b| requests[*b].distance.total_cmp(&requests[*a].distance));

        // Back to front, one request at a time. The group machinery is
        // deliberately absent here.
        for &index in &self.translucent_order {
            let request = &requests[index];
            let material = &request.draw_call.material;
            if material.is_tools() && !context.debug_visibility {
                continue;
            }

            let shader = context.shader_override.unwrap_or(&request.draw_call.shader);
            self.backend.use_program(shader.program());
            self.set_group_uniforms(shader, context.camera);

            let _binding = MaterialBinding::bind(&*self.backend, material, shader);
            self.draw(request, shader);
        }
    }

    fn set_group_uniforms(&self, shader: &Shader, camera: &Camera) {
        let backend = &*self.backend;
        if let Some(location) = shader.uniform_location(backend, UNIFORM_VIEW_PROJECTION) {
            backend.set_uniform_mat4(&location, &camera.view_projection());
        }
        // Eye and light both track the camera for now.
        if let Some(location) = shader.uniform_location(backend, UNIFORM_EYE_POSITION) {
            backend.set_uniform_vec3(&location, camera.position);
        }
        if let Some(location) = shader.uniform_location(backend, UNIFORM_LIGHT_POSITION) {
            backend.set_uniform_vec3(&location, camera.position);
        }
    }

    fn draw(&self, request: &BatchRequest, shader: &Shader) {
        let backend = &*self.backend;
        let call = request.draw_call;

        if let Some(location) = shader.uniform_location(backend, UNIFORM_MODEL) {
            backend.set_uniform_mat4(&location, &request.world);
        }
        if let Some(location) = shader.uniform_location(backend, UNIFORM_NODE_ID) {
            backend.set_uniform_u32(&location, request.node_id);
        }
        if let Some(location) = shader.uniform_location(backend, UNIFORM_MESH_ID) {
            backend.set_uniform_u32(&location, request.mesh_id);
        }
        if let Some(location) = shader.uniform_location(backend, UNIFORM_ANIM_TIME) {
            backend.set_uniform_f32(&location, request.anim_time);
        }

        match request.anim_texture {
            Some(texture) => {
                if let Some(location) = shader.uniform_location(backend, UNIFORM_ANIM_TEXTURE) {
                    backend.bind_texture(ANIMATION_TEXTURE_UNIT, texture);
                    backend.set_uniform_i32(&location, ANIMATION_TEXTURE_UNIT as i32);
                }
                if let Some(location) = shader.uniform_location(backend, UNIFORM_HAS_ANIM_TEXTURE)
                {
                    backend.set_uniform_i32(&location, 1);
                }
            }
            None => {
                if let Some(location) = shader.uniform_location(backend, UNIFORM_HAS_ANIM_TEXTURE)
                {
                    backend.set_uniform_i32(&location, 0);
                }
            }
        }

        if let Some(location) = shader.uniform_location(backend, UNIFORM_TINT_COLOR) {
            backend.set_uniform_vec4(&location, call.tint.unwrap_or(Vec4::ONE));
        }
        if let Some(location) = shader.uniform_location(backend, UNIFORM_OBJECT_TINT) {
            backend.set_uniform_vec4(&location, request.tint.unwrap_or(Vec4::ONE));
        }

        backend.draw_indexed(
            call.vertex_array(),
            call.primitive,
            call.index_count,
            call.index_format,
            call.start_index_offset,
        );
    }
}

struct ShaderGroup<'a> {
    shader: &'a Arc<Shader>,
    requests: Vec<usize>,
}

/// Group opaque request indices by shader variant, preserving first-seen
/// order. Translucent requests belong to the other phase and are left out.
/// A shader override collapses everything into one group.
fn shader_groups<'a>(
    requests: &'a [BatchRequest],
    shader_override: Option<&'a Arc<Shader>>,
) -> Vec<ShaderGroup<'a>> {
    let opaque = requests
        .iter()
        .enumerate()
        .filter(|(_, request)| !request.draw_call.material.is_translucent());

    if let Some(shader) = shader_override {
        let indices: Vec<usize> = opaque.map(|(index, _)| index).collect();
        if indices.is_empty() {
            return Vec::new();
        }
        return vec![ShaderGroup {
            shader,
            requests: indices,
        }];
    }

    let mut groups: Vec<ShaderGroup> = Vec::new();
    let mut by_id: HashMap<u64, usize> = HashMap::new();
    for (index, request) in opaque {
        let shader = &request.draw_call.shader;
        let slot = *by_id.entry(shader.id().raw()).or_insert_with(|| {
            groups.push(ShaderGroup {
                shader,
                requests: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].requests.push(index);
    }
    groups
}

/// Sub-group a shader group's request indices by material identity,
/// preserving first-seen order.
fn material_sub_groups(requests: &[BatchRequest], indices: &[usize]) -> Vec<Vec<usize>> {
    let mut sub_groups: Vec<Vec<usize>> = Vec::new();
    let mut by_material: HashMap<usize, usize> = HashMap::new();
    for &index in indices {
        let key = Arc::as_ptr(&requests[index].draw_call.material) as usize;
        let slot = *by_material.entry(key).or_insert_with(|| {
            sub_groups.push(Vec::new());
            sub_groups.len() - 1
        });
        sub_groups[slot].push(index);
    }
    sub_groups
}
