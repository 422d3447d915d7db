//! Material definition.
//!
//! A [`Material`] carries the shader name, texture bindings and parameter
//! tables resolved by the (external) material manager, plus the blend flags
//! that drive translucent-pass classification and state switching.
//!
//! Materials come in two kinds, modeled as a tagged union: *fixed*
//! materials have no parameter tables and no blend-flag derivation at all,
//! while *parameterized* materials carry the full float/vector/flag
//! tables.

use std::cell::{Ref, RefCell};
use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec4;

use crate::backend::GpuTexture;
use crate::error::RenderError;
use crate::shader::ShaderDefines;

bitflags! {
    /// Blend and pass-routing flags derived from a material definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        /// Renders in the translucent pass with blending.
        const TRANSLUCENT = 1 << 0;
        /// Additive blending (implies TRANSLUCENT routing).
        const ADDITIVE = 1 << 1;
        /// Backfaces stay visible; culling is disabled while bound.
        const RENDER_BACKFACES = 1 << 2;
        /// Editor/debug material, skipped unless debug visibility is on.
        const TOOLS = 1 << 3;
        /// Overlay material; assembly skips these entirely.
        const OVERLAY = 1 << 4;
    }
}

/// A texture bound under a shader sampler name.
#[derive(Debug, Clone)]
pub struct MaterialTexture {
    /// Sampler uniform name the texture binds to.
    pub uniform: String,
    /// The texture handle.
    pub texture: GpuTexture,
}

/// Parameter tables and derived flags of a parameterized material.
#[derive(Debug, Clone, Default)]
pub struct ParameterizedInfo {
    /// Named float parameters, set as uniforms while bound.
    pub scalars: Vec<(String, f32)>,
    /// Named vector parameters, set as uniforms while bound.
    pub vectors: Vec<(String, Vec4)>,
    /// Integer flag table from the material definition. Non-zero flags
    /// become shader defines.
    pub int_flags: Vec<(String, i32)>,
    /// Derived blend/routing flags.
    pub flags: MaterialFlags,
    /// Alpha-test reference value, if the material alpha-tests.
    pub alpha_test_ref: Option<f32>,
}

/// The two material kinds.
#[derive(Debug, Clone)]
pub enum MaterialInfo {
    /// Fixed material: textures only, always opaque, no derived state.
    Fixed,
    /// Parameterized material with tables and derived blend flags.
    Parameterized(ParameterizedInfo),
}

/// A resolved material.
///
/// The texture list is interior-mutable because draw-call assembly patches
/// missing tint-mask/normal bindings with synthesized fallbacks; the
/// material may already be shared between meshes at that point.
#[derive(Debug)]
pub struct Material {
    name: String,
    shader_name: String,
    textures: RefCell<Vec<MaterialTexture>>,
    info: MaterialInfo,
}

impl Material {
    /// Create a fixed material.
    pub fn fixed(name: impl Into<String>, shader_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader_name: shader_name.into(),
            textures: RefCell::new(Vec::new()),
            info: MaterialInfo::Fixed,
        }
    }

    /// Create a parameterized material.
    pub fn parameterized(
        name: impl Into<String>,
        shader_name: impl Into<String>,
        info: ParameterizedInfo,
    ) -> Self {
        Self {
            name: name.into(),
            shader_name: shader_name.into(),
            textures: RefCell::new(Vec::new()),
            info: MaterialInfo::Parameterized(info),
        }
    }

    /// Bind a texture under a sampler name (builder form).
    pub fn with_texture(self, uniform: impl Into<String>, texture: GpuTexture) -> Self {
        self.set_texture(uniform, texture);
        self
    }

    /// Material name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the shader this material renders with.
    pub fn shader_name(&self) -> &str {
        &self.shader_name
    }

    /// The material kind and its tables.
    pub fn info(&self) -> &MaterialInfo {
        &self.info
    }

    /// Derived flags; empty for fixed materials.
    pub fn flags(&self) -> MaterialFlags {
        match &self.info {
            MaterialInfo::Fixed => MaterialFlags::empty(),
            MaterialInfo::Parameterized(info) => info.flags,
        }
    }

    /// Whether the material renders in the translucent pass.
    pub fn is_translucent(&self) -> bool {
        self.flags().contains(MaterialFlags::TRANSLUCENT)
    }

    /// Whether the material blends additively.
    pub fn is_additive(&self) -> bool {
        self.flags().contains(MaterialFlags::ADDITIVE)
    }

    /// Whether backfaces stay visible.
    pub fn renders_backfaces(&self) -> bool {
        self.flags().contains(MaterialFlags::RENDER_BACKFACES)
    }

    /// Whether this is an editor/debug material.
    pub fn is_tools(&self) -> bool {
        self.flags().contains(MaterialFlags::TOOLS)
    }

    /// Whether this is an overlay material (assembly skips these).
    pub fn is_overlay(&self) -> bool {
        self.flags().contains(MaterialFlags::OVERLAY)
    }

    /// Alpha-test reference, if the material alpha-tests.
    pub fn alpha_test_ref(&self) -> Option<f32> {
        match &self.info {
            MaterialInfo::Fixed => None,
            MaterialInfo::Parameterized(info) => info.alpha_test_ref,
        }
    }

    /// The shader defines this material derives from its definition.
    ///
    /// Non-zero integer flags each contribute a define; alpha-testing
    /// materials additionally define `alpha_test`. These take precedence
    /// over caller-supplied overrides when combined during assembly.
    pub fn shader_defines(&self) -> ShaderDefines {
        let mut defines = ShaderDefines::new();
        if let MaterialInfo::Parameterized(info) = &self.info {
            for (name, value) in &info.int_flags {
                defines.set(name.clone(), *value != 0);
            }
            if info.alpha_test_ref.is_some() {
                defines.set("alpha_test", true);
            }
        }
        defines
    }

    /// The bound textures.
    pub fn textures(&self) -> Ref<'_, Vec<MaterialTexture>> {
        self.textures.borrow()
    }

    /// Whether a texture is bound under a sampler name.
    pub fn has_texture(&self, uniform: &str) -> bool {
        self.textures.borrow().iter().any(|t| t.uniform == uniform)
    }

    /// The texture bound under a sampler name, if any.
    pub fn texture(&self, uniform: &str) -> Option<GpuTexture> {
        self.textures
            .borrow()
            .iter()
            .find(|t| t.uniform == uniform)
            .map(|t| t.texture)
    }

    /// Bind (or replace) a texture under a sampler name.
    pub fn set_texture(&self, uniform: impl Into<String>, texture: GpuTexture) {
        let uniform = uniform.into();
        let mut textures = self.textures.borrow_mut();
        if let Some(existing) = textures.iter_mut().find(|t| t.uniform == uniform) {
            existing.texture = texture;
        } else {
            textures.push(MaterialTexture { uniform, texture });
        }
    }
}

/// Contract of the material manager collaborator.
///
/// Resolution of texture bindings, shader name and parameter tables from an
/// asset's material definition is out of scope here; this crate only
/// consumes the resolved [`Material`].
pub trait MaterialManager {
    /// Resolve a material by name.
    fn load_material(&mut self, name: &str) -> Result<Arc<Material>, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_materials_have_no_derived_state() {
        let material = Material::fixed("floor", "model");
        assert_eq!(material.flags(), MaterialFlags::empty());
        assert!(!material.is_translucent());
        assert!(material.alpha_test_ref().is_none());
        assert!(material.shader_defines().is_empty());
    }

    #[test]
    fn parameterized_flags_route_passes() {
        let material = Material::parameterized(
            "glass",
            "model",
            ParameterizedInfo {
                flags: MaterialFlags::TRANSLUCENT | MaterialFlags::RENDER_BACKFACES,
                ..Default::default()
            },
        );
        assert!(material.is_translucent());
        assert!(material.renders_backfaces());
        assert!(!material.is_additive());
    }

    #[test]
    fn int_flags_and_alpha_test_become_defines() {
        let material = Material::parameterized(
            "foliage",
            "model",
            ParameterizedInfo {
                int_flags: vec![("two_sided".to_string(), 1), ("unlit".to_string(), 0)],
                alpha_test_ref: Some(0.5),
                ..Default::default()
            },
        );

        let defines = material.shader_defines();
        assert_eq!(defines.get("two_sided"), Some(true));
        assert_eq!(defines.get("unlit"), Some(false));
        assert_eq!(defines.get("alpha_test"), Some(true));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn set_texture_replaces_existing_binding() {
        use crate::backend::GpuTexture;

        let material = Material::fixed("wall", "model");
        material.set_texture("uDiffuse", GpuTexture::Dummy { id: 1 });
        material.set_texture("uDiffuse", GpuTexture::Dummy { id: 2 });

        assert_eq!(material.textures().len(), 1);
        assert_eq!(material.texture("uDiffuse"), Some(GpuTexture::Dummy { id: 2 }));
    }
}
