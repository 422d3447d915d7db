//! Scoped material state binding.
//!
//! [`MaterialBinding`] pairs the "render" and "post-render" halves of
//! material state switching as an RAII guard: binding sets textures,
//! uniforms and blend/depth/cull state, and dropping the guard restores
//! exactly what was changed. The batch renderer holds one guard per
//! material sub-group, so restoration cannot be skipped on any exit path.

use crate::backend::{BlendState, GpuBackend};
use crate::shader::Shader;

use super::material::{Material, MaterialInfo};

/// First texture unit used for material textures. Unit 0 is reserved for
/// the per-draw animation texture.
pub const MATERIAL_TEXTURE_UNIT_BASE: u32 = 1;

/// Uniform name of the alpha-test reference value.
pub const UNIFORM_ALPHA_TEST_REF: &str = "uAlphaTestRef";

/// An active material binding; dropping it restores the touched state.
pub struct MaterialBinding<'a> {
    backend: &'a dyn GpuBackend,
    translucent: bool,
    culling_disabled: bool,
}

impl<'a> MaterialBinding<'a> {
    /// Bind a material for drawing with `shader`.
    ///
    /// Textures bind to consecutive units starting at
    /// [`MATERIAL_TEXTURE_UNIT_BASE`]; textures and parameters whose
    /// uniform names the shader variant doesn't use are skipped.
    pub fn bind(backend: &'a dyn GpuBackend, material: &Material, shader: &Shader) -> Self {
        let mut unit = MATERIAL_TEXTURE_UNIT_BASE;
        for entry in material.textures().iter() {
            let Some(location) = shader.uniform_location(backend, &entry.uniform) else {
                log::trace!(
                    "shader {} does not sample {}; texture skipped",
                    shader.name(),
                    entry.uniform
                );
                continue;
            };
            backend.bind_texture(unit, &entry.texture);
            backend.set_uniform_i32(&location, unit as i32);
            unit += 1;
        }

        if let MaterialInfo::Parameterized(info) = material.info() {
            for (name, value) in &info.scalars {
                if let Some(location) = shader.uniform_location(backend, name) {
                    backend.set_uniform_f32(&location, *value);
                }
            }
            for (name, value) in &info.vectors {
                if let Some(location) = shader.uniform_location(backend, name) {
                    backend.set_uniform_vec4(&location, *value);
                }
            }
            if let Some(reference) = info.alpha_test_ref {
                if let Some(location) = shader.uniform_location(backend, UNIFORM_ALPHA_TEST_REF) {
                    backend.set_uniform_f32(&location, reference);
                }
            }
        }

        let translucent = material.is_translucent();
        if translucent {
            backend.set_depth_write(false);
            let blend = if material.is_additive() {
                BlendState::additive()
            } else {
                BlendState::alpha()
            };
            backend.set_blend(Some(blend));
        }

        let culling_disabled = material.renders_backfaces();
        if culling_disabled {
            backend.set_cull_face(false);
        }

        Self {
            backend,
            translucent,
            culling_disabled,
        }
    }
}

impl Drop for MaterialBinding<'_> {
    fn drop(&mut self) {
        if self.translucent {
            self.backend.set_depth_write(true);
            self.backend.set_blend(None);
        }
        if self.culling_disabled {
            self.backend.set_cull_face(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::dummy::{DummyBackend, GpuOp};
    use crate::backend::{BlendFactor, GpuTexture, ProgramDescriptor};
    use crate::materials::material::{MaterialFlags, ParameterizedInfo};
    use crate::shader::{Shader, ShaderDefines, ShaderId};

    fn test_shader(backend: &DummyBackend) -> Shader {
        let program = backend
            .create_program(&ProgramDescriptor {
                label: "test",
                vertex_source: "",
                fragment_source: "",
            })
            .unwrap();
        Shader::new(ShaderId::from_raw(1), "test", ShaderDefines::new(), program, Vec::new())
    }

    #[test]
    fn textures_bind_from_unit_one() {
        let backend = DummyBackend::new();
        let shader = test_shader(&backend);
        let material = Material::fixed("wall", "model")
            .with_texture("uDiffuse", GpuTexture::Dummy { id: 100 })
            .with_texture("uSpecular", GpuTexture::Dummy { id: 101 });

        let binding = MaterialBinding::bind(&backend, &material, &shader);
        drop(binding);

        let units: Vec<u32> = backend
            .ops()
            .iter()
            .filter_map(|op| match op {
                GpuOp::BindTexture { unit, .. } => Some(*unit),
                _ => None,
            })
            .collect();
        assert_eq!(units, vec![1, 2]);
    }

    #[test]
    fn translucent_state_is_restored_on_drop() {
        let backend = DummyBackend::new();
        let shader = test_shader(&backend);
        let material = Material::parameterized(
            "glass",
            "model",
            ParameterizedInfo {
                flags: MaterialFlags::TRANSLUCENT,
                ..Default::default()
            },
        );

        {
            let _binding = MaterialBinding::bind(&backend, &material, &shader);
        }

        let ops = backend.ops();
        let expected = [
            GpuOp::SetDepthWrite(false),
            GpuOp::SetBlend(Some(BlendState::alpha())),
            GpuOp::SetDepthWrite(true),
            GpuOp::SetBlend(None),
        ];
        let state_ops: Vec<_> = ops
            .iter()
            .filter(|op| matches!(op, GpuOp::SetDepthWrite(_) | GpuOp::SetBlend(_)))
            .cloned()
            .collect();
        assert_eq!(state_ops, expected);
    }

    #[test]
    fn additive_materials_blend_onto_one() {
        let backend = DummyBackend::new();
        let shader = test_shader(&backend);
        let material = Material::parameterized(
            "flame",
            "model",
            ParameterizedInfo {
                flags: MaterialFlags::TRANSLUCENT | MaterialFlags::ADDITIVE,
                ..Default::default()
            },
        );

        let _binding = MaterialBinding::bind(&backend, &material, &shader);

        assert!(backend.ops().iter().any(|op| matches!(
            op,
            GpuOp::SetBlend(Some(BlendState {
                src: BlendFactor::SrcAlpha,
                dst: BlendFactor::One,
            }))
        )));
    }

    #[test]
    fn backface_materials_toggle_culling() {
        let backend = DummyBackend::new();
        let shader = test_shader(&backend);
        let material = Material::parameterized(
            "leaves",
            "model",
            ParameterizedInfo {
                flags: MaterialFlags::RENDER_BACKFACES,
                ..Default::default()
            },
        );

        {
            let _binding = MaterialBinding::bind(&backend, &material, &shader);
        }

        let cull_ops: Vec<_> = backend
            .ops()
            .iter()
            .filter(|op| matches!(op, GpuOp::SetCullFace(_)))
            .cloned()
            .collect();
        assert_eq!(cull_ops, vec![GpuOp::SetCullFace(false), GpuOp::SetCullFace(true)]);
    }

    #[test]
    fn unresolved_texture_uniforms_do_not_consume_units() {
        let backend = DummyBackend::new();
        let program = backend.create_program_with_bindings(&[], &["uSpecular"]);
        let shader = Shader::new(
            ShaderId::from_raw(2),
            "partial",
            ShaderDefines::new(),
            program,
            Vec::new(),
        );
        let material = Material::fixed("wall", "model")
            .with_texture("uDiffuse", GpuTexture::Dummy { id: 100 })
            .with_texture("uSpecular", GpuTexture::Dummy { id: 101 });

        let _binding = MaterialBinding::bind(&backend, &material, &shader);

        let binds: Vec<(u32, u64)> = backend
            .ops()
            .iter()
            .filter_map(|op| match op {
                GpuOp::BindTexture { unit, id } => Some((*unit, *id)),
                _ => None,
            })
            .collect();
        // uDiffuse doesn't resolve, so uSpecular takes unit 1.
        assert_eq!(binds, vec![(1, 101)]);
    }
}
