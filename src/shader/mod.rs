//! Shader variants and the manager contract.
//!
//! A [`Shader`] is one *variant*: a linked program for a named shader plus
//! one set of boolean compile-time defines. Distinct define sets for the
//! same name are distinct variants with their own attribute and uniform
//! locations, which is why the vertex layout cache keys on [`ShaderId`].
//!
//! Render modes ride on the same mechanism: switching a mesh to mode `m`
//! swaps its draw calls to the variant with `render_mode_m` defined, if the
//! shader declares support for `m`.

pub mod library;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::{GpuBackend, GpuProgram, UniformLocation};
use crate::error::RenderError;

pub use library::{ShaderSourceLoader, ShaderSourceSet, ShaderVariantLibrary};

/// Define-key prefix reserved for render modes.
pub const RENDER_MODE_PREFIX: &str = "render_mode_";

/// Identity of a compiled shader variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(u64);

impl ShaderId {
    /// Wrap a raw id (minted by the variant library).
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// An ordered set of boolean compile-time defines.
///
/// Ordering makes the set a stable cache key: two define sets with the same
/// entries are the same variant regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderDefines {
    defines: BTreeMap<String, bool>,
}

impl ShaderDefines {
    /// Create an empty define set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a define.
    pub fn set(&mut self, key: impl Into<String>, value: bool) {
        self.defines.insert(key.into(), value);
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: bool) -> Self {
        self.set(key, value);
        self
    }

    /// Get a define's value.
    pub fn get(&self, key: &str) -> Option<bool> {
        self.defines.get(key).copied()
    }

    /// Remove every key starting with `prefix`.
    pub fn remove_prefixed(&mut self, prefix: &str) {
        self.defines.retain(|key, _| !key.starts_with(prefix));
    }

    /// Combine two define sets. Entries from `stronger` overwrite entries
    /// from `self` on key collision.
    pub fn merged_with(&self, stronger: &ShaderDefines) -> ShaderDefines {
        let mut merged = self.clone();
        for (key, value) in &stronger.defines {
            merged.defines.insert(key.clone(), *value);
        }
        merged
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.defines.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of defines.
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }
}

/// A compiled shader variant.
#[derive(Debug)]
pub struct Shader {
    id: ShaderId,
    name: String,
    defines: ShaderDefines,
    program: GpuProgram,
    supported_render_modes: Vec<String>,
}

impl Shader {
    /// Create a shader variant (called by the variant library).
    pub fn new(
        id: ShaderId,
        name: impl Into<String>,
        defines: ShaderDefines,
        program: GpuProgram,
        supported_render_modes: Vec<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            defines,
            program,
            supported_render_modes,
        }
    }

    /// Variant identity.
    pub fn id(&self) -> ShaderId {
        self.id
    }

    /// Shader name (shared across variants).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved define set this variant was compiled with.
    pub fn defines(&self) -> &ShaderDefines {
        &self.defines
    }

    /// The linked program handle.
    pub fn program(&self) -> &GpuProgram {
        &self.program
    }

    /// Render mode names this shader declares support for.
    pub fn supported_render_modes(&self) -> &[String] {
        &self.supported_render_modes
    }

    /// Whether the shader declares support for a render mode.
    pub fn supports_render_mode(&self, mode: &str) -> bool {
        self.supported_render_modes.iter().any(|m| m == mode)
    }

    /// Resolve a uniform location in this variant's program.
    pub fn uniform_location(
        &self,
        backend: &dyn GpuBackend,
        name: &str,
    ) -> Option<UniformLocation> {
        backend.uniform_location(&self.program, name)
    }
}

/// Contract of the shader manager collaborators load variants through.
///
/// Must be deterministic: the same (name, defines) pair returns the same or
/// an equivalent cached shader. [`ShaderVariantLibrary`] is the shipped
/// implementation.
pub trait ShaderManager {
    /// Load (or fetch from cache) the variant of `name` compiled with
    /// `defines`.
    fn load_shader(
        &mut self,
        name: &str,
        defines: &ShaderDefines,
    ) -> Result<Arc<Shader>, RenderError>;
}
