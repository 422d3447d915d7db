//! # scene-renderer
//!
//! GPU resource cache and batched draw-call renderer for previously-loaded
//! 3D scenes.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GpuBufferCache`] / [`VertexLayoutCache`] - deduplicated upload of
//!   mesh geometry and per-shader vertex layout binding
//! - [`SceneMesh`] - draw-call assembly from generic scene records, plus
//!   render-mode switching
//! - [`BatchRenderer`] - the per-frame entry point with two-phase
//!   opaque/translucent batching
//! - [`GpuBackend`] - the device abstraction, with a recording dummy
//!   backend and an OpenGL backend behind the `glow-backend` feature
//!
//! ## Example
//!
//! ```ignore
//! use scene_renderer::{
//!     BatchRenderer, BatchRequest, Camera, RenderContext, RenderResources, SceneMesh,
//! };
//!
//! let mut resources = RenderResources::new(backend.clone());
//! let handle = resources.meshes.insert(buffer_set);
//! let mut mesh = SceneMesh::new(handle);
//! mesh.push_record(&record, material, &overrides, &mut shaders, &mut resources)?;
//!
//! // Each frame:
//! let requests: Vec<BatchRequest> = /* built by the scene driver */;
//! renderer.render(&requests, &RenderContext::new(&camera));
//! ```
//!
//! The renderer is single-threaded and bound to one device context; caches
//! grow for the lifetime of a loaded scene and are torn down wholesale via
//! [`RenderResources::clear`].

pub mod backend;
pub mod error;
pub mod materials;
pub mod mesh;
pub mod resources;
pub mod scene;
pub mod shader;

// Re-export main types for convenience
pub use backend::{BackendError, GpuBackend, GpuTexture, PrimitiveType};
pub use error::RenderError;
pub use materials::{Material, MaterialBinding, MaterialFlags, MaterialManager, ParameterizedInfo};
pub use mesh::{
    Attribute, AttributeFormat, GpuBufferCache, IndexBufferDescription, IndexFormat,
    MeshBufferArena, MeshBufferHandle, MeshBufferSet, VertexBufferDescription, VertexLayoutCache,
};
pub use resources::{RenderResources, TextureCache};
pub use scene::{
    BatchRenderer, BatchRequest, Camera, DrawCall, DrawRecord, RenderContext, RenderPass,
    SceneMesh,
};
pub use shader::{Shader, ShaderDefines, ShaderManager, ShaderVariantLibrary};

/// Renderer library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the renderer subsystem.
///
/// This only announces itself on the log; call it once after the logger is
/// installed.
pub fn init() {
    log::info!("scene-renderer v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
