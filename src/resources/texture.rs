//! Solid-color texture cache.
//!
//! Draw-call assembly falls back to synthesized 1x1 solid textures when a
//! material lacks a tint-mask or normal binding. The cache memoizes those
//! by color so repeated assembly reuses one GPU texture per color.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::{GpuBackend, GpuTexture};
use crate::error::RenderError;

/// Creates and memoizes 1x1 solid-color textures.
pub struct TextureCache {
    backend: Arc<dyn GpuBackend>,
    solid: HashMap<[u8; 4], GpuTexture>,
}

impl TextureCache {
    /// Create an empty cache on a backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            backend,
            solid: HashMap::new(),
        }
    }

    /// Get the 1x1 texture of a solid color, creating it on first use.
    ///
    /// Color components are given in [0,1] and quantized to RGBA8.
    pub fn solid(&mut self, color: [f32; 4]) -> Result<GpuTexture, RenderError> {
        let texel = quantize(color);
        if let Some(existing) = self.solid.get(&texel) {
            return Ok(*existing);
        }
        let texture = self.backend.create_texture_rgba8(1, 1, &texel)?;
        log::debug!("created solid fallback texture rgba{texel:?}");
        self.solid.insert(texel, texture);
        Ok(texture)
    }

    /// Number of distinct solid textures created.
    pub fn len(&self) -> usize {
        self.solid.len()
    }

    /// Whether no texture has been created yet.
    pub fn is_empty(&self) -> bool {
        self.solid.is_empty()
    }

    /// Drop every entry (scene unload).
    pub fn clear(&mut self) {
        self.solid.clear();
    }
}

fn quantize(color: [f32; 4]) -> [u8; 4] {
    let mut texel = [0u8; 4];
    for (dst, src) in texel.iter_mut().zip(color.iter()) {
        *dst = (src.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    texel
}
