//! Caching shader variant library.
//!
//! [`ShaderVariantLibrary`] is the shipped [`ShaderManager`]: it loads GLSL
//! sources through a [`ShaderSourceLoader`], injects the variant's defines,
//! compiles through the backend, and caches the resulting [`Shader`] by
//! (name, defines). Loading the same pair twice returns the cached `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::{GpuBackend, ProgramDescriptor};
use crate::error::RenderError;

use super::{Shader, ShaderDefines, ShaderId, ShaderManager};

/// Sources and metadata for one named shader, as delivered by the loader.
#[derive(Debug, Clone)]
pub struct ShaderSourceSet {
    /// Vertex stage GLSL.
    pub vertex: String,
    /// Fragment stage GLSL.
    pub fragment: String,
    /// Render mode names the shader declares support for.
    pub supported_render_modes: Vec<String>,
}

/// Loads shader sources by name.
///
/// Where the sources come from (disk, archive, embedded strings) is the
/// embedder's business; the library only asks for them once per name+defines
/// combination.
pub trait ShaderSourceLoader {
    /// Load the source set for a named shader.
    fn load(&self, name: &str) -> Result<ShaderSourceSet, RenderError>;
}

/// Caching shader manager.
pub struct ShaderVariantLibrary<L> {
    backend: Arc<dyn GpuBackend>,
    loader: L,
    variants: HashMap<(String, ShaderDefines), Arc<Shader>>,
    next_id: u64,
}

impl<L: ShaderSourceLoader> ShaderVariantLibrary<L> {
    /// Create an empty library.
    pub fn new(backend: Arc<dyn GpuBackend>, loader: L) -> Self {
        Self {
            backend,
            loader,
            variants: HashMap::new(),
            next_id: 0,
        }
    }

    /// Number of compiled variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Whether no variant has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl<L: ShaderSourceLoader> ShaderManager for ShaderVariantLibrary<L> {
    fn load_shader(
        &mut self,
        name: &str,
        defines: &ShaderDefines,
    ) -> Result<Arc<Shader>, RenderError> {
        let key = (name.to_string(), defines.clone());
        if let Some(existing) = self.variants.get(&key) {
            return Ok(existing.clone());
        }

        let sources = self.loader.load(name)?;
        let vertex = inject_defines(&sources.vertex, defines);
        let fragment = inject_defines(&sources.fragment, defines);
        let program = self.backend.create_program(&ProgramDescriptor {
            label: name,
            vertex_source: &vertex,
            fragment_source: &fragment,
        })?;

        self.next_id += 1;
        let shader = Arc::new(Shader::new(
            ShaderId::from_raw(self.next_id),
            name,
            defines.clone(),
            program,
            sources.supported_render_modes,
        ));
        log::debug!(
            "compiled shader variant {} ({} defines), {} variants cached",
            name,
            defines.len(),
            self.variants.len() + 1
        );
        self.variants.insert(key, shader.clone());
        Ok(shader)
    }
}

/// Splice `#define` lines into a GLSL source, after the `#version` directive
/// if one is present. Defines with value `false` are omitted; identity of
/// the variant still includes them.
fn inject_defines(source: &str, defines: &ShaderDefines) -> String {
    let mut block = String::new();
    for (key, value) in defines.iter() {
        if value {
            block.push_str("#define ");
            block.push_str(key);
            block.push_str(" 1\n");
        }
    }
    if block.is_empty() {
        return source.to_string();
    }

    match source.lines().next() {
        Some(first) if first.trim_start().starts_with("#version") => {
            let rest = &source[first.len()..];
            format!("{first}\n{block}{}", rest.trim_start_matches('\n'))
        }
        _ => format!("{block}{source}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;

    struct StubLoader;

    impl ShaderSourceLoader for StubLoader {
        fn load(&self, _name: &str) -> Result<ShaderSourceSet, RenderError> {
            Ok(ShaderSourceSet {
                vertex: "#version 330 core\nvoid main() {}\n".to_string(),
                fragment: "#version 330 core\nvoid main() {}\n".to_string(),
                supported_render_modes: vec!["wireframe".to_string()],
            })
        }
    }

    #[test]
    fn same_key_returns_cached_variant() {
        let backend = Arc::new(DummyBackend::new());
        let mut library = ShaderVariantLibrary::new(backend, StubLoader);
        let defines = ShaderDefines::new().with("alpha_test", true);

        let a = library.load_shader("model", &defines).unwrap();
        let b = library.load_shader("model", &defines).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn distinct_defines_are_distinct_variants() {
        let backend = Arc::new(DummyBackend::new());
        let mut library = ShaderVariantLibrary::new(backend, StubLoader);

        let plain = library.load_shader("model", &ShaderDefines::new()).unwrap();
        let variant = library
            .load_shader("model", &ShaderDefines::new().with("alpha_test", true))
            .unwrap();

        assert_ne!(plain.id(), variant.id());
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn defines_are_injected_after_version() {
        let defines = ShaderDefines::new()
            .with("alpha_test", true)
            .with("skinned", false);
        let injected = inject_defines("#version 330 core\nvoid main() {}\n", &defines);

        let mut lines = injected.lines();
        assert_eq!(lines.next(), Some("#version 330 core"));
        assert_eq!(lines.next(), Some("#define alpha_test 1"));
        // false defines are omitted from the source
        assert_eq!(lines.next(), Some("void main() {}"));
    }
}
