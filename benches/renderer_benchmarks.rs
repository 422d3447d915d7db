use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scene_renderer::backend::dummy::DummyBackend;
use scene_renderer::shader::library::{ShaderSourceLoader, ShaderSourceSet};
use scene_renderer::{
    Attribute, AttributeFormat, BatchRenderer, BatchRequest, Camera, DrawRecord,
    IndexBufferDescription, Material, MaterialFlags, MeshBufferSet, ParameterizedInfo,
    RenderContext, RenderError, RenderPass, RenderResources, SceneMesh, ShaderDefines,
    ShaderManager, ShaderVariantLibrary, VertexBufferDescription,
};

struct StubLoader;

impl ShaderSourceLoader for StubLoader {
    fn load(&self, _name: &str) -> Result<ShaderSourceSet, RenderError> {
        Ok(ShaderSourceSet {
            vertex: String::new(),
            fragment: String::new(),
            supported_render_modes: Vec::new(),
        })
    }
}

fn buffer_set(vertex_count: u32, index_count: u32) -> MeshBufferSet {
    MeshBufferSet::new()
        .with_vertex_buffer(
            VertexBufferDescription::new(
                vertex_count,
                20,
                vec![0u8; (vertex_count * 20) as usize],
            )
            .with_attribute(Attribute::new("Position", AttributeFormat::Float32x3, 0))
            .with_attribute(Attribute::new("TexCoord", AttributeFormat::Float32x2, 12)),
        )
        .with_index_buffer(IndexBufferDescription::new(
            index_count,
            2,
            vec![0u8; (index_count * 2) as usize],
        ))
}

struct Scene {
    _backend: Arc<DummyBackend>,
    renderer: BatchRenderer,
    resources: RenderResources,
    mesh: SceneMesh,
}

fn build_scene(draw_calls: usize, translucent: bool) -> Scene {
    let backend = Arc::new(DummyBackend::new());
    let mut resources = RenderResources::new(backend.clone());
    let handle = resources.meshes.insert(buffer_set(1024, 3 * 1024));
    let mut shaders = ShaderVariantLibrary::new(backend.clone(), StubLoader);
    let mut mesh = SceneMesh::new(handle);

    let material = if translucent {
        Arc::new(Material::parameterized(
            "glass",
            "model",
            ParameterizedInfo {
                flags: MaterialFlags::TRANSLUCENT,
                ..Default::default()
            },
        ))
    } else {
        Arc::new(Material::fixed("wall", "model"))
    };

    for i in 0..draw_calls {
        mesh.push_record(
            &DrawRecord::triangles((i * 3) as u32, 3),
            material.clone(),
            &ShaderDefines::new(),
            &mut shaders,
            &mut resources,
        )
        .expect("assembly");
    }

    Scene {
        renderer: BatchRenderer::new(backend.clone()),
        _backend: backend,
        resources,
        mesh,
    }
}

fn bench_opaque_batching(c: &mut Criterion) {
    let mut scene = build_scene(256, false);
    let camera = Camera::default();

    c.bench_function("render_opaque_256_requests", |b| {
        let calls = scene.mesh.opaque();
        let requests: Vec<BatchRequest> = calls
            .iter()
            .enumerate()
            .map(|(i, call)| BatchRequest::new(call).with_ids(i as u32, 0))
            .collect();
        b.iter(|| {
            scene.renderer.render(
                black_box(&requests),
                &RenderContext::new(&camera).with_pass(RenderPass::Opaque),
            );
        });
    });

    scene.resources.clear();
}

fn bench_translucent_sorting(c: &mut Criterion) {
    let mut scene = build_scene(256, true);
    let camera = Camera::default();

    c.bench_function("render_translucent_256_requests", |b| {
        let calls = scene.mesh.blended();
        let requests: Vec<BatchRequest> = calls
            .iter()
            .enumerate()
            .map(|(i, call)| {
                // Scatter distances so the sort does real work.
                BatchRequest::new(call).with_distance(((i * 37) % 251) as f32)
            })
            .collect();
        b.iter(|| {
            scene.renderer.render(
                black_box(&requests),
                &RenderContext::new(&camera).with_pass(RenderPass::Translucent),
            );
        });
    });

    scene.resources.clear();
}

fn bench_shader_define_merge(c: &mut Criterion) {
    let overrides = ShaderDefines::new()
        .with("skinned", true)
        .with("fog", true)
        .with("two_sided", false);
    let material = ShaderDefines::new()
        .with("two_sided", true)
        .with("alpha_test", true);

    c.bench_function("shader_defines_merge", |b| {
        b.iter(|| black_box(overrides.merged_with(&material)));
    });
}

fn bench_layout_cache_hit(c: &mut Criterion) {
    let backend = Arc::new(DummyBackend::new());
    let mut resources = RenderResources::new(backend.clone());
    let handle = resources.meshes.insert(buffer_set(1024, 3 * 1024));
    let mut shaders = ShaderVariantLibrary::new(backend.clone(), StubLoader);
    let shader = shaders
        .load_shader("model", &ShaderDefines::new())
        .expect("shader");

    // Prime the caches.
    resources
        .layouts
        .get_or_create(&mut resources.buffers, &resources.meshes, handle, &shader, 0, 0, 0)
        .expect("layout");

    c.bench_function("vertex_layout_cache_hit", |b| {
        b.iter(|| {
            let layout = resources
                .layouts
                .get_or_create(
                    &mut resources.buffers,
                    &resources.meshes,
                    handle,
                    &shader,
                    0,
                    0,
                    0,
                )
                .expect("layout");
            black_box(layout);
        });
    });
}

criterion_group!(
    benches,
    bench_opaque_batching,
    bench_translucent_sorting,
    bench_shader_define_merge,
    bench_layout_cache_hit
);
criterion_main!(benches);
