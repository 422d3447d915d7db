//! Scene-side rendering: records, draw calls, batching and the camera.

pub mod batch;
pub mod camera;
pub mod draw_call;
pub mod record;

pub use batch::{
    BatchRenderer, BatchRequest, RenderContext, RenderPass, ANIMATION_TEXTURE_UNIT,
};
pub use camera::Camera;
pub use draw_call::{
    DrawCall, SceneMesh, NORMAL_MAP_FALLBACK, NORMAL_MAP_TEXTURE, TINT_MASK_FALLBACK,
    TINT_MASK_TEXTURE,
};
pub use record::{DrawRecord, PrimitiveTypeField, TRIANGLE_LIST_CODE};
