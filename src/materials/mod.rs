//! Materials and scoped material state binding.

pub mod binding;
pub mod material;

pub use binding::{MaterialBinding, MATERIAL_TEXTURE_UNIT_BASE, UNIFORM_ALPHA_TEST_REF};
pub use material::{
    Material, MaterialFlags, MaterialInfo, MaterialManager, MaterialTexture, ParameterizedInfo,
};
