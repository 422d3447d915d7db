//! Renderer error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors surfaced while building GPU resources or assembling draw calls.
///
/// All of these are fatal for the mesh or feature being loaded: they signal
/// corrupt or unsupported asset data and are propagated to the caller rather
/// than patched over. None of them should abort the whole application.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The scene record declared a primitive type other than triangle list.
    #[error("unsupported primitive type: {0}")]
    UnsupportedPrimitiveType(String),

    /// The index buffer element size is not 2 or 4 bytes.
    #[error("unsupported index element size: {0} bytes")]
    UnsupportedIndexElementSize(u32),

    /// The vertex attribute format code has no entry in the format table.
    #[error("unsupported vertex attribute format code: {0}")]
    UnsupportedAttributeFormat(u32),

    /// A GPU backend operation failed (allocation, compile, link).
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = RenderError::UnsupportedIndexElementSize(3);
        assert_eq!(err.to_string(), "unsupported index element size: 3 bytes");

        let err = RenderError::UnsupportedPrimitiveType("points".to_string());
        assert!(err.to_string().contains("points"));
    }

    #[test]
    fn backend_error_converts() {
        let err: RenderError = BackendError::ResourceCreationFailed("oom".to_string()).into();
        assert!(matches!(err, RenderError::Backend(_)));
    }
}
