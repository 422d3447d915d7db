//! Backend error types.

use thiserror::Error;

/// Errors that can occur in backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Failed to create a GPU resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A shader stage failed to compile.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// The program failed to link.
    #[error("program link failed: {0}")]
    ProgramLinkFailed(String),
}
