//! Error types for the facial-animation engine.

/// Top-level error type for the avatar animation system.
///
/// Errors only occur at load/configuration time. The per-frame animation
/// paths are infallible: bad input degrades (dropped characters, ignored
/// channels, clamped tracking values) rather than failing the utterance.
#[derive(Debug, thiserror::Error)]
pub enum FaceError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Rig binding error (no usable channel taxonomy).
    #[error("rig error: {0}")]
    Rig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, FaceError>;
