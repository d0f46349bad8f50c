use thiserror::Error;

/// Frame-local failures. None of them is fatal: the affected piece of work is
/// skipped for the current frame and the previous state is retained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),
    #[error("invalid globe camera state: {0}")]
    InvalidCameraState(&'static str),
    #[error("zero-sized viewport {width}x{height}")]
    ZeroViewport { width: u32, height: u32 },
    #[error("placed object refers to a transform that no longer exists")]
    StaleHandle,
}
