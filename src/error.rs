//! Error types for palmburst.
//!
//! Only session setup can fail in a way the caller has to handle. Steady-state
//! frame processing never surfaces an error: transient classification failures
//! are swallowed by the classifier adapter and missing hand data simply means
//! "no trigger".

use thiserror::Error;

/// Terminal failure while mounting a session.
///
/// Reported once; the render loop never starts and any partially acquired
/// resources have already been released when this is returned.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The recognition model could not be fetched or loaded.
    #[error("failed to load gesture model: {0}")]
    ModelLoad(String),
    /// The camera could not be opened.
    #[error("failed to open camera: {0}")]
    Camera(String),
    /// The user or platform denied camera access.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// The device lacks a required capability (e.g. GPU delegate).
    #[error("unsupported device: {0}")]
    Unsupported(String),
    /// Teardown started before setup finished.
    #[error("setup canceled by teardown")]
    Canceled,
}

/// A single recognition call failed.
///
/// Never propagated past the classifier adapter.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The recognizer rejected or failed on this frame.
    #[error("recognition failed: {0}")]
    Recognition(String),
    /// Timestamps passed in video mode must increase monotonically.
    #[error("non-monotonic timestamp {timestamp_ms} (previous {previous_ms})")]
    Timestamp { timestamp_ms: u64, previous_ms: u64 },
    /// Closing the recognizer failed.
    #[error("failed to close recognizer: {0}")]
    Close(String),
}

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for [`SessionConfig`](crate::SessionConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors that can occur during GPU initialization for the overlay window.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reported no usable configuration for this adapter.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Errors that can occur when running the overlay window.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}
