use thiserror::Error;

/// Everything that can go wrong between loading the configuration and
/// presenting a frame.
#[derive(Error, Debug)]
pub enum TracerError {
    /// Configuration rejected at load time.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The render target could not be allocated. Fatal for the frame only.
    #[error("Failed to allocate {width}x{height} render target: {reason}")]
    TargetAllocation {
        width: u32,
        height: u32,
        reason: String,
    },

    /// Adapter, device or surface could not be created.
    #[error("GPU device error: {0}")]
    Device(String),

    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("Window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl TracerError {
    pub fn config<T: ToString>(msg: T) -> Self {
        TracerError::Config(msg.to_string())
    }

    pub fn device<T: ToString>(msg: T) -> Self {
        TracerError::Device(msg.to_string())
    }
}

pub type TracerResult<T> = Result<T, TracerError>;
