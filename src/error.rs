use thiserror::Error;

/// Everything that can go wrong while building GPU-side draw objects.
///
/// Construction paths return this instead of aborting so a host can decide
/// what to do; the default host policy is [`OrAbort::or_abort`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to allocate buffer '{label}': {reason}")]
    Allocation { label: String, reason: String },

    #[error("failed to create pipeline '{label}': {reason}")]
    Pipeline { label: String, reason: String },

    #[error("texture handle {0} is not registered")]
    UnknownTexture(usize),

    #[error("failed to load texture {path}: {reason}")]
    TextureLoad { path: String, reason: String },

    #[error("graphics device unavailable: {0}")]
    Device(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl RenderError {
    pub fn allocation(label: &str, reason: impl ToString) -> Self {
        RenderError::Allocation {
            label: label.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn pipeline(label: &str, reason: impl ToString) -> Self {
        RenderError::Pipeline {
            label: label.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Setup failures are unrecoverable for the renderer: log and stop the process.
pub trait OrAbort<T> {
    fn or_abort(self, context: &str) -> T;
}

impl<T> OrAbort<T> for Result<T, RenderError> {
    fn or_abort(self, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                log::error!("{context}: {err}");
                std::process::exit(1);
            }
        }
    }
}
