use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The files extension are not the same [{0}] and [{1}]")]
    ExtensionMismatch(String, String),
    #[error("Unsupported extension [{0}]")]
    UnsupportedExtension(String),
    #[error("Missing file extension: {0}")]
    MissingExtension(PathBuf),
    #[error("Unexpected number of channels in {path}: expected 1, found {channels}")]
    ChannelCount { path: PathBuf, channels: u8 },
    #[error("Images have different {what} ([{first}] and [{second}])")]
    ShapeMismatch {
        what: &'static str,
        first: String,
        second: String,
    },
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
    #[error("Unsupported configuration: {0}")]
    Config(String),
    #[error("GPU error: {0}")]
    Device(String),
    #[error("GPU context not available")]
    NoGpuContext,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn decode(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Error::Decode {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Error::Encode {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// True for errors raised before any device resource is touched.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::ExtensionMismatch(..)
                | Error::UnsupportedExtension(_)
                | Error::MissingExtension(_)
                | Error::ChannelCount { .. }
                | Error::ShapeMismatch { .. }
                | Error::Decode { .. }
        )
    }
}

impl From<wgpu::Error> for Error {
    fn from(e: wgpu::Error) -> Self {
        Error::Device(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
