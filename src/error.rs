use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Start-up and per-frame failures of the demos.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("cannot read `{}`", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{stage} shader `{}` failed to compile:\n{log}", .path.display())]
    ShaderCompileFailed {
        stage: &'static str,
        path: PathBuf,
        log: String,
    },

    #[error("shader program failed to link: {0}")]
    ShaderLinkFailed(String),

    #[error("cannot decode texture `{}`", .path.display())]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot create window")]
    Window(#[from] winit::error::OsError),

    #[error("graphics backend failed to {context}: {message}")]
    Backend {
        context: &'static str,
        message: String,
    },
}

impl DemoError {
    /// Wraps a gfx-hal error. Most of its error types only implement `Debug`
    /// consistently across backends, so the message is taken from there.
    pub fn backend(context: &'static str, error: impl Debug) -> Self {
        DemoError::Backend {
            context,
            message: format!("{:?}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, DemoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_names_the_path() {
        let err = DemoError::FileNotFound {
            path: PathBuf::from("assets/shaders/cube.vert"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "cannot read `assets/shaders/cube.vert`");
    }

    #[test]
    fn backend_error_carries_context() {
        let err = DemoError::backend("create fence", "OutOfMemory");
        assert_eq!(
            err.to_string(),
            "graphics backend failed to create fence: \"OutOfMemory\""
        );
    }
}
