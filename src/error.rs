use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::{Rect, Size};

/// Host refused to hand out a surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// Zero-sized surfaces are never allocated.
    #[error("cannot allocate an empty {0} surface")]
    Empty(Size),

    /// Request exceeds the host's surface limit.
    #[error("surface {requested} exceeds the {limit} limit")]
    TooLarge { requested: Size, limit: Size },

    /// Host returned a surface of a different size than requested.
    #[error("requested a {requested} surface, got {actual}")]
    SizeMismatch { requested: Size, actual: Size },
}

/// Library error type for bezel loading.
///
/// None of these interrupt emulation; [`crate::bezel::Bezel::load`] degrades
/// to "no bezel" on every variant.
#[derive(Debug, Error)]
pub enum BezelError {
    /// Every candidate name was tried and none produced a usable bezel.
    ///
    /// `last` carries the failure of the last candidate that existed on disk.
    #[error("no bezel artwork could be resolved")]
    ResolutionExhausted {
        #[source]
        last: Option<Box<BezelError>>,
    },

    /// Window does not fit the artwork, or none was found (`window` is `None`).
    #[error("no usable window {} in {size} artwork", describe_window(.window))]
    InvalidWindowGeometry { size: Size, window: Option<Rect> },

    /// Artwork exists but could not be decoded.
    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Window sidecar next to the artwork is malformed.
    #[error("invalid window sidecar {path}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    SurfaceAllocation(#[from] SurfaceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn describe_window(window: &Option<Rect>) -> String {
    match window {
        Some(rect) => rect.to_string(),
        None => "(no transparent region)".to_string(),
    }
}
