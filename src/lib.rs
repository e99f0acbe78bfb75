pub mod bezel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod processing;
pub mod surface;

pub use bezel::Bezel;
pub use config::Configuration;
pub use error::{BezelError, SurfaceError};
pub use geometry::{BezelInfo, Rect, Size};
pub use surface::{ContentIdentity, Presentation, Session, Surface, SurfaceHandle};
