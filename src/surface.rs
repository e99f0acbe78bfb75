//! Host-facing surfaces and the presentation context the bezel draws through.

use std::cell::{Cell, RefCell};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbaImage;

use crate::error::SurfaceError;
use crate::geometry::{Rect, Size};

/// RGBA pixel buffer plus where the presentation layer should place it.
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
    dst: Rect,
    visible: bool,
}

impl Surface {
    /// Transparent surface, hidden until a destination is set.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            dst: Rect::new(0, 0, width, height),
            visible: false,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn dst(&self) -> Rect {
        self.dst
    }

    pub fn set_dst(&mut self, dst: Rect) {
        self.dst = dst;
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Shared, reference-counted surface.
///
/// The pixel storage is freed when the last clone is dropped, so the
/// presentation layer may keep a handle alive after the bezel is gone.
#[derive(Debug, Clone)]
pub struct SurfaceHandle(Arc<Mutex<Surface>>);

impl SurfaceHandle {
    pub fn new(surface: Surface) -> Self {
        Self(Arc::new(Mutex::new(surface)))
    }

    /// Lock the surface. A poisoned lock still yields the pixels.
    pub fn lock(&self) -> MutexGuard<'_, Surface> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn size(&self) -> Size {
        self.lock().size()
    }

    /// Number of live handles to this surface.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Identity of the loaded title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentIdentity {
    /// Display name, e.g. `"Pitfall! (1982) (Activision)"`.
    pub name: String,
    /// Per-title bezel name from the property store, if any.
    pub bezel_override: Option<String>,
}

impl ContentIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bezel_override: None,
        }
    }

    pub fn with_override(mut self, name: impl Into<String>) -> Self {
        self.bezel_override = Some(name.into());
        self
    }
}

/// Services the bezel consumes from the emulator's presentation layer.
pub trait Presentation {
    /// Identity of the currently loaded content.
    fn content(&self) -> ContentIdentity;

    /// Current display zoom.
    fn zoom(&self) -> f64;

    /// Allocate a blittable RGBA surface.
    fn allocate_surface(&self, width: u32, height: u32) -> Result<SurfaceHandle, SurfaceError>;
}

/// In-memory presentation context used by the CLI and tests.
#[derive(Debug)]
pub struct Session {
    content: RefCell<ContentIdentity>,
    zoom: Cell<f64>,
    max_surface: Size,
}

impl Session {
    pub const DEFAULT_MAX_SURFACE: Size = Size::new(16384, 16384);

    pub fn new(content: ContentIdentity) -> Self {
        Self {
            content: RefCell::new(content),
            zoom: Cell::new(1.0),
            max_surface: Self::DEFAULT_MAX_SURFACE,
        }
    }

    /// Refuse surfaces larger than `limit`.
    pub fn with_max_surface(mut self, limit: Size) -> Self {
        self.max_surface = limit;
        self
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.zoom.set(zoom);
    }

    pub fn set_content(&self, content: ContentIdentity) {
        *self.content.borrow_mut() = content;
    }
}

impl Presentation for Session {
    fn content(&self) -> ContentIdentity {
        self.content.borrow().clone()
    }

    fn zoom(&self) -> f64 {
        self.zoom.get()
    }

    fn allocate_surface(&self, width: u32, height: u32) -> Result<SurfaceHandle, SurfaceError> {
        let requested = Size::new(width, height);
        if requested.is_empty() {
            return Err(SurfaceError::Empty(requested));
        }
        if width > self.max_surface.w || height > self.max_surface.h {
            return Err(SurfaceError::TooLarge {
                requested,
                limit: self.max_surface,
            });
        }
        Ok(SurfaceHandle::new(Surface::new(width, height)))
    }
}
