//! Pixel geometry shared by the resolver, the window detector and the compositor.

use std::fmt;

use serde::Deserialize;

use crate::error::BezelError;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    #[must_use]
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Both dimensions multiplied by `zoom` and rounded to whole pixels.
    #[must_use]
    pub fn scaled(&self, zoom: f64) -> Self {
        Self {
            w: scale_dim(self.w, zoom),
            h: scale_dim(self.h, zoom),
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.w, size.h)
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    /// One past the right-most column.
    #[must_use]
    pub const fn right(&self) -> u64 {
        self.x as u64 + self.w as u64
    }

    /// One past the bottom-most row.
    #[must_use]
    pub const fn bottom(&self) -> u64 {
        self.y as u64 + self.h as u64
    }

    #[must_use]
    pub const fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Whether `self` lies completely inside a `size` sized area anchored at the origin.
    #[must_use]
    pub const fn fits_within(&self, size: Size) -> bool {
        self.right() <= size.w as u64 && self.bottom() <= size.h as u64
    }

    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && (x as u64) < self.right() && (y as u64) < self.bottom()
    }

    /// Position and extent multiplied by `zoom`, each rounded to whole pixels.
    #[must_use]
    pub fn scaled(&self, zoom: f64) -> Self {
        Self {
            x: scale_dim(self.x, zoom),
            y: scale_dim(self.y, zoom),
            w: scale_dim(self.w, zoom),
            h: scale_dim(self.h, zoom),
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

fn scale_dim(v: u32, zoom: f64) -> u32 {
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    (f64::from(v) * zoom).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Artwork size and the transparent window inside it.
///
/// The default value means "no bezel". A shown value is only produced by
/// [`BezelInfo::new`], which checks that the window is non-empty and lies
/// inside the artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BezelInfo {
    is_shown: bool,
    size: Size,
    window: Rect,
}

impl Default for BezelInfo {
    fn default() -> Self {
        Self {
            is_shown: false,
            size: Size::new(1, 1),
            window: Rect::new(0, 0, 1, 1),
        }
    }
}

impl BezelInfo {
    /// # Errors
    /// Returns [`BezelError::InvalidWindowGeometry`] when `window` is empty or
    /// extends outside `size`.
    pub fn new(size: Size, window: Rect) -> Result<Self, BezelError> {
        if size.is_empty() || window.is_empty() || !window.fits_within(size) {
            return Err(BezelError::InvalidWindowGeometry {
                size,
                window: Some(window),
            });
        }
        Ok(Self {
            is_shown: true,
            size,
            window,
        })
    }

    #[must_use]
    pub const fn is_shown(&self) -> bool {
        self.is_shown
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub const fn window(&self) -> Rect {
        self.window
    }

    /// Artwork width over window width. Meaningless unless [`Self::is_shown`].
    #[must_use]
    pub fn ratio_w(&self) -> f64 {
        f64::from(self.size.w) / f64::from(self.window.w)
    }

    /// Artwork height over window height. Meaningless unless [`Self::is_shown`].
    #[must_use]
    pub fn ratio_h(&self) -> f64 {
        f64::from(self.size.h) / f64::from(self.window.h)
    }

    /// Artwork size required for a live image of `live` pixels to fill the window.
    #[must_use]
    pub fn bezel_size_for(&self, live: Size) -> Size {
        Size::new(
            (f64::from(live.w) * self.ratio_w()).round() as u32,
            (f64::from(live.h) * self.ratio_h()).round() as u32,
        )
    }
}
