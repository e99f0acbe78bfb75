//! Feathering between the live display and the bezel artwork.

/// Shape of the feather band along the window edge.
///
/// The band is `corner_fraction * size` thick at the corners and grows
/// smoothly to `edge_fraction * size` at the middle of each edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderProfile {
    pub corner_fraction: f32,
    pub edge_fraction: f32,
}

impl Default for BorderProfile {
    fn default() -> Self {
        Self {
            corner_fraction: 0.01,
            edge_fraction: 0.03,
        }
    }
}

impl BorderProfile {
    /// Feather thickness at `(x, y)` of a `size`×`size` sampling square.
    ///
    /// The result is a multiple of `step` within `[0, size]`, and does not
    /// change when the coordinates are swapped or mirrored around the centre.
    /// A `step` of zero or less disables feathering.
    #[must_use]
    pub fn border_size(&self, x: u32, y: u32, size: u32, step: i32) -> u32 {
        if step <= 0 || size == 0 {
            return 0;
        }
        let last = size - 1;
        let (x, y) = (x.min(last), y.min(last));
        let along = x.min(last - x).max(y.min(last - y));

        let half = (last as f32 / 2.0).max(1.0);
        let s = (along as f32 / half).clamp(0.0, 1.0);
        let eased = s * s * (3.0 - 2.0 * s);
        let frac = self.corner_fraction + (self.edge_fraction - self.corner_fraction) * eased;
        let raw = (frac.clamp(0.0, 1.0) * size as f32).min(size as f32) as u32;

        let step = step as u32;
        raw / step * step
    }
}

/// Per-pixel alpha of the live layer inside the window rectangle.
#[derive(Debug, Clone, Default)]
pub struct BlendMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl BlendMask {
    /// Precompute the mask for a `width`×`height` window.
    ///
    /// Each pixel's alpha is its distance to the nearest window edge relative
    /// to the local feather thickness, saturating at fully opaque.
    #[must_use]
    pub fn build(width: u32, height: u32, profile: &BorderProfile, step: i32) -> Self {
        let sample = width.min(height);
        let mut alpha = Vec::with_capacity(width as usize * height as usize);
        for py in 0..height {
            let dy = py.min(height - 1 - py);
            let v = project(dy, height, sample);
            for px in 0..width {
                let dx = px.min(width - 1 - px);
                let u = project(dx, width, sample);
                let band = profile.border_size(u, v, sample, step);
                let edge = dx.min(dy);
                let a = if band == 0 {
                    255
                } else {
                    ((u64::from(edge) + 1) * 255 / (u64::from(band) + 1)).min(255) as u8
                };
                alpha.push(a);
            }
        }
        Self {
            width,
            height,
            alpha,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y as usize) * (self.width as usize) + x as usize]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.alpha
    }
}

// Map an edge distance along an axis of `len` pixels onto the sampling square.
fn project(dist: u32, len: u32, sample: u32) -> u32 {
    if len <= 1 || sample <= 1 {
        return 0;
    }
    let num = u64::from(dist) * u64::from(sample - 1);
    let den = u64::from(len - 1);
    ((num * 2 + den) / (den * 2)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide() -> BorderProfile {
        BorderProfile {
            corner_fraction: 0.05,
            edge_fraction: 0.2,
        }
    }

    #[test]
    fn non_positive_step_is_a_hard_edge() {
        let p = wide();
        for step in [0, -1, -8] {
            assert_eq!(p.border_size(10, 0, 100, step), 0);
        }
        assert_eq!(p.border_size(0, 0, 0, 1), 0);
    }

    #[test]
    fn symmetric_under_mirror_and_swap() {
        let p = wide();
        let size = 64;
        for step in [1, 2, 3, 5] {
            for x in 0..size {
                for y in [0, 1, 7, size / 2, size - 1] {
                    let v = p.border_size(x, y, size, step);
                    assert_eq!(v, p.border_size(size - 1 - x, y, size, step));
                    assert_eq!(v, p.border_size(x, size - 1 - y, size, step));
                    assert_eq!(v, p.border_size(y, x, size, step));
                }
            }
        }
    }

    #[test]
    fn bounded_and_quantized() {
        let p = BorderProfile {
            corner_fraction: 0.5,
            edge_fraction: 0.5,
        };
        for size in [1, 2, 9, 100] {
            for step in [1, 2, 4, 7] {
                for x in 0..size {
                    let v = p.border_size(x, 0, size, step);
                    assert!(v <= size);
                    assert_eq!(v % step as u32, 0);
                }
            }
        }
    }

    #[test]
    fn thicker_at_edge_middle_than_corner() {
        let p = wide();
        let corner = p.border_size(0, 0, 201, 1);
        let middle = p.border_size(100, 0, 201, 1);
        assert_eq!(corner, 10);
        assert_eq!(middle, 40);
        let mut prev = 0;
        for x in 0..=100 {
            let v = p.border_size(x, 0, 201, 1);
            assert!(v >= prev, "not monotonic at {x}");
            prev = v;
        }
    }

    #[test]
    fn mask_is_opaque_in_the_middle_and_faded_at_edges() {
        let mask = BlendMask::build(100, 60, &wide(), 1);
        assert_eq!((mask.width(), mask.height()), (100, 60));
        assert_eq!(mask.as_slice().len(), 6000);
        assert_eq!(mask.alpha(50, 30), 255);
        assert!(mask.alpha(50, 0) < 255);
        assert!(mask.alpha(0, 30) < 255);
        assert_eq!(mask.alpha(50, 0), mask.alpha(50, 59));
        assert_eq!(mask.alpha(0, 30), mask.alpha(99, 30));
    }

    #[test]
    fn mask_without_feather_is_fully_opaque() {
        let mask = BlendMask::build(10, 10, &wide(), 0);
        assert!(mask.as_slice().iter().all(|&a| a == 255));
    }
}
