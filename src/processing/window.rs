//! Locating the transparent display window inside bezel artwork.

use image::RgbaImage;
use serde::Deserialize;

use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowDetection {
    /// Largest fully transparent rectangle, preferring the one nearest the centre.
    #[default]
    LargestTransparent,
    /// Walk inward from the middle of each edge until the artwork stops being opaque.
    EdgeScan,
}

/// Find the window using the selected strategy.
///
/// `transparent_alpha` is the highest alpha still treated as see-through by
/// [`WindowDetection::LargestTransparent`].
#[must_use]
pub fn detect_window(
    img: &RgbaImage,
    detection: WindowDetection,
    transparent_alpha: u8,
) -> Option<Rect> {
    match detection {
        WindowDetection::LargestTransparent => largest_transparent_rect(img, transparent_alpha),
        WindowDetection::EdgeScan => edge_scan_rect(img),
    }
}

/// Largest axis-aligned rectangle whose pixels all have alpha `<= threshold`.
///
/// Rows are scanned top to bottom keeping a histogram of transparent run
/// heights per column; each row is resolved with a monotonic stack. Among
/// equally large rectangles the one whose centre is closest to the image
/// centre wins, then the first one found.
#[must_use]
pub fn largest_transparent_rect(img: &RgbaImage, threshold: u8) -> Option<Rect> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }

    let mut heights = vec![0u32; w as usize];
    let mut stack: Vec<(u32, u32)> = Vec::with_capacity(w as usize);
    let mut best: Option<(Rect, u64)> = None;

    for y in 0..h {
        for (x, run) in heights.iter_mut().enumerate() {
            *run = if img.get_pixel(x as u32, y)[3] <= threshold {
                *run + 1
            } else {
                0
            };
        }

        stack.clear();
        for x in 0..=w {
            let hx = if x < w { heights[x as usize] } else { 0 };
            let mut start = x;
            while let Some(&(s, run)) = stack.last() {
                if run < hx {
                    break;
                }
                stack.pop();
                let rect = Rect::new(s, y + 1 - run, x - s, run);
                consider(&mut best, rect, w, h);
                start = s;
            }
            if hx > 0 {
                stack.push((start, hx));
            }
        }
    }

    best.map(|(rect, _)| rect)
}

fn consider(best: &mut Option<(Rect, u64)>, rect: Rect, img_w: u32, img_h: u32) {
    if rect.is_empty() {
        return;
    }
    let dist = center_distance_sq(rect, img_w, img_h);
    let better = match best {
        None => true,
        Some((cur, cur_dist)) => {
            rect.area() > cur.area() || (rect.area() == cur.area() && dist < *cur_dist)
        }
    };
    if better {
        *best = Some((rect, dist));
    }
}

// Squared distance between rectangle and image centres, in half pixels.
fn center_distance_sq(rect: Rect, img_w: u32, img_h: u32) -> u64 {
    let dx = (2 * i64::from(rect.x) + i64::from(rect.w)) - i64::from(img_w);
    let dy = (2 * i64::from(rect.y) + i64::from(rect.h)) - i64::from(img_h);
    (dx * dx + dy * dy) as u64
}

/// Window bounded by the first non-opaque pixel seen from the middle of each edge.
#[must_use]
pub fn edge_scan_rect(img: &RgbaImage) -> Option<Rect> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let (mid_x, mid_y) = (w / 2, h / 2);
    let opaque = |x: u32, y: u32| img.get_pixel(x, y)[3] == u8::MAX;

    let left = (0..w).take_while(|&x| opaque(x, mid_y)).count() as u32;
    if left == w {
        return None;
    }
    let right = (0..w).rev().take_while(|&x| opaque(x, mid_y)).count() as u32;
    let top = (0..h).take_while(|&y| opaque(mid_x, y)).count() as u32;
    if top == h {
        return None;
    }
    let bottom = (0..h).rev().take_while(|&y| opaque(mid_x, y)).count() as u32;

    let rect = Rect::new(
        left,
        top,
        w.checked_sub(left + right)?,
        h.checked_sub(top + bottom)?,
    );
    (!rect.is_empty()).then_some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn frame_with_hole(w: u32, h: u32, hole: Rect) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if hole.contains(x, y) {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([90, 60, 30, 255])
            }
        })
    }

    #[test]
    fn finds_single_cutout() {
        let hole = Rect::new(10, 8, 30, 20);
        let img = frame_with_hole(50, 40, hole);
        assert_eq!(largest_transparent_rect(&img, 0), Some(hole));
    }

    #[test]
    fn picks_the_largest_of_several_holes() {
        let mut img = frame_with_hole(60, 40, Rect::new(20, 10, 30, 20));
        for y in 2..6 {
            for x in 2..6 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }
        assert_eq!(
            largest_transparent_rect(&img, 0),
            Some(Rect::new(20, 10, 30, 20))
        );
    }

    #[test]
    fn equal_holes_prefer_the_centred_one() {
        let mut img = frame_with_hole(60, 60, Rect::new(25, 25, 10, 10));
        for y in 2..12 {
            for x in 2..12 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }
        assert_eq!(
            largest_transparent_rect(&img, 0),
            Some(Rect::new(25, 25, 10, 10))
        );
    }

    #[test]
    fn threshold_admits_nearly_transparent_pixels() {
        let hole = Rect::new(4, 4, 8, 8);
        let mut img = frame_with_hole(20, 20, hole);
        img.put_pixel(6, 6, Rgba([0, 0, 0, 12]));
        assert_ne!(largest_transparent_rect(&img, 0), Some(hole));
        assert_eq!(largest_transparent_rect(&img, 16), Some(hole));
    }

    #[test]
    fn opaque_artwork_has_no_window() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([1, 2, 3, 255]));
        assert_eq!(largest_transparent_rect(&img, 0), None);
        assert_eq!(edge_scan_rect(&img), None);
    }

    #[test]
    fn edge_scan_matches_simple_frame() {
        let hole = Rect::new(12, 6, 20, 14);
        let img = frame_with_hole(40, 30, hole);
        assert_eq!(edge_scan_rect(&img), Some(hole));
        assert_eq!(detect_window(&img, WindowDetection::EdgeScan, 0), Some(hole));
    }

    #[test]
    fn edge_scan_stops_at_soft_edge() {
        let hole = Rect::new(5, 5, 10, 10);
        let mut img = frame_with_hole(20, 20, hole);
        // semi-transparent rim is part of the window for the edge scan
        for y in 0..20 {
            img.put_pixel(4, y, Rgba([0, 0, 0, 128]));
        }
        assert_eq!(edge_scan_rect(&img), Some(Rect::new(4, 5, 11, 10)));
    }
}
