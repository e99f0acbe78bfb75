use crate::geometry::Size;

/// Largest zoom at which `content` still fits inside `bounds`.
///
/// Degenerate inputs fall back to `1.0`.
pub fn zoom_to_fit(content: Size, bounds: Size) -> f64 {
    let iw = f64::from(content.w.max(1));
    let ih = f64::from(content.h.max(1));
    let cw = f64::from(bounds.w.max(1));
    let ch = f64::from(bounds.h.max(1));
    let zoom = (cw / iw).min(ch / ih);
    if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 }
}

/// Nearest-neighbour source index for destination pixel `d` along one axis.
#[inline]
pub fn nearest(d: u32, src_len: u32, dst_len: u32) -> u32 {
    if src_len == 0 || dst_len == 0 {
        return 0;
    }
    let s = (u64::from(d) * 2 + 1) * u64::from(src_len) / (u64::from(dst_len) * 2);
    (s as u32).min(src_len - 1)
}

pub fn center_offset(inner: Size, outer: Size) -> (u32, u32) {
    let ox = outer.w.saturating_sub(inner.w) / 2;
    let oy = outer.h.saturating_sub(inner.h) / 2;
    (ox, oy)
}
