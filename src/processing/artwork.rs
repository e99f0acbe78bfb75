use std::path::Path;

use anyhow::Context;
use fast_image_resize as fir;
use image::{ImageReader, RgbaImage};
use tracing::debug;

use crate::error::BezelError;

/// Decode bezel artwork into RGBA8, sniffing the format from content.
pub fn decode_artwork(path: &Path) -> Result<RgbaImage, BezelError> {
    let decode_err = |source| BezelError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(decode_err)?
        .to_rgba8();
    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "decoded bezel artwork"
    );
    Ok(img)
}

/// Resample `source` to `target_w`×`target_h` with a CatmullRom convolution.
pub fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> anyhow::Result<RgbaImage> {
    if target_w == 0 || target_h == 0 {
        anyhow::bail!("resize dimensions must be positive");
    }
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("failed to create source view for artwork resize")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("artwork resize failed")?;
    let buffer = dst_image.into_vec();
    RgbaImage::from_raw(target_w, target_h, buffer)
        .ok_or_else(|| anyhow::anyhow!("failed to construct resized RGBA image"))
}

/// Composite `img` over opaque black in place.
pub fn flatten_over_black(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = u16::from(px[3]);
        for c in 0..3 {
            px[c] = ((u16::from(px[c]) * a + 127) / 255) as u8;
        }
        px[3] = u8::MAX;
    }
}
