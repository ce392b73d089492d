// ============================================================================
// IMAGE FILTERS — grayscale
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

/// Luma of one pixel: `floor(0.299 R + 0.587 G + 0.114 B)`.
///
/// Integer weights keep the result an exact floor, so a gray pixel maps to
/// itself and the filter is idempotent.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Convert the image to grayscale in place. Alpha is left unchanged.
pub fn grayscale(image: &mut RgbaImage) {
    let stride = image.width() as usize * 4;
    if stride == 0 {
        return;
    }
    // Parallel by row.
    image.par_chunks_mut(stride).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let lum = luma(px[0], px[1], px[2]);
            px[0] = lum;
            px[1] = lum;
            px[2] = lum;
        }
    });
}
