//! RGBA to luminance conversion for the decode path
//!
//! Y = 0.299*R + 0.587*G + 0.114*B, computed with fast integer
//! arithmetic: Y = (76*R + 150*G + 29*B) >> 8. Alpha is ignored.
//!
//! Small frames take an unrolled scalar path; frames at roughly 1080p
//! and above are converted row-parallel with rayon.

use rayon::prelude::*;

/// Coefficients for luminance conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Pixel count at which the parallel path starts paying for itself.
const PARALLEL_MIN_PIXELS: usize = 1 << 20;

#[inline(always)]
fn luma_of(px: &[u8]) -> u8 {
    let y = (COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32) >> 8;
    y.min(255) as u8
}

/// Convert a packed RGBA buffer to luminance, selecting the conversion
/// path by frame size.
pub fn rgba_to_luma(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    rgba_to_luma_into(rgba, width, height, &mut out);
    out
}

/// Convert into a caller-provided buffer, resizing it to `width * height`.
///
/// Reusing one buffer across frames keeps the per-tick decode path free
/// of allocations.
///
/// # Panics
///
/// Panics when `rgba.len() != width * height * 4`.
pub fn rgba_to_luma_into(rgba: &[u8], width: usize, height: usize, out: &mut Vec<u8>) {
    let pixel_count = width * height;
    assert_eq!(rgba.len(), pixel_count * 4, "RGBA buffer size mismatch");
    out.resize(pixel_count, 0);

    if pixel_count >= PARALLEL_MIN_PIXELS && width > 0 {
        rgba_to_luma_parallel(rgba, width, out);
    } else {
        rgba_to_luma_scalar(rgba, out);
    }
}

/// Scalar path with 8x unrolling. The chunk bound check is hoisted by
/// `chunks_exact`, so the inner loop is branch-free per pixel.
fn rgba_to_luma_scalar(rgba: &[u8], out: &mut [u8]) {
    let mut src = rgba.chunks_exact(32);
    let mut dst = out.chunks_exact_mut(8);
    for (block, gray) in src.by_ref().zip(dst.by_ref()) {
        for j in 0..8 {
            gray[j] = luma_of(&block[j * 4..j * 4 + 4]);
        }
    }

    // Remaining pixels
    for (px, gray) in src
        .remainder()
        .chunks_exact(4)
        .zip(dst.into_remainder().iter_mut())
    {
        *gray = luma_of(px);
    }
}

/// Row-parallel path for large frames.
fn rgba_to_luma_parallel(rgba: &[u8], width: usize, out: &mut [u8]) {
    out.par_chunks_mut(width)
        .zip(rgba.par_chunks(width * 4))
        .for_each(|(row_out, row_in)| {
            for (px, gray) in row_in.chunks_exact(4).zip(row_out.iter_mut()) {
                *gray = luma_of(px);
            }
        });
}
