//! Pixel format conversion and tile extraction

use mupdf::{Colorspace, DisplayList, Matrix};

use crate::protocol::{EngineError, TileRect};

/// Tightly packed RGBA raster, 4 bytes per pixel, no row padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Rasterize a display list at a pure scale transform into packed RGBA.
///
/// The native rasterizer draws into a BGR-oriented pixmap with alpha; the
/// transient pixmap is converted row by row and dropped before returning.
pub fn rasterize_rgba(list: &DisplayList, scale: f32) -> Result<RgbaBuffer, EngineError> {
    let ctm = Matrix::new_scale(scale, scale);
    let pixmap = list.to_pixmap(&ctm, &Colorspace::device_bgr(), true)?;

    let width = pixmap.width();
    let height = pixmap.height();
    let pixels = repack_rgba(
        pixmap.samples(),
        width,
        height,
        pixmap.stride() as usize,
        pixmap.n() as usize,
    )?;

    Ok(RgbaBuffer {
        width,
        height,
        pixels,
    })
}

/// Remap a raw raster into tightly packed RGBA.
///
/// `components` selects the source layout: 4 is BGRA, 3 is BGR with full
/// opacity, fewer is treated as gray replicated across the channels. Rows
/// are read at `stride` byte intervals, which may exceed
/// `width * components` due to alignment padding.
pub fn repack_rgba(
    samples: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    components: usize,
) -> Result<Vec<u8>, EngineError> {
    let width = width as usize;
    let height = height as usize;

    if components == 0 {
        return Err(EngineError::Internal {
            detail: "pixmap has zero components".into(),
        });
    }
    let row_bytes = width * components;
    if row_bytes > stride || samples.len() < stride.saturating_mul(height) {
        return Err(EngineError::Internal {
            detail: "pixmap buffer size mismatch".into(),
        });
    }

    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        match components {
            4 => {
                for px in row.chunks_exact(4) {
                    out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
            3 => {
                for px in row.chunks_exact(3) {
                    out.extend_from_slice(&[px[2], px[1], px[0], 0xFF]);
                }
            }
            n => {
                for px in row.chunks_exact(n) {
                    out.extend_from_slice(&[px[0], px[0], px[0], 0xFF]);
                }
            }
        }
    }

    Ok(out)
}

/// Copy an axis-aligned sub-rectangle out of a packed RGBA buffer.
///
/// The rectangle is clamped to the buffer bounds; an empty intersection
/// yields a zero-sized buffer rather than an error. The stated height is
/// additionally capped by the complete rows `pixels` actually holds, so
/// extraction never reads past the end of an under-sized buffer.
#[must_use]
pub fn extract_tile(full: &RgbaBuffer, rect: TileRect) -> RgbaBuffer {
    let stride = full.width as usize * 4;
    let usable_rows = if stride == 0 {
        0
    } else {
        (full.pixels.len() / stride).min(full.height as usize)
    };

    let x0 = i64::from(rect.x).clamp(0, i64::from(full.width));
    let y0 = i64::from(rect.y).clamp(0, usable_rows as i64);
    let x1 = (i64::from(rect.x) + i64::from(rect.width)).clamp(x0, i64::from(full.width));
    let y1 = (i64::from(rect.y) + i64::from(rect.height)).clamp(y0, usable_rows as i64);

    let width = (x1 - x0) as usize;
    let height = (y1 - y0) as usize;
    if width == 0 || height == 0 {
        return RgbaBuffer {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
    }

    let row_bytes = width * 4;
    let mut pixels = Vec::with_capacity(row_bytes * height);
    for y in y0 as usize..y1 as usize {
        let start = y * stride + x0 as usize * 4;
        pixels.extend_from_slice(&full.pixels[start..start + row_bytes]);
    }

    RgbaBuffer {
        width: width as u32,
        height: height as u32,
        pixels,
    }
}

/// Encode a packed RGBA buffer as PNG bytes.
pub fn encode_png(image: RgbaBuffer) -> Result<Vec<u8>, EngineError> {
    let raster = image::RgbaImage::from_raw(image.width, image.height, image.pixels).ok_or(
        EngineError::Internal {
            detail: "rgba buffer does not match its dimensions".into(),
        },
    )?;

    let mut png = Vec::new();
    raster.write_to(
        &mut std::io::Cursor::new(&mut png),
        image::ImageFormat::Png,
    )?;
    Ok(png)
}
