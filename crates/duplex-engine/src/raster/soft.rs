use crate::coords::{Color8, PixelPoint, PixelRect};
use crate::error::{RenderError, Result};

use super::{BlendMode, Rasterizer, SurfaceMut};

/// Straightforward per-pixel rasterizer.
#[derive(Debug, Default, Copy, Clone)]
pub struct SoftRasterizer;

impl SoftRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for SoftRasterizer {
    fn draw_points(
        &mut self,
        surface: &mut SurfaceMut<'_>,
        points: &[PixelPoint],
        color: Color8,
        blend: BlendMode,
    ) -> Result<()> {
        check_format(surface)?;
        for &p in points {
            plot(surface, p, color, blend);
        }
        Ok(())
    }

    fn draw_lines(
        &mut self,
        surface: &mut SurfaceMut<'_>,
        points: &[PixelPoint],
        color: Color8,
        blend: BlendMode,
    ) -> Result<()> {
        check_format(surface)?;
        match points {
            [] => {}
            [p] => plot(surface, *p, color, blend),
            _ => {
                for (i, seg) in points.windows(2).enumerate() {
                    // Shared endpoints are plotted once so blended joints don't double up.
                    line(surface, seg[0], seg[1], i > 0, color, blend);
                }
            }
        }
        Ok(())
    }

    fn fill_rects(
        &mut self,
        surface: &mut SurfaceMut<'_>,
        rects: &[PixelRect],
        color: Color8,
        blend: BlendMode,
    ) -> Result<()> {
        check_format(surface)?;
        for &r in rects {
            let Some(r) = r.intersect(surface.clip) else { continue };
            for y in r.y..r.bottom() {
                for x in r.x..r.right() {
                    put(surface, x as u32, y as u32, color, blend);
                }
            }
        }
        Ok(())
    }
}

fn check_format(surface: &SurfaceMut<'_>) -> Result<()> {
    if surface.format.masks().is_none() {
        return Err(RenderError::UnsupportedFormat {
            format: surface.format,
            reason: "primitives require a direct-color target",
        });
    }
    let needed = surface.pitch as usize * surface.height as usize;
    if surface.pixels.len() < needed {
        return Err(RenderError::BufferTooSmall { needed, actual: surface.pixels.len() });
    }
    Ok(())
}

fn line(surface: &mut SurfaceMut<'_>, a: PixelPoint, b: PixelPoint, skip_first: bool, color: Color8, blend: BlendMode) {
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };

    let (mut x, mut y) = (a.x, a.y);
    let mut err = dx + dy;
    let mut first = true;

    loop {
        if !(first && skip_first) {
            plot(surface, PixelPoint::new(x, y), color, blend);
        }
        first = false;

        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[inline]
fn plot(surface: &mut SurfaceMut<'_>, p: PixelPoint, color: Color8, blend: BlendMode) {
    if surface.clip.contains(p) {
        put(surface, p.x as u32, p.y as u32, color, blend);
    }
}

/// Writes one pixel; the caller has already clipped.
fn put(surface: &mut SurfaceMut<'_>, x: u32, y: u32, color: Color8, blend: BlendMode) {
    let format = surface.format;
    let bpp = format.bytes_per_pixel() as usize;
    let at = y as usize * surface.pitch as usize + x as usize * bpp;
    let bytes = &mut surface.pixels[at..at + bpp];

    let out = match blend {
        BlendMode::None => color,
        _ => blend_pixel(color, format.unpack(format.read(bytes)), blend),
    };
    format.write(bytes, format.map_rgba(out));
}

fn blend_pixel(src: Color8, dst: Color8, mode: BlendMode) -> Color8 {
    let sa = src.a as u32;
    let mul = |a: u8, b: u32| (a as u32 * b + 127) / 255;

    match mode {
        BlendMode::None => src,
        BlendMode::Blend => {
            let inv = 255 - sa;
            let ch = |s: u8, d: u8| (mul(s, sa) + mul(d, inv)) as u8;
            Color8 {
                r: ch(src.r, dst.r),
                g: ch(src.g, dst.g),
                b: ch(src.b, dst.b),
                a: (sa + mul(dst.a, inv)) as u8,
            }
        }
        BlendMode::Add => {
            let ch = |s: u8, d: u8| (mul(s, sa) + d as u32).min(255) as u8;
            Color8 {
                r: ch(src.r, dst.r),
                g: ch(src.g, dst.g),
                b: ch(src.b, dst.b),
                a: dst.a,
            }
        }
        BlendMode::Mod => {
            let ch = |s: u8, d: u8| mul(s, d as u32) as u8;
            Color8 {
                r: ch(src.r, dst.r),
                g: ch(src.g, dst.g),
                b: ch(src.b, dst.b),
                a: dst.a,
            }
        }
    }
}
