//! The demo frame: a clear, a few primitives and a scaled texture copy per frame.

use duplex_engine::coords::{Color8, PixelRect, Rect, Vec2};
use duplex_engine::format::PixelFormat;
use duplex_engine::raster::BlendMode;
use duplex_engine::renderer::{Renderer, TextureId};

const BACKGROUND: Color8 = Color8::new(18, 22, 30, 255);
const CHECKER_SIZE: u32 = 8;

#[derive(Debug, Default)]
pub struct DemoScene {
    checker: Option<TextureId>,
    frame: u64,
}

impl DemoScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Draws one frame into the current drawable. The caller presents it.
    pub fn draw<R: Renderer>(&mut self, r: &mut R, width: f32, height: f32) -> duplex_engine::Result<()> {
        let checker = match self.checker {
            Some(id) => id,
            None => {
                let id = create_checker(r)?;
                self.checker = Some(id);
                id
            }
        };

        let t = self.frame as f32 / 60.0;
        self.frame += 1;

        r.set_draw_blend_mode(BlendMode::None);
        r.set_draw_color(BACKGROUND);
        r.clear()?;

        // Scaled copy, breathing between 4x and 12x.
        let scale = 8.0 + 4.0 * t.sin();
        let side = CHECKER_SIZE as f32 * scale;
        r.copy(
            checker,
            PixelRect::sized(CHECKER_SIZE, CHECKER_SIZE),
            Rect::new((width - side) * 0.5, (height - side) * 0.5, side, side),
        )?;

        // Translucent bars sweeping across.
        r.set_draw_blend_mode(BlendMode::Blend);
        r.set_draw_color(Color8::new(255, 140, 40, 160));
        let x = (t * 90.0) % width;
        r.fill_rects(&[
            Rect::new(x, 12.0, 24.0, height - 24.0),
            Rect::new(width - x - 24.0, 12.0, 24.0, height - 24.0),
        ])?;

        r.set_draw_blend_mode(BlendMode::Add);
        r.set_draw_color(Color8::new(40, 200, 255, 255));
        let (cx, cy) = (width * 0.5, height * 0.5);
        let radius = height * 0.45;
        let star: Vec<Vec2> = (0..=5)
            .map(|i| {
                let a = t + i as f32 * std::f32::consts::TAU * 2.0 / 5.0;
                Vec2::new(cx + radius * a.cos(), cy + radius * a.sin())
            })
            .collect();
        r.draw_lines(&star)?;

        r.set_draw_blend_mode(BlendMode::None);
        r.set_draw_color(Color8::white());
        r.draw_points(&[
            Vec2::new(2.0, 2.0),
            Vec2::new(width - 3.0, 2.0),
            Vec2::new(2.0, height - 3.0),
            Vec2::new(width - 3.0, height - 3.0),
        ])?;

        Ok(())
    }
}

fn create_checker<R: Renderer>(r: &mut R) -> duplex_engine::Result<TextureId> {
    let id = r.create_texture(PixelFormat::Argb8888, CHECKER_SIZE, CHECKER_SIZE)?;
    let light = PixelFormat::Argb8888.map_rgba(Color8::new(230, 230, 235, 255));
    let dark = PixelFormat::Argb8888.map_rgba(Color8::new(70, 80, 160, 255));

    let lock = r.lock_texture(id, PixelRect::sized(CHECKER_SIZE, CHECKER_SIZE))?;
    for y in 0..CHECKER_SIZE as usize {
        for x in 0..CHECKER_SIZE as usize {
            let px = if (x + y) % 2 == 0 { light } else { dark };
            let at = y * lock.pitch as usize + x * 4;
            lock.pixels[at..at + 4].copy_from_slice(&px.to_le_bytes());
        }
    }
    Ok(id)
}
