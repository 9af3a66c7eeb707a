use super::PixelRect;

/// Host window size in pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Resolves the effective viewport for a drawable of `drawable` size.
///
/// - A viewport with zero width and height means "whole drawable".
/// - When the drawable is wider (taller) than the window, the offset is moved right
///   (down) by half the excess so the window's region sits in the middle of the buffer.
///
/// The result is derived from `requested` alone; calling this repeatedly with the same
/// input yields the same viewport.
pub fn centered_viewport(
    requested: PixelRect,
    drawable: WindowSize,
    window: Option<WindowSize>,
) -> PixelRect {
    let mut vp = requested;

    if vp.w == 0 && vp.h == 0 {
        vp.w = drawable.width as i32;
        vp.h = drawable.height as i32;
    }

    if let Some(win) = window {
        if drawable.width > win.width {
            vp.x += ((drawable.width - win.width) / 2) as i32;
        }
        if drawable.height > win.height {
            vp.y += ((drawable.height - win.height) / 2) as i32;
        }
    }

    vp
}
