use crate::graphics::{CpuRenderer, Renderer2d};
use crate::surface::SurfaceSize;

use pixels::Pixels;

/// Windowed renderer built on `pixels`.
///
/// The frame buffer keeps a fixed logical size; `pixels` scales it onto whatever the window
/// surface currently is, so game layouts never have to care about resizes.
pub struct PixelsRenderer2d {
    pixels: Pixels,
    logical: SurfaceSize,
}

impl PixelsRenderer2d {
    pub fn new(mut pixels: Pixels, logical: SurfaceSize) -> Result<Self, pixels::Error> {
        pixels.resize_buffer(logical.width, logical.height)?;
        Ok(Self { pixels, logical })
    }

    pub fn size(&self) -> SurfaceSize {
        self.logical
    }

    /// Resizes the window surface; the logical buffer is untouched.
    pub fn resize_surface(&mut self, window: SurfaceSize) -> Result<(), pixels::Error> {
        if window.is_empty() {
            return Ok(());
        }
        self.pixels.resize_surface(window.width, window.height)?;
        Ok(())
    }

    /// Maps a physical window position to logical buffer coordinates.
    pub fn window_to_logical(&self, x: f32, y: f32) -> Option<(u32, u32)> {
        self.pixels
            .window_pos_to_pixel((x, y))
            .ok()
            .map(|(px, py)| (px as u32, py as u32))
    }

    pub fn draw_frame<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut dyn Renderer2d) -> R,
    {
        let mut cpu = CpuRenderer::new(self.pixels.frame_mut(), self.logical);
        cpu.begin_frame(self.logical);
        f(&mut cpu)
    }

    pub fn present(&mut self) -> Result<(), pixels::Error> {
        self.pixels.render()
    }
}
