use crate::{surface::SurfaceSize, ui::Rect};

pub type Color = [u8; 4];

// 3x5 block font, scaled up by an integer factor.
pub const DEFAULT_TEXT_SCALE: u32 = 2;
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

fn glyph_advance_x(scale: u32) -> u32 {
    (GLYPH_W + 1) * scale.max(1)
}

fn line_advance_y(scale: u32) -> u32 {
    (GLYPH_H + 1) * scale.max(1)
}

/// Width in pixels of the longest line of `text` at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.lines()
        .map(|line| line.chars().count() as u32)
        .max()
        .unwrap_or(0)
        .saturating_mul(glyph_advance_x(scale))
        .saturating_sub(scale.max(1))
}

pub fn text_height(text: &str, scale: u32) -> u32 {
    let lines = text.lines().count().max(1) as u32;
    lines
        .saturating_mul(line_advance_y(scale))
        .saturating_sub(scale.max(1))
}

/// Drawing interface shared by every game screen.
///
/// Games only talk to this trait; whether pixels end up in a window or a test buffer is the
/// caller's business.
pub trait Renderer2d {
    fn begin_frame(&mut self, size: SurfaceSize);
    fn size(&self) -> SurfaceSize;

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Alpha-blended rect over existing content (alpha is applied to `color`'s RGB).
    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8);

    fn rect_outline(&mut self, rect: Rect, color: Color);

    /// Filled disc centred on `(cx, cy)`. Pixels whose centre lies within `radius` are painted.
    fn fill_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Color);

    fn draw_text_scaled(&mut self, x: u32, y: u32, text: &str, color: Color, scale: u32);

    fn draw_text(&mut self, x: u32, y: u32, text: &str, color: Color) {
        self.draw_text_scaled(x, y, text, color, DEFAULT_TEXT_SCALE);
    }

    /// Draws `text` horizontally centred inside `area`, starting at `y`.
    fn draw_text_centered(&mut self, area: Rect, y: u32, text: &str, color: Color, scale: u32) {
        let w = text_width(text, scale);
        let x = area.x.saturating_add(area.w.saturating_sub(w) / 2);
        self.draw_text_scaled(x, y, text, color, scale);
    }

    fn clear(&mut self, color: Color) {
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
    }
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self { frame, size }
    }

    /// Clips `rect` to the surface and calls `f` with each row's byte slice.
    fn for_each_row(&mut self, rect: Rect, mut f: impl FnMut(&mut [u8])) {
        let width = self.size.width;
        let max_x = rect.x.saturating_add(rect.w).min(width);
        let max_y = rect.y.saturating_add(rect.h).min(self.size.height);
        if rect.x >= max_x || rect.y >= max_y || self.frame.len() < self.size.rgba_len() {
            return;
        }

        let stride = width as usize * 4;
        let row_bytes = (max_x - rect.x) as usize * 4;
        for y in rect.y..max_y {
            let start = y as usize * stride + rect.x as usize * 4;
            f(&mut self.frame[start..start + row_bytes]);
        }
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let idx = (y as usize * self.size.width as usize + x as usize) * 4;
        if let Some(px) = self.frame.get_mut(idx..idx + 4) {
            px.copy_from_slice(&color);
        }
    }

    fn draw_char(&mut self, x: u32, y: u32, ch: char, color: Color, scale: u32) {
        let bits = glyph_bits(ch);
        for row in 0..GLYPH_H {
            for col in 0..GLYPH_W {
                let shift = (GLYPH_H - 1 - row) * GLYPH_W + (GLYPH_W - 1 - col);
                if bits & (1 << shift) == 0 {
                    continue;
                }
                let px = x.saturating_add(col * scale);
                let py = y.saturating_add(row * scale);
                self.fill_rect(Rect::new(px, py, scale, scale), color);
            }
        }
    }
}

impl Renderer2d for CpuRenderer<'_> {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.for_each_row(rect, |row| {
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&color);
            }
        });
    }

    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        match alpha {
            0 => return,
            255 => return self.fill_rect(rect, color),
            _ => {}
        }

        let a = u32::from(alpha);
        let inv = 255 - a;
        self.for_each_row(rect, |row| {
            for px in row.chunks_exact_mut(4) {
                for c in 0..3 {
                    px[c] = ((u32::from(px[c]) * inv + u32::from(color[c]) * a + 127) / 255) as u8;
                }
                px[3] = 255;
            }
        });
    }

    fn rect_outline(&mut self, rect: Rect, color: Color) {
        if rect.w == 0 || rect.h == 0 {
            return;
        }
        let right = rect.x + rect.w - 1;
        let bottom = rect.y + rect.h - 1;
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, 1), color);
        self.fill_rect(Rect::new(rect.x, bottom, rect.w, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.y, 1, rect.h), color);
        self.fill_rect(Rect::new(right, rect.y, 1, rect.h), color);
    }

    fn fill_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Color) {
        let r = radius as i32;
        let r2 = i64::from(r) * i64::from(r);
        for dy in -r..=r {
            let y = cy + dy;
            if y < 0 {
                continue;
            }
            for dx in -r..=r {
                let x = cx + dx;
                if x < 0 {
                    continue;
                }
                if i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy) <= r2 {
                    self.set_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    fn draw_text_scaled(&mut self, x: u32, y: u32, text: &str, color: Color, scale: u32) {
        let scale = scale.max(1);
        let mut cursor_y = y;
        for line in text.lines() {
            if cursor_y >= self.size.height {
                break;
            }
            let mut cursor_x = x;
            for ch in line.chars() {
                if cursor_x >= self.size.width {
                    break;
                }
                if ch != ' ' {
                    self.draw_char(cursor_x, cursor_y, ch, color, scale);
                }
                cursor_x = cursor_x.saturating_add(glyph_advance_x(scale));
            }
            cursor_y = cursor_y.saturating_add(line_advance_y(scale));
        }
    }
}

/// 15-bit glyph bitmaps, top row in the high bits.
fn glyph_bits(ch: char) -> u16 {
    match ch.to_ascii_uppercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_001_001_001,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b010_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b111_100_100_100_111,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_111_100_111,
        'F' => 0b111_100_111_100_100,
        'G' => 0b111_100_101_101_111,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b111_001_001_101_010,
        'K' => 0b101_110_100_110_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101,
        'N' => 0b101_111_111_111_101,
        'O' => 0b111_101_101_101_111,
        'P' => 0b111_101_111_100_100,
        'Q' => 0b111_101_101_111_001,
        'R' => 0b111_101_111_110_101,
        'S' => 0b111_100_111_001_111,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_111_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '.' => 0b000_000_000_000_010,
        ',' => 0b000_000_000_010_100,
        ':' => 0b000_010_000_010_000,
        '-' => 0b000_000_111_000_000,
        '+' => 0b000_010_111_010_000,
        '/' => 0b001_001_010_100_100,
        '(' => 0b010_100_100_100_010,
        ')' => 0b010_001_001_001_010,
        '!' => 0b010_010_010_000_010,
        '\'' => 0b010_010_000_000_000,
        '>' => 0b100_010_001_010_100,
        '<' => 0b001_010_100_010_001,
        _ => 0b111_001_010_000_010,
    }
}
