//! Minimal layout primitives for popup screens.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x
            && px < self.x.saturating_add(self.w)
            && py >= self.y
            && py < self.y.saturating_add(self.h)
    }

    /// Shrinks the rect by `pad` on every side, saturating at zero size.
    pub fn inset(&self, pad: u32) -> Self {
        Self {
            x: self.x.saturating_add(pad),
            y: self.y.saturating_add(pad),
            w: self.w.saturating_sub(pad.saturating_mul(2)),
            h: self.h.saturating_sub(pad.saturating_mul(2)),
        }
    }

    /// Places a `w` x `h` child inside this rect. The child is clamped to fit.
    pub fn place(&self, w: u32, h: u32, anchor: Anchor) -> Self {
        let w = w.min(self.w);
        let h = h.min(self.h);
        let cx = self.x + (self.w - w) / 2;
        let (x, y) = match anchor {
            Anchor::TopCenter => (cx, self.y),
            Anchor::Center => (cx, self.y + (self.h - h) / 2),
            Anchor::BottomCenter => (cx, self.y + (self.h - h)),
        };
        Self { x, y, w, h }
    }

    /// Splits off a strip of `h` pixels from the top, returning `(strip, rest)`.
    pub fn split_top(&self, h: u32) -> (Self, Self) {
        let h = h.min(self.h);
        (
            Self::new(self.x, self.y, self.w, h),
            Self::new(self.x, self.y + h, self.w, self.h - h),
        )
    }

    /// Lays out `count` rows of height `row_h` from the top, separated by `gap`.
    pub fn stack_rows(&self, count: usize, row_h: u32, gap: u32) -> Vec<Rect> {
        (0..count as u32)
            .map(|i| Rect::new(self.x, self.y + i * (row_h + gap), self.w, row_h))
            .take_while(|row| row.y.saturating_add(row.h) <= self.y.saturating_add(self.h))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopCenter,
    Center,
    BottomCenter,
}
