//! Grid drawing shared by the block games.

use crate::graphics::{Color, Renderer2d};
use crate::ui::Rect;

pub const COLOR_BACKGROUND: Color = [26, 26, 46, 255];
const COLOR_BOARD_OUTLINE: Color = [60, 60, 84, 255];
const COLOR_GRID_DOT: Color = [40, 40, 62, 255];

pub const CELL_SNAKE_ONE: u8 = 8;
pub const CELL_SNAKE_TWO: u8 = 9;
pub const CELL_FOOD: u8 = 10;
pub const CELL_DEAD: u8 = 11;

/// Stable palette: 1-7 are the tetromino kinds, 8-11 the snake board labels.
pub fn color_for_cell(cell: u8) -> Color {
    match cell {
        0 => COLOR_BACKGROUND,
        1 => [0, 229, 255, 255],
        2 => [255, 215, 0, 255],
        3 => [186, 85, 211, 255],
        4 => [0, 200, 0, 255],
        5 => [220, 20, 60, 255],
        6 => [30, 144, 255, 255],
        7 => [255, 140, 0, 255],
        CELL_SNAKE_ONE => [134, 239, 172, 255],
        CELL_SNAKE_TWO => [147, 197, 253, 255],
        CELL_FOOD => [252, 165, 165, 255],
        CELL_DEAD => [110, 110, 120, 255],
        _ => [255, 255, 255, 255],
    }
}

/// Pixel rect a grid of `cols` x `rows` cells occupies when centred in `area`.
pub fn grid_rect(area: Rect, cols: usize, rows: usize, cell_size: u32) -> Rect {
    let w = cols as u32 * cell_size;
    let h = rows as u32 * cell_size;
    Rect::new(
        area.x + area.w.saturating_sub(w) / 2,
        area.y + area.h.saturating_sub(h) / 2,
        w,
        h,
    )
}

/// Draws `cells` (row 0 at the top) centred in `area` and returns the board rect.
///
/// Occupied cells leave a one pixel gap so neighbouring blocks stay distinguishable.
pub fn draw_grid<R: AsRef<[u8]>>(
    gfx: &mut dyn Renderer2d,
    area: Rect,
    cells: &[R],
    cell_size: u32,
) -> Rect {
    let rows = cells.len();
    let cols = cells.first().map(|row| row.as_ref().len()).unwrap_or(0);
    let board = grid_rect(area, cols, rows, cell_size);

    gfx.fill_rect(board, COLOR_BACKGROUND);
    if board.x > 0 && board.y > 0 {
        gfx.rect_outline(
            Rect::new(board.x - 1, board.y - 1, board.w + 2, board.h + 2),
            COLOR_BOARD_OUTLINE,
        );
    }

    for (y, row) in cells.iter().enumerate() {
        for (x, &cell) in row.as_ref().iter().enumerate() {
            let px = board.x + x as u32 * cell_size;
            let py = board.y + y as u32 * cell_size;
            if cell == 0 {
                let dot = (cell_size / 8).max(1);
                let off = (cell_size - dot) / 2;
                gfx.fill_rect(Rect::new(px + off, py + off, dot, dot), COLOR_GRID_DOT);
            } else {
                let inner = cell_size.saturating_sub(1).max(1);
                gfx.fill_rect(Rect::new(px, py, inner, inner), color_for_cell(cell));
            }
        }
    }

    board
}
