//! Popup screens, drawn through `Renderer2d` only.

use engine::graphics::{Color, Renderer2d, text_height};
use engine::render::draw_grid;
use engine::surface::SurfaceSize;
use engine::ui::{Anchor, Rect};

use crate::flappy::{self, FlappyState};
use crate::game_2048::{SIZE as TILES, State2048};
use crate::session::{HighScores, Session};
use crate::snake::SnakeState;
use crate::tetris_core::TetrisState;
use crate::view::{GameKind, PopupView};

pub const POPUP_SIZE: SurfaceSize = SurfaceSize::new(420, 650);

const HEADER_H: u32 = 56;
const HUD_H: u32 = 36;
const BUTTON_H: u32 = 52;
const BUTTON_GAP: u32 = 14;

const COLOR_PANEL: Color = [243, 240, 255, 255];
const COLOR_HEADER: Color = [221, 214, 254, 255];
const COLOR_TEXT: Color = [31, 41, 55, 255];
const COLOR_MUTED: Color = [107, 114, 128, 255];
const COLOR_CLOSE: Color = [239, 68, 68, 255];
const COLOR_WHITE: Color = [255, 255, 255, 255];
const COLOR_OVERLAY: Color = [0, 0, 0, 255];

const COLOR_SKY: Color = [135, 206, 235, 255];
const COLOR_PIPE: Color = [34, 139, 34, 255];
const COLOR_BIRD: Color = [255, 215, 0, 255];

const COLOR_BOARD_2048: Color = [156, 163, 175, 255];

fn button_color(kind: GameKind) -> Color {
    match kind {
        GameKind::Snake => [187, 247, 208, 255],
        GameKind::SnakeDuo => [167, 243, 208, 255],
        GameKind::Flappy => [191, 219, 254, 255],
        GameKind::Game2048 => [254, 240, 138, 255],
        GameKind::Tetris => [233, 213, 255, 255],
    }
}

/// Tile colours keyed by value, light to saturated.
pub fn tile_color(value: u32) -> Color {
    match value {
        0 => [229, 231, 235, 255],
        2 => [254, 249, 195, 255],
        4 => [254, 240, 138, 255],
        8 => [254, 215, 170, 255],
        16 => [253, 186, 116, 255],
        32 => [254, 202, 202, 255],
        64 => [252, 165, 165, 255],
        128 => [253, 224, 71, 255],
        256 => [250, 204, 21, 255],
        512 => [249, 168, 212, 255],
        1024 => [244, 114, 182, 255],
        2048 => [216, 180, 254, 255],
        _ => [192, 132, 252, 255],
    }
}

/// Clickable regions of the popup.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub home: Rect,
    pub close: Rect,
    pub content: Rect,
    pub menu: Vec<(GameKind, Rect)>,
    pub start: Rect,
}

impl Layout {
    pub fn new(size: SurfaceSize) -> Self {
        let full = Rect::from_size(size.width, size.height);
        let (header, content) = full.split_top(HEADER_H);
        let home = Rect::new(header.x + 12, header.y + 12, 40, 32);
        let close = Rect::new(header.x + header.w.saturating_sub(52), header.y + 12, 40, 32);

        let list_h = GameKind::ALL.len() as u32 * (BUTTON_H + BUTTON_GAP);
        let list = content.inset(24).place(content.w.saturating_sub(64), list_h, Anchor::Center);
        let menu = GameKind::ALL
            .into_iter()
            .zip(list.stack_rows(GameKind::ALL.len(), BUTTON_H, BUTTON_GAP))
            .collect();

        let start = content.inset(24).place(200, BUTTON_H, Anchor::BottomCenter);

        Self {
            home,
            close,
            content,
            menu,
            start,
        }
    }

    pub fn menu_hit(&self, x: u32, y: u32) -> Option<GameKind> {
        self.menu
            .iter()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(kind, _)| *kind)
    }

    /// Area left for the board once the score line is taken off the top.
    pub fn board_area(&self) -> Rect {
        let (_, rest) = self.content.split_top(HUD_H);
        let (board, _) = rest.split_top(rest.h.saturating_sub(BUTTON_H + 24));
        board
    }
}

fn button(gfx: &mut dyn Renderer2d, rect: Rect, label: &str, fill: Color) {
    gfx.fill_rect(rect, fill);
    gfx.rect_outline(rect, COLOR_MUTED);
    let y = rect.y + rect.h.saturating_sub(text_height(label, 2)) / 2;
    gfx.draw_text_centered(rect, y, label, COLOR_TEXT, 2);
}

pub fn draw_popup(
    gfx: &mut dyn Renderer2d,
    layout: &Layout,
    view: PopupView,
    session: Option<&Session>,
    scores: &HighScores,
) {
    gfx.clear(COLOR_PANEL);
    draw_header(gfx, layout, view);

    match view {
        PopupView::Menu => draw_menu(gfx, layout),
        PopupView::Ready(kind) => draw_ready(gfx, layout, kind, scores),
        PopupView::Playing(kind) | PopupView::GameOver(kind) => {
            if let Some(session) = session {
                draw_session(gfx, layout, session, scores);
            }
            if matches!(view, PopupView::GameOver(_)) {
                draw_game_over(gfx, layout, kind, session);
            }
        }
    }
}

fn draw_header(gfx: &mut dyn Renderer2d, layout: &Layout, view: PopupView) {
    let size = gfx.size();
    gfx.fill_rect(Rect::new(0, 0, size.width, HEADER_H), COLOR_HEADER);
    if view != PopupView::Menu {
        button(gfx, layout.home, "<", COLOR_WHITE);
    }
    button(gfx, layout.close, "X", COLOR_CLOSE);
    let title = match view.game() {
        Some(kind) => kind.label(),
        None => "BREAK TIME",
    };
    gfx.draw_text_centered(Rect::new(0, 0, size.width, HEADER_H), 20, title, COLOR_TEXT, 3);
}

fn draw_menu(gfx: &mut dyn Renderer2d, layout: &Layout) {
    if let Some((_, first)) = layout.menu.first() {
        gfx.draw_text_centered(
            layout.content,
            first.y.saturating_sub(32),
            "PICK A GAME",
            COLOR_MUTED,
            2,
        );
    }
    for (i, (kind, rect)) in layout.menu.iter().enumerate() {
        let label = format!("{} {}", i + 1, kind.label());
        button(gfx, *rect, &label, button_color(*kind));
    }
}

fn draw_ready(gfx: &mut dyn Renderer2d, layout: &Layout, kind: GameKind, scores: &HighScores) {
    let mid = layout.content.y + layout.content.h / 3;
    gfx.draw_text_centered(layout.content, mid, kind.label(), COLOR_TEXT, 4);
    gfx.draw_text_centered(layout.content, mid + 48, kind.controls_hint(), COLOR_MUTED, 2);
    let best = format!("BEST {}", scores.best(kind));
    gfx.draw_text_centered(layout.content, mid + 80, &best, COLOR_MUTED, 2);
    button(gfx, layout.start, "START", button_color(kind));
}

fn draw_hud(gfx: &mut dyn Renderer2d, layout: &Layout, session: &Session, scores: &HighScores) {
    let kind = session.kind();
    let line = match session.scores().as_slice() {
        [p1, p2] => format!("P1 {p1}   P2 {p2}"),
        scores_now => format!(
            "SCORE {}   BEST {}",
            scores_now.first().copied().unwrap_or(0),
            scores.best(kind)
        ),
    };
    gfx.draw_text_centered(layout.content, layout.content.y + 12, &line, COLOR_TEXT, 2);
}

fn draw_session(gfx: &mut dyn Renderer2d, layout: &Layout, session: &Session, scores: &HighScores) {
    draw_hud(gfx, layout, session, scores);
    let area = layout.board_area();
    match session {
        Session::Snake(r) => {
            draw_snake(gfx, area, r.state());
        }
        Session::Flappy(r) => {
            draw_flappy(gfx, area, r.state());
        }
        Session::Game2048(r) => {
            draw_2048(gfx, area, r.state());
            button(gfx, layout.start, "NEW GAME", button_color(GameKind::Game2048));
        }
        Session::Tetris(r) => {
            draw_tetris(gfx, area, r.state());
        }
    }
}

pub fn draw_snake(gfx: &mut dyn Renderer2d, area: Rect, state: &SnakeState) -> Rect {
    let cells = state.cells();
    let cell = (area.w.min(area.h) / state.size.max(1) as u32).max(1);
    draw_grid(gfx, area, &cells, cell)
}

pub fn draw_tetris(gfx: &mut dyn Renderer2d, area: Rect, state: &TetrisState) -> Rect {
    let cells = state.board_with_active_piece();
    let rows = state.rows().max(1) as u32;
    let cols = state.cols().max(1) as u32;
    let cell = (area.h / rows).min(area.w / cols).max(1);
    draw_grid(gfx, area, &cells, cell)
}

/// Clips a world-space rect (which may start left of or above the area) into `area`.
fn clip_rect(area: Rect, x: i32, y: i32, w: i32, h: i32) -> Option<Rect> {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(area.w as i32);
    let y1 = (y + h).min(area.h as i32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::new(
        area.x + x0 as u32,
        area.y + y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    ))
}

pub fn draw_flappy(gfx: &mut dyn Renderer2d, area: Rect, state: &FlappyState) -> Rect {
    let play = area.place(flappy::WIDTH as u32, flappy::HEIGHT as u32, Anchor::Center);
    gfx.fill_rect(play, COLOR_SKY);

    for pipe in &state.pipes {
        let x = pipe.x.round() as i32;
        let w = flappy::PIPE_WIDTH as i32;
        let gap_top = pipe.gap_y.round() as i32;
        let gap_bottom = (pipe.gap_y + pipe.gap).round() as i32;
        if let Some(r) = clip_rect(play, x, 0, w, gap_top) {
            gfx.fill_rect(r, COLOR_PIPE);
        }
        if let Some(r) = clip_rect(play, x, gap_bottom, w, play.h as i32 - gap_bottom) {
            gfx.fill_rect(r, COLOR_PIPE);
        }
    }

    gfx.fill_circle(
        play.x as i32 + flappy::BIRD_X as i32,
        play.y as i32 + state.bird_y.round() as i32,
        flappy::BIRD_RADIUS as u32,
        COLOR_BIRD,
    );
    gfx.rect_outline(play, COLOR_MUTED);
    play
}

pub fn draw_2048(gfx: &mut dyn Renderer2d, area: Rect, state: &State2048) -> Rect {
    const GAP: u32 = 8;
    let side = area.w.min(area.h).min(360);
    let board = area.place(side, side, Anchor::Center);
    gfx.fill_rect(board, COLOR_BOARD_2048);

    let tile = (side.saturating_sub(GAP * (TILES as u32 + 1))) / TILES as u32;
    for (r, row) in state.board.iter().enumerate() {
        for (c, &value) in row.iter().enumerate() {
            let rect = Rect::new(
                board.x + GAP + c as u32 * (tile + GAP),
                board.y + GAP + r as u32 * (tile + GAP),
                tile,
                tile,
            );
            gfx.fill_rect(rect, tile_color(value));
            if value != 0 {
                let text = value.to_string();
                let scale = if text.len() > 3 { 3 } else { 4 };
                let y = rect.y + rect.h.saturating_sub(text_height(&text, scale)) / 2;
                gfx.draw_text_centered(rect, y, &text, COLOR_TEXT, scale);
            }
        }
    }
    board
}

fn draw_game_over(gfx: &mut dyn Renderer2d, layout: &Layout, kind: GameKind, session: Option<&Session>) {
    let area = layout.board_area();
    gfx.blend_rect(area, COLOR_OVERLAY, 170);

    let mid = area.y + area.h / 2;
    gfx.draw_text_centered(area, mid.saturating_sub(48), "GAME OVER", COLOR_WHITE, 4);

    let scores = session.map(Session::scores).unwrap_or_default();
    let line = match (kind, scores.as_slice()) {
        (GameKind::SnakeDuo, [p1, p2]) => format!("P1 {p1}  P2 {p2}"),
        (_, [score, ..]) => format!("SCORE {score}"),
        _ => String::new(),
    };
    gfx.draw_text_centered(area, mid, &line, COLOR_WHITE, 3);

    gfx.draw_text_centered(area, mid + 40, "PRESS ENTER", COLOR_WHITE, 2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_buttons_fit_inside_content() {
        let layout = Layout::new(POPUP_SIZE);
        assert_eq!(layout.menu.len(), GameKind::ALL.len());
        for (_, rect) in &layout.menu {
            assert!(rect.y >= layout.content.y);
            assert!(rect.y + rect.h <= layout.content.y + layout.content.h);
        }
    }

    #[test]
    fn menu_hit_finds_the_button_under_the_cursor() {
        let layout = Layout::new(POPUP_SIZE);
        let (kind, rect) = layout.menu[2];
        assert_eq!(layout.menu_hit(rect.x + 5, rect.y + 5), Some(kind));
        assert_eq!(layout.menu_hit(0, 0), None);
    }

    #[test]
    fn clip_rect_trims_offscreen_pipes() {
        let area = Rect::new(10, 10, 300, 400);
        assert_eq!(clip_rect(area, -20, 0, 50, 100), Some(Rect::new(10, 10, 30, 100)));
        assert_eq!(clip_rect(area, -60, 0, 50, 100), None);
        assert_eq!(clip_rect(area, 290, 350, 50, 100), Some(Rect::new(300, 360, 10, 50)));
    }

    #[test]
    fn unknown_tile_values_use_the_top_colour() {
        assert_eq!(tile_color(4096), tile_color(8192));
        assert_ne!(tile_color(2), tile_color(4));
    }
}
