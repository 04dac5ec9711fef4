use std::error::Error;
use std::io::BufRead;
use std::time::{Duration, Instant};

use pixels::{Pixels, SurfaceTexture};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::WindowBuilder;

use crate::graphics::Renderer2d;
use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::SurfaceSize;

/// Target frame period of the window loop (~60 Hz).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPlacement {
    /// Let the window system decide.
    Default,
    /// Anchor to the bottom-right corner of the primary monitor.
    BottomRight { margin_x: u32, margin_y: u32 },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    /// Logical frame buffer size; the game draws in these coordinates.
    pub size: SurfaceSize,
    /// Initial window size. The buffer is scaled onto it.
    pub window: SurfaceSize,
    pub placement: WindowPlacement,
    /// Read `focus` / `close` control lines from stdin.
    pub listen_stdin: bool,
}

/// Requests from whoever spawned the window process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    Focus,
    Close,
}

impl HostSignal {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "focus" => Some(Self::Focus),
            "close" => Some(Self::Close),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppControl {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    R,
    H,
    Space,
    Enter,
    Escape,
    Digit(u8),
}

impl Key {
    pub fn from_virtual(code: VirtualKeyCode) -> Option<Self> {
        use VirtualKeyCode as V;
        Some(match code {
            V::Up => Key::Up,
            V::Down => Key::Down,
            V::Left => Key::Left,
            V::Right => Key::Right,
            V::W => Key::W,
            V::A => Key::A,
            V::S => Key::S,
            V::D => Key::D,
            V::R => Key::R,
            V::H => Key::H,
            V::Space => Key::Space,
            V::Return | V::NumpadEnter => Key::Enter,
            V::Escape => Key::Escape,
            V::Key1 | V::Numpad1 => Key::Digit(1),
            V::Key2 | V::Numpad2 => Key::Digit(2),
            V::Key3 | V::Numpad3 => Key::Digit(3),
            V::Key4 | V::Numpad4 => Key::Digit(4),
            V::Key5 | V::Numpad5 => Key::Digit(5),
            V::Key6 | V::Numpad6 => Key::Digit(6),
            V::Key7 | V::Numpad7 => Key::Digit(7),
            V::Key8 | V::Numpad8 => Key::Digit(8),
            V::Key9 | V::Numpad9 => Key::Digit(9),
            _ => return None,
        })
    }
}

/// Input gathered since the previous frame. Coordinates are logical buffer pixels.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    pub keys_pressed: Vec<Key>,
    pub mouse_pos: Option<(u32, u32)>,
    pub mouse_clicked: bool,
}

impl InputFrame {
    pub fn pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    fn clear(&mut self) {
        self.keys_pressed.clear();
        self.mouse_clicked = false;
    }
}

pub trait GameApp {
    type State;

    fn init_state(&mut self) -> Self::State;

    fn update(&mut self, state: &mut Self::State, input: &InputFrame, dt: Duration) -> AppControl;

    fn render(&self, state: &Self::State, gfx: &mut dyn Renderer2d);

    fn on_signal(&mut self, _state: &mut Self::State, signal: HostSignal) -> AppControl {
        match signal {
            HostSignal::Close => AppControl::Exit,
            HostSignal::Focus => AppControl::Continue,
        }
    }
}

fn spawn_stdin_listener(proxy: EventLoopProxy<HostSignal>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let Some(signal) = HostSignal::parse(&line) else {
                tracing::debug!(%line, "ignoring unknown control line");
                continue;
            };
            if proxy.send_event(signal).is_err() {
                break;
            }
        }
    });
}

fn bottom_right(monitor: PhysicalSize<u32>, size: SurfaceSize, mx: u32, my: u32) -> PhysicalPosition<i32> {
    let x = monitor.width.saturating_sub(size.width.saturating_add(mx));
    let y = monitor.height.saturating_sub(size.height.saturating_add(my));
    PhysicalPosition::new(x as i32, y as i32)
}

pub fn run_game<G: GameApp + 'static>(config: AppConfig, mut game: G) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoopBuilder::<HostSignal>::with_user_event().build();

    let mut builder = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(config.window.width, config.window.height));
    if let WindowPlacement::BottomRight { margin_x, margin_y } = config.placement {
        if let Some(monitor) = event_loop.primary_monitor() {
            builder = builder.with_position(bottom_right(monitor.size(), config.window, margin_x, margin_y));
        }
    }
    let window = builder.build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
    let pixels = Pixels::new(config.size.width, config.size.height, surface_texture)?;
    let mut renderer = PixelsRenderer2d::new(pixels, config.size)?;

    if config.listen_stdin {
        spawn_stdin_listener(event_loop.create_proxy());
    }

    let mut state = game.init_state();
    let mut input = InputFrame::default();
    let mut last_frame = Instant::now();
    let mut next_frame = last_frame;

    event_loop.run(move |event, _, control_flow| {
        match event {
            Event::UserEvent(signal) => {
                if signal == HostSignal::Focus {
                    window.set_minimized(false);
                    window.focus_window();
                }
                if game.on_signal(&mut state, signal) == AppControl::Exit {
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    if let Err(err) = renderer.resize_surface(SurfaceSize::new(size.width, size.height)) {
                        tracing::warn!(error = %err, "resize failed");
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.mouse_pos = renderer.window_to_logical(position.x as f32, position.y as f32);
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    input.mouse_clicked = true;
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(code),
                            ..
                        },
                    ..
                } => {
                    if let Some(key) = Key::from_virtual(code) {
                        input.keys_pressed.push(key);
                    }
                }
                _ => {}
            },
            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(last_frame);
                last_frame = now;
                next_frame = now + FRAME_INTERVAL;

                if game.update(&mut state, &input, dt) == AppControl::Exit {
                    *control_flow = ControlFlow::Exit;
                }
                input.clear();

                renderer.draw_frame(|gfx| game.render(&state, gfx));
                if let Err(err) = renderer.present() {
                    tracing::warn!(error = %err, "present failed");
                }
            }
            Event::MainEventsCleared => {
                if *control_flow == ControlFlow::Exit {
                    return;
                }
                if Instant::now() >= next_frame {
                    window.request_redraw();
                }
                *control_flow = ControlFlow::WaitUntil(next_frame);
            }
            _ => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_lines_parse() {
        assert_eq!(HostSignal::parse("focus\n"), Some(HostSignal::Focus));
        assert_eq!(HostSignal::parse(" close "), Some(HostSignal::Close));
        assert_eq!(HostSignal::parse("quit"), None);
    }

    #[test]
    fn bottom_right_keeps_margins() {
        let pos = bottom_right(PhysicalSize::new(1920, 1080), SurfaceSize::new(420, 650), 20, 80);
        assert_eq!(pos, PhysicalPosition::new(1480, 350));
    }

    #[test]
    fn bottom_right_pins_to_the_origin_for_huge_margins() {
        let pos = bottom_right(
            PhysicalSize::new(1920, 1080),
            SurfaceSize::new(420, 650),
            u32::MAX,
            u32::MAX - 10,
        );
        assert_eq!(pos, PhysicalPosition::new(0, 0));
    }

    #[test]
    fn key_mapping_covers_both_enter_keys() {
        assert_eq!(Key::from_virtual(VirtualKeyCode::Return), Some(Key::Enter));
        assert_eq!(Key::from_virtual(VirtualKeyCode::NumpadEnter), Some(Key::Enter));
        assert_eq!(Key::from_virtual(VirtualKeyCode::Key3), Some(Key::Digit(3)));
        assert_eq!(Key::from_virtual(VirtualKeyCode::F1), None);
    }
}
