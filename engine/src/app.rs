use std::path::PathBuf;
use std::time::{Duration, Instant};

use pixels::{PixelsBuilder, SurfaceTexture};
use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, StartCause, VirtualKeyCode,
    WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::graphics::Renderer2d;
use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::SurfaceSize;
use crate::ticker::{Tick, Ticker};
use crate::view_tree::{ViewTree, hit_test};

/// Pixels scrolled per mouse-wheel line.
const WHEEL_LINE_PX: f32 = 48.0;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to initialise pixel surface: {0}")]
    Pixels(#[from] pixels::Error),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub desired_size: PhysicalSize<u32>,
    pub clamp_to_monitor: bool,
    pub tick_period: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Escape,
    Left,
    Right,
    Home,
    End,
    Char(char),
}

/// A windowed application whose only timer is a fixed-period tick.
///
/// Every handler returns whether the frame needs repainting; the loop coalesces those requests
/// into at most one redraw per wake-up.
pub trait TickApp {
    type Action: Clone;

    fn on_tick(&mut self, tick: Tick) -> bool;

    fn on_action(&mut self, action: Self::Action) -> bool;

    fn on_key(&mut self, _key: KeyPress) -> bool {
        false
    }

    /// Horizontal scroll in pixels; positive moves the content left.
    fn on_scroll(&mut self, _delta_px: i32) -> bool {
        false
    }

    fn on_file_dropped(&mut self, _path: PathBuf) -> bool {
        false
    }

    fn on_resize(&mut self, _size: SurfaceSize) {}

    fn build_view(&self, size: SurfaceSize) -> ViewTree<Self::Action>;

    fn render(&mut self, gfx: &mut dyn Renderer2d);
}

fn map_key(code: VirtualKeyCode) -> Option<KeyPress> {
    match code {
        VirtualKeyCode::Escape => Some(KeyPress::Escape),
        VirtualKeyCode::Left => Some(KeyPress::Left),
        VirtualKeyCode::Right => Some(KeyPress::Right),
        VirtualKeyCode::Home => Some(KeyPress::Home),
        VirtualKeyCode::End => Some(KeyPress::End),
        _ => None,
    }
}

pub fn run_app<A: TickApp + 'static>(config: AppConfig, mut app: A) -> Result<(), AppError> {
    let event_loop = EventLoop::new();
    let initial_size = match event_loop.primary_monitor().filter(|_| config.clamp_to_monitor) {
        Some(monitor) => {
            let m = monitor.size();
            PhysicalSize::new(
                config.desired_size.width.min(m.width),
                config.desired_size.height.min(m.height),
            )
        }
        None => config.desired_size,
    };
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(initial_size)
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let mut surface_size = SurfaceSize::new(window_size.width, window_size.height);
    let surface_texture = SurfaceTexture::new(surface_size.width, surface_size.height, &window);
    let pixels =
        PixelsBuilder::new(surface_size.width, surface_size.height, surface_texture).build()?;
    let mut renderer = PixelsRenderer2d::new(pixels, surface_size)?;
    app.on_resize(surface_size);

    let mut ticker = Ticker::new(Instant::now(), config.tick_period);
    let mut cursor: Option<(u32, u32)> = None;
    tracing::info!(
        title = %config.title,
        width = surface_size.width,
        height = surface_size.height,
        tick_ms = ticker.period().as_millis() as u64,
        "window opened"
    );

    event_loop.run(move |event, _, control_flow| {
        let mut dirty = false;

        match event {
            Event::NewEvents(cause) => {
                dirty |= matches!(cause, StartCause::Init);
                if let Some(tick) = ticker.poll(Instant::now()) {
                    if tick.missed > 0 {
                        tracing::debug!(missed = tick.missed, "ticks coalesced");
                    }
                    dirty |= app.on_tick(tick);
                }
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    tracing::info!("window closed");
                    control_flow.set_exit();
                    return;
                }
                WindowEvent::Resized(size) => {
                    surface_size = SurfaceSize::new(size.width, size.height);
                    if let Err(err) = renderer.resize(surface_size) {
                        tracing::warn!(%err, "resize failed");
                    }
                    app.on_resize(renderer.size());
                    dirty = true;
                }
                WindowEvent::CursorMoved { position, .. } => {
                    cursor = Some((position.x.max(0.0) as u32, position.y.max(0.0) as u32));
                }
                WindowEvent::CursorLeft { .. } => cursor = None,
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: MouseButton::Left,
                    ..
                } => {
                    let view = app.build_view(renderer.size());
                    if let Some(action) = cursor.and_then(|pos| hit_test(&view, pos)) {
                        dirty |= app.on_action(action);
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let px = match delta {
                        MouseScrollDelta::LineDelta(x, y) => (x - y) * WHEEL_LINE_PX,
                        MouseScrollDelta::PixelDelta(pos) => (pos.x - pos.y) as f32,
                    };
                    dirty |= app.on_scroll(px.round() as i32);
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
                    if let Some(key) = map_key(code) {
                        dirty |= app.on_key(key);
                    }
                }
                WindowEvent::ReceivedCharacter(ch) if ch.is_ascii_graphic() => {
                    dirty |= app.on_key(KeyPress::Char(ch.to_ascii_lowercase()));
                }
                WindowEvent::DroppedFile(path) => {
                    dirty |= app.on_file_dropped(path);
                }
                _ => {}
            },
            Event::RedrawRequested(_) => {
                renderer.draw_frame(|gfx| app.render(gfx));
                if let Err(err) = renderer.present() {
                    tracing::warn!(%err, "present failed");
                }
            }
            _ => {}
        }

        if dirty {
            window.request_redraw();
        }
        control_flow.set_wait_until(ticker.next_deadline(Instant::now()));
    })
}
