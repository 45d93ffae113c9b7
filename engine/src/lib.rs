//! Windowing and drawing layer for timer-driven 2D surfaces.
//!
//! Nothing in here knows about tiles or schedules: it provides layout rects, a CPU renderer
//! with a block font, clickable view trees, a drift-free fixed-period ticker, and the `winit`
//! loop that wires them together.

pub mod app;
pub mod graphics;
pub mod pixels_renderer;
pub mod surface;
pub mod ticker;
pub mod ui;
pub mod view_tree;
