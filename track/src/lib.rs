//! A horizontal track of tiles that unlock at scheduled instants.
//!
//! [`schedule`] and [`countdown`] are pure functions of `(schedule, now)`. [`renderer`] turns
//! them into per-tile presentations once per tick, and [`app`] hosts that cycle in a window.

pub mod app;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod draw;
pub mod layout;
pub mod renderer;
pub mod schedule;
pub mod store;
pub mod tile;
pub mod upload;
pub mod view;
