//! egui desktop player for the danmaku overlay engine.

mod app;
mod renderer;
mod theme;

pub use app::PlayerApp;
