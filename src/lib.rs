// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires terminal, tracker and logging around it.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controls;
pub mod dwell;
pub mod game;
pub mod geometry;
pub mod opponent;
pub mod render;
pub mod runtime;
pub mod status;
pub mod tracking;
pub mod ui;
