// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds terminal setup and the event loop.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod effects;
pub mod game;
pub mod high_score;
pub mod input;
pub mod presentation;
pub mod random;
pub mod runtime;
pub mod session;
pub mod ui;
