// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds terminal setup and the CLI.
pub mod app;
pub mod app_dirs;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod game;
pub mod pose;
pub mod pose_source;
pub mod runtime;
pub mod session;
pub mod targets;
pub mod ui;
pub mod util;
