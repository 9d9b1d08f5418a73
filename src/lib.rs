mod app;
pub mod config;
pub mod content;
pub mod geometry;
pub mod input;
pub mod ipc;
pub mod paragraph;
pub mod prefs;
pub mod session;
mod telemetry;
pub mod tts;
pub mod ui;
pub mod utf8_safe;

pub use app::{
    init_logging, log_debug, log_debug_content, log_file_path, log_panic, log_timing,
};
