//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_ACTIVATION_KEY, DEFAULT_HIGHLIGHT_COLOR, DEFAULT_LOCAL_VOICE, DEFAULT_MODIFIER_KEY,
    DEFAULT_READ_SELECTION_KEY, DEFAULT_REVALIDATE_INTERVAL_MS, DEFAULT_SPEECH_RATE,
    MAX_REVALIDATE_INTERVAL_MS, MAX_SPEECH_RATE, MIN_REVALIDATE_INTERVAL_MS, MIN_SPEECH_RATE,
    PARAGRAPH_SELECTION_MAX_SIZE,
};

/// CLI options for the select-to-speak host. The binary speaks a JSON-lines
/// protocol on stdin/stdout; these flags seed its preferences and key chord.
#[derive(Debug, Parser, Clone)]
#[command(about = "Select-to-speak host (JSON lines over stdio)", author, version)]
pub struct AppConfig {
    /// Enable file logging (debug)
    #[arg(long = "logs", env = "SELECTSPEAK_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "SELECTSPEAK_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Allow logging node and spoken text snippets (debug log only)
    #[arg(
        long = "log-content",
        env = "SELECTSPEAK_LOG_CONTENT",
        default_value_t = false
    )]
    pub log_content: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,

    /// JSON document tree to load at startup
    #[arg(long, value_name = "PATH")]
    pub document: Option<PathBuf>,

    /// Highlight each word as it is spoken (default)
    #[arg(long = "word-highlighting", overrides_with = "no_word_highlighting")]
    pub word_highlighting: bool,

    /// Only draw the focus ring around the spoken node
    #[arg(long = "no-word-highlighting")]
    pub no_word_highlighting: bool,

    /// Show the navigation panel while speaking (default)
    #[arg(long = "navigation-controls", overrides_with = "no_navigation_controls")]
    pub navigation_controls: bool,

    /// Hide the navigation panel; speech ends when the selection is read
    #[arg(long = "no-navigation-controls")]
    pub no_navigation_controls: bool,

    /// Pick a voice per detected language instead of the configured voice
    #[arg(long = "voice-switching", default_value_t = false)]
    pub voice_switching: bool,

    /// Base speech rate
    #[arg(long = "speech-rate", default_value_t = DEFAULT_SPEECH_RATE)]
    pub speech_rate: f32,

    /// Preferred voice name
    #[arg(long)]
    pub voice: Option<String>,

    /// Voice used when a network voice fails
    #[arg(long = "local-voice", default_value = DEFAULT_LOCAL_VOICE)]
    pub local_voice: String,

    /// Voice names that require the network (repeatable)
    #[arg(long = "network-voice", action = ArgAction::Append, value_name = "NAME")]
    pub network_voices: Vec<String>,

    /// Word highlight color (#RRGGBB)
    #[arg(long = "highlight-color", default_value = DEFAULT_HIGHLIGHT_COLOR)]
    pub highlight_color: String,

    /// How often the spoken node is re-checked and redrawn (milliseconds)
    #[arg(
        long = "revalidate-interval-ms",
        default_value_t = DEFAULT_REVALIDATE_INTERVAL_MS
    )]
    pub revalidate_interval_ms: u64,

    /// Key code held to select with the mouse
    #[arg(long = "activation-key", default_value_t = DEFAULT_ACTIVATION_KEY)]
    pub activation_key: u32,

    /// Key code tapped alone to cancel speech
    #[arg(long = "modifier-key", default_value_t = DEFAULT_MODIFIER_KEY)]
    pub modifier_key: u32,

    /// Key code pressed with the activation key to read the selection
    #[arg(long = "read-selection-key", default_value_t = DEFAULT_READ_SELECTION_KEY)]
    pub read_selection_key: u32,
}

impl AppConfig {
    pub fn word_highlighting_enabled(&self) -> bool {
        !self.no_word_highlighting
    }

    pub fn navigation_controls_enabled(&self) -> bool {
        !self.no_navigation_controls
    }
}
