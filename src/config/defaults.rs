pub const DEFAULT_SPEECH_RATE: f32 = 1.0;
pub const MIN_SPEECH_RATE: f32 = 0.2;
pub const MAX_SPEECH_RATE: f32 = 5.0;

pub const DEFAULT_LOCAL_VOICE: &str = "local";
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#5e9bff";

pub const DEFAULT_REVALIDATE_INTERVAL_MS: u64 = 1000;
pub const MIN_REVALIDATE_INTERVAL_MS: u64 = 100;
pub const MAX_REVALIDATE_INTERVAL_MS: u64 = 10_000;

pub const DEFAULT_ACTIVATION_KEY: u32 = 91;
pub const DEFAULT_MODIFIER_KEY: u32 = 17;
pub const DEFAULT_READ_SELECTION_KEY: u32 = 83;

/// Selections this thin (in either dimension) read the whole paragraph under them.
pub const PARAGRAPH_SELECTION_MAX_SIZE: i32 = 5;

pub(super) const MAX_VOICE_NAME_BYTES: usize = 256;
pub(super) const MAX_NETWORK_VOICES: usize = 64;
