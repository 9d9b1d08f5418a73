//! Speech engine session.
//!
//! Wraps a bare speak/stop engine and turns one logical "speak this text"
//! request into as many engine utterances as pause/resume needs, while
//! reporting every character index relative to the original full text.

mod event;
mod manager;
#[cfg(test)]
pub(crate) mod mock;

use serde::{Deserialize, Serialize};

pub use event::{EngineEvent, TtsError, TtsEvent};
pub use manager::{PauseSignal, TtsManager};

/// One call into the engine's speak primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtteranceId(pub u64);

/// One logical `speak` request; survives pause/resume and voice fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// Options handed to the engine with each utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
    /// Queued playback is not supported; `speak` rejects options with this set.
    #[serde(default)]
    pub enqueue: bool,
}

/// The underlying synthesizer. Events for an utterance are delivered back
/// through [`TtsManager::on_engine_event`] by whoever owns the engine's
/// callback channel.
pub trait SpeechEngine {
    fn speak(&mut self, utterance: UtteranceId, text: &str, options: &SpeechOptions);
    fn stop(&mut self);
}
