//! Read-only preference surface used by the speech session.
//!
//! The session reads preferences at the moment it needs them and never
//! caches them across a request, so hosts may change them at any time.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_HIGHLIGHT_COLOR, DEFAULT_SPEECH_RATE};
use crate::tts::SpeechOptions;

pub trait Preferences {
    fn word_highlighting_enabled(&self) -> bool;
    fn navigation_controls_enabled(&self) -> bool;
    fn voice_switching_enabled(&self) -> bool;
    /// Base speech rate before the session's multiplier.
    fn speech_rate(&self) -> f32;
    fn voice_name(&self) -> Option<String>;
    /// Voice used when a network voice fails.
    fn local_voice(&self) -> Option<String>;
    fn is_network_voice(&self, voice: &str) -> bool;
    fn highlight_color(&self) -> String;

    /// Engine options for one utterance. With voice switching the engine picks
    /// a voice for `language` instead of the configured one.
    fn speech_options(&self, language: Option<&str>, use_voice_switching: bool) -> SpeechOptions {
        SpeechOptions {
            voice_name: if use_voice_switching {
                None
            } else {
                self.voice_name()
            },
            lang: language.map(str::to_string),
            rate: Some(self.speech_rate()),
            enqueue: false,
        }
    }
}

/// Plain preference values, as configured on the command line or over IPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticPreferences {
    pub word_highlighting: bool,
    pub navigation_controls: bool,
    pub voice_switching: bool,
    pub speech_rate: f32,
    pub voice: Option<String>,
    pub local_voice: Option<String>,
    pub network_voices: Vec<String>,
    pub highlight_color: String,
}

impl Default for StaticPreferences {
    fn default() -> Self {
        Self {
            word_highlighting: true,
            navigation_controls: true,
            voice_switching: false,
            speech_rate: DEFAULT_SPEECH_RATE,
            voice: None,
            local_voice: None,
            network_voices: Vec::new(),
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
        }
    }
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreferenceUpdate {
    pub word_highlighting: Option<bool>,
    pub navigation_controls: Option<bool>,
    pub voice_switching: Option<bool>,
    pub speech_rate: Option<f32>,
    pub voice: Option<String>,
    pub highlight_color: Option<String>,
}

impl StaticPreferences {
    pub fn apply(&mut self, update: PreferenceUpdate) {
        if let Some(value) = update.word_highlighting {
            self.word_highlighting = value;
        }
        if let Some(value) = update.navigation_controls {
            self.navigation_controls = value;
        }
        if let Some(value) = update.voice_switching {
            self.voice_switching = value;
        }
        if let Some(rate) = update.speech_rate.filter(|r| r.is_finite() && *r > 0.0) {
            self.speech_rate = rate;
        }
        if let Some(voice) = update.voice {
            self.voice = (!voice.is_empty()).then_some(voice);
        }
        if let Some(color) = update.highlight_color {
            self.highlight_color = color;
        }
    }
}

impl Preferences for StaticPreferences {
    fn word_highlighting_enabled(&self) -> bool {
        self.word_highlighting
    }

    fn navigation_controls_enabled(&self) -> bool {
        self.navigation_controls
    }

    fn voice_switching_enabled(&self) -> bool {
        self.voice_switching
    }

    fn speech_rate(&self) -> f32 {
        self.speech_rate
    }

    fn voice_name(&self) -> Option<String> {
        self.voice.clone()
    }

    fn local_voice(&self) -> Option<String> {
        self.local_voice.clone()
    }

    fn is_network_voice(&self, voice: &str) -> bool {
        self.network_voices.iter().any(|v| v == voice)
    }

    fn highlight_color(&self) -> String {
        self.highlight_color.clone()
    }
}

/// Shared handle so a host can keep editing preferences the session reads.
impl<P: Preferences> Preferences for Rc<RefCell<P>> {
    fn word_highlighting_enabled(&self) -> bool {
        self.borrow().word_highlighting_enabled()
    }

    fn navigation_controls_enabled(&self) -> bool {
        self.borrow().navigation_controls_enabled()
    }

    fn voice_switching_enabled(&self) -> bool {
        self.borrow().voice_switching_enabled()
    }

    fn speech_rate(&self) -> f32 {
        self.borrow().speech_rate()
    }

    fn voice_name(&self) -> Option<String> {
        self.borrow().voice_name()
    }

    fn local_voice(&self) -> Option<String> {
        self.borrow().local_voice()
    }

    fn is_network_voice(&self, voice: &str) -> bool {
        self.borrow().is_network_voice(voice)
    }

    fn highlight_color(&self) -> String {
        self.borrow().highlight_color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_keeps_unset_fields() {
        let mut prefs = StaticPreferences::default();
        prefs.apply(PreferenceUpdate {
            navigation_controls: Some(false),
            speech_rate: Some(-2.0),
            voice: Some("Aria".to_string()),
            ..PreferenceUpdate::default()
        });
        assert!(!prefs.navigation_controls);
        assert!(prefs.word_highlighting);
        assert_eq!(prefs.speech_rate, 1.0);
        assert_eq!(prefs.voice.as_deref(), Some("Aria"));
    }

    #[test]
    fn voice_switching_defers_voice_choice_to_language() {
        let prefs = StaticPreferences {
            voice: Some("Aria".to_string()),
            speech_rate: 1.5,
            ..StaticPreferences::default()
        };
        let fixed = prefs.speech_options(None, false);
        assert_eq!(fixed.voice_name.as_deref(), Some("Aria"));
        assert_eq!(fixed.rate, Some(1.5));

        let switched = prefs.speech_options(Some("fr"), true);
        assert_eq!(switched.voice_name, None);
        assert_eq!(switched.lang.as_deref(), Some("fr"));
    }

    #[test]
    fn shared_handle_reads_latest_values() {
        let shared = Rc::new(RefCell::new(StaticPreferences::default()));
        let reader = Rc::clone(&shared);
        shared.borrow_mut().word_highlighting = false;
        assert!(!reader.word_highlighting_enabled());
    }
}
