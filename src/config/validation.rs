use super::defaults::{MAX_NETWORK_VOICES, MAX_VOICE_NAME_BYTES};
use super::{
    AppConfig, MAX_REVALIDATE_INTERVAL_MS, MAX_SPEECH_RATE, MIN_REVALIDATE_INTERVAL_MS,
    MIN_SPEECH_RATE,
};
use crate::input::{ChordKeys, KeyCode};
use crate::prefs::StaticPreferences;
use anyhow::{bail, Context, Result};
use clap::Parser;
use regex::Regex;
use std::time::Duration;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize names, colors and paths.
    pub fn validate(&mut self) -> Result<()> {
        if !self.speech_rate.is_finite()
            || !(MIN_SPEECH_RATE..=MAX_SPEECH_RATE).contains(&self.speech_rate)
        {
            bail!(
                "--speech-rate must be between {MIN_SPEECH_RATE} and {MAX_SPEECH_RATE}, got {}",
                self.speech_rate
            );
        }
        if !(MIN_REVALIDATE_INTERVAL_MS..=MAX_REVALIDATE_INTERVAL_MS)
            .contains(&self.revalidate_interval_ms)
        {
            bail!(
                "--revalidate-interval-ms must be between {MIN_REVALIDATE_INTERVAL_MS} and {MAX_REVALIDATE_INTERVAL_MS}, got {}",
                self.revalidate_interval_ms
            );
        }

        let keys = [
            ("--activation-key", self.activation_key),
            ("--modifier-key", self.modifier_key),
            ("--read-selection-key", self.read_selection_key),
        ];
        for (i, (flag, code)) in keys.iter().enumerate() {
            if let Some((other, _)) = keys[i + 1..].iter().find(|(_, c)| c == code) {
                bail!("{flag} and {other} must be different keys (both {code})");
            }
        }

        self.highlight_color = sanitize_color(&self.highlight_color)?;
        self.voice = match self.voice.take() {
            Some(voice) => sanitize_voice_name(&voice, "--voice")?,
            None => None,
        };
        self.local_voice = sanitize_voice_name(&self.local_voice, "--local-voice")?
            .context("--local-voice cannot be empty")?;
        if self.network_voices.len() > MAX_NETWORK_VOICES {
            bail!("--network-voice may be given at most {MAX_NETWORK_VOICES} times");
        }
        let mut network_voices = Vec::with_capacity(self.network_voices.len());
        for voice in &self.network_voices {
            if let Some(voice) = sanitize_voice_name(voice, "--network-voice")? {
                if !network_voices.contains(&voice) {
                    network_voices.push(voice);
                }
            }
        }
        self.network_voices = network_voices;

        if let Some(path) = &self.document {
            let canonical = path
                .canonicalize()
                .with_context(|| format!("--document '{}' does not exist", path.display()))?;
            if !canonical.is_file() {
                bail!("--document '{}' is not a file", canonical.display());
            }
            self.document = Some(canonical);
        }
        Ok(())
    }

    /// Preference values the session starts with.
    pub fn preferences(&self) -> StaticPreferences {
        StaticPreferences {
            word_highlighting: self.word_highlighting_enabled(),
            navigation_controls: self.navigation_controls_enabled(),
            voice_switching: self.voice_switching,
            speech_rate: self.speech_rate,
            voice: self.voice.clone(),
            local_voice: Some(self.local_voice.clone()),
            network_voices: self.network_voices.clone(),
            highlight_color: self.highlight_color.clone(),
        }
    }

    pub fn chord_keys(&self) -> ChordKeys {
        ChordKeys {
            activation: KeyCode(self.activation_key),
            modifier: KeyCode(self.modifier_key),
            read_selection: KeyCode(self.read_selection_key),
        }
    }

    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_millis(self.revalidate_interval_ms)
    }
}

/// Accepts `#RRGGBB` and returns it lowercased.
pub(super) fn sanitize_color(value: &str) -> Result<String> {
    let pattern = Regex::new(r"^#[0-9a-fA-F]{6}$").context("invalid color pattern")?;
    let trimmed = value.trim();
    if !pattern.is_match(trimmed) {
        bail!("--highlight-color must look like #RRGGBB, got '{trimmed}'");
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Trims a voice name; blank names mean "engine default".
pub(super) fn sanitize_voice_name(value: &str, flag: &str) -> Result<Option<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_VOICE_NAME_BYTES {
        bail!("{flag} is longer than {MAX_VOICE_NAME_BYTES} bytes");
    }
    if trimmed.chars().any(char::is_control) {
        bail!("{flag} cannot contain control characters");
    }
    Ok(Some(trimmed.to_string()))
}
