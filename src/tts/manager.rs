use std::cell::Cell;
use std::time::Duration;

use anyhow::{bail, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use super::{EngineEvent, RequestId, SpeechEngine, SpeechOptions, TtsError, TtsEvent, UtteranceId};
use crate::utf8_safe::{first_non_whitespace, floor_char_boundary, is_blank, safe_tail};
use crate::{log_debug, log_debug_content};

/// Resolves once a pause has fully settled (the engine's interruption has been
/// translated into a `Pause` event) or when nothing was playing to begin with.
#[derive(Debug)]
pub struct PauseSignal {
    rx: Receiver<()>,
    settled: Cell<bool>,
}

impl PauseSignal {
    fn new(rx: Receiver<()>) -> Self {
        Self {
            rx,
            settled: Cell::new(false),
        }
    }

    pub fn is_settled(&self) -> bool {
        if self.settled.get() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                self.settled.set(true);
                true
            }
            Err(TryRecvError::Empty) => false,
        }
    }

    /// Blocks up to `timeout` for the pause to settle.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.settled.get() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.settled.set(true);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}

/// Owns exactly one logical utterance at a time. Pause is emulated with
/// stop + resume-from-offset because native engine pause is unreliable.
pub struct TtsManager {
    engine: Box<dyn SpeechEngine>,
    next_utterance: u64,
    next_request: u64,
    request: Option<RequestId>,
    /// Engine utterance whose events are still accepted.
    utterance: Option<UtteranceId>,
    text: String,
    options: SpeechOptions,
    use_remote_voice: bool,
    fallback_voice: Option<String>,
    /// Offset of the current utterance's slice within `text`.
    start_offset: usize,
    current_char_index: usize,
    speaking: bool,
    /// Next start event should be reported as a resume.
    resuming: bool,
    pause_waiters: Vec<Sender<()>>,
}

impl TtsManager {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            next_utterance: 1,
            next_request: 1,
            request: None,
            utterance: None,
            text: String::new(),
            options: SpeechOptions::default(),
            use_remote_voice: false,
            fallback_voice: None,
            start_offset: 0,
            current_char_index: 0,
            speaking: false,
            resuming: false,
            pause_waiters: Vec::new(),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn current_request(&self) -> Option<RequestId> {
        self.request
    }

    pub fn current_utterance(&self) -> Option<UtteranceId> {
        self.utterance
    }

    /// Last reported index, relative to the full text.
    pub fn current_char_index(&self) -> usize {
        self.current_char_index
    }

    /// Starts speaking `text`, replacing whatever was playing before.
    pub fn speak(
        &mut self,
        text: &str,
        options: SpeechOptions,
        use_remote_voice: bool,
        fallback_voice: Option<String>,
    ) -> Result<RequestId> {
        if options.enqueue {
            bail!("queued playback is not supported; speak replaces the current utterance");
        }
        let request = RequestId(self.next_request);
        self.next_request += 1;
        self.begin(request, text.to_string(), options, use_remote_voice, fallback_voice);
        Ok(request)
    }

    fn begin(
        &mut self,
        request: RequestId,
        text: String,
        options: SpeechOptions,
        use_remote_voice: bool,
        fallback_voice: Option<String>,
    ) {
        if self.utterance.take().is_some() {
            self.engine.stop();
        }
        self.settle_pause_waiters();
        self.request = Some(request);
        self.text = text;
        self.options = options;
        self.use_remote_voice = use_remote_voice;
        self.fallback_voice = fallback_voice;
        self.start_offset = 0;
        self.current_char_index = 0;
        self.speaking = false;
        self.resuming = false;
        self.start_utterance();
    }

    fn start_utterance(&mut self) {
        let utterance = UtteranceId(self.next_utterance);
        self.next_utterance += 1;
        self.utterance = Some(utterance);
        let slice = safe_tail(&self.text, self.start_offset);
        log_debug_content(&format!(
            "tts utterance {} at offset {}: {:?}",
            utterance.0,
            self.start_offset,
            crate::utf8_safe::safe_prefix(slice, 40)
        ));
        self.engine.speak(utterance, slice, &self.options);
    }

    /// Stops the engine and requests a `Pause` event carrying the last index.
    pub fn pause(&mut self) -> PauseSignal {
        let (tx, rx) = bounded(1);
        if self.utterance.is_none() {
            let _ = tx.send(());
        } else {
            self.pause_waiters.push(tx);
            self.engine.stop();
        }
        PauseSignal::new(rx)
    }

    /// Resumes from the last reported index. Returns a synthetic event when the
    /// resume cannot start; otherwise the engine reports progress as usual.
    pub fn resume(&mut self, options: Option<SpeechOptions>) -> Option<TtsEvent> {
        if self.speaking || self.utterance.is_some() || self.request.is_none() {
            return None;
        }
        self.start_offset = floor_char_boundary(&self.text, self.current_char_index);
        if is_blank(safe_tail(&self.text, self.start_offset)) {
            log_debug("tts resume skipped: nothing left to read");
            return Some(TtsEvent::Error(TtsError::ResumeWithEmptyContent));
        }
        if let Some(options) = options {
            self.options = options;
        }
        self.resuming = true;
        self.start_utterance();
        None
    }

    /// Stops speech and forgets the current request. Late engine events for it
    /// are dropped.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.utterance = None;
        self.request = None;
        self.speaking = false;
        self.resuming = false;
        self.settle_pause_waiters();
    }

    fn settle_pause_waiters(&mut self) {
        for waiter in self.pause_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    /// Translates an engine event into a caller event, re-basing indices onto
    /// the full text. Events for superseded utterances are discarded.
    pub fn on_engine_event(&mut self, utterance: UtteranceId, event: EngineEvent) -> Option<TtsEvent> {
        if self.utterance != Some(utterance) {
            log_debug(&format!(
                "dropping {event:?} for stale utterance {}",
                utterance.0
            ));
            return None;
        }
        let slice_len = self.text.len() - self.start_offset;
        match event {
            EngineEvent::Start => {
                self.speaking = true;
                self.current_char_index =
                    first_non_whitespace(safe_tail(&self.text, self.start_offset)) + self.start_offset;
                let char_index = self.current_char_index;
                if std::mem::take(&mut self.resuming) {
                    Some(TtsEvent::Resume { char_index })
                } else {
                    Some(TtsEvent::Start { char_index })
                }
            }
            EngineEvent::Word { char_index, length } => {
                self.speaking = true;
                self.current_char_index =
                    floor_char_boundary(&self.text, char_index.saturating_add(self.start_offset));
                Some(TtsEvent::Word {
                    char_index: self.current_char_index,
                    length,
                })
            }
            EngineEvent::End => {
                self.speaking = false;
                self.utterance = None;
                self.current_char_index = slice_len + self.start_offset;
                Some(TtsEvent::End {
                    char_index: self.current_char_index,
                })
            }
            EngineEvent::Error { message } => {
                self.speaking = false;
                self.utterance = None;
                if self.use_remote_voice {
                    self.retry_with_local_voice(&message);
                    return None;
                }
                Some(TtsEvent::Error(TtsError::Engine(message)))
            }
            EngineEvent::Interrupted | EngineEvent::Cancelled => {
                self.speaking = false;
                self.utterance = None;
                if !self.pause_waiters.is_empty() {
                    self.settle_pause_waiters();
                    return Some(TtsEvent::Pause {
                        char_index: self.current_char_index,
                    });
                }
                if event == EngineEvent::Interrupted {
                    Some(TtsEvent::Interrupted)
                } else {
                    Some(TtsEvent::Cancelled)
                }
            }
            EngineEvent::Pause => {
                self.speaking = false;
                Some(TtsEvent::Pause {
                    char_index: self.current_char_index,
                })
            }
            EngineEvent::Resume => {
                self.speaking = true;
                Some(TtsEvent::Resume {
                    char_index: self.current_char_index,
                })
            }
        }
    }

    fn retry_with_local_voice(&mut self, message: &str) {
        let Some(request) = self.request else {
            return;
        };
        tracing::warn!(
            error = message,
            fallback_voice = self.fallback_voice.as_deref().unwrap_or("default"),
            "network voice failed; retrying with local voice"
        );
        log_debug(&format!("network voice failed ({message}); retrying locally"));
        let text = std::mem::take(&mut self.text);
        let mut options = self.options.clone();
        options.voice_name = self.fallback_voice.clone();
        let fallback = self.fallback_voice.clone();
        self.begin(request, text, options, false, fallback);
    }
}
