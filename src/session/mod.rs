//! The select-to-speak controller.
//!
//! `SpeechSession` ties the input tracker, the speech engine session, the
//! node group builder and the host collaborators together. It is driven
//! entirely by calls from its owner: input snapshots, engine events, hit-test
//! answers, panel requests and a periodic revalidation tick. Nothing in here
//! blocks or spawns threads.
//!
//! Work that depends on a pause settling (navigation, rate changes) is parked
//! in `pending` and run after the engine event that settles it.

mod highlight;
mod navigation;
mod selection;
mod state;
#[cfg(test)]
mod tests;

use crate::content::{Desktop, GroupingOptions, NodeId, WordSpan};
use crate::geometry::Rect;
use crate::input::{ChordKeys, InputIntent, KeyChordTracker, KeyCode, MouseEventKind};
use crate::log_debug;
use crate::paragraph::{build_node_groups, NodeGroup};
use crate::prefs::Preferences;
use crate::tts::{
    EngineEvent, PauseSignal, SpeechEngine, SpeechOptions, TtsError, TtsEvent, TtsManager,
    UtteranceId,
};
use crate::ui::UiSink;
use crate::utf8_safe::is_blank;

use state::{Cursor, PendingAction};

pub use state::{Navigation, SessionState};

/// Point query the host must answer with [`SpeechSession::on_hit_test_result`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTestRequest {
    /// Answers carrying any other token are ignored.
    pub token: u64,
    pub x: i32,
    pub y: i32,
    pub rect: Rect,
}

pub struct SpeechSession<D: Desktop> {
    desktop: D,
    tts: TtsManager,
    ui: Box<dyn UiSink>,
    prefs: Box<dyn Preferences>,
    input: KeyChordTracker,
    state: SessionState,
    cursor: Cursor,
    speech_rate_multiplier: f32,
    /// Cleared when the queued nodes belong to system UI.
    supports_navigation_panel: bool,
    scroll_to_spoken_node: bool,
    /// A queue is live and the revalidation tick should redraw it.
    revalidating: bool,
    pending: Option<(PendingAction, PauseSignal)>,
    hit_test_generation: u64,
    /// Issued but not yet collected by the host.
    pending_hit_test: Option<HitTestRequest>,
    /// Issued and not yet answered.
    awaited_hit_test: Option<HitTestRequest>,
}

impl<D: Desktop> SpeechSession<D> {
    pub fn new(
        desktop: D,
        engine: Box<dyn SpeechEngine>,
        mut ui: Box<dyn UiSink>,
        prefs: Box<dyn Preferences>,
        keys: ChordKeys,
    ) -> Self {
        ui.set_state(SessionState::Inactive);
        Self {
            desktop,
            tts: TtsManager::new(engine),
            ui,
            prefs,
            input: KeyChordTracker::new(keys),
            state: SessionState::Inactive,
            cursor: Cursor::default(),
            speech_rate_multiplier: 1.0,
            supports_navigation_panel: true,
            scroll_to_spoken_node: false,
            revalidating: false,
            pending: None,
            hit_test_generation: 0,
            pending_hit_test: None,
            awaited_hit_test: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn desktop(&self) -> &D {
        &self.desktop
    }

    /// Mutable access for hosts that edit the tree between events.
    pub fn desktop_mut(&mut self) -> &mut D {
        &mut self.desktop
    }

    pub fn input(&self) -> &KeyChordTracker {
        &self.input
    }

    pub fn current_group(&self) -> Option<&NodeGroup> {
        self.cursor.current_group()
    }

    pub fn char_index(&self) -> usize {
        self.cursor.char_index
    }

    pub fn current_word(&self) -> Option<WordSpan> {
        self.cursor.current_word
    }

    pub fn speech_rate_multiplier(&self) -> f32 {
        self.speech_rate_multiplier
    }

    /// Speaking state with the engine stopped.
    pub fn is_paused(&self) -> bool {
        !self.tts.is_speaking() && self.state == SessionState::Speaking
    }

    pub fn on_keys_changed<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = KeyCode>,
    {
        let intents = self.input.on_keys_changed(keys);
        self.apply_intents(intents);
    }

    pub fn on_mouse_event(&mut self, kind: MouseEventKind, x: i32, y: i32) {
        let can_start = self.state != SessionState::Selecting;
        let intents = self.input.on_mouse_event(kind, x, y, can_start);
        self.apply_intents(intents);
    }

    fn apply_intents(&mut self, intents: Vec<InputIntent>) {
        for intent in intents {
            match intent {
                InputIntent::StartSelecting { .. } => {
                    self.set_state(SessionState::Selecting);
                    self.cancel_if_speaking(false);
                }
                InputIntent::SelectionRectChanged(rect) => self.ui.set_selection_rect(rect),
                InputIntent::StopSelecting { x, y } => {
                    self.set_state(SessionState::Inactive);
                    self.request_hit_test(x, y);
                }
                InputIntent::KeystrokeSelection => self.speak_selection(),
                InputIntent::CancelRequest => self.cancel_if_speaking(true),
            }
        }
    }

    /// Feeds a raw engine callback. Stale utterances are dropped by the
    /// engine session; stale requests are dropped here.
    pub fn on_engine_event(&mut self, utterance: UtteranceId, event: EngineEvent) {
        if let Some(event) = self.tts.on_engine_event(utterance, event) {
            self.handle_tts_event(event);
        }
        self.run_pending_if_settled();
    }

    fn handle_tts_event(&mut self, event: TtsEvent) {
        if self.cursor.request.is_none() || self.cursor.request != self.tts.current_request() {
            log_debug(&format!("ignoring {event:?} for a superseded request"));
            return;
        }
        match event {
            TtsEvent::Start { char_index } => self.on_speech_started(char_index),
            TtsEvent::Resume { char_index } => {
                self.on_word(char_index, None);
                self.update_ui();
            }
            TtsEvent::Word { char_index, length } => self.on_word(char_index, length),
            TtsEvent::End { .. } => self.on_group_completed(),
            TtsEvent::Pause { .. } => {
                // Stay in speaking so the panel can offer resume.
                self.set_state(SessionState::Speaking);
                if self.should_show_navigation_controls() {
                    self.update_ui();
                } else {
                    self.set_state(SessionState::Inactive);
                }
            }
            TtsEvent::Interrupted | TtsEvent::Cancelled => {
                if !self.should_show_navigation_controls() {
                    self.set_state(SessionState::Inactive);
                }
            }
            TtsEvent::Error(TtsError::ResumeWithEmptyContent) => self.on_resume_with_empty_content(),
            TtsEvent::Error(TtsError::Engine(message)) => {
                tracing::warn!(error = %message, "speech engine failed; stopping");
                log_debug(&format!("speech engine error: {message}"));
                self.ui.speech_error(&message);
                self.stop_all();
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        if state == SessionState::Inactive {
            // Nothing may keep speaking once the session is inactive.
            self.tts.stop();
            self.pending = None;
            self.clear_focus_ring_and_node();
        }
        tracing::info!(from = self.state.label(), to = state.label(), "session state changed");
        log_debug(&format!("state {} -> {}", self.state.label(), state.label()));
        self.state = state;
        self.ui.set_state(state);
    }

    fn clear_focus_ring_and_node(&mut self) {
        self.ui.clear();
        self.cursor.reset();
        self.supports_navigation_panel = true;
        self.revalidating = false;
        self.scroll_to_spoken_node = false;
    }

    /// Stops speech and returns to inactive, dropping any deferred work and
    /// the queue even when the state was already inactive.
    fn stop_all(&mut self) {
        self.tts.stop();
        self.pending = None;
        self.ui.clear();
        self.cursor.reset();
        self.revalidating = false;
        self.set_state(SessionState::Inactive);
    }

    fn cancel_if_speaking(&mut self, clear_focus_ring: bool) {
        if clear_focus_ring {
            self.stop_all();
        } else {
            self.tts.stop();
            self.pending = None;
        }
    }

    fn should_show_navigation_controls(&self) -> bool {
        self.prefs.navigation_controls_enabled() && self.supports_navigation_panel
    }

    /// Replaces the queue with groups built from `nodes` and starts the first.
    fn start_speech_queue(
        &mut self,
        nodes: Vec<NodeId>,
        clear_focus_ring: bool,
        start_char: Option<usize>,
        end_char: Option<usize>,
    ) {
        self.cancel_if_speaking(clear_focus_ring);
        self.revalidating = true;
        if nodes.is_empty() {
            return;
        }
        self.supports_navigation_panel = !nodes.iter().any(|n| self.desktop.is_system_ui(*n));
        self.update_node_groups(&nodes, start_char, end_char);
        self.start_current_group();
    }

    fn update_node_groups(&mut self, nodes: &[NodeId], start_char: Option<usize>, end_char: Option<usize>) {
        self.cursor.reset();
        let options = GroupingOptions {
            split_on_language: self.prefs.voice_switching_enabled(),
        };
        self.cursor.groups = build_node_groups(&self.desktop, nodes, start_char, end_char, &options);
        if !self.cursor.groups.is_empty() {
            self.cursor.group_index = Some(0);
        }
        log_debug(&format!(
            "queued {} node(s) as {} group(s)",
            nodes.len(),
            self.cursor.groups.len()
        ));
    }

    fn start_current_group(&mut self) {
        let Some(group) = self.cursor.current_group() else {
            return;
        };
        if is_blank(&group.text) {
            self.on_group_completed();
            return;
        }
        let text = group.text.clone();
        self.cursor.char_index = 0;
        self.cursor.item_index = None;
        self.cursor.current_word = None;

        let options = self.tts_options_for_current_group();
        let use_remote_voice = options
            .voice_name
            .as_deref()
            .is_some_and(|voice| self.prefs.is_network_voice(voice));
        match self.tts.speak(&text, options, use_remote_voice, self.prefs.local_voice()) {
            Ok(request) => self.cursor.request = Some(request),
            Err(err) => {
                log_debug(&format!("speak rejected: {err:#}"));
                tracing::error!(error = %err, "speak request rejected");
            }
        }
    }

    fn tts_options_for_current_group(&self) -> SpeechOptions {
        let voice_switching = self.prefs.voice_switching_enabled();
        let language = self
            .cursor
            .current_group()
            .filter(|_| voice_switching)
            .and_then(|group| group.detected_language.as_deref());
        let mut options = self.prefs.speech_options(language, voice_switching);
        if self.should_show_navigation_controls() {
            let rate = self.prefs.speech_rate() * self.speech_rate_multiplier;
            options.rate = Some((rate * 10.0).round() / 10.0);
        }
        options
    }

    fn on_group_completed(&mut self) {
        let Some(group) = self.cursor.current_group() else {
            return;
        };
        self.cursor.char_index = group.terminal_char_index();
        if self.cursor.is_last_group() {
            if self.should_show_navigation_controls() {
                // Keep the panel up so the user can navigate or exit.
                self.set_state(SessionState::Speaking);
                self.update_ui();
            } else {
                self.set_state(SessionState::Inactive);
            }
            return;
        }
        self.cursor.group_index = self.cursor.group_index.map(|index| index + 1);
        self.start_current_group();
    }

    /// Redraws the current node while a queue is live.
    pub fn on_revalidate_tick(&mut self) {
        if self.revalidating {
            self.update_ui();
        }
    }

    /// The user scrolled by hand; stop scrolling the spoken node into view.
    pub fn on_user_scrolled(&mut self) {
        self.scroll_to_spoken_node = false;
    }

    /// Stops everything; the panel's exit button.
    pub fn on_exit_requested(&mut self) {
        self.stop_all();
    }
}
