use super::{Navigation, PendingAction, SessionState, SpeechSession};
use crate::content::{Desktop, Direction, NodeId};
use crate::log_debug;
use crate::tts::PauseSignal;

impl<D: Desktop> SpeechSession<D> {
    /// Pauses playback. The signal settles once the engine has actually stopped.
    pub fn on_pause_requested(&mut self) -> PauseSignal {
        self.tts.pause()
    }

    pub fn on_resume_requested(&mut self) {
        if !self.is_paused() || self.cursor.current_group().is_none() {
            return;
        }
        self.resume_current_group();
    }

    pub fn on_next_sentence_requested(&mut self) {
        self.on_navigation_requested(Navigation::Sentence(Direction::Forward));
    }

    pub fn on_previous_sentence_requested(&mut self) {
        self.on_navigation_requested(Navigation::Sentence(Direction::Backward));
    }

    pub fn on_next_paragraph_requested(&mut self) {
        self.on_navigation_requested(Navigation::Paragraph(Direction::Forward));
    }

    pub fn on_previous_paragraph_requested(&mut self) {
        self.on_navigation_requested(Navigation::Paragraph(Direction::Backward));
    }

    /// Moves to the adjacent sentence or paragraph, pausing first if needed.
    pub fn on_navigation_requested(&mut self, navigation: Navigation) {
        if self.is_paused() {
            self.navigate(navigation);
            return;
        }
        let signal = self.tts.pause();
        self.await_pause(PendingAction::Navigate(navigation), signal);
    }

    /// Changes the rate multiplier, restarting playback at the new rate.
    pub fn on_change_speed_requested(&mut self, multiplier: f32) {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            log_debug(&format!("ignoring speech rate multiplier {multiplier}"));
            return;
        }
        self.speech_rate_multiplier = multiplier;
        if self.tts.current_utterance().is_some() {
            let signal = self.tts.pause();
            self.await_pause(PendingAction::Resume, signal);
        } else {
            self.update_ui();
        }
    }

    /// Tray button: toggles selection mode or cancels speech.
    pub fn on_state_change_requested(&mut self) {
        match self.state {
            SessionState::Inactive => {
                self.input.set_tracking_mouse(true);
                self.set_state(SessionState::Selecting);
            }
            SessionState::Speaking => self.cancel_if_speaking(true),
            SessionState::Selecting => {
                self.input.set_tracking_mouse(false);
                self.set_state(SessionState::Inactive);
            }
        }
    }

    fn await_pause(&mut self, action: PendingAction, signal: PauseSignal) {
        if signal.is_settled() {
            self.pending = None;
            self.run_action(action);
        } else {
            self.pending = Some((action, signal));
        }
    }

    pub(super) fn run_pending_if_settled(&mut self) {
        let settled = self
            .pending
            .as_ref()
            .is_some_and(|(_, signal)| signal.is_settled());
        if !settled {
            return;
        }
        if let Some((action, _)) = self.pending.take() {
            self.run_action(action);
        }
    }

    fn run_action(&mut self, action: PendingAction) {
        match action {
            PendingAction::Resume => {
                if self.state == SessionState::Speaking {
                    self.resume_current_group();
                }
            }
            PendingAction::Navigate(navigation) => self.navigate(navigation),
        }
    }

    fn resume_current_group(&mut self) {
        let options = self.tts_options_for_current_group();
        if let Some(event) = self.tts.resume(Some(options)) {
            self.handle_tts_event(event);
        }
    }

    /// Resume found only whitespace left: read the rest of the paragraph, or
    /// the next one when nothing remains.
    pub(super) fn on_resume_with_empty_content(&mut self) {
        let char_index = self.cursor.char_index.max(self.tts.current_char_index());
        let position = self
            .cursor
            .current_group()
            .and_then(|group| group.position_at(&self.desktop, char_index, true));
        let run = position
            .map(|position| {
                self.desktop
                    .next_nodes_in_paragraph_from_position(position, Direction::Forward)
            })
            .unwrap_or_default();
        if run.nodes.is_empty() {
            self.navigate(Navigation::Paragraph(Direction::Forward));
        } else {
            self.start_speech_queue(run.nodes, false, Some(run.offset), None);
        }
    }

    fn navigate(&mut self, navigation: Navigation) {
        let Some(group) = self.cursor.current_group() else {
            return;
        };
        let desktop = &self.desktop;
        let outside_panel = |nodes: &[NodeId]| nodes.first().is_some_and(|node| !desktop.is_in_panel(*node));
        let (nodes, offset) = match navigation {
            Navigation::Paragraph(direction) => (
                desktop.nodes_for_next_paragraph(group, direction, &outside_panel),
                None,
            ),
            Navigation::Sentence(direction) => {
                let run = desktop.nodes_for_next_sentence(
                    group,
                    self.cursor.char_index,
                    direction,
                    &outside_panel,
                );
                (run.nodes, Some(run.offset))
            }
        };
        let Some(&first) = nodes.first() else {
            log_debug(&format!("nothing to navigate to for {navigation:?}"));
            return;
        };
        self.desktop.make_visible(first);
        self.start_speech_queue(nodes, false, offset, None);
    }
}
