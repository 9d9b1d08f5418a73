//! Speech engine and UI sink that forward to the host as IPC events.

use crossbeam_channel::Sender;

use super::protocol::IpcEvent;
use crate::geometry::Rect;
use crate::session::SessionState;
use crate::tts::{SpeechEngine, SpeechOptions, UtteranceId};
use crate::ui::{PanelUpdate, UiSink};

/// Queues an event for the writer; a closed channel means the loop is gone.
fn emit(events: &Sender<IpcEvent>, event: IpcEvent) {
    let _ = events.send(event);
}

pub(super) struct IpcSpeechEngine {
    events: Sender<IpcEvent>,
}

impl IpcSpeechEngine {
    pub(super) fn new(events: Sender<IpcEvent>) -> Self {
        Self { events }
    }
}

impl SpeechEngine for IpcSpeechEngine {
    fn speak(&mut self, utterance: UtteranceId, text: &str, options: &SpeechOptions) {
        emit(
            &self.events,
            IpcEvent::Speak {
                utterance,
                text: text.to_string(),
                options: options.clone(),
            },
        );
    }

    fn stop(&mut self) {
        emit(&self.events, IpcEvent::Stop);
    }
}

pub(super) struct IpcUiSink {
    events: Sender<IpcEvent>,
}

impl IpcUiSink {
    pub(super) fn new(events: Sender<IpcEvent>) -> Self {
        Self { events }
    }
}

impl UiSink for IpcUiSink {
    fn set_state(&mut self, state: SessionState) {
        emit(&self.events, IpcEvent::State { state });
    }

    fn set_selection_rect(&mut self, rect: Rect) {
        emit(&self.events, IpcEvent::SelectionRect { rect });
    }

    fn set_focus_ring(&mut self, rects: &[Rect], draw_background: bool, panel_visible: bool) {
        emit(
            &self.events,
            IpcEvent::FocusRing {
                rects: rects.to_vec(),
                draw_background,
                panel_visible,
            },
        );
    }

    fn set_highlight(&mut self, bounds: Option<Rect>, color: &str) {
        emit(
            &self.events,
            IpcEvent::Highlight {
                bounds,
                color: color.to_string(),
            },
        );
    }

    fn update_panel(&mut self, panel: &PanelUpdate) {
        emit(&self.events, IpcEvent::Panel(panel.clone()));
    }

    fn clear(&mut self) {
        emit(&self.events, IpcEvent::Clear);
    }

    fn null_selection(&mut self, focus_panel: bool) {
        emit(&self.events, IpcEvent::NullSelection { focus_panel });
    }

    fn speech_error(&mut self, message: &str) {
        emit(
            &self.events,
            IpcEvent::Error {
                message: message.to_string(),
                recoverable: true,
            },
        );
    }
}
