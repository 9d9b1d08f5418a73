//! JSON-lines protocol between the speech core and its host.
//!
//! The host owns the real accessibility tree, the synthesizer and the
//! screen; it mirrors the first into a document tree, forwards raw input and
//! engine callbacks as commands, and renders the events it gets back.

use serde::{Deserialize, Serialize};

use crate::content::{NodeId, NodeSpec, RawSelection};
use crate::geometry::Rect;
use crate::input::{KeyCode, MouseEventKind};
use crate::prefs::PreferenceUpdate;
use crate::session::SessionState;
use crate::tts::{EngineEvent, SpeechOptions, UtteranceId};
use crate::ui::PanelUpdate;

// ============================================================================
// IPC Events (core → host)
// ============================================================================

/// Serialized with an `"event"` tag field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum IpcEvent {
    /// Sent once on startup and on request
    #[serde(rename = "capabilities")]
    Capabilities {
        session_id: String,
        version: String,
        document_loaded: bool,
        word_highlighting: bool,
        navigation_controls: bool,
        voice_switching: bool,
        activation_key: KeyCode,
        modifier_key: KeyCode,
        read_selection_key: KeyCode,
        revalidate_interval_ms: u64,
    },

    /// Start synthesizing `text`; report progress with `engine_event` for this utterance
    #[serde(rename = "speak")]
    Speak {
        utterance: UtteranceId,
        text: String,
        options: SpeechOptions,
    },

    /// Stop whatever the synthesizer is playing and report `interrupted`
    /// for the utterance that was cut off
    #[serde(rename = "stop")]
    Stop,

    #[serde(rename = "state")]
    State { state: SessionState },

    /// Rectangle being dragged out
    #[serde(rename = "selection_rect")]
    SelectionRect { rect: Rect },

    #[serde(rename = "focus_ring")]
    FocusRing {
        rects: Vec<Rect>,
        draw_background: bool,
        panel_visible: bool,
    },

    /// Word highlight; a missing `bounds` hides it
    #[serde(rename = "highlight")]
    Highlight {
        #[serde(skip_serializing_if = "Option::is_none")]
        bounds: Option<Rect>,
        color: String,
    },

    #[serde(rename = "panel")]
    Panel(PanelUpdate),

    /// Remove the focus ring, highlight and panel
    #[serde(rename = "clear")]
    Clear,

    /// Read-selection was requested with nothing selected
    #[serde(rename = "null_selection")]
    NullSelection { focus_panel: bool },

    /// Error (recoverable or fatal)
    #[serde(rename = "error")]
    Error { message: String, recoverable: bool },
}

// ============================================================================
// IPC Commands (host → core)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd")]
pub enum IpcCommand {
    /// Replace the document tree, from a file or inline
    #[serde(rename = "load_document")]
    LoadDocument {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        document: Option<NodeSpec>,
    },

    /// Move focus; `text_selection` is `[start, end]` within the focused field
    #[serde(rename = "set_focus")]
    SetFocus {
        #[serde(default)]
        node: Option<NodeId>,
        #[serde(default)]
        text_selection: Option<(usize, usize)>,
    },

    #[serde(rename = "set_selection")]
    SetSelection {
        #[serde(default)]
        selection: Option<RawSelection>,
    },

    /// Window that currently has focus; `null` means everything is foreground
    #[serde(rename = "set_foreground_window")]
    SetForegroundWindow {
        #[serde(default)]
        window: Option<NodeId>,
    },

    /// The node (and its subtree) went away
    #[serde(rename = "invalidate_node")]
    InvalidateNode { node: NodeId },

    /// Every key currently held down
    #[serde(rename = "keys")]
    Keys { keys: Vec<KeyCode> },

    #[serde(rename = "mouse")]
    Mouse {
        kind: MouseEventKind,
        x: i32,
        y: i32,
    },

    /// Callback from the synthesizer for one utterance
    #[serde(rename = "engine_event")]
    EngineEvent {
        utterance: UtteranceId,
        event: EngineEvent,
    },

    #[serde(rename = "pause")]
    Pause,

    #[serde(rename = "resume")]
    Resume,

    #[serde(rename = "next_sentence")]
    NextSentence,

    #[serde(rename = "previous_sentence")]
    PreviousSentence,

    #[serde(rename = "next_paragraph")]
    NextParagraph,

    #[serde(rename = "previous_paragraph")]
    PreviousParagraph,

    /// Panel exit button: stop speaking and go inactive
    #[serde(rename = "exit")]
    Exit,

    /// Tray button
    #[serde(rename = "state_change")]
    StateChange,

    #[serde(rename = "change_speed")]
    ChangeSpeed { multiplier: f32 },

    /// Context menu "speak selection"
    #[serde(rename = "speak_selection")]
    SpeakSelection,

    #[serde(rename = "user_scrolled")]
    UserScrolled,

    #[serde(rename = "set_prefs")]
    SetPrefs { prefs: PreferenceUpdate },

    /// Request capabilities (re-emit capabilities event)
    #[serde(rename = "get_capabilities")]
    GetCapabilities,
}
