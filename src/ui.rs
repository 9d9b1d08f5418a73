//! Rendering sink for the focus ring, word highlight and navigation panel.

use serde::Serialize;

use crate::geometry::Rect;
use crate::session::SessionState;

/// Navigation panel contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelUpdate {
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Rect>,
    pub paused: bool,
    pub speech_rate_multiplier: f32,
}

pub trait UiSink {
    /// Published whenever the session state changes.
    fn set_state(&mut self, state: SessionState);
    /// Rectangle the user is dragging out.
    fn set_selection_rect(&mut self, rect: Rect);
    fn set_focus_ring(&mut self, rects: &[Rect], draw_background: bool, panel_visible: bool);
    /// Word highlight; `None` hides it.
    fn set_highlight(&mut self, bounds: Option<Rect>, color: &str);
    fn update_panel(&mut self, panel: &PanelUpdate);
    /// Removes every visual.
    fn clear(&mut self);
    /// The user asked to read a selection but nothing was selected.
    /// `focus_panel` is set when the navigation panel should take focus
    /// instead of an audible cue.
    fn null_selection(&mut self, focus_panel: bool);
    /// Non-fatal engine failure; speech has stopped.
    fn speech_error(&mut self, message: &str);
}
