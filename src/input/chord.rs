use std::collections::BTreeSet;

use super::{ChordKeys, InputIntent, KeyCode, MouseEventKind};
use crate::geometry::Rect;
use crate::log_debug;

/// Deterministic state machine over the set of pressed keys plus mouse drags.
///
/// Each key snapshot from the host is authoritative: derived state is updated
/// from the set difference against the previous snapshot, then the previous
/// snapshot is replaced wholesale so a missed key-up heals on the next tick.
#[derive(Debug)]
pub struct KeyChordTracker {
    keys: ChordKeys,
    /// Keys down as of the last snapshot.
    keys_currently_down: BTreeSet<KeyCode>,
    /// Every key seen down since the set was last empty.
    keys_pressed_together: BTreeSet<KeyCode>,
    /// Activation key is held on its own (mouse selection armed).
    is_search_down: bool,
    /// Activation + read-selection chord is held.
    is_selection_chord_down: bool,
    /// A mouse drag is in progress.
    is_tracking_mouse: bool,
    /// Mouse selection was armed by an explicit request (tray button) rather than a key.
    armed_by_request: bool,
    /// A drag happened at some point during the current chord.
    did_track_mouse_since_chord_start: bool,
    mouse_start: (i32, i32),
    mouse_end: (i32, i32),
}

impl KeyChordTracker {
    pub fn new(keys: ChordKeys) -> Self {
        Self {
            keys,
            keys_currently_down: BTreeSet::new(),
            keys_pressed_together: BTreeSet::new(),
            is_search_down: false,
            is_selection_chord_down: false,
            is_tracking_mouse: false,
            armed_by_request: false,
            did_track_mouse_since_chord_start: false,
            mouse_start: (0, 0),
            mouse_end: (0, 0),
        }
    }

    pub fn chord_keys(&self) -> ChordKeys {
        self.keys
    }

    pub fn is_search_down(&self) -> bool {
        self.is_search_down
    }

    pub fn is_selection_chord_down(&self) -> bool {
        self.is_selection_chord_down
    }

    pub fn is_tracking_mouse(&self) -> bool {
        self.is_tracking_mouse
    }

    pub fn is_armed_by_request(&self) -> bool {
        self.armed_by_request
    }

    pub fn keys_currently_down(&self) -> &BTreeSet<KeyCode> {
        &self.keys_currently_down
    }

    pub fn keys_pressed_together(&self) -> &BTreeSet<KeyCode> {
        &self.keys_pressed_together
    }

    /// Rectangle spanned by the drag origin and the latest mouse point.
    pub fn selection_rect(&self) -> Rect {
        Rect::spanning(self.mouse_start, self.mouse_end)
    }

    /// Arms (or disarms) mouse selection without the activation key.
    pub fn set_tracking_mouse(&mut self, tracking: bool) {
        self.armed_by_request = tracking;
        if !tracking {
            self.is_tracking_mouse = false;
        }
    }

    /// Feeds a new authoritative snapshot of the pressed keys.
    pub fn on_keys_changed<I>(&mut self, new_keys: I) -> Vec<InputIntent>
    where
        I: IntoIterator<Item = KeyCode>,
    {
        let new_keys: BTreeSet<KeyCode> = new_keys.into_iter().collect();
        let removed: BTreeSet<KeyCode> = self
            .keys_currently_down
            .difference(&new_keys)
            .copied()
            .collect();
        let added = new_keys.difference(&self.keys_currently_down).next().is_some();

        let mut intents = Vec::new();
        if !removed.is_empty() {
            self.on_keys_released(&removed, &mut intents);
        }
        if added {
            self.on_keys_pressed(&new_keys);
        }

        self.keys_currently_down = new_keys;
        if self.keys_currently_down.is_empty() {
            self.did_track_mouse_since_chord_start = false;
            self.keys_pressed_together.clear();
        }
        intents
    }

    fn on_keys_pressed(&mut self, new_keys: &BTreeSet<KeyCode>) {
        self.keys_pressed_together.extend(new_keys.iter().copied());
        if self.keys_pressed_together.len() == 1
            && self.keys_pressed_together.contains(&self.keys.activation)
        {
            self.is_search_down = true;
        } else if self.is_search_down
            && new_keys.len() == 2
            && new_keys.contains(&self.keys.read_selection)
            && !self.is_tracking_mouse
        {
            self.is_selection_chord_down = true;
        } else if !self.is_tracking_mouse {
            // Any other key breaks the chord.
            self.is_search_down = false;
        }
    }

    fn on_keys_released(&mut self, removed: &BTreeSet<KeyCode>, intents: &mut Vec<InputIntent>) {
        let search_went_up = removed.contains(&self.keys.activation);
        let modifier_went_up = removed.contains(&self.keys.modifier);
        let read_selection_went_up = removed.contains(&self.keys.read_selection);
        let mut cancelled = false;

        if read_selection_went_up {
            if self.is_selection_chord_down && self.pressed_exactly_read_selection_chord() {
                intents.push(InputIntent::KeystrokeSelection);
            }
            self.is_selection_chord_down = false;
        } else if search_went_up {
            self.is_search_down = false;
            self.is_selection_chord_down = false;
            if self.is_tracking_mouse || self.armed_by_request {
                self.is_tracking_mouse = false;
                self.armed_by_request = false;
                intents.push(InputIntent::CancelRequest);
                cancelled = true;
            }
        }

        // Tap-to-cancel: a lone activation or modifier tap with no drag. Suppressed
        // when the branch above already asked to cancel on this tick.
        if !cancelled
            && !self.did_track_mouse_since_chord_start
            && (search_went_up || modifier_went_up)
            && self.keys_pressed_together.len() == 1
        {
            self.is_tracking_mouse = false;
            self.armed_by_request = false;
            intents.push(InputIntent::CancelRequest);
        }
    }

    fn pressed_exactly_read_selection_chord(&self) -> bool {
        self.keys_pressed_together.len() == 2
            && self.keys_pressed_together.contains(&self.keys.activation)
            && self.keys_pressed_together.contains(&self.keys.read_selection)
    }

    /// Feeds a mouse event. `can_start_selecting` is the caller's veto for new
    /// drags (false while a selection is already in progress).
    pub fn on_mouse_event(
        &mut self,
        kind: MouseEventKind,
        x: i32,
        y: i32,
        can_start_selecting: bool,
    ) -> Vec<InputIntent> {
        match kind {
            MouseEventKind::Press => self.on_mouse_press(x, y, can_start_selecting),
            MouseEventKind::Move => self.on_mouse_move(x, y),
            MouseEventKind::Release => self.on_mouse_release(x, y),
        }
    }

    fn on_mouse_press(&mut self, x: i32, y: i32, can_start_selecting: bool) -> Vec<InputIntent> {
        if self.is_selection_chord_down {
            return Vec::new();
        }
        let armed = self.is_search_down || self.armed_by_request;
        if !armed || (!can_start_selecting && !self.armed_by_request) {
            return Vec::new();
        }

        self.is_tracking_mouse = true;
        self.did_track_mouse_since_chord_start = true;
        self.mouse_start = (x, y);
        self.mouse_end = (x, y);
        log_debug(&format!("mouse selection started at ({x}, {y})"));
        vec![
            InputIntent::StartSelecting { x, y },
            InputIntent::SelectionRectChanged(self.selection_rect()),
        ]
    }

    fn on_mouse_move(&mut self, x: i32, y: i32) -> Vec<InputIntent> {
        if !self.is_tracking_mouse {
            return Vec::new();
        }
        self.mouse_end = (x, y);
        vec![InputIntent::SelectionRectChanged(self.selection_rect())]
    }

    fn on_mouse_release(&mut self, x: i32, y: i32) -> Vec<InputIntent> {
        if !self.is_tracking_mouse {
            return Vec::new();
        }
        self.mouse_end = (x, y);
        let rect = self.selection_rect();
        self.is_tracking_mouse = false;
        self.armed_by_request = false;

        // Key-up can race ahead of mouse-up; if the activation key is already gone
        // the chord is over.
        if !self.keys_currently_down.contains(&self.keys.activation) {
            self.did_track_mouse_since_chord_start = false;
        }

        let (cx, cy) = rect.center();
        vec![
            InputIntent::SelectionRectChanged(rect),
            InputIntent::StopSelecting { x: cx, y: cy },
        ]
    }
}

impl Default for KeyChordTracker {
    fn default() -> Self {
        Self::new(ChordKeys::default())
    }
}
