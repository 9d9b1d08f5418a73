//! Keyboard chord and mouse-drag tracking.
//!
//! The tracker turns raw key-set snapshots and mouse events into a handful of
//! high-level intents. It knows nothing about speech or content.

mod chord;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

pub use chord::KeyChordTracker;

/// Platform key code as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const CONTROL: KeyCode = KeyCode(17);
    pub const S: KeyCode = KeyCode(83);
    pub const SEARCH: KeyCode = KeyCode(91);
}

/// The three keys the tracker gives meaning to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordKeys {
    /// Held to arm mouse selection; first half of the read-selection chord.
    pub activation: KeyCode,
    /// Tapped alone to cancel speech.
    pub modifier: KeyCode,
    /// Second half of the read-selection chord.
    pub read_selection: KeyCode,
}

impl Default for ChordKeys {
    fn default() -> Self {
        Self {
            activation: KeyCode::SEARCH,
            modifier: KeyCode::CONTROL,
            read_selection: KeyCode::S,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseEventKind {
    Press,
    Move,
    Release,
}

/// Intents emitted by [`KeyChordTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIntent {
    /// A mouse drag began at the given point.
    StartSelecting { x: i32, y: i32 },
    /// The drag rectangle changed.
    SelectionRectChanged(Rect),
    /// The drag ended; the point is the center of the final rectangle.
    StopSelecting { x: i32, y: i32 },
    /// The read-selection chord was pressed and released.
    KeystrokeSelection,
    /// The user asked to cancel input and speech.
    CancelRequest,
}
