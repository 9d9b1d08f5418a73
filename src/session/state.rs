use serde::{Deserialize, Serialize};

use crate::content::{Direction, WordSpan};
use crate::paragraph::{NodeGroup, NodeGroupItem};
use crate::tts::RequestId;

/// Externally visible session state. Paused is `Speaking` with the engine idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Inactive,
    Selecting,
    Speaking,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Inactive => "inactive",
            SessionState::Selecting => "selecting",
            SessionState::Speaking => "speaking",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Sentence(Direction),
    Paragraph(Direction),
}

/// Work deferred until a pause has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingAction {
    Resume,
    Navigate(Navigation),
}

/// Where playback is within the queued groups.
#[derive(Debug, Default)]
pub(crate) struct Cursor {
    pub(crate) groups: Vec<NodeGroup>,
    pub(crate) group_index: Option<usize>,
    pub(crate) item_index: Option<usize>,
    /// Furthest index reported within the current group.
    pub(crate) char_index: usize,
    /// Highlighted word, in the current item's local offsets.
    pub(crate) current_word: Option<WordSpan>,
    /// Engine request that owns the current group.
    pub(crate) request: Option<RequestId>,
}

impl Cursor {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn current_group(&self) -> Option<&NodeGroup> {
        self.group_index.and_then(|index| self.groups.get(index))
    }

    pub(crate) fn current_item(&self) -> Option<NodeGroupItem> {
        let group = self.current_group()?;
        self.item_index.and_then(|index| group.nodes.get(index).copied())
    }

    pub(crate) fn is_last_group(&self) -> bool {
        self.group_index
            .map_or(true, |index| index + 1 >= self.groups.len())
    }

    /// Moves the item cursor to the item owning `char_index`, scanning forward
    /// from `from`. Returns true when the item changed.
    pub(crate) fn sync_item(&mut self, char_index: usize, from: usize) -> bool {
        let Some(group) = self.group_index.and_then(|index| self.groups.get(index)) else {
            return false;
        };
        if group.nodes.is_empty() {
            return false;
        }
        let previous = self.item_index;
        if char_index == 0 {
            self.item_index = Some(0);
        } else {
            let mut index = from.min(group.nodes.len() - 1);
            while index + 1 < group.nodes.len() && char_index >= group.nodes[index + 1].start_char {
                index += 1;
                self.current_word = None;
            }
            self.item_index = Some(index);
        }
        if previous != self.item_index {
            self.current_word = None;
            return true;
        }
        false
    }
}
