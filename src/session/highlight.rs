use super::{SessionState, SpeechSession};
use crate::content::{Desktop, NodeState, WordSpan};
use crate::geometry::Rect;
use crate::ui::PanelUpdate;

impl<D: Desktop> SpeechSession<D> {
    pub(super) fn on_speech_started(&mut self, char_index: usize) {
        if self.cursor.current_group().map_or(true, |group| group.nodes.is_empty()) {
            return;
        }
        self.set_state(SessionState::Speaking);
        self.cursor.char_index = char_index;
        self.cursor.sync_item(char_index, 0);
        if self.prefs.word_highlighting_enabled() {
            self.cursor.current_word = None;
            // A non-zero start means the group was clipped; the word starts there.
            self.update_node_highlight(char_index, (char_index != 0).then_some(char_index));
        } else {
            self.update_ui();
        }
    }

    pub(super) fn on_word(&mut self, char_index: usize, length: Option<usize>) {
        self.cursor.char_index = self.cursor.char_index.max(char_index);
        let from = self.cursor.item_index.unwrap_or(0);
        let item_changed = self.cursor.sync_item(char_index, from);

        if !self.prefs.word_highlighting_enabled() {
            self.cursor.current_word = None;
            if item_changed {
                self.update_ui();
            }
            return;
        }

        let Some(length) = length else {
            self.update_node_highlight(char_index, None);
            return;
        };
        let Some(item) = self.cursor.current_item() else {
            return;
        };
        let node_len = self.desktop.text_len(item.node);
        let start = char_index.saturating_sub(item.start_char);
        let end = start.saturating_add(length).min(node_len);
        let advances = self.cursor.current_word.map_or(true, |word| start >= word.start);
        if advances && start <= end {
            self.cursor.current_word = Some(WordSpan { start, end });
            self.update_ui();
        }
    }

    /// Highlights the word at `char_index` unless it would move the highlight
    /// backwards within the current node.
    fn update_node_highlight(&mut self, char_index: usize, start_override: Option<usize>) {
        let (Some(group), Some(item)) = (self.cursor.current_group(), self.cursor.current_item()) else {
            return;
        };
        if char_index >= group.text.len() {
            return;
        }
        let Some(word) = self.desktop.next_word_boundary(&group.text, char_index) else {
            return;
        };
        let start = start_override.unwrap_or(word.start);
        let node_start = start.saturating_sub(item.start_char);
        let node_end = word
            .end
            .saturating_sub(item.start_char)
            .min(self.desktop.text_len(item.node));
        let advances = self
            .cursor
            .current_word
            .map_or(true, |current| node_start >= current.end);
        if advances && node_start <= node_end {
            self.cursor.current_word = Some(WordSpan {
                start: node_start,
                end: node_end,
            });
            self.update_ui();
        }
    }

    /// Draws the focus ring, word highlight and panel for the current item,
    /// or clears everything if the node is gone or in the background.
    pub(super) fn update_ui(&mut self) {
        let (Some(group), Some(item)) = (self.cursor.current_group(), self.cursor.current_item()) else {
            return;
        };
        let block_parent = group.block_parent;
        let word = self.cursor.current_word;

        let in_foreground =
            self.desktop.bounds(item.node).is_some() && self.desktop.is_in_foreground(item.node);
        if self.desktop.node_state(item.node) != NodeState::Normal || !in_foreground {
            self.ui.clear();
            return;
        }

        let show_panel = self.should_show_navigation_controls();
        let inline = match word {
            Some(word) if item.has_inline_text => self.desktop.inline_text_at(item.node, word.start),
            None if item.has_inline_text && show_panel => self.desktop.inline_text_at(item.node, 0),
            _ => None,
        };
        let spoken = inline.unwrap_or(item.node);
        if self.scroll_to_spoken_node && self.desktop.is_offscreen(spoken) {
            self.desktop.make_visible(spoken);
        }

        let spoken_bounds = self.desktop.bounds(spoken);
        let focus = if show_panel {
            block_parent
                .and_then(|parent| self.desktop.bounds(parent))
                .or(spoken_bounds)
        } else {
            spoken_bounds
        };
        let rects: Vec<Rect> = focus.into_iter().collect();
        self.ui.set_focus_ring(&rects, word.is_some(), show_panel);

        let highlight = word.and_then(|w| self.desktop.bounds_for_range(item.node, w.start, w.end));
        let color = self.prefs.highlight_color();
        self.ui.set_highlight(highlight, &color);

        let panel = PanelUpdate {
            visible: show_panel,
            anchor: focus,
            paused: self.is_paused(),
            speech_rate_multiplier: self.speech_rate_multiplier,
        };
        self.ui.update_panel(&panel);
    }
}
