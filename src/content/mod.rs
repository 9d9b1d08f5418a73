//! Interfaces to the accessibility tree and text layout that supply content
//! nodes, plus an in-memory tree implementation.
//!
//! The speech core never owns nodes. It refers to them by [`NodeId`] and asks
//! the collaborators below for text, geometry, grouping and navigation.

mod document;
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::geometry::Rect;
use crate::paragraph::NodeGroup;

pub use document::{DocumentTree, NodeSpec, Role};

/// Opaque handle to a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A concrete leaf and a byte offset into its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    /// Builds a position with the offset clamped to `[0, text_len]`.
    pub fn clamped(node: NodeId, offset: usize, text_len: usize) -> Self {
        Self {
            node,
            offset: offset.min(text_len),
        }
    }
}

/// Liveness of a node as seen by the UI tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Normal,
    Invisible,
    Invalid,
}

/// Selection endpoints as reported by the tree, before leaf resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSelection {
    pub start_node: NodeId,
    pub start_offset: usize,
    pub end_node: NodeId,
    pub end_offset: usize,
}

impl RawSelection {
    pub fn is_collapsed(&self) -> bool {
        self.start_node == self.end_node && self.start_offset == self.end_offset
    }
}

/// Word span in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
}

/// Nodes to read plus the offset into the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRun {
    pub nodes: Vec<NodeId>,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingOptions {
    /// Start a new group whenever the detected language changes.
    pub split_on_language: bool,
}

/// Read access to the content tree.
pub trait ContentSource {
    fn focused_node(&self) -> Option<NodeId>;
    /// Document selection if there is one, else the focused text field's selection.
    fn selection(&self, focused: NodeId) -> Option<RawSelection>;
    /// Name-or-value text of the node.
    fn text(&self, node: NodeId) -> Option<&str>;
    fn text_len(&self, node: NodeId) -> usize {
        self.text(node).map_or(0, str::len)
    }
    fn bounds(&self, node: NodeId) -> Option<Rect>;
    /// Approximate screen bounds of `[start, end)` within the node's text.
    fn bounds_for_range(&self, node: NodeId, start: usize, end: usize) -> Option<Rect>;
    fn node_state(&self, node: NodeId) -> NodeState;
    fn is_selectable(&self, node: NodeId) -> bool;
    fn is_offscreen(&self, node: NodeId) -> bool;
    fn should_ignore(&self, node: NodeId, include_offscreen: bool) -> bool;
    fn is_in_foreground(&self, node: NodeId) -> bool;
    /// Nearest window, web area, dialog, toolbar or desktop containing the node.
    fn container_root(&self, node: NodeId) -> NodeId;
    fn nodes_intersecting(&self, root: NodeId, rect: Rect) -> Vec<NodeId>;
    fn all_nodes_in_paragraph(&self, node: NodeId) -> Vec<NodeId>;
    /// Translates a selection endpoint that may be anchored on a container into a leaf.
    fn resolve_selection_to_leaf_position(&self, node: NodeId, offset: usize, is_start: bool)
        -> Position;
    /// Tree order of `to` relative to `from`.
    fn direction(&self, from: NodeId, to: NodeId) -> Direction;
    fn next_readable_leaf(&self, node: NodeId) -> Option<NodeId>;
    /// Inline text child of `node` covering `char_index`, if the node has inline children.
    fn inline_text_at(&self, node: NodeId, char_index: usize) -> Option<NodeId>;
    fn is_tray_button(&self, node: NodeId) -> bool;
    fn is_in_panel(&self, node: NodeId) -> bool;
    /// True when the node's tree is the desktop itself (system UI).
    fn is_system_ui(&self, node: NodeId) -> bool;
    fn make_visible(&mut self, node: NodeId);
}

/// Paragraph grouping and word boundaries.
pub trait TextLayout {
    /// Groups nodes starting at `start` into one paragraph-sized group.
    fn build_node_group(&self, nodes: &[NodeId], start: usize, options: &GroupingOptions)
        -> NodeGroup;

    /// Offset of `node`'s text within the node that represents it in a group.
    fn start_char_index_in_parent(&self, node: NodeId) -> usize;

    /// Node that represents `node` as a group item.
    fn group_item_node(&self, node: NodeId) -> NodeId {
        node
    }

    /// First word at or after `char_index`.
    fn next_word_boundary(&self, text: &str, char_index: usize) -> Option<WordSpan> {
        text.split_word_bound_indices()
            .filter(|(_, word)| !word.chars().all(char::is_whitespace))
            .map(|(start, word)| WordSpan {
                start,
                end: start + word.len(),
            })
            .find(|span| span.end > char_index)
            .map(|span| WordSpan {
                start: span.start.max(char_index),
                end: span.end,
            })
    }
}

/// Sentence and paragraph navigation relative to the group being spoken.
pub trait Navigator {
    /// Nodes of the adjacent paragraph accepted by `accept`.
    fn nodes_for_next_paragraph(
        &self,
        group: &NodeGroup,
        direction: Direction,
        accept: &dyn Fn(&[NodeId]) -> bool,
    ) -> Vec<NodeId>;

    /// Nodes starting at the adjacent sentence boundary.
    fn nodes_for_next_sentence(
        &self,
        group: &NodeGroup,
        char_index: usize,
        direction: Direction,
        accept: &dyn Fn(&[NodeId]) -> bool,
    ) -> NodeRun;

    /// Unread nodes of the paragraph containing `position`.
    fn next_nodes_in_paragraph_from_position(
        &self,
        position: Position,
        direction: Direction,
    ) -> NodeRun;
}

/// Everything the session needs from its host tree.
pub trait Desktop: ContentSource + TextLayout + Navigator {}

impl<T: ContentSource + TextLayout + Navigator> Desktop for T {}
