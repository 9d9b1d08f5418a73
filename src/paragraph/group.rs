use crate::content::{ContentSource, NodeId, Position};
use crate::utf8_safe::{blank_prefix, floor_char_boundary};

/// One node's slice of a group's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeGroupItem {
    pub node: NodeId,
    /// Offset of this node's text within [`NodeGroup::text`].
    pub start_char: usize,
    /// The node's text lives in inline text children.
    pub has_inline_text: bool,
}

/// A paragraph-sized run of nodes spoken as one utterance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeGroup {
    pub nodes: Vec<NodeGroupItem>,
    pub text: String,
    /// Index into the input node list of the last node consumed.
    pub end_index: usize,
    /// Set when the end of the text was clipped.
    pub end_offset: Option<usize>,
    pub block_parent: Option<NodeId>,
    pub detected_language: Option<String>,
}

impl NodeGroup {
    pub fn new(block_parent: Option<NodeId>, detected_language: Option<String>) -> Self {
        Self {
            block_parent,
            detected_language,
            ..Self::default()
        }
    }

    /// Appends a node's text, followed by a space unless it already ends in whitespace.
    /// Empty text adds no item.
    pub fn push(&mut self, node: NodeId, text: &str, has_inline_text: bool) {
        if text.is_empty() {
            return;
        }
        self.nodes.push(NodeGroupItem {
            node,
            start_char: self.text.len(),
            has_inline_text,
        });
        self.text.push_str(text);
        if !text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
    }

    pub fn with_end_index(mut self, end_index: usize) -> Self {
        self.end_index = end_index;
        self
    }

    /// Blanks everything before `offset` with spaces so indices stay aligned.
    pub fn with_start_offset(mut self, offset: usize) -> Self {
        self.text = blank_prefix(&self.text, offset);
        self
    }

    /// Drops everything from `offset` on and records where the text now ends.
    pub fn with_end_offset(mut self, offset: usize) -> Self {
        let offset = floor_char_boundary(&self.text, offset);
        self.text.truncate(offset);
        self.end_offset = Some(offset);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index reached once the whole group has been spoken.
    pub fn terminal_char_index(&self) -> usize {
        self.end_offset.unwrap_or(self.text.len())
    }

    /// Position of `char_index` within the item that owns it.
    pub fn position_at<C: ContentSource + ?Sized>(
        &self,
        content: &C,
        char_index: usize,
        fallback_to_end: bool,
    ) -> Option<Position> {
        for item in &self.nodes {
            let len = content.text_len(item.node);
            if char_index < item.start_char + len {
                return Some(Position {
                    node: item.node,
                    offset: char_index.saturating_sub(item.start_char),
                });
            }
        }
        if !fallback_to_end {
            return None;
        }
        self.nodes.last().map(|item| Position {
            node: item.node,
            offset: content.text_len(item.node),
        })
    }
}
