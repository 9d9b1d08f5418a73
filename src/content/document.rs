use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::{
    ContentSource, Direction, GroupingOptions, Navigator, NodeId, NodeRun, NodeState, Position,
    RawSelection, TextLayout,
};
use crate::geometry::Rect;
use crate::paragraph::NodeGroup;
use crate::utf8_safe::{first_non_whitespace, is_blank};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Desktop,
    Window,
    RootWebArea,
    Dialog,
    Toolbar,
    /// The reader's own floating navigation panel.
    Panel,
    /// The reader's tray toggle.
    TrayButton,
    Paragraph,
    Heading,
    ListItem,
    StaticText,
    InlineTextBox,
    TextField,
    Button,
    #[default]
    Generic,
}

impl Role {
    fn is_root_like(self) -> bool {
        matches!(
            self,
            Role::Desktop | Role::Window | Role::RootWebArea | Role::Dialog | Role::Toolbar
        )
    }

    fn is_tree_root(self) -> bool {
        matches!(self, Role::Desktop | Role::RootWebArea)
    }

    fn is_block(self) -> bool {
        self.is_root_like() || matches!(self, Role::Paragraph | Role::Heading | Role::ListItem)
    }
}

/// Serialized form of a node and its subtree, as loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub role: Role,
    pub text: Option<String>,
    pub bounds: Option<Rect>,
    pub selectable: Option<bool>,
    pub offscreen: bool,
    pub invisible: bool,
    pub language: Option<String>,
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    pub fn text(role: Role, text: &str) -> Self {
        Self {
            role,
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn with_children(mut self, children: Vec<NodeSpec>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    role: Role,
    text: String,
    bounds: Option<Rect>,
    selectable: bool,
    offscreen: bool,
    invisible: bool,
    valid: bool,
    language: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// One past the last descendant; ids are assigned in pre-order.
    subtree_end: u32,
}

/// In-memory accessibility tree. Node ids are pre-order indices, so tree
/// order is id order.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    focus: Option<NodeId>,
    selection: Option<RawSelection>,
    text_selection: Option<(NodeId, usize, usize)>,
    foreground_window: Option<NodeId>,
    made_visible: Vec<NodeId>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::from_spec(NodeSpec::new(Role::Desktop))
    }
}

impl DocumentTree {
    pub fn from_spec(root: NodeSpec) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            focus: None,
            selection: None,
            text_selection: None,
            foreground_window: None,
            made_visible: Vec::new(),
        };
        tree.insert(root, None, true);
        tree.fill_container_geometry();
        tree
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let spec: NodeSpec = serde_json::from_str(json).context("invalid document JSON")?;
        Ok(Self::from_spec(spec))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read document {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("failed to load {}", path.display()))
    }

    fn insert(&mut self, spec: NodeSpec, parent: Option<NodeId>, inherited_selectable: bool) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let inherited = parent.and_then(|p| self.node(p)).map(|p| {
            (p.offscreen, p.invisible, p.language.clone())
        });
        let (parent_offscreen, parent_invisible, parent_language) =
            inherited.unwrap_or((false, false, None));
        let selectable = spec.selectable.unwrap_or(inherited_selectable);
        let joins_children = spec.text.is_none() && spec.role == Role::StaticText;
        self.nodes.push(Node {
            role: spec.role,
            text: spec.text.unwrap_or_default(),
            bounds: spec.bounds,
            selectable,
            offscreen: spec.offscreen || parent_offscreen,
            invisible: spec.invisible || parent_invisible,
            valid: true,
            language: spec.language.or(parent_language),
            parent,
            children: Vec::new(),
            subtree_end: id.0 + 1,
        });
        let mut children = Vec::with_capacity(spec.children.len());
        for child in spec.children {
            children.push(self.insert(child, Some(id), selectable));
        }
        let end = self.nodes.len() as u32;
        let joined: Option<String> = joins_children.then(|| {
            children
                .iter()
                .filter_map(|c| self.nodes.get(c.0 as usize))
                .map(|c| c.text.as_str())
                .collect()
        });
        let node = &mut self.nodes[id.0 as usize];
        node.children = children;
        node.subtree_end = end;
        if let Some(joined) = joined {
            node.text = joined;
        }
        id
    }

    /// Containers without explicit bounds cover their children.
    fn fill_container_geometry(&mut self) {
        for index in (0..self.nodes.len()).rev() {
            if self.nodes[index].bounds.is_some() {
                continue;
            }
            let union = self.nodes[index]
                .children
                .iter()
                .filter_map(|c| self.nodes.get(c.0 as usize).and_then(|n| n.bounds))
                .reduce(|a, b| a.union(&b));
            self.nodes[index].bounds = union;
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).filter(|n| n.valid)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn role(&self, id: NodeId) -> Option<Role> {
        self.node(id).map(|n| n.role)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn set_focus(&mut self, node: Option<NodeId>, text_selection: Option<(usize, usize)>) {
        self.focus = node.filter(|n| self.contains(*n));
        self.text_selection = match (self.focus, text_selection) {
            (Some(node), Some((start, end))) => Some((node, start, end)),
            _ => None,
        };
    }

    pub fn set_selection(&mut self, selection: Option<RawSelection>) {
        self.selection = selection;
    }

    /// Limits foreground checks to one window; `None` treats every node as foreground.
    pub fn set_foreground_window(&mut self, window: Option<NodeId>) {
        self.foreground_window = window;
    }

    /// Marks the node and its subtree as removed from the tree.
    pub fn invalidate(&mut self, id: NodeId) {
        let Some(end) = self.nodes.get(id.0 as usize).map(|n| n.subtree_end) else {
            return;
        };
        for node in &mut self.nodes[id.0 as usize..end as usize] {
            node.valid = false;
        }
        if self.focus.is_some_and(|f| f.0 >= id.0 && f.0 < end) {
            self.focus = None;
            self.text_selection = None;
        }
    }

    /// Nodes scrolled into view on request, oldest first.
    pub fn made_visible(&self) -> &[NodeId] {
        &self.made_visible
    }

    /// Deepest node whose bounds contain the point; later siblings are on top.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<NodeId> {
        let root = self.root();
        let contains = |id: &NodeId| {
            self.node(*id)
                .and_then(|n| n.bounds)
                .is_some_and(|b| b.contains(x, y))
        };
        if !contains(&root) {
            return None;
        }
        let mut current = root;
        while let Some(next) = self
            .node(current)
            .and_then(|n| n.children.iter().rev().find(|c| contains(*c)).copied())
        {
            current = next;
        }
        Some(current)
    }

    fn subtree(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let end = self.node(id).map_or(id.0, |n| n.subtree_end);
        (id.0..end).map(NodeId)
    }

    fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.children.is_empty())
    }

    fn is_readable_leaf(&self, id: NodeId) -> bool {
        self.is_leaf(id) && !self.should_ignore(id, true)
    }

    fn ancestors_or_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).map(|_| id), move |n| self.parent(*n))
    }

    fn block_parent(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors_or_self(id)
            .skip(1)
            .find(|a| self.role(*a).is_some_and(Role::is_block))
    }

    fn inline_children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|c| self.role(*c) == Some(Role::InlineTextBox))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn has_inline_text(&self, id: NodeId) -> bool {
        !self.inline_children(id).is_empty()
    }

    /// Readable leaves grouped into runs that share a block parent.
    fn paragraphs(&self) -> Vec<Vec<NodeId>> {
        let mut paragraphs: Vec<Vec<NodeId>> = Vec::new();
        let mut current_block = None;
        for leaf in (0..self.nodes.len() as u32).map(NodeId) {
            if !self.is_readable_leaf(leaf) {
                continue;
            }
            let block = self.block_parent(leaf);
            match paragraphs.last_mut() {
                Some(run) if block == current_block => run.push(leaf),
                _ => paragraphs.push(vec![leaf]),
            }
            current_block = block;
        }
        paragraphs
    }

    /// Maps a group-level position (possibly on a static text parent) to a leaf.
    fn leaf_position(&self, position: Position) -> Position {
        if self.is_leaf(position.node) {
            return Position::clamped(position.node, position.offset, self.text_len(position.node));
        }
        self.resolve_selection_to_leaf_position(position.node, position.offset, true)
    }

    fn sentence_starts(text: &str) -> Vec<usize> {
        text.split_sentence_bound_indices()
            .filter_map(|(start, sentence)| {
                let lead = first_non_whitespace(sentence);
                (lead < sentence.len()).then_some(start + lead)
            })
            .collect()
    }

    fn run_from_group_index(&self, group: &NodeGroup, char_index: usize) -> NodeRun {
        match group.position_at(self, char_index, false) {
            Some(position) => self.next_nodes_in_paragraph_from_position(position, Direction::Forward),
            None => NodeRun::default(),
        }
    }
}

impl ContentSource for DocumentTree {
    fn focused_node(&self) -> Option<NodeId> {
        self.focus
    }

    fn selection(&self, focused: NodeId) -> Option<RawSelection> {
        if let Some(selection) = self.selection {
            return Some(selection);
        }
        match self.text_selection {
            Some((node, start, end)) if node == focused => Some(RawSelection {
                start_node: node,
                start_offset: start,
                end_node: node,
                end_offset: end,
            }),
            _ => None,
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.text.as_str())
    }

    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.node(node).and_then(|n| n.bounds)
    }

    fn bounds_for_range(&self, node: NodeId, start: usize, end: usize) -> Option<Rect> {
        let (node, start, end) = match self.inline_text_at(node, start) {
            Some(inline) => {
                let base = self.start_char_index_in_parent(inline);
                (inline, start.saturating_sub(base), end.saturating_sub(base))
            }
            None => (node, start, end),
        };
        let bounds = self.bounds(node)?;
        let len = self.text_len(node).max(1) as i64;
        let start = start.min(len as usize) as i64;
        let end = end.clamp(start as usize, len as usize) as i64;
        let width = bounds.width as i64;
        Some(Rect::new(
            bounds.left + (width * start / len) as i32,
            bounds.top,
            (width * (end - start) / len) as i32,
            bounds.height,
        ))
    }

    fn node_state(&self, node: NodeId) -> NodeState {
        match self.node(node) {
            None => NodeState::Invalid,
            Some(n) if n.invisible => NodeState::Invisible,
            Some(_) => NodeState::Normal,
        }
    }

    fn is_selectable(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.selectable)
    }

    fn is_offscreen(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.offscreen)
    }

    fn should_ignore(&self, node: NodeId, include_offscreen: bool) -> bool {
        match self.node(node) {
            None => true,
            Some(n) => n.invisible || is_blank(&n.text) || (!include_offscreen && n.offscreen),
        }
    }

    fn is_in_foreground(&self, node: NodeId) -> bool {
        let Some(foreground) = self.foreground_window else {
            return true;
        };
        let window = self
            .ancestors_or_self(node)
            .find(|a| self.role(*a) == Some(Role::Window));
        window.is_none() || window == Some(foreground) || self.is_in_panel(node)
    }

    fn container_root(&self, node: NodeId) -> NodeId {
        self.ancestors_or_self(node)
            .find(|a| self.role(*a).is_some_and(Role::is_root_like) || self.parent(*a).is_none())
            .unwrap_or(node)
    }

    fn nodes_intersecting(&self, root: NodeId, rect: Rect) -> Vec<NodeId> {
        self.subtree(root)
            .filter(|n| self.is_leaf(*n) && !self.should_ignore(*n, false))
            .filter(|n| self.bounds(*n).is_some_and(|b| b.intersects(&rect)))
            .collect()
    }

    fn all_nodes_in_paragraph(&self, node: NodeId) -> Vec<NodeId> {
        let Some(block) = self.block_parent(node) else {
            return if self.is_readable_leaf(node) {
                vec![node]
            } else {
                Vec::new()
            };
        };
        self.subtree(block)
            .filter(|n| self.is_readable_leaf(*n) && self.block_parent(*n) == Some(block))
            .collect()
    }

    fn resolve_selection_to_leaf_position(
        &self,
        node: NodeId,
        offset: usize,
        is_start: bool,
    ) -> Position {
        let Some(n) = self.node(node) else {
            return Position { node, offset: 0 };
        };
        if n.children.is_empty() {
            return Position::clamped(node, offset, n.text.len());
        }
        let leaves: Vec<NodeId> = self.subtree(node).filter(|l| self.is_leaf(*l)).collect();
        let (Some(&first), Some(&last)) = (leaves.first(), leaves.last()) else {
            return Position { node, offset: 0 };
        };
        let at_end = |leaf: NodeId| Position {
            node: leaf,
            offset: self.text_len(leaf),
        };

        if matches!(n.role, Role::StaticText | Role::TextField) {
            // Character offset across the text of the leaves.
            let mut consumed = 0;
            for &leaf in &leaves {
                let len = self.text_len(leaf);
                if offset < consumed + len || (!is_start && offset == consumed + len) {
                    return Position {
                        node: leaf,
                        offset: offset - consumed,
                    };
                }
                consumed += len;
            }
            return at_end(last);
        }

        // Anywhere else the offset indexes the children.
        if is_start {
            match n.children.get(offset) {
                Some(child) => {
                    let child_end = self.node(*child).map_or(child.0, |c| c.subtree_end);
                    leaves
                        .iter()
                        .find(|l| l.0 >= child.0 && l.0 < child_end)
                        .map(|l| Position { node: *l, offset: 0 })
                        .unwrap_or_else(|| at_end(last))
                }
                None => at_end(last),
            }
        } else if offset == 0 {
            Position {
                node: first,
                offset: 0,
            }
        } else {
            let child = n.children[(offset - 1).min(n.children.len() - 1)];
            let child_end = self.node(child).map_or(child.0 + 1, |c| c.subtree_end);
            leaves
                .iter()
                .rev()
                .find(|l| l.0 < child_end)
                .map(|l| at_end(*l))
                .unwrap_or(Position {
                    node: first,
                    offset: 0,
                })
        }
    }

    fn direction(&self, from: NodeId, to: NodeId) -> Direction {
        if to >= from {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    fn next_readable_leaf(&self, node: NodeId) -> Option<NodeId> {
        (node.0 + 1..self.nodes.len() as u32)
            .map(NodeId)
            .find(|n| self.is_leaf(*n) && !is_blank(self.text(*n).unwrap_or_default()))
    }

    fn inline_text_at(&self, node: NodeId, char_index: usize) -> Option<NodeId> {
        let inline = self.inline_children(node);
        let mut consumed = 0;
        for &child in &inline {
            consumed += self.text_len(child);
            if char_index < consumed {
                return Some(child);
            }
        }
        inline.last().copied()
    }

    fn is_tray_button(&self, node: NodeId) -> bool {
        self.role(node) == Some(Role::TrayButton)
    }

    fn is_in_panel(&self, node: NodeId) -> bool {
        self.ancestors_or_self(node)
            .any(|a| self.role(a) == Some(Role::Panel))
    }

    fn is_system_ui(&self, node: NodeId) -> bool {
        self.ancestors_or_self(node)
            .find(|a| self.role(*a).is_some_and(Role::is_tree_root))
            .and_then(|root| self.role(root))
            == Some(Role::Desktop)
    }

    fn make_visible(&mut self, node: NodeId) {
        let Some(end) = self.node(node).map(|n| n.subtree_end) else {
            return;
        };
        for n in &mut self.nodes[node.0 as usize..end as usize] {
            n.offscreen = false;
        }
        self.made_visible.push(node);
    }
}

impl TextLayout for DocumentTree {
    fn build_node_group(
        &self,
        nodes: &[NodeId],
        start: usize,
        options: &GroupingOptions,
    ) -> NodeGroup {
        let Some(&first) = nodes.get(start) else {
            return NodeGroup::new(None, None).with_end_index(start);
        };
        let block = self.block_parent(first);
        let language = self.node(first).and_then(|n| n.language.clone());
        let mut group = NodeGroup::new(block, language.clone());
        let mut index = start;
        let mut last_inline_parent = None;
        loop {
            let node = nodes[index];
            if self.role(node) == Some(Role::InlineTextBox) {
                let parent = self.parent(node);
                if parent.is_some() && parent != last_inline_parent {
                    last_inline_parent = parent;
                    if let Some(parent) = parent {
                        group.push(parent, self.text(parent).unwrap_or_default(), true);
                    }
                }
            } else {
                last_inline_parent = None;
                group.push(
                    node,
                    self.text(node).unwrap_or_default(),
                    self.has_inline_text(node),
                );
            }

            let Some(&next) = nodes.get(index + 1) else {
                break;
            };
            if self.block_parent(next) != block {
                break;
            }
            if options.split_on_language
                && self.node(next).and_then(|n| n.language.clone()) != language
            {
                break;
            }
            index += 1;
        }
        group.with_end_index(index)
    }

    fn start_char_index_in_parent(&self, node: NodeId) -> usize {
        if self.role(node) != Some(Role::InlineTextBox) {
            return 0;
        }
        let Some(parent) = self.parent(node) else {
            return 0;
        };
        self.inline_children(parent)
            .into_iter()
            .take_while(|sibling| *sibling != node)
            .map(|sibling| self.text_len(sibling))
            .sum()
    }

    fn group_item_node(&self, node: NodeId) -> NodeId {
        if self.role(node) == Some(Role::InlineTextBox) {
            self.parent(node).unwrap_or(node)
        } else {
            node
        }
    }
}

impl Navigator for DocumentTree {
    fn nodes_for_next_paragraph(
        &self,
        group: &NodeGroup,
        direction: Direction,
        accept: &dyn Fn(&[NodeId]) -> bool,
    ) -> Vec<NodeId> {
        let anchor = match direction {
            Direction::Forward => group.nodes.last(),
            Direction::Backward => group.nodes.first(),
        };
        let Some(anchor) = anchor.map(|item| item.node) else {
            return Vec::new();
        };
        let anchor_end = self.node(anchor).map_or(anchor.0 + 1, |n| n.subtree_end);
        let paragraphs = self.paragraphs();
        let current = paragraphs
            .iter()
            .position(|p| p.iter().any(|l| l.0 >= anchor.0 && l.0 < anchor_end));

        let candidates: Vec<&Vec<NodeId>> = match (direction, current) {
            (Direction::Forward, Some(index)) => paragraphs[index + 1..].iter().collect(),
            (Direction::Backward, Some(index)) => paragraphs[..index].iter().rev().collect(),
            (Direction::Forward, None) => paragraphs
                .iter()
                .filter(|p| p.first().is_some_and(|l| l.0 >= anchor_end))
                .collect(),
            (Direction::Backward, None) => paragraphs
                .iter()
                .rev()
                .filter(|p| p.last().is_some_and(|l| l.0 < anchor.0))
                .collect(),
        };
        candidates
            .into_iter()
            .find(|p| accept(p.as_slice()))
            .cloned()
            .unwrap_or_default()
    }

    fn nodes_for_next_sentence(
        &self,
        group: &NodeGroup,
        char_index: usize,
        direction: Direction,
        accept: &dyn Fn(&[NodeId]) -> bool,
    ) -> NodeRun {
        let items: Vec<NodeId> = group.nodes.iter().map(|item| item.node).collect();
        if items.is_empty() {
            return NodeRun::default();
        }
        // Sentence bounds come from the unclipped paragraph text.
        let full = self.build_node_group(&items, 0, &GroupingOptions::default());
        let starts = Self::sentence_starts(&full.text);

        match direction {
            Direction::Forward => {
                if let Some(&next) = starts.iter().find(|s| **s > char_index) {
                    let run = self.run_from_group_index(&full, next);
                    if !run.nodes.is_empty() {
                        return run;
                    }
                }
                NodeRun {
                    nodes: self.nodes_for_next_paragraph(group, Direction::Forward, accept),
                    offset: 0,
                }
            }
            Direction::Backward => {
                let current = starts.iter().rposition(|s| *s <= char_index);
                if let Some(previous) = current.and_then(|i| i.checked_sub(1)) {
                    return self.run_from_group_index(&full, starts[previous]);
                }
                let nodes = self.nodes_for_next_paragraph(group, Direction::Backward, accept);
                if nodes.is_empty() {
                    return NodeRun::default();
                }
                let previous = self.build_node_group(&nodes, 0, &GroupingOptions::default());
                match Self::sentence_starts(&previous.text).last() {
                    Some(&last) => self.run_from_group_index(&previous, last),
                    None => NodeRun { nodes, offset: 0 },
                }
            }
        }
    }

    fn next_nodes_in_paragraph_from_position(
        &self,
        position: Position,
        direction: Direction,
    ) -> NodeRun {
        let position = self.leaf_position(position);
        let leaf = position.node;
        let leaves = self.all_nodes_in_paragraph(leaf);
        let index = leaves.iter().position(|n| *n == leaf);
        match direction {
            Direction::Forward => match index {
                Some(index) if position.offset < self.text_len(leaf) => NodeRun {
                    nodes: leaves[index..].to_vec(),
                    offset: position.offset,
                },
                Some(index) => NodeRun {
                    nodes: leaves[index + 1..].to_vec(),
                    offset: 0,
                },
                None => NodeRun {
                    nodes: leaves.into_iter().filter(|n| *n > leaf).collect(),
                    offset: 0,
                },
            },
            Direction::Backward => {
                let mut nodes: Vec<NodeId> = leaves.iter().copied().filter(|n| *n < leaf).collect();
                if index.is_some() && position.offset > 0 {
                    nodes.push(leaf);
                }
                NodeRun { nodes, offset: 0 }
            }
        }
    }
}
