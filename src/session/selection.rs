use super::{HitTestRequest, SpeechSession};
use crate::config::PARAGRAPH_SELECTION_MAX_SIZE;
use crate::content::{Desktop, Direction, NodeId, NodeState, Position};
use crate::log_debug;

impl<D: Desktop> SpeechSession<D> {
    /// Takes the hit test issued by the last mouse selection, if any.
    pub fn take_hit_test_request(&mut self) -> Option<HitTestRequest> {
        self.pending_hit_test.take()
    }

    pub(super) fn request_hit_test(&mut self, x: i32, y: i32) {
        self.hit_test_generation += 1;
        let request = HitTestRequest {
            token: self.hit_test_generation,
            x,
            y,
            rect: self.input.selection_rect(),
        };
        self.pending_hit_test = Some(request);
        self.awaited_hit_test = Some(request);
    }

    /// Answers a hit test with the node under the point, then reads every node
    /// in that node's container that intersects the selection rectangle.
    pub fn on_hit_test_result(&mut self, token: u64, hit: Option<NodeId>) {
        let Some(request) = self.awaited_hit_test.filter(|r| r.token == token) else {
            log_debug(&format!("dropping stale hit test result {token}"));
            return;
        };
        self.awaited_hit_test = None;
        let Some(hit) = hit.filter(|node| self.desktop.node_state(*node) != NodeState::Invalid) else {
            return;
        };

        let root = self.desktop.container_root(hit);
        let mut nodes = self.desktop.nodes_intersecting(root, request.rect);
        if nodes.is_empty() {
            // Nothing in the hit window; try the focused window unless that is the desktop.
            if let Some(focused) = self
                .desktop
                .focused_node()
                .filter(|node| !self.desktop.is_system_ui(*node))
            {
                let focused_root = self.desktop.container_root(focused);
                nodes = self.desktop.nodes_intersecting(focused_root, request.rect);
            }
        }
        // Clicking the tray button toggles the feature; it is not content.
        if nodes.len() == 1 && self.desktop.is_tray_button(nodes[0]) {
            return;
        }
        if !nodes.is_empty()
            && self.should_show_navigation_controls()
            && (request.rect.width <= PARAGRAPH_SELECTION_MAX_SIZE
                || request.rect.height <= PARAGRAPH_SELECTION_MAX_SIZE)
        {
            nodes = self.desktop.all_nodes_in_paragraph(nodes[0]);
        }
        self.start_speech_queue(nodes, true, None, None);
    }

    /// Reads the focused node's selection.
    pub fn speak_selection(&mut self) {
        let focus_panel = self.should_show_navigation_controls();
        let selection = self
            .desktop
            .focused_node()
            .and_then(|focused| self.desktop.selection(focused))
            .filter(|selection| !selection.is_collapsed());
        let Some(selection) = selection else {
            log_debug("read selection requested with nothing selected");
            self.ui.null_selection(focus_panel);
            return;
        };

        let start = self.desktop.resolve_selection_to_leaf_position(
            selection.start_node,
            selection.start_offset,
            true,
        );
        let end = self
            .desktop
            .resolve_selection_to_leaf_position(selection.end_node, selection.end_offset, false);
        let in_order = if start.node == end.node {
            start.offset <= end.offset
        } else {
            self.desktop.direction(start.node, end.node) == Direction::Forward
        };
        let (first, last) = if in_order { (start, end) } else { (end, start) };

        self.cancel_if_speaking(true);
        self.read_nodes_between_positions(first, last);
    }

    fn read_nodes_between_positions(&mut self, first: Position, last: Position) {
        let mut nodes = Vec::new();
        let mut start_offset = first.offset;
        if self.is_readable_selection_node(first.node) && first.offset < self.desktop.text_len(first.node) {
            nodes.push(first.node);
        } else {
            // The selection starts in a node we skip; read the next one from its start.
            start_offset = 0;
        }

        let mut current = first.node;
        while current != last.node {
            let Some(next) = self.desktop.next_readable_leaf(current) else {
                break;
            };
            if self.desktop.direction(next, last.node) != Direction::Forward {
                break;
            }
            if self.is_readable_selection_node(next) {
                nodes.push(next);
            }
            current = next;
        }

        if nodes.is_empty() {
            log_debug("selection has no readable nodes");
            return;
        }
        let end_offset = (nodes.last() == Some(&last.node)).then_some(last.offset);
        self.start_speech_queue(nodes, true, Some(start_offset), end_offset);
        self.scroll_to_spoken_node = true;
    }

    fn is_readable_selection_node(&self, node: NodeId) -> bool {
        self.desktop.text_len(node) > 0
            && !self.desktop.should_ignore(node, true)
            && self.desktop.is_selectable(node)
    }
}
