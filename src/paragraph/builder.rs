use super::NodeGroup;
use crate::content::{GroupingOptions, NodeId, TextLayout};
use crate::log_debug;

/// Splits `nodes` into paragraph groups, clipping the first group at
/// `start_char` and the last at `end_char`. Both offsets are relative to the
/// text of the first and last input node respectively.
pub fn build_node_groups<L: TextLayout + ?Sized>(
    layout: &L,
    nodes: &[NodeId],
    start_char: Option<usize>,
    end_char: Option<usize>,
    options: &GroupingOptions,
) -> Vec<NodeGroup> {
    let mut groups = Vec::new();
    let mut index = 0;
    while index < nodes.len() {
        let mut group = layout.build_node_group(nodes, index, options);

        if index == 0 {
            if let (Some(start), Some(first)) = (start_char, group.nodes.first().copied()) {
                if first.node == layout.group_item_node(nodes[0]) {
                    let in_group = start
                        + first.start_char
                        + if first.has_inline_text {
                            layout.start_char_index_in_parent(nodes[0])
                        } else {
                            0
                        };
                    group = group.with_start_offset(in_group);
                }
            }
        }

        // Never revisit consumed nodes, even if the layout reports a stale index.
        let end_index = group.end_index.clamp(index, nodes.len() - 1);
        let is_last = end_index == nodes.len() - 1;
        if is_last {
            if let (Some(end), Some(last)) = (end_char, group.nodes.last().copied()) {
                if last.node == layout.group_item_node(nodes[end_index]) {
                    let in_group = end
                        + last.start_char
                        + if last.has_inline_text {
                            layout.start_char_index_in_parent(nodes[end_index])
                        } else {
                            0
                        };
                    group = group.with_end_offset(in_group);
                }
            }
        }

        index = end_index + 1;
        if group.is_empty() && !is_last {
            log_debug(&format!("dropping empty node group ending at {end_index}"));
            continue;
        }
        groups.push(group);
    }
    groups
}
