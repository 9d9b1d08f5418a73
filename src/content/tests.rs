use super::*;

fn static_text(text: &str, bounds: Rect) -> NodeSpec {
    NodeSpec::text(Role::StaticText, text).with_bounds(bounds)
}

fn paragraph(children: Vec<NodeSpec>) -> NodeSpec {
    NodeSpec::new(Role::Paragraph).with_children(children)
}

/// 0 desktop
///   1 window
///     2 web area
///       3 p / 4 "First sentence. Second sentence."
///       5 p / 6 static text / 7 "Third one. " 8 "Fourth."
///       9 p / 10 "Offscreen tail." (offscreen)
///   11 panel / 12 p / 13 "Panel text"
///   14 tray button
fn desktop() -> DocumentTree {
    let mut offscreen = static_text("Offscreen tail.", Rect::new(10, 900, 150, 20));
    offscreen.offscreen = true;
    DocumentTree::from_spec(
        NodeSpec::new(Role::Desktop)
            .with_bounds(Rect::new(0, 0, 1000, 1000))
            .with_children(vec![
                NodeSpec::new(Role::Window)
                    .with_bounds(Rect::new(0, 0, 800, 600))
                    .with_children(vec![NodeSpec::new(Role::RootWebArea).with_children(vec![
                        paragraph(vec![static_text(
                            "First sentence. Second sentence.",
                            Rect::new(10, 10, 320, 20),
                        )]),
                        paragraph(vec![NodeSpec::new(Role::StaticText).with_children(vec![
                            NodeSpec::text(Role::InlineTextBox, "Third one. ")
                                .with_bounds(Rect::new(10, 40, 110, 20)),
                            NodeSpec::text(Role::InlineTextBox, "Fourth.")
                                .with_bounds(Rect::new(120, 40, 70, 20)),
                        ])]),
                        paragraph(vec![offscreen]),
                    ])]),
                NodeSpec::new(Role::Panel).with_children(vec![paragraph(vec![static_text(
                    "Panel text",
                    Rect::new(10, 700, 100, 20),
                )])]),
                NodeSpec::text(Role::TrayButton, "Select to speak")
                    .with_bounds(Rect::new(950, 950, 20, 20)),
            ]),
    )
}

fn group_of(tree: &DocumentTree, nodes: &[u32]) -> NodeGroup {
    let nodes: Vec<NodeId> = nodes.iter().copied().map(NodeId).collect();
    tree.build_node_group(&nodes, 0, &GroupingOptions::default())
}

fn accept_all(_: &[NodeId]) -> bool {
    true
}

#[test]
fn static_text_without_text_joins_inline_children() {
    let tree = desktop();
    assert_eq!(tree.text(NodeId(6)), Some("Third one. Fourth."));
    assert_eq!(tree.start_char_index_in_parent(NodeId(8)), 11);
    assert_eq!(tree.group_item_node(NodeId(8)), NodeId(6));
}

#[test]
fn document_loads_from_json() {
    let tree = DocumentTree::from_json(
        r#"{"role":"root_web_area","children":[
            {"role":"static_text","text":"Hi","bounds":{"left":0,"top":0,"width":10,"height":10}}
        ]}"#,
    )
    .unwrap();
    assert_eq!(tree.text(NodeId(1)), Some("Hi"));
    assert_eq!(tree.bounds(NodeId(0)), Some(Rect::new(0, 0, 10, 10)));
    assert!(DocumentTree::from_json("{\"role\": 3}").is_err());
}

#[test]
fn hit_test_finds_deepest_node_and_its_container() {
    let tree = desktop();
    let hit = tree.hit_test(15, 45);
    assert_eq!(hit, Some(NodeId(7)));
    assert_eq!(tree.container_root(NodeId(7)), NodeId(2));
    assert_eq!(tree.hit_test(2000, 2000), None);
}

#[test]
fn intersecting_nodes_skip_offscreen_leaves() {
    let tree = desktop();
    let nodes = tree.nodes_intersecting(NodeId(2), Rect::new(0, 0, 800, 1000));
    assert_eq!(nodes, vec![NodeId(4), NodeId(7), NodeId(8)]);
}

#[test]
fn paragraph_nodes_share_a_block_parent() {
    let tree = desktop();
    assert_eq!(tree.all_nodes_in_paragraph(NodeId(7)), vec![NodeId(7), NodeId(8)]);
    assert_eq!(tree.all_nodes_in_paragraph(NodeId(4)), vec![NodeId(4)]);
}

#[test]
fn selection_endpoints_resolve_to_leaves() {
    let tree = desktop();
    assert_eq!(
        tree.resolve_selection_to_leaf_position(NodeId(6), 13, true),
        Position {
            node: NodeId(8),
            offset: 2
        }
    );
    assert_eq!(
        tree.resolve_selection_to_leaf_position(NodeId(3), 0, true),
        Position {
            node: NodeId(4),
            offset: 0
        }
    );
    assert_eq!(
        tree.resolve_selection_to_leaf_position(NodeId(5), 1, false),
        Position {
            node: NodeId(8),
            offset: 7
        }
    );
    assert_eq!(
        tree.resolve_selection_to_leaf_position(NodeId(4), 99, true),
        Position {
            node: NodeId(4),
            offset: 32
        }
    );
}

#[test]
fn focused_text_field_selection_is_used_without_document_selection() {
    let mut tree = desktop();
    tree.set_focus(Some(NodeId(4)), Some((0, 5)));
    let selection = tree.selection(NodeId(4)).unwrap();
    assert_eq!((selection.start_offset, selection.end_offset), (0, 5));

    let document = RawSelection {
        start_node: NodeId(7),
        start_offset: 0,
        end_node: NodeId(8),
        end_offset: 3,
    };
    tree.set_selection(Some(document));
    assert_eq!(tree.selection(NodeId(4)), Some(document));
}

#[test]
fn remaining_paragraph_nodes_start_at_position() {
    let tree = desktop();
    let run = tree.next_nodes_in_paragraph_from_position(
        Position {
            node: NodeId(6),
            offset: 13,
        },
        Direction::Forward,
    );
    assert_eq!(
        run,
        NodeRun {
            nodes: vec![NodeId(8)],
            offset: 2
        }
    );

    let at_end = tree.next_nodes_in_paragraph_from_position(
        Position {
            node: NodeId(4),
            offset: 32,
        },
        Direction::Forward,
    );
    assert!(at_end.nodes.is_empty());
}

#[test]
fn paragraph_navigation_honors_predicate() {
    let tree = desktop();
    let first = group_of(&tree, &[4]);
    assert_eq!(
        tree.nodes_for_next_paragraph(&first, Direction::Forward, &accept_all),
        vec![NodeId(7), NodeId(8)]
    );

    let second = group_of(&tree, &[7, 8]);
    assert_eq!(
        tree.nodes_for_next_paragraph(&second, Direction::Backward, &accept_all),
        vec![NodeId(4)]
    );

    let tail = group_of(&tree, &[10]);
    let outside_panel = |nodes: &[NodeId]| !tree.is_in_panel(nodes[0]);
    assert_eq!(
        tree.nodes_for_next_paragraph(&tail, Direction::Forward, &outside_panel),
        vec![NodeId(14)]
    );
}

#[test]
fn sentence_navigation_moves_within_and_across_paragraphs() {
    let tree = desktop();
    let first = group_of(&tree, &[4]);
    assert_eq!(
        tree.nodes_for_next_sentence(&first, 0, Direction::Forward, &accept_all),
        NodeRun {
            nodes: vec![NodeId(4)],
            offset: 16
        }
    );
    assert_eq!(
        tree.nodes_for_next_sentence(&first, 20, Direction::Forward, &accept_all),
        NodeRun {
            nodes: vec![NodeId(7), NodeId(8)],
            offset: 0
        }
    );

    let second = group_of(&tree, &[7, 8]);
    assert_eq!(
        tree.nodes_for_next_sentence(&second, 13, Direction::Backward, &accept_all),
        NodeRun {
            nodes: vec![NodeId(7), NodeId(8)],
            offset: 0
        }
    );
    assert_eq!(
        tree.nodes_for_next_sentence(&second, 2, Direction::Backward, &accept_all),
        NodeRun {
            nodes: vec![NodeId(4)],
            offset: 16
        }
    );
}

#[test]
fn system_ui_panel_and_tray_are_classified() {
    let tree = desktop();
    assert!(tree.is_system_ui(NodeId(13)));
    assert!(!tree.is_system_ui(NodeId(4)));
    assert!(tree.is_in_panel(NodeId(13)));
    assert!(!tree.is_in_panel(NodeId(4)));
    assert!(tree.is_tray_button(NodeId(14)));
}

#[test]
fn range_bounds_use_the_inline_box_holding_the_range() {
    let tree = desktop();
    assert_eq!(
        tree.bounds_for_range(NodeId(6), 11, 14),
        Some(Rect::new(120, 40, 30, 20))
    );
}

#[test]
fn invalidated_nodes_are_reported_and_unfocused() {
    let mut tree = desktop();
    tree.set_focus(Some(NodeId(7)), None);
    tree.invalidate(NodeId(5));
    assert_eq!(tree.node_state(NodeId(7)), NodeState::Invalid);
    assert_eq!(tree.text(NodeId(7)), None);
    assert_eq!(tree.focused_node(), None);
    assert_eq!(tree.node_state(NodeId(4)), NodeState::Normal);
}

#[test]
fn foreground_and_visibility_follow_host_state() {
    let mut tree = desktop();
    assert!(tree.is_in_foreground(NodeId(4)));
    tree.set_foreground_window(Some(NodeId(99)));
    assert!(!tree.is_in_foreground(NodeId(4)));
    assert!(tree.is_in_foreground(NodeId(13)));

    assert!(tree.is_offscreen(NodeId(10)));
    tree.make_visible(NodeId(10));
    assert!(!tree.is_offscreen(NodeId(10)));
    assert_eq!(tree.made_visible(), &[NodeId(10)]);
}

#[test]
fn word_boundary_skips_whitespace() {
    let tree = desktop();
    assert_eq!(
        tree.next_word_boundary("Hello big world", 5),
        Some(WordSpan { start: 6, end: 9 })
    );
    assert_eq!(
        tree.next_word_boundary("Hello big world", 0),
        Some(WordSpan { start: 0, end: 5 })
    );
    assert_eq!(tree.next_word_boundary("Hello   ", 5), None);
}
