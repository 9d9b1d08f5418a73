use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::content::{DocumentTree, NodeSpec, Role};
use crate::prefs::StaticPreferences;
use crate::tts::mock::MockEngine;
use crate::ui::PanelUpdate;

#[derive(Debug, Default)]
struct UiLog {
    states: Vec<SessionState>,
    selection_rects: Vec<Rect>,
    focus_rings: Vec<Vec<Rect>>,
    highlights: Vec<Option<Rect>>,
    panels: Vec<PanelUpdate>,
    clears: usize,
    null_selections: Vec<bool>,
    errors: Vec<String>,
}

struct RecordingUi(Rc<RefCell<UiLog>>);

impl UiSink for RecordingUi {
    fn set_state(&mut self, state: SessionState) {
        self.0.borrow_mut().states.push(state);
    }

    fn set_selection_rect(&mut self, rect: Rect) {
        self.0.borrow_mut().selection_rects.push(rect);
    }

    fn set_focus_ring(&mut self, rects: &[Rect], _draw_background: bool, _panel_visible: bool) {
        self.0.borrow_mut().focus_rings.push(rects.to_vec());
    }

    fn set_highlight(&mut self, bounds: Option<Rect>, _color: &str) {
        self.0.borrow_mut().highlights.push(bounds);
    }

    fn update_panel(&mut self, panel: &PanelUpdate) {
        self.0.borrow_mut().panels.push(panel.clone());
    }

    fn clear(&mut self) {
        self.0.borrow_mut().clears += 1;
    }

    fn null_selection(&mut self, focus_panel: bool) {
        self.0.borrow_mut().null_selections.push(focus_panel);
    }

    fn speech_error(&mut self, message: &str) {
        self.0.borrow_mut().errors.push(message.to_string());
    }
}

struct Harness {
    session: SpeechSession<DocumentTree>,
    engine: MockEngine,
    ui: Rc<RefCell<UiLog>>,
    prefs: Rc<RefCell<StaticPreferences>>,
}

impl Harness {
    fn new(tree: DocumentTree) -> Self {
        let engine = MockEngine::new();
        let ui = Rc::new(RefCell::new(UiLog::default()));
        let prefs = Rc::new(RefCell::new(StaticPreferences::default()));
        let session = SpeechSession::new(
            tree,
            Box::new(engine.clone()),
            Box::new(RecordingUi(Rc::clone(&ui))),
            Box::new(Rc::clone(&prefs)),
            ChordKeys::default(),
        );
        Self {
            session,
            engine,
            ui,
            prefs,
        }
    }

    /// Holds the activation key, drags from `from` to `to`, lets go and
    /// answers the resulting hit test from the tree.
    fn drag_select(&mut self, from: (i32, i32), to: (i32, i32)) {
        self.session.on_keys_changed([KeyCode::SEARCH]);
        self.session.on_mouse_event(MouseEventKind::Press, from.0, from.1);
        self.session.on_mouse_event(MouseEventKind::Move, to.0, to.1);
        self.session.on_mouse_event(MouseEventKind::Release, to.0, to.1);
        self.session.on_keys_changed([]);
        let request = self.session.take_hit_test_request().unwrap();
        let hit = self.session.desktop().hit_test(request.x, request.y);
        self.session.on_hit_test_result(request.token, hit);
    }

    fn last_utterance(&self) -> UtteranceId {
        self.engine.last().unwrap().id
    }

    fn engine_event(&mut self, event: EngineEvent) {
        let utterance = self.last_utterance();
        self.session.on_engine_event(utterance, event);
    }

    fn word(&mut self, char_index: usize, length: Option<usize>) {
        self.engine_event(EngineEvent::Word { char_index, length });
    }

    fn last_spoken_text(&self) -> String {
        self.engine.last().unwrap().text
    }
}

fn text(value: &str, bounds: Rect) -> NodeSpec {
    NodeSpec::text(Role::StaticText, value).with_bounds(bounds)
}

fn paragraph(children: Vec<NodeSpec>) -> NodeSpec {
    NodeSpec::new(Role::Paragraph).with_children(children)
}

/// 0 web area, 1 p / 2 "Paragraph one.", 3 p / 4 "Paragraph two."
fn two_paragraphs() -> DocumentTree {
    DocumentTree::from_spec(
        NodeSpec::new(Role::RootWebArea)
            .with_bounds(Rect::new(0, 0, 800, 600))
            .with_children(vec![
                paragraph(vec![text("Paragraph one.", Rect::new(10, 10, 140, 20))]),
                paragraph(vec![text("Paragraph two.", Rect::new(10, 40, 140, 20))]),
            ]),
    )
}

/// 0 web area, 1 p / 2 `value`
fn single_paragraph(value: &str) -> DocumentTree {
    DocumentTree::from_spec(
        NodeSpec::new(Role::RootWebArea)
            .with_bounds(Rect::new(0, 0, 800, 600))
            .with_children(vec![paragraph(vec![text(value, Rect::new(10, 10, 300, 20))])]),
    )
}

#[test]
fn finished_group_advances_to_the_next_paragraph() {
    let mut h = Harness::new(two_paragraphs());
    h.drag_select((0, 0), (400, 100));
    assert_eq!(h.last_spoken_text(), "Paragraph one. ");
    assert_eq!(h.session.state(), SessionState::Inactive);

    h.engine_event(EngineEvent::Start);
    assert_eq!(h.session.state(), SessionState::Speaking);
    h.engine_event(EngineEvent::End);
    assert_eq!(h.engine.spoken_count(), 2);
    assert_eq!(h.last_spoken_text(), "Paragraph two. ");

    h.engine_event(EngineEvent::Start);
    h.engine_event(EngineEvent::End);
    // Navigation controls keep the session alive after the last group.
    assert_eq!(h.session.state(), SessionState::Speaking);
    assert!(h.session.is_paused());
    assert_eq!(h.engine.spoken_count(), 2);
}

#[test]
fn last_group_ends_the_session_without_navigation_controls() {
    let mut h = Harness::new(two_paragraphs());
    h.prefs.borrow_mut().navigation_controls = false;
    h.drag_select((0, 0), (400, 100));
    for _ in 0..2 {
        h.engine_event(EngineEvent::Start);
        h.engine_event(EngineEvent::End);
    }
    assert_eq!(h.session.state(), SessionState::Inactive);
    assert!(h.session.current_group().is_none());
    assert!(!h.session.tts.is_speaking());
    assert!(h.session.tts.current_request().is_none());
    assert_eq!(
        h.ui.borrow().states,
        vec![
            SessionState::Inactive,
            SessionState::Selecting,
            SessionState::Inactive,
            SessionState::Speaking,
            SessionState::Inactive
        ]
    );
}

#[test]
fn pause_without_navigation_controls_silences_the_engine() {
    let mut h = Harness::new(two_paragraphs());
    h.prefs.borrow_mut().navigation_controls = false;
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    let first = h.last_utterance();

    let signal = h.session.on_pause_requested();
    h.engine_event(EngineEvent::Interrupted);
    assert!(signal.is_settled());
    assert_eq!(h.session.state(), SessionState::Inactive);
    assert!(!h.session.tts.is_speaking());
    assert!(h.session.tts.current_utterance().is_none());

    // Late callbacks for the old utterance change nothing.
    h.session.on_engine_event(first, EngineEvent::Start);
    h.session.on_engine_event(first, EngineEvent::End);
    h.session.on_resume_requested();
    assert_eq!(h.engine.spoken_count(), 1);
    assert_eq!(h.session.state(), SessionState::Inactive);
    assert!(!h.session.tts.is_speaking());
    assert!(h.session.current_group().is_none());
}

#[test]
fn speed_change_without_navigation_controls_does_not_restart() {
    let mut h = Harness::new(single_paragraph("Hello big world"));
    h.prefs.borrow_mut().navigation_controls = false;
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    h.word(6, Some(3));

    h.session.on_change_speed_requested(2.0);
    h.engine_event(EngineEvent::Interrupted);
    assert_eq!(h.session.state(), SessionState::Inactive);
    assert_eq!(h.engine.spoken_count(), 1);
    assert!(!h.session.tts.is_speaking());
    assert!(h.session.tts.current_utterance().is_none());
}

#[test]
fn oversized_word_event_is_clamped() {
    let mut h = Harness::new(single_paragraph("Hello big world"));
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);

    h.word(6, Some(usize::MAX));
    assert_eq!(h.session.current_word(), Some(WordSpan { start: 6, end: 15 }));

    h.word(usize::MAX, Some(usize::MAX));
    assert_eq!(h.session.state(), SessionState::Speaking);
    assert_eq!(h.session.char_index(), "Hello big world ".len());
}

#[test]
fn next_paragraph_before_start_waits_for_the_pause() {
    let mut h = Harness::new(two_paragraphs());
    h.drag_select((0, 0), (400, 100));
    let first = h.last_utterance();

    h.session.on_next_paragraph_requested();
    assert_eq!(h.engine.spoken_count(), 1);

    h.session.on_engine_event(first, EngineEvent::Interrupted);
    assert_eq!(h.engine.spoken_count(), 2);
    assert_eq!(h.last_spoken_text(), "Paragraph two. ");

    // A late start for the superseded utterance changes nothing.
    h.session.on_engine_event(first, EngineEvent::Start);
    assert_eq!(h.session.current_group().unwrap().text, "Paragraph two. ");

    h.engine_event(EngineEvent::Start);
    assert_eq!(h.session.state(), SessionState::Speaking);
    assert_eq!(h.session.current_group().unwrap().text, "Paragraph two. ");
}

#[test]
fn word_highlight_never_moves_backwards() {
    let mut h = Harness::new(single_paragraph("Hello big world"));
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    assert_eq!(h.session.current_word(), Some(WordSpan { start: 0, end: 5 }));

    h.word(6, Some(3));
    assert_eq!(h.session.current_word(), Some(WordSpan { start: 6, end: 9 }));
    h.word(0, Some(5));
    assert_eq!(h.session.current_word(), Some(WordSpan { start: 6, end: 9 }));
    h.word(10, None);
    assert_eq!(h.session.current_word(), Some(WordSpan { start: 10, end: 15 }));
    assert_eq!(h.session.char_index(), 10);
    assert!(h.ui.borrow().highlights.last().unwrap().is_some());
}

#[test]
fn partial_text_selection_speaks_only_the_selected_words() {
    let mut tree = single_paragraph("This is some text");
    tree.set_focus(Some(NodeId(2)), Some((8, 12)));
    let mut h = Harness::new(tree);

    h.session.speak_selection();
    assert_eq!(h.last_spoken_text(), "        some");
    assert_eq!(h.session.current_group().unwrap().end_offset, Some(12));

    h.engine_event(EngineEvent::Start);
    assert_eq!(h.session.char_index(), 8);
    assert_eq!(h.session.current_word(), Some(WordSpan { start: 8, end: 12 }));
}

#[test]
fn missing_or_empty_selection_reports_null_selection() {
    let mut h = Harness::new(single_paragraph("Some text"));
    h.session.speak_selection();
    h.session.desktop_mut().set_focus(Some(NodeId(2)), Some((3, 3)));
    h.session.speak_selection();
    assert_eq!(h.ui.borrow().null_selections, vec![true, true]);
    assert_eq!(h.engine.spoken_count(), 0);
}

#[test]
fn resume_past_the_last_word_moves_to_the_next_paragraph() {
    let mut h = Harness::new(two_paragraphs());
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    h.word(14, None);

    let signal = h.session.on_pause_requested();
    assert!(!signal.is_settled());
    h.engine_event(EngineEvent::Interrupted);
    assert!(signal.is_settled());
    assert!(h.session.is_paused());

    h.session.on_resume_requested();
    assert_eq!(h.last_spoken_text(), "Paragraph two. ");
}

#[test]
fn resume_continues_from_the_paused_word() {
    let mut h = Harness::new(single_paragraph("First sentence. Second sentence."));
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    h.word(23, None);
    let _ = h.session.on_pause_requested();
    h.engine_event(EngineEvent::Interrupted);

    h.session.on_resume_requested();
    assert_eq!(h.engine.spoken_count(), 2);
    assert_eq!(h.last_spoken_text(), "sentence. ");
    h.engine_event(EngineEvent::Start);
    assert_eq!(h.session.char_index(), 23);
    assert!(!h.session.is_paused());
}

#[test]
fn lone_modifier_tap_cancels_speech() {
    let mut h = Harness::new(two_paragraphs());
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    let stops = h.engine.stops();

    h.session.on_keys_changed([KeyCode::CONTROL]);
    h.session.on_keys_changed([]);
    assert_eq!(h.session.state(), SessionState::Inactive);
    assert!(h.engine.stops() > stops);
    assert!(h.session.current_group().is_none());
}

#[test]
fn stale_hit_test_answers_are_ignored() {
    let mut h = Harness::new(two_paragraphs());
    h.session.on_keys_changed([KeyCode::SEARCH]);
    h.session.on_mouse_event(MouseEventKind::Press, 0, 0);
    h.session.on_mouse_event(MouseEventKind::Release, 400, 100);
    h.session.on_keys_changed([]);
    let request = h.session.take_hit_test_request().unwrap();
    assert_eq!(request.rect, Rect::new(0, 0, 400, 100));
    assert!(h.session.take_hit_test_request().is_none());

    h.session.on_hit_test_result(request.token + 1, Some(NodeId(0)));
    assert_eq!(h.engine.spoken_count(), 0);
    h.session.on_hit_test_result(request.token, Some(NodeId(0)));
    assert_eq!(h.engine.spoken_count(), 1);
    h.session.on_hit_test_result(request.token, Some(NodeId(0)));
    assert_eq!(h.engine.spoken_count(), 1);
}

#[test]
fn selecting_only_the_tray_button_reads_nothing() {
    let tree = DocumentTree::from_spec(
        NodeSpec::new(Role::Desktop)
            .with_bounds(Rect::new(0, 0, 1000, 1000))
            .with_children(vec![NodeSpec::text(Role::TrayButton, "Select to speak")
                .with_bounds(Rect::new(950, 950, 20, 20))]),
    );
    let mut h = Harness::new(tree);
    h.drag_select((940, 940), (980, 980));
    assert_eq!(h.engine.spoken_count(), 0);
}

#[test]
fn tiny_selection_expands_to_the_whole_paragraph() {
    let tree = DocumentTree::from_spec(
        NodeSpec::new(Role::RootWebArea)
            .with_bounds(Rect::new(0, 0, 800, 600))
            .with_children(vec![paragraph(vec![
                text("Hello", Rect::new(10, 10, 50, 20)),
                text("world", Rect::new(70, 10, 50, 20)),
            ])]),
    );
    let mut h = Harness::new(tree);
    h.drag_select((12, 12), (14, 30));
    assert_eq!(h.last_spoken_text(), "Hello world ");
}

#[test]
fn system_ui_selection_hides_the_panel() {
    let tree = DocumentTree::from_spec(
        NodeSpec::new(Role::Desktop)
            .with_bounds(Rect::new(0, 0, 1000, 1000))
            .with_children(vec![paragraph(vec![text(
                "System text",
                Rect::new(10, 10, 100, 20),
            )])]),
    );
    let mut h = Harness::new(tree);
    h.drag_select((0, 0), (200, 100));
    assert_eq!(h.last_spoken_text(), "System text ");
    h.engine_event(EngineEvent::Start);
    assert!(!h.ui.borrow().panels.last().unwrap().visible);
    h.engine_event(EngineEvent::End);
    assert_eq!(h.session.state(), SessionState::Inactive);
}

#[test]
fn speed_change_restarts_at_the_new_rate() {
    let mut h = Harness::new(single_paragraph("Hello big world"));
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    h.word(6, Some(3));

    h.session.on_change_speed_requested(2.0);
    assert_eq!(h.engine.spoken_count(), 1);
    h.engine_event(EngineEvent::Interrupted);
    assert_eq!(h.engine.spoken_count(), 2);
    let resumed = h.engine.last().unwrap();
    assert_eq!(resumed.options.rate, Some(2.0));
    assert_eq!(resumed.text, "big world ");
}

#[test]
fn engine_failure_stops_and_reports() {
    let mut h = Harness::new(two_paragraphs());
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    h.engine_event(EngineEvent::Error {
        message: "synthesis failed".to_string(),
    });
    assert_eq!(h.session.state(), SessionState::Inactive);
    assert_eq!(h.ui.borrow().errors, vec!["synthesis failed".to_string()]);
    assert_eq!(h.engine.spoken_count(), 1);
}

#[test]
fn tray_request_toggles_selection_mode() {
    let mut h = Harness::new(two_paragraphs());
    h.session.on_state_change_requested();
    assert_eq!(h.session.state(), SessionState::Selecting);
    assert!(h.session.input().is_armed_by_request());
    h.session.on_state_change_requested();
    assert_eq!(h.session.state(), SessionState::Inactive);
    assert!(!h.session.input().is_armed_by_request());
}

#[test]
fn revalidation_clears_the_ui_once_the_node_disappears() {
    let mut h = Harness::new(two_paragraphs());
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    let rings = h.ui.borrow().focus_rings.len();
    h.session.on_revalidate_tick();
    assert_eq!(h.ui.borrow().focus_rings.len(), rings + 1);

    let clears = h.ui.borrow().clears;
    h.session.desktop_mut().invalidate(NodeId(1));
    h.session.on_revalidate_tick();
    assert_eq!(h.ui.borrow().clears, clears + 1);
}

#[test]
fn sentence_navigation_reads_from_the_next_sentence() {
    let mut h = Harness::new(single_paragraph("First sentence. Second sentence."));
    h.drag_select((0, 0), (400, 100));
    h.engine_event(EngineEvent::Start);
    let _ = h.session.on_pause_requested();
    h.engine_event(EngineEvent::Interrupted);

    h.session.on_next_sentence_requested();
    assert_eq!(h.last_spoken_text(), "                Second sentence. ");
}
