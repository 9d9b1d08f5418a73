use crate::content::{DocumentTree, NodeId};
use crate::log_debug;
use anyhow::{bail, ensure, Result};
use std::path::Path;

use super::protocol::IpcCommand;
use super::session::IpcState;

fn ensure_node(state: &IpcState, node: NodeId) -> Result<()> {
    ensure!(
        state.session.desktop().contains(node),
        "unknown node {}",
        node.0
    );
    Ok(())
}

fn ensure_optional_node(state: &IpcState, node: Option<NodeId>) -> Result<()> {
    match node {
        Some(node) => ensure_node(state, node),
        None => Ok(()),
    }
}

pub(super) fn handle_command(state: &mut IpcState, cmd: IpcCommand) -> Result<()> {
    match cmd {
        IpcCommand::LoadDocument { path, document } => {
            let tree = match (path, document) {
                (Some(path), None) => DocumentTree::load(Path::new(&path))?,
                (None, Some(spec)) => DocumentTree::from_spec(spec),
                (Some(_), Some(_)) => bail!("load_document takes a path or a document, not both"),
                (None, None) => bail!("load_document needs a path or a document"),
            };
            load_document(state, tree);
        }
        IpcCommand::SetFocus {
            node,
            text_selection,
        } => {
            ensure_optional_node(state, node)?;
            state.session.desktop_mut().set_focus(node, text_selection);
        }
        IpcCommand::SetSelection { selection } => {
            if let Some(selection) = &selection {
                ensure_node(state, selection.start_node)?;
                ensure_node(state, selection.end_node)?;
            }
            state.session.desktop_mut().set_selection(selection);
        }
        IpcCommand::SetForegroundWindow { window } => {
            ensure_optional_node(state, window)?;
            state.session.desktop_mut().set_foreground_window(window);
        }
        IpcCommand::InvalidateNode { node } => {
            ensure_node(state, node)?;
            state.session.desktop_mut().invalidate(node);
        }
        IpcCommand::Keys { keys } => state.session.on_keys_changed(keys),
        IpcCommand::Mouse { kind, x, y } => state.session.on_mouse_event(kind, x, y),
        IpcCommand::EngineEvent { utterance, event } => {
            state.session.on_engine_event(utterance, event)
        }
        IpcCommand::Pause => {
            // Settles on a later engine event; the session resolves it itself.
            let _ = state.session.on_pause_requested();
        }
        IpcCommand::Resume => state.session.on_resume_requested(),
        IpcCommand::NextSentence => state.session.on_next_sentence_requested(),
        IpcCommand::PreviousSentence => state.session.on_previous_sentence_requested(),
        IpcCommand::NextParagraph => state.session.on_next_paragraph_requested(),
        IpcCommand::PreviousParagraph => state.session.on_previous_paragraph_requested(),
        IpcCommand::Exit => state.session.on_exit_requested(),
        IpcCommand::StateChange => state.session.on_state_change_requested(),
        IpcCommand::ChangeSpeed { multiplier } => {
            ensure!(
                multiplier.is_finite() && multiplier > 0.0,
                "speed multiplier must be positive, got {multiplier}"
            );
            state.session.on_change_speed_requested(multiplier);
        }
        IpcCommand::SpeakSelection => state.session.speak_selection(),
        IpcCommand::UserScrolled => state.session.on_user_scrolled(),
        IpcCommand::SetPrefs { prefs } => {
            state.prefs.borrow_mut().apply(prefs);
            log_debug("preferences updated");
        }
        IpcCommand::GetCapabilities => state.emit_capabilities(),
    }
    Ok(())
}

fn load_document(state: &mut IpcState, tree: DocumentTree) {
    state.session.on_exit_requested();
    *state.session.desktop_mut() = tree;
    state.document_loaded = true;
    log_debug("document replaced");
}
