use crate::config::AppConfig;
use crate::content::DocumentTree;
use crate::prefs::{Preferences, StaticPreferences};
use crate::session::SpeechSession;
use crate::{log_debug, log_debug_content, log_timing};
use anyhow::{Context, Result};
use crossbeam_channel::{select, tick, unbounded, Receiver, Sender};
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::bridge::{IpcSpeechEngine, IpcUiSink};
use super::protocol::{IpcCommand, IpcEvent};
use super::router::handle_command;

// ============================================================================
// IPC State
// ============================================================================

/// One stdin line, parsed.
#[derive(Debug)]
pub(super) enum Inbound {
    Command(IpcCommand),
    Invalid(String),
}

pub(super) struct IpcState {
    pub(super) config: AppConfig,
    pub(super) session: SpeechSession<DocumentTree>,
    pub(super) prefs: Rc<RefCell<StaticPreferences>>,
    /// Events from the session and from command handlers, in order.
    pub(super) outbox: Sender<IpcEvent>,
    events: Receiver<IpcEvent>,
    pub(super) session_id: String,
    pub(super) document_loaded: bool,
}

impl IpcState {
    pub(super) fn new(config: AppConfig) -> Result<Self> {
        let (document, loaded) = match &config.document {
            Some(path) => (DocumentTree::load(path)?, true),
            None => (DocumentTree::default(), false),
        };
        Ok(Self::with_document(config, document, loaded))
    }

    pub(super) fn with_document(config: AppConfig, document: DocumentTree, document_loaded: bool) -> Self {
        let (outbox, events) = unbounded();
        let prefs = Rc::new(RefCell::new(config.preferences()));
        let session = SpeechSession::new(
            document,
            Box::new(IpcSpeechEngine::new(outbox.clone())),
            Box::new(IpcUiSink::new(outbox.clone())),
            Box::new(Rc::clone(&prefs)),
            config.chord_keys(),
        );
        let session_id = format!(
            "{:x}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis()
        );
        Self {
            config,
            session,
            prefs,
            outbox,
            events,
            session_id,
            document_loaded,
        }
    }

    pub(super) fn emit(&self, event: IpcEvent) {
        let _ = self.outbox.send(event);
    }

    pub(super) fn emit_capabilities(&self) {
        let prefs = self.prefs.borrow();
        let keys = self.session.input().chord_keys();
        self.emit(IpcEvent::Capabilities {
            session_id: self.session_id.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            document_loaded: self.document_loaded,
            word_highlighting: prefs.word_highlighting_enabled(),
            navigation_controls: prefs.navigation_controls_enabled(),
            voice_switching: prefs.voice_switching_enabled(),
            activation_key: keys.activation,
            modifier_key: keys.modifier,
            read_selection_key: keys.read_selection,
            revalidate_interval_ms: self.config.revalidate_interval_ms,
        });
    }

    /// Answers hit tests the session issued with the loaded document.
    pub(super) fn answer_hit_tests(&mut self) {
        while let Some(request) = self.session.take_hit_test_request() {
            let hit = self.session.desktop().hit_test(request.x, request.y);
            log_debug(&format!(
                "hit test {} at ({}, {}) -> {:?}",
                request.token, request.x, request.y, hit
            ));
            self.session.on_hit_test_result(request.token, hit);
        }
    }

    fn flush_events<W: Write>(&self, out: &mut W) -> Result<()> {
        for event in self.events.try_iter() {
            write_event(out, &event)?;
        }
        out.flush().context("failed to flush IPC output")
    }
}

pub(super) fn write_event<W: Write>(out: &mut W, event: &IpcEvent) -> Result<()> {
    let json = serde_json::to_string(event).context("failed to serialize IPC event")?;
    writeln!(out, "{json}").context("failed to write IPC event")
}

// ============================================================================
// Stdin Reader
// ============================================================================

pub(super) fn parse_line(line: &str) -> Option<Inbound> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(match serde_json::from_str::<IpcCommand>(trimmed) {
        Ok(cmd) => Inbound::Command(cmd),
        Err(e) => Inbound::Invalid(format!("Invalid command: {e}")),
    })
}

fn spawn_stdin_reader(tx: Sender<Inbound>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(inbound) = parse_line(&line) {
                if tx.send(inbound).is_err() {
                    break; // Main loop has exited
                }
            }
        }
        log_debug("Stdin reader thread exiting");
    })
}

// ============================================================================
// Main Loop
// ============================================================================

/// Runs the JSON-lines host until stdin closes.
pub fn run_ipc_mode(config: AppConfig) -> Result<()> {
    log_debug("Starting JSON IPC mode");
    let ticker = tick(config.revalidate_interval());
    let mut state = IpcState::new(config)?;

    let (tx, rx) = unbounded();
    let _stdin_handle = spawn_stdin_reader(tx);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_ipc_loop(&mut state, &rx, &ticker, &mut out)
}

/// Serves commands and revalidation ticks, writing events after each one.
pub(super) fn run_ipc_loop<W: Write>(
    state: &mut IpcState,
    inbound: &Receiver<Inbound>,
    ticker: &Receiver<Instant>,
    out: &mut W,
) -> Result<()> {
    state.emit_capabilities();
    state.flush_events(out)?;

    let mut handled: u64 = 0;
    loop {
        select! {
            recv(inbound) -> message => match message {
                Ok(Inbound::Command(cmd)) => {
                    log_debug_content(&format!("IPC command received: {cmd:?}"));
                    let started = Instant::now();
                    if let Err(err) = handle_command(state, cmd) {
                        log_debug(&format!("IPC command failed: {err:#}"));
                        state.emit(IpcEvent::Error {
                            message: format!("{err:#}"),
                            recoverable: true,
                        });
                    }
                    state.answer_hit_tests();
                    log_timing("ipc_command", started.elapsed());
                    handled += 1;
                    if handled % 1000 == 0 {
                        log_debug(&format!(
                            "IPC handled {handled} commands, state {}",
                            state.session.state().label()
                        ));
                    }
                }
                Ok(Inbound::Invalid(message)) => state.emit(IpcEvent::Error {
                    message,
                    recoverable: true,
                }),
                Err(_) => {
                    log_debug("Command channel disconnected, exiting");
                    break;
                }
            },
            recv(ticker) -> _ => state.session.on_revalidate_tick(),
        }
        state.flush_events(out)?;
    }

    log_debug("IPC mode exiting");
    Ok(())
}
