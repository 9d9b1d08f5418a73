//! JSON IPC host for the speech session.
//!
//! A non-blocking JSON-lines protocol over stdin/stdout lets a platform
//! frontend drive the session: it mirrors the accessibility tree, forwards
//! keys, mouse and synthesizer callbacks, and renders what comes back.
//!
//! Architecture:
//! - Stdin reader thread: reads JSON commands, sends to main loop via channel
//! - Main event loop: processes commands and the revalidation tick
//! - Bridges: the session's speech engine and UI sink queue events for stdout
//!
//! Protocol:
//! - Each line is a JSON object
//! - Events (Rust → client): {"event": "...", ...}
//! - Commands (client → Rust): {"cmd": "...", ...}

mod bridge;
mod protocol;
mod router;
mod session;


pub use protocol::{IpcCommand, IpcEvent};
pub use session::run_ipc_mode;
