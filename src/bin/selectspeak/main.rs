//! Select-to-speak host entrypoint.
//!
//! Reads JSON commands from stdin and writes JSON events to stdout until
//! stdin closes. See `selectspeak::ipc` for the protocol.

use anyhow::Result;
use selectspeak::config::AppConfig;
use selectspeak::{init_logging, ipc::run_ipc_mode, log_debug, log_file_path, log_panic};
use std::panic;
use std::process;

fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        previous(info);
    }));
}

fn main() -> Result<()> {
    let config = match AppConfig::parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("selectspeak: {err:#}");
            process::exit(2);
        }
    };
    init_logging(&config);
    install_panic_hook();
    log_debug(&format!(
        "selectspeak v{} starting, log file {}",
        env!("CARGO_PKG_VERSION"),
        log_file_path().display()
    ));

    let result = run_ipc_mode(config);
    if let Err(err) = &result {
        log_debug(&format!("selectspeak exiting with error: {err:#}"));
    }
    result
}
