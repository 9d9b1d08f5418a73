//! File logging: a size-capped debug log plus a metadata-only crash log.
//!
//! Both live in the temp directory and are off unless `--logs` (or
//! `--log-timings`) is set. Node and spoken text only reach the debug log
//! through [`log_debug_content`], which additionally needs `--log-content`.

use crate::config::AppConfig;
use std::{
    env, fs,
    io::Write,
    panic,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, OnceLock,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

const DEBUG_LOG_CAP_BYTES: u64 = 5 * 1024 * 1024;
const CRASH_LOG_CAP_BYTES: u64 = 256 * 1024;

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static CONTENT_ENABLED: AtomicBool = AtomicBool::new(false);
static TIMINGS_ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: OnceLock<Mutex<Option<CappedLog>>> = OnceLock::new();

pub fn log_file_path() -> PathBuf {
    env::temp_dir().join("selectspeak.log")
}

fn crash_log_path() -> PathBuf {
    env::temp_dir().join("selectspeak_crash.log")
}

/// Append-only file that starts over once it would grow past `cap` bytes.
struct CappedLog {
    path: PathBuf,
    file: fs::File,
    cap: u64,
    len: u64,
}

impl CappedLog {
    fn open(path: &Path, cap: u64) -> Option<Self> {
        let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let truncate = len > cap;
        Some(Self {
            path: path.to_path_buf(),
            file: open_log(path, truncate)?,
            cap,
            len: if truncate { 0 } else { len },
        })
    }

    fn append(&mut self, line: &str) {
        let incoming = line.len() as u64;
        if self.len.saturating_add(incoming) > self.cap {
            let Some(file) = open_log(&self.path, true) else {
                return;
            };
            self.file = file;
            self.len = 0;
        }
        if self.file.write_all(line.as_bytes()).is_ok() {
            self.len = self.len.saturating_add(incoming);
        }
    }
}

fn open_log(path: &Path, truncate: bool) -> Option<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.open(path).ok()
}

fn debug_log() -> &'static Mutex<Option<CappedLog>> {
    DEBUG_LOG.get_or_init(|| Mutex::new(None))
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn configure(enabled: bool, content: bool, timings: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
    CONTENT_ENABLED.store(enabled && content, Ordering::Relaxed);
    TIMINGS_ENABLED.store(enabled && timings, Ordering::Relaxed);
    let mut log = debug_log()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *log = if enabled {
        CappedLog::open(&log_file_path(), DEBUG_LOG_CAP_BYTES)
    } else {
        None
    };
}

/// Configure logging from CLI flags (env fallbacks are applied by clap).
pub fn init_logging(config: &AppConfig) {
    let enabled = (config.logs || config.log_timings) && !config.no_logs;
    configure(enabled, config.log_content, config.log_timings);
    crate::telemetry::init_tracing(config);
}

/// Appends a timestamped line to the debug log.
pub fn log_debug(msg: &str) {
    if !DEBUG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let line = format!("[{}] {msg}\n", unix_seconds());
    let mut log = debug_log()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(log) = log.as_mut() {
        log.append(&line);
    }
}

/// Like [`log_debug`], for messages that quote node or spoken text.
pub fn log_debug_content(msg: &str) {
    if CONTENT_ENABLED.load(Ordering::Relaxed) {
        log_debug(msg);
    }
}

pub fn log_timing(label: &str, elapsed: Duration) {
    if TIMINGS_ENABLED.load(Ordering::Relaxed) {
        log_debug(&format!("timing|{label}|{:.3}ms", elapsed.as_secs_f64() * 1000.0));
    }
}

/// Records where a panic happened. The payload is only kept with `--log-content`.
pub fn log_panic(info: &panic::PanicHookInfo<'_>) {
    if !DEBUG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());
    let payload = if CONTENT_ENABLED.load(Ordering::Relaxed) {
        info.payload()
            .downcast_ref::<&str>()
            .map(|text| (*text).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string())
    } else {
        "payload omitted".to_string()
    };
    let line = format!(
        "[{}] panic at {location}: {payload} (v{})\n",
        unix_seconds(),
        env!("CARGO_PKG_VERSION")
    );
    if let Some(mut crash_log) = CappedLog::open(&crash_log_path(), CRASH_LOG_CAP_BYTES) {
        crash_log.append(&line);
    }
}
