//! Process plumbing shared by the binary and the library.

mod logging;

pub use logging::{
    init_logging, log_debug, log_debug_content, log_file_path, log_panic, log_timing,
};
