// rigtune library - public API

// Re-export error types
pub mod error;
pub use error::{EngineError, ErrorKind, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::{ActionResponse, Engine, EngineConfig};

/// Initialize logging. `RUST_LOG` wins over the default `info` level;
/// `verbose` forces debug output for this crate.
pub fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_default_env();
    if verbose {
        builder.filter_module("rigtune", log::LevelFilter::Debug);
    }
    let _ = builder.try_init();
}
