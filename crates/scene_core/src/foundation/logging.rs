//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default filter (e.g. `"info"` or `"scene_core=debug"`)
///
/// `RUST_LOG` still takes precedence when set. Calling this twice is harmless;
/// the second initialization is ignored.
pub fn init_with_level(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}
