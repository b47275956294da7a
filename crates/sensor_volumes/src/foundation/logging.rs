//! Logging setup
//!
//! The crate logs through the `log` facade: resource rebuilds and primitive
//! lifecycle at `debug`, per-frame summaries at `trace`. Applications pick the
//! sink; these helpers wire up `env_logger` for binaries and tests.

use log::LevelFilter;

/// Target prefix of every record emitted by this crate
pub const LOG_TARGET: &str = "sensor_volumes";

/// Initialize `env_logger`, honouring `RUST_LOG` and otherwise showing this
/// crate's records at `level`
///
/// Does nothing when a logger is already installed.
pub fn init(level: LevelFilter) {
    let _ = builder(level).try_init();
}

/// Initialize logging for tests, capturing output per test
pub fn init_for_tests() {
    let _ = builder(LevelFilter::Debug).is_test(true).try_init();
}

fn builder(level: LevelFilter) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_module(LOG_TARGET, level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder
}
