use rol_core::{Error, Result};
use std::str::FromStr;
use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

pub fn parse_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim())
        .map_err(|_| Error::InvalidInput(format!("Unknown log level: {}", level)))
}

/// Installs the fmt subscriber once; later calls are no-ops.
pub fn init_logging(level: Level) {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .init();
        });
    }
}
