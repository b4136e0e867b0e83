use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

/// Request traces from `tower_http` show up at debug level.
const DEFAULT_FILTER: &str = "info,tower_http=debug";

static INIT: OnceCell<()> = OnceCell::new();

/// Installs the global subscriber; `RUST_LOG` replaces the default filter.
/// Safe to call more than once, e.g. from several test binaries.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let _ = fmt().with_env_filter(filter).with_target(false).try_init();
    });
}
