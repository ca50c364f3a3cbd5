//! Tracing bootstrap shared by binaries, demos, and tests.

use std::sync::Once;

use tracing_subscriber::FmtSubscriber;

static INIT: Once = Once::new();

/// Installs the global fmt subscriber once; later calls are no-ops.
///
/// The filter honors `RUST_LOG` and falls back to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter.as_str())
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
