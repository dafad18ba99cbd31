use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `mqlhttp_core=debug`.
pub const LOG_ENV: &str = "MQLHTTP_LOG";

static INIT: Once = Once::new();

/// Install a stderr subscriber the first time this is called, if `LOG_ENV`
/// is set. A host that already installed a global subscriber keeps it.
pub(crate) fn init() {
    INIT.call_once(|| {
        let Ok(filter) = std::env::var(LOG_ENV) else {
            return;
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .try_init();
    });
}
