//! Logger setup with a runtime-replaceable filter.

use tracing::{debug, warn};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use inbrowser_core::traits::DebugFilterHook;

/// Applies the stored `debug` filter on top of the startup filter.
pub struct ReloadableFilter {
    base: String,
    handle: reload::Handle<EnvFilter, Registry>,
}

impl DebugFilterHook for ReloadableFilter {
    fn apply(&self, filter: &str) {
        let directives = if filter.trim().is_empty() {
            self.base.clone()
        } else {
            format!("{},{}", self.base, filter.trim())
        };

        match EnvFilter::try_new(&directives) {
            Ok(new_filter) => match self.handle.reload(new_filter) {
                Ok(()) => debug!(filter, "Applied debug filter"),
                Err(e) => warn!(error = %e, "Failed to apply debug filter"),
            },
            Err(e) => warn!(filter, error = %e, "Ignoring invalid debug filter"),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the built-in filter.
pub fn init(verbose: bool) -> ReloadableFilter {
    let default = if verbose {
        "inbrowser=debug,info"
    } else {
        "inbrowser=info,warn"
    };

    let from_env = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(&directives).ok().map(|f| (directives, f)));
    let (base, filter) = from_env.unwrap_or_else(|| (default.to_string(), EnvFilter::new(default)));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    ReloadableFilter { base, handle }
}
