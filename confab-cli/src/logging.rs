//! Terminal logging setup.
//!
//! Log lines go to stderr so they never interleave with streamed answers
//! on stdout. The `log` command flips verbosity at runtime through
//! [`LogControl`].

use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Noisy library modules held at `warn` level.
///
/// These produce high-volume connection and TLS chatter that drowns out
/// session logs at debug level.
pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls", "tokio_util"];

fn build_filter(verbose: bool) -> EnvFilter {
    // RUST_LOG overrides everything
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(if verbose { "debug" } else { "info" });
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    EnvFilter::new(&directives)
}

/// Handle for changing log verbosity while the session runs.
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogControl {
    pub fn set_verbose(&self, verbose: bool) {
        let _ = self.handle.reload(build_filter(verbose));
    }
}

/// Install the global subscriber and return the verbosity handle.
pub fn init(verbose: bool) -> LogControl {
    let (filter, handle) = reload::Layer::new(build_filter(verbose));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
    LogControl { handle }
}
