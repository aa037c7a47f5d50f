// Logging setup for the three front-ends

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Which binary is logging; decides the default verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontend {
    /// Command output owns stdout, so only problems are logged
    Cli,
    /// The terminal UI owns the screen; stderr lines would tear it
    Tui,
    Server,
}

impl Frontend {
    /// Filter directive used when `RUST_LOG` is unset
    pub fn default_directive(&self, verbose: bool) -> &'static str {
        match (self, verbose) {
            (_, true) => "debug",
            (Frontend::Cli, false) => "warn",
            (Frontend::Tui, false) => "off",
            (Frontend::Server, false) => "info",
        }
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` overrides the front-end default. Later calls are no-ops.
pub fn init_tracing(frontend: Frontend, verbose: bool, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(frontend.default_directive(verbose)));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let installed = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
    };

    if installed.is_ok() {
        tracing::debug!(?frontend, verbose, json, "logging ready");
    }
}
