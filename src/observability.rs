//! Structured logging setup (`SPEC_FULL.md` §1 ambient stack).
//!
//! Grounded on the teacher's `observability::tracing::init_tracing`:
//! `tracing` is the sole logging facade, filtered by `RUST_LOG` with a
//! sensible default, installed once from the binary entry point. Unlike
//! the teacher, there is no TUI to suppress output for, so the writer is
//! a plain stderr layer.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber. `verbosity` follows the
/// conventional CLI `-v` count: 0 ⇒ warnings and errors only, 1 ⇒ info,
/// 2+ ⇒ debug. `RUST_LOG`, when set, always takes precedence.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

/// Installs a panic hook that routes thread panics through `tracing`
/// instead of a bare stderr backtrace, so they show up alongside the
/// rest of a run's structured output.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "panicked");
        default_hook(info);
    }));
}
