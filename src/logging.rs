//! Tracing setup for the command line tool.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

static INIT: Once = Once::new();

/// Installs a stdout subscriber filtered by `RUST_LOG` (default `info`).
/// Later calls do nothing.
pub fn init() {
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
		let subscriber = Registry::default()
			.with(filter)
			.with(fmt::layer().with_target(false).with_writer(std::io::stdout));

		if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
			eprintln!("failed to install tracing subscriber: {}", e);
		}
	});
}
