//! Logging setup for the deployer binary
//!
//! All diagnostics go to standard error so standard output carries nothing but
//! the deployment result line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "vaultgate_deployer=info,warn";
const DEBUG_FILTER: &str = "vaultgate_deployer=debug,warn";

/// Filter directives used when `RUST_LOG` is not set
pub fn default_directives(debug: bool) -> &'static str {
	if debug {
		DEBUG_FILTER
	} else {
		DEFAULT_FILTER
	}
}

/// Initialize structured logging
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at info, or debug when
/// `debug` is set, and every other crate at warn.
pub fn init_logging(debug: bool) {
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

	// A second init (e.g. from tests) is not an error worth surfacing
	let _ = tracing_subscriber::registry()
		.with(
			fmt::layer()
				.with_writer(std::io::stderr)
				.with_target(true)
				.with_thread_ids(false)
				.with_file(false)
				.with_line_number(false)
				.compact(),
		)
		.with(env_filter)
		.try_init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_directives() {
		assert_eq!(default_directives(false), "vaultgate_deployer=info,warn");
		assert_eq!(default_directives(true), "vaultgate_deployer=debug,warn");
	}

	#[test]
	fn test_init_logging_twice_is_harmless() {
		init_logging(false);
		init_logging(true);
	}
}
