//! Logging setup based on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,flinch_resources=debug";

/// Install the global fmt subscriber.
///
/// Honors `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// # Panics
/// Panics if a global subscriber has already been installed.
pub fn init() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// Install the global fmt subscriber with an explicit filter directive.
///
/// # Panics
/// Panics if a global subscriber has already been installed.
pub fn init_with_filter(directive: &str) {
    tracing_subscriber::fmt().with_env_filter(directive).init();
}

/// Like [`init`], but returns `false` instead of panicking when a subscriber
/// is already installed.
pub fn try_init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init()
        .is_ok()
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_is_idempotent() {
        let _ = try_init();
        // Whatever happened first, a second install must report failure, not panic.
        assert!(!try_init());
    }
}
