//! Log output for the backend binary.

use tracing_subscriber::{
    EnvFilter,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Filter used when `RUST_LOG` is unset: this crate and the per-request
/// traces from `tower_http` at debug, everything else at info.
pub const DEFAULT_FILTER: &str = "info,ask_widget=debug,tower_http=debug";

/// Filter from `RUST_LOG`, or [`DEFAULT_FILTER`] when it is unset or invalid.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install compact console logging as the global subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn try_init() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().compact().with_target(true))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_valid() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_init_only_once() {
        let _ = try_init();
        assert!(try_init().is_err());
    }
}
