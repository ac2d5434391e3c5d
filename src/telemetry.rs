//! Telemetry helpers for applications embedding `chartlite`.
//!
//! The crate logs through `tracing` at its mutation sites: series ids
//! and item counts on bulk sets, timestamps on streaming updates, and
//! clamped renderer failures in the paint scheduler. A host that already
//! runs a subscriber sees those events with no extra setup; the helper
//! below is for hosts that do not.

/// Filter used when the host has not set `RUST_LOG`: chart internals at
/// debug, everything else at info.
pub const DEFAULT_FILTER: &str = "info,chartlite=debug";

/// Installs a default `tracing` subscriber when the `telemetry` feature
/// is enabled, filtered by `RUST_LOG` or [`DEFAULT_FILTER`].
///
/// Returns `true` on success, `false` when the feature is disabled or a
/// global subscriber was already installed by the host application.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::init_default_tracing;

    #[cfg(not(feature = "telemetry"))]
    #[test]
    fn init_is_a_noop_without_the_feature() {
        assert!(!init_default_tracing());
    }

    #[cfg(feature = "telemetry")]
    #[test]
    fn init_installs_the_default_subscriber_exactly_once() {
        assert!(init_default_tracing());
        // A second call finds the global subscriber already set.
        assert!(!init_default_tracing());
    }
}
