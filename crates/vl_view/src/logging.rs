//! Structured logging bootstrap for host applications.
//!
//! Library code only emits `tracing` events; the host decides where they go.

/// Default filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "vl_proto=info,vl_view=info";

/// Install a fmt subscriber honouring `RUST_LOG`. Safe to call more than
/// once; later calls are no-ops.
pub fn init() -> bool {
    init_with_default(DEFAULT_FILTER)
}

/// Like [`init`] with a caller-chosen fallback filter. Returns `false` when a
/// global subscriber was already installed.
pub fn init_with_default(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .try_init()
        .is_ok()
}
