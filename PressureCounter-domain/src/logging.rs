use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Install the global tracing subscriber
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Returns `false`
/// when a subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(env_filter)
        .try_init()
        .is_ok()
}
