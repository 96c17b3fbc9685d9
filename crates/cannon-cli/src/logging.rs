use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Install the global subscriber. Log lines go to stderr so the report on
/// stdout stays clean; `RUST_LOG` overrides the default `info` level.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    // A second call (e.g. from tests) leaves the first subscriber in place.
    let _ = Registry::default().with(filter).with(fmt_layer).try_init();
}
