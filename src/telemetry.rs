use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global fmt subscriber. `filter` uses `RUST_LOG` syntax; an invalid
/// filter falls back to `info`. Output goes to stderr. Calling this twice is harmless.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
