use tracing_subscriber::EnvFilter;

/// Install the global subscriber. With `debug` the level defaults to `debug`
/// and `RUST_LOG` may override it; otherwise the level is fixed at `info`.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
