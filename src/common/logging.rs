use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber (`RUST_LOG`, default `info`). Safe to call
/// more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
}
