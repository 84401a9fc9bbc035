use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "mffr_service=info,mffr_client=info";

/// Installs the global fmt subscriber. `RUST_LOG` overrides the defaults.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // A second init (tests, repeated bins) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
