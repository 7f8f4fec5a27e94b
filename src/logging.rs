//! Subscriber setup for one CLI invocation.

use tracing::Subscriber;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "WHATSVECTOR_LOG";

fn filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn build<W>(verbose: bool, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(writer)
        .with_target(false)
        .finish()
}

/// Install a stderr subscriber for the current thread.
///
/// Logging stops when the guard is dropped.
pub fn init(verbose: bool) -> DefaultGuard {
    tracing::subscriber::set_default(build(verbose, std::io::stderr))
}
