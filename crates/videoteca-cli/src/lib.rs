//! Videoteca CLI support: tracing setup, the container health probe and the
//! `doctor` environment checks, and error reporting.

pub mod doctor;
pub mod health;
pub mod report;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
