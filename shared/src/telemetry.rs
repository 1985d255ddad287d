use std::time::Instant;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber. Logs go to stderr so stdout only
/// carries the prompt and the answer.
pub fn init_logging(verbose: bool) {
    let default_directives = if verbose {
        "info,application=debug,infrastructure=debug"
    } else {
        "warn,application=info,infrastructure=info,presentation=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

pub struct Telemetry {
    label: &'static str,
    start: Instant,
}

impl Telemetry {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    pub fn finish(self) {
        tracing::info!(stage = self.label, elapsed_ms = self.elapsed().as_millis() as u64, "stage finished");
    }
}
