use crate::cli::Cli;
use anyhow::Result;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Install the global subscriber. RUST_LOG wins over the CLI level when
/// set; the format flag picks json (default) or human-readable output.
pub fn init(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.effective_log_level()));

    let base = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let registry = tracing_subscriber::registry().with(filter);

    if cli.effective_log_format() == "json" {
        registry.with(base.json()).init();
    } else {
        registry.with(base).init();
    }

    Ok(())
}
