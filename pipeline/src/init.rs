//! Tracing initialization
//!
//! Logs go to stderr so stdout stays free for CLI output and the MCP
//! protocol.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for a binary in this workspace
///
/// - Environment-based filtering via RUST_LOG, taken as-is when set
/// - Otherwise `info` for `crate_name` and the pipeline library
///
/// Set `LOG_FORMAT=json` for structured JSON output. Default is
/// human-readable text without ANSI colors.
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), crate_name)?;

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}

const LIBRARY_TARGET: &str = "image_pipeline";

fn build_filter(rust_log: Option<&str>, crate_name: &str) -> anyhow::Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return Ok(EnvFilter::try_new(directives)?);
    }

    let mut filter = EnvFilter::new(format!("{}=info", crate_name));
    if crate_name != LIBRARY_TARGET {
        filter = filter.add_directive(format!("{}=info", LIBRARY_TARGET).parse()?);
    }
    Ok(filter)
}
