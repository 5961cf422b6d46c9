//! Tracing setup
//!
//! Shared with the other MCP servers in this workspace family: same stderr
//! writer, same `RUST_LOG` plus `LOG_FORMAT` switches. Logs always go to
//! stderr because stdout carries the stdio transport's protocol stream.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crate default, added on top of whatever `RUST_LOG` asks for
const DEFAULT_DIRECTIVE: &str = "obsidian_mcp=info";

/// Initialize tracing for the server
///
/// Sets up logging to stderr with:
/// - Environment-based filtering via `RUST_LOG`
/// - `obsidian_mcp=info` as the crate default
/// - No ANSI colors, so logs captured by an MCP host stay readable
///
/// Set `LOG_FORMAT=json` for structured JSON output (one object per line,
/// suited to log aggregation). Anything else gives human-readable text.
///
/// Fails if the directive does not parse or a global subscriber is already
/// installed, so call it once, first thing in `main`.
///
/// # Example
///
/// ```rust,ignore
/// obsidian_mcp::logging::init_tracing()?;
/// tracing::info!("Starting Obsidian MCP Server");
/// ```
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(DEFAULT_DIRECTIVE.parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    if wants_json(std::env::var("LOG_FORMAT").ok().as_deref()) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

fn wants_json(log_format: Option<&str>) -> bool {
    log_format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    // Note: the global subscriber can only be installed once per process,
    // so only the format switch and the default directive are tested here
    use super::*;

    #[test]
    fn test_log_format_switch() {
        assert!(wants_json(Some("json")));
        assert!(wants_json(Some("JSON")));
        assert!(wants_json(Some(" json ")));
        assert!(!wants_json(Some("text")));
        assert!(!wants_json(Some("")));
        assert!(!wants_json(None));
    }

    #[test]
    fn test_default_directive_parses() {
        assert!(DEFAULT_DIRECTIVE.parse::<tracing_subscriber::filter::Directive>().is_ok());
    }
}
