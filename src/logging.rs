use std::io::IsTerminal as _;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Crates whose `log` output is too chatty at debug level.
const QUIET_DEPENDENCIES: &[&str] = &["html5ever=warn", "selectors=warn", "hyper_util=info"];

/// Installs the stderr subscriber. `RUST_LOG` overrides the default `info`.
pub fn init() -> anyhow::Result<()> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()
        .context("build log filter")?;
    for directive in QUIET_DEPENDENCIES {
        filter = filter.add_directive(directive.parse().context("parse log directive")?);
    }

    let stderr = std::io::stderr();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(stderr.is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
