//! Logging setup for the simulator.

#[cfg(feature = "trace")]
pub(crate) mod tracer {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

    /// Logs go to stderr so stdout only carries the simulation report.
    ///
    /// `GOSSIP_SIM_LOG_FORMAT=json` switches to JSON lines and
    /// `GOSSIP_SIM_DISABLE_LOGS` turns logging off entirely.
    pub fn init_tracer(level: Option<LevelFilter>) -> anyhow::Result<()> {
        if std::env::var("GOSSIP_SIM_DISABLE_LOGS").is_ok() {
            return Ok(());
        }

        let default_filter = if cfg!(any(test, debug_assertions)) {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        let default_filter = level.unwrap_or(default_filter);
        let filter_layer = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(default_filter.into())
            .from_env_lossy();

        let use_json = std::env::var("GOSSIP_SIM_LOG_FORMAT")
            .map(|v| v.to_lowercase() == "json")
            .unwrap_or(false);

        let fmt_layer = if use_json {
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            let layer = tracing_subscriber::fmt::layer().with_level(true).pretty();
            let layer = if cfg!(any(test, debug_assertions)) {
                layer.with_file(true).with_line_number(true)
            } else {
                layer
            };
            layer.with_writer(std::io::stderr).boxed()
        };

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init()?;
        Ok(())
    }
}
