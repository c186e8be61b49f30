mod config;

use anyhow::Result;
use bmcmon_collector::IpmiCollector;
use bmcmon_common::types::MetricBatch;
use bmcmon_ipmi::VALUE_UNAVAILABLE;
use chrono::Utc;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("bmcmon_agent=info".parse()?)
                .add_directive("bmcmon_collector=info".parse()?)
                .add_directive("bmcmon_ipmi=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/agent.toml".to_string());

    let config = config::AgentConfig::load(&config_path)?;
    // A configuration error here is fatal: no partial collection makes
    // sense without a valid execution layer.
    let collector = IpmiCollector::build(&config.collector)?;
    let metrics = collector.discover();
    tracing::info!(
        hosts = collector.hosts().len(),
        metric_count = metrics.len(),
        interval_secs = config.collection_interval_secs,
        "bmcmon-agent starting"
    );

    let mut tick = interval(Duration::from_secs(config.collection_interval_secs));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let samples = collector.collect(&metrics).await;
                let degraded = samples
                    .iter()
                    .filter(|s| s.value == VALUE_UNAVAILABLE)
                    .count();
                if degraded > 0 {
                    tracing::warn!(degraded, total = samples.len(), "some metrics unavailable");
                } else {
                    tracing::debug!(total = samples.len(), "collection pass complete");
                }

                let batch = MetricBatch {
                    timestamp: samples.first().map(|s| s.timestamp).unwrap_or_else(Utc::now),
                    samples,
                };
                match serde_json::to_string(&batch) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!(error = %e, "failed to serialize batch"),
                }
            }
            _ = signal::ctrl_c() => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}
