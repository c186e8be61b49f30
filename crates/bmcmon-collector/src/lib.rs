//! IPMI metric collection orchestrator.
//!
//! [`IpmiCollector`] consumes a capability catalog and an execution layer.
//! For a requested set of metric paths it deduplicates the underlying
//! commands so no command is issued twice per host, groups them into
//! per-host batches, fans the batches out concurrently (bounded by a
//! semaphore, each under its own timeout), decodes every response through
//! its descriptor's format, and reassembles a flat sample list in the
//! caller's requested order with one timestamp shared by the whole pass.
//!
//! Per-request failures degrade the affected metrics to the unavailable
//! sentinel; one unreachable or hung host never aborts collection for the
//! others.

pub mod config;


use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use bmcmon_common::namespace::{extend_path, make_name, parse_name, split_host};
use bmcmon_common::types::MetricSample;
use bmcmon_ipmi::catalog::RequestDescriptor;
use bmcmon_ipmi::error::IpmiError;
use bmcmon_ipmi::exec::{ToolInBand, ToolLan, ToolOpen};
use bmcmon_ipmi::formats::validate;
use bmcmon_ipmi::{IpmiExecutor, IpmiRequest, IpmiResponse, VALUE_UNAVAILABLE};

use crate::config::{CollectorConfig, ExecMode};

/// Orchestrates metric collection over one execution layer.
///
/// Built once from validated configuration; the catalog and host list are
/// a read-only snapshot for the collector's lifetime, so a collection
/// pass never races a reconfiguration (rebuilding means constructing a
/// new collector).
pub struct IpmiCollector {
    executor: Arc<dyn IpmiExecutor>,
    catalog: HashMap<String, Vec<RequestDescriptor>>,
    hosts: Vec<String>,
    concurrency: usize,
    timeout: Duration,
}

impl IpmiCollector {
    /// Builds a collector from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IpmiError::Configuration`] when the out-of-band mode has
    /// no usable hosts file or the resulting host list is empty.
    pub fn build(config: &CollectorConfig) -> Result<Self, IpmiError> {
        let executor: Arc<dyn IpmiExecutor> = match config.mode {
            ExecMode::InbandTool => Arc::new(ToolInBand::new(
                config.channel.clone(),
                config.slave.clone(),
            )),
            ExecMode::InbandOpen => Arc::new(ToolOpen::new()),
            ExecMode::Oob => Arc::new(ToolLan::new(
                config.channel.clone(),
                config.slave.clone(),
                config.user.clone(),
                config.password.clone(),
            )),
        };
        let hosts = match config.mode {
            ExecMode::Oob => {
                let path = config.hosts_file.as_deref().ok_or_else(|| {
                    IpmiError::Configuration(
                        "hosts_file is required for out-of-band mode".to_string(),
                    )
                })?;
                config::load_hosts(path)?
            }
            ExecMode::InbandTool | ExecMode::InbandOpen => vec![local_hostname()],
        };
        if hosts.is_empty() {
            return Err(IpmiError::Configuration("host list is empty".to_string()));
        }
        tracing::info!(
            mode = executor.mode(),
            hosts = hosts.len(),
            concurrency = config.concurrency,
            "building IPMI collector"
        );
        Ok(Self::with_executor(
            executor,
            hosts,
            config.concurrency,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// Assembles a collector around an existing execution layer.
    pub fn with_executor(
        executor: Arc<dyn IpmiExecutor>,
        hosts: Vec<String>,
        concurrency: usize,
        batch_timeout: Duration,
    ) -> Self {
        let catalog = executor.platform_capabilities(&hosts);
        Self {
            executor,
            catalog,
            hosts,
            concurrency: concurrency.max(1),
            timeout: batch_timeout,
        }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Enumerates every metric namespace path the catalog can produce.
    pub fn discover(&self) -> Vec<String> {
        let mut names = Vec::new();
        for host in &self.hosts {
            let Some(capabilities) = self.catalog.get(host) else {
                continue;
            };
            for descriptor in capabilities {
                for metric in descriptor.format.metrics() {
                    let path = extend_path(&extend_path(host, descriptor.metrics_root), &metric);
                    names.push(make_name(&path));
                }
            }
        }
        names
    }

    /// Collects current values for the given metric paths.
    ///
    /// Returns one sample per requested path, in request order. Metrics
    /// whose command failed, timed out, or whose path is unknown carry
    /// [`VALUE_UNAVAILABLE`].
    pub async fn collect(&self, metrics: &[String]) -> Vec<MetricSample> {
        let batches = self.plan_batches(metrics);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(batches.len());
        for (host, descriptors) in batches {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let batch_timeout = self.timeout;
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();
                let requests: Vec<IpmiRequest> =
                    descriptors.iter().map(|d| d.request.clone()).collect();
                let responses =
                    match timeout(batch_timeout, executor.batch_exec(&requests, &host)).await {
                        Ok(Ok(responses)) if responses.len() == requests.len() => responses,
                        Ok(Ok(responses)) => {
                            tracing::warn!(
                                target_host = %host,
                                got = responses.len(),
                                expected = requests.len(),
                                "batch response count mismatch"
                            );
                            failed_batch(&host, requests.len())
                        }
                        Ok(Err(e)) => {
                            tracing::warn!(target_host = %host, error = %e, "batch execution failed");
                            failed_batch(&host, requests.len())
                        }
                        Err(_) => {
                            tracing::warn!(
                                target_host = %host,
                                timeout_secs = batch_timeout.as_secs(),
                                "batch timed out"
                            );
                            failed_batch(&host, requests.len())
                        }
                    };
                (host, descriptors, responses)
            }));
        }

        // host -> host-relative path -> value
        let mut cache: HashMap<String, HashMap<String, u16>> = HashMap::new();
        for task in tasks {
            match task.await {
                Ok((host, descriptors, responses)) => {
                    let host_cache = cache.entry(host.clone()).or_default();
                    for (descriptor, response) in descriptors.iter().zip(&responses) {
                        if let Err(e) = validate(response) {
                            tracing::debug!(
                                target_host = %host,
                                root = descriptor.metrics_root,
                                error = %e,
                                "response failed validation"
                            );
                        }
                        for (name, value) in descriptor.format.parse(response) {
                            host_cache.insert(extend_path(descriptor.metrics_root, &name), value);
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "collection task panicked"),
            }
        }

        // One timestamp for the whole pass, taken after every batch is in.
        let timestamp = Utc::now();
        metrics
            .iter()
            .map(|path| {
                let (source, value) = match parse_name(path).and_then(split_host) {
                    Some((host, metric_path)) => {
                        let value = cache
                            .get(host)
                            .and_then(|values| values.get(metric_path))
                            .copied()
                            .unwrap_or(VALUE_UNAVAILABLE);
                        (host.to_string(), value)
                    }
                    None => (String::new(), VALUE_UNAVAILABLE),
                };
                MetricSample {
                    namespace: path.clone(),
                    source,
                    timestamp,
                    value,
                }
            })
            .collect()
    }

    /// Groups requested metrics into one deduplicated descriptor batch per
    /// host, preserving first-seen host and descriptor order.
    fn plan_batches(&self, metrics: &[String]) -> Vec<(String, Vec<RequestDescriptor>)> {
        let mut batches: Vec<(String, Vec<RequestDescriptor>)> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for path in metrics {
            let Some((host, metric_path)) = parse_name(path).and_then(split_host) else {
                tracing::warn!(path = %path, "requested metric outside collector namespace");
                continue;
            };
            let Some(capabilities) = self.catalog.get(host) else {
                tracing::warn!(target_host = host, "no capability catalog for host");
                continue;
            };
            let slot = *slots.entry(host.to_string()).or_insert_with(|| {
                batches.push((host.to_string(), Vec::new()));
                batches.len() - 1
            });
            for descriptor in capabilities {
                if root_matches(metric_path, descriptor.metrics_root)
                    && !batches[slot]
                        .1
                        .iter()
                        .any(|d| d.metrics_root == descriptor.metrics_root)
                {
                    batches[slot].1.push(descriptor.clone());
                }
            }
        }
        batches
    }
}

/// Exact segment-boundary match of a host-relative metric path against a
/// catalog root. Plain substring matching would over-match whenever one
/// command's root is a prefix of another's (`temp` vs `temperature`).
fn root_matches(metric_path: &str, root: &str) -> bool {
    metric_path == root
        || metric_path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn failed_batch(host: &str, len: usize) -> Vec<IpmiResponse> {
    (0..len).map(|index| IpmiResponse::failed(host, index)).collect()
}

fn local_hostname() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "localhost".to_string())
}
