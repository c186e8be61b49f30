use serde::Deserialize;

use bmcmon_ipmi::error::IpmiError;

/// Execution mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Local controller through the `ipmitool` system interface.
    InbandTool,
    /// Remote controllers over lanplus, using the configured credentials
    /// and a newline-delimited host list.
    Oob,
    /// Local controller through the OpenIPMI kernel driver.
    InbandOpen,
}

/// Collector configuration.
///
/// Every recognized option is an explicit typed field with a default;
/// validation happens once, in
/// [`IpmiCollector::build`](crate::IpmiCollector::build).
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    pub mode: ExecMode,
    #[serde(default = "default_bmc_addr")]
    pub channel: String,
    #[serde(default = "default_bmc_addr")]
    pub slave: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Path to a newline-delimited host list; required for out-of-band
    /// mode, ignored otherwise.
    #[serde(default)]
    pub hosts_file: Option<String>,
    /// Maximum number of per-host batches in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-host batch timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bmc_addr() -> String {
    "0x00".to_string()
}

fn default_concurrency() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

/// Loads a newline-delimited host list, skipping blank lines.
///
/// # Errors
///
/// Returns [`IpmiError::Configuration`] when the file cannot be read.
pub fn load_hosts(path: &str) -> Result<Vec<String>, IpmiError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| IpmiError::Configuration(format!("cannot read hosts file {path}: {e}")))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
