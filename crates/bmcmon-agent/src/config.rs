use serde::Deserialize;

use bmcmon_collector::config::CollectorConfig;

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_collection_interval")]
    pub collection_interval_secs: u64,
    pub collector: CollectorConfig,
}

fn default_collection_interval() -> u64 {
    10
}

impl AgentConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmcmon_collector::config::ExecMode;

    #[test]
    fn agent_config_parses_with_collector_section() {
        let config: AgentConfig = toml::from_str(
            r#"
            collection_interval_secs = 30

            [collector]
            mode = "oob"
            user = "admin"
            password = "secret"
            hosts_file = "config/hosts"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.collection_interval_secs, 30);
        assert_eq!(config.collector.mode, ExecMode::Oob);
    }

    #[test]
    fn interval_defaults_when_omitted() {
        let config: AgentConfig =
            toml::from_str("[collector]\nmode = \"inband_tool\"").expect("config should parse");
        assert_eq!(config.collection_interval_secs, 10);
    }
}
