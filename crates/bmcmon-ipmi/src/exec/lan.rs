use async_trait::async_trait;

use super::{bridge_args, exec_tool, raw_args, DEFAULT_TOOL};
use crate::error::{IpmiError, Result};
use crate::{IpmiExecutor, IpmiRequest, IpmiResponse};

/// Out-of-band execution over the lanplus interface.
///
/// Each target host gets its own lanplus session, so batches against
/// distinct hosts are independent and may run concurrently; no lock is
/// shared between targets. Within one host's batch, requests run
/// sequentially over the single session, and the returned order always
/// matches submission order.
pub struct ToolLan {
    program: String,
    channel: String,
    slave: String,
    user: String,
    password: String,
}

impl ToolLan {
    pub fn new(
        channel: impl Into<String>,
        slave: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            program: DEFAULT_TOOL.to_string(),
            channel: channel.into(),
            slave: slave.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    fn session_args(&self, target: &str) -> Vec<String> {
        let mut args = vec![
            "-I".to_string(),
            "lanplus".to_string(),
            "-H".to_string(),
            target.to_string(),
            "-U".to_string(),
            self.user.clone(),
            "-P".to_string(),
            self.password.clone(),
        ];
        args.extend(bridge_args(&self.channel, &self.slave));
        args
    }
}

#[async_trait]
impl IpmiExecutor for ToolLan {
    fn mode(&self) -> &str {
        "oob"
    }

    async fn batch_exec(
        &self,
        requests: &[IpmiRequest],
        target: &str,
    ) -> Result<Vec<IpmiResponse>> {
        if target.is_empty() {
            return Err(IpmiError::Configuration(
                "out-of-band target host is empty".to_string(),
            ));
        }
        let mut responses = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let mut args = self.session_args(target);
            args.extend(raw_args(request));
            responses.push(exec_tool(&self.program, args, target, index).await);
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_args_carry_interface_host_and_credentials() {
        let executor = ToolLan::new("0x00", "0x00", "admin", "secret");
        assert_eq!(
            executor.session_args("10.0.0.7"),
            vec!["-I", "lanplus", "-H", "10.0.0.7", "-U", "admin", "-P", "secret"]
        );
    }

    #[test]
    fn session_args_append_bridge_addressing() {
        let executor = ToolLan::new("0x06", "0x2c", "admin", "secret");
        let args = executor.session_args("10.0.0.7");
        assert!(args.ends_with(&[
            "-b".to_string(),
            "0x06".to_string(),
            "-t".to_string(),
            "0x2c".to_string()
        ]));
    }

    #[tokio::test]
    async fn empty_target_aborts_the_batch() {
        let executor = ToolLan::new("0x00", "0x00", "admin", "secret");
        let requests = [IpmiRequest::new([0x2e, 0xc8])];
        assert!(matches!(
            executor.batch_exec(&requests, "").await,
            Err(IpmiError::Configuration(_))
        ));
    }
}
