use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{bridge_args, exec_tool, raw_args, DEFAULT_TOOL};
use crate::error::Result;
use crate::{IpmiExecutor, IpmiRequest, IpmiResponse};

/// In-band execution through the local `ipmitool` binary.
///
/// One session to the local controller backs every request, so batches
/// from concurrent callers are serialized behind a lock scoped to that
/// channel. The lock covers nothing else; out-of-band executors to other
/// hosts are unaffected.
pub struct ToolInBand {
    program: String,
    channel: String,
    slave: String,
    session: Mutex<()>,
}

impl ToolInBand {
    pub fn new(channel: impl Into<String>, slave: impl Into<String>) -> Self {
        Self {
            program: DEFAULT_TOOL.to_string(),
            channel: channel.into(),
            slave: slave.into(),
            session: Mutex::new(()),
        }
    }
}

#[async_trait]
impl IpmiExecutor for ToolInBand {
    fn mode(&self) -> &str {
        "inband_tool"
    }

    async fn batch_exec(
        &self,
        requests: &[IpmiRequest],
        target: &str,
    ) -> Result<Vec<IpmiResponse>> {
        let _session = self.session.lock().await;
        let mut responses = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let mut args = bridge_args(&self.channel, &self.slave);
            args.extend(raw_args(request));
            responses.push(exec_tool(&self.program, args, target, index).await);
        }
        Ok(responses)
    }
}
