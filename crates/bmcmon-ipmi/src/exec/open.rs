use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{exec_tool, raw_args, DEFAULT_TOOL};
use crate::error::Result;
use crate::{IpmiExecutor, IpmiRequest, IpmiResponse};

/// In-band execution through the OpenIPMI kernel driver interface.
///
/// Uses the tool's `open` interface, which talks to `/dev/ipmiN` instead
/// of the system interface. Like [`super::ToolInBand`], concurrent
/// callers are serialized behind a lock scoped to the single local
/// device.
pub struct ToolOpen {
    program: String,
    session: Mutex<()>,
}

impl ToolOpen {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_TOOL.to_string(),
            session: Mutex::new(()),
        }
    }
}

impl Default for ToolOpen {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IpmiExecutor for ToolOpen {
    fn mode(&self) -> &str {
        "inband_open"
    }

    async fn batch_exec(
        &self,
        requests: &[IpmiRequest],
        target: &str,
    ) -> Result<Vec<IpmiResponse>> {
        let _session = self.session.lock().await;
        let mut responses = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let mut args = vec!["-I".to_string(), "open".to_string()];
            args.extend(raw_args(request));
            responses.push(exec_tool(&self.program, args, target, index).await);
        }
        Ok(responses)
    }
}
