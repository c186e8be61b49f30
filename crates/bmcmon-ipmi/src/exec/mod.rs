//! Execution strategies for raw IPMI commands.
//!
//! Three [`IpmiExecutor`](crate::IpmiExecutor) variants cover the
//! supported transports: [`ToolInBand`] drives the local controller
//! through the `ipmitool` binary, [`ToolOpen`] does the same through the
//! OpenIPMI kernel driver interface, and [`ToolLan`] reaches remote
//! controllers over lanplus with credentials.
//!
//! All variants share the same result shaping: a successful tool run
//! yields the parsed response bytes prefixed with a zero completion code;
//! a command-level failure reported by the controller yields a one-byte
//! payload carrying the completion code; anything else (spawn failure,
//! unreachable host, unparseable output) yields a response with the
//! communication flag cleared.

mod lan;
mod open;
mod tool;

pub use lan::ToolLan;
pub use open::ToolOpen;
pub use tool::ToolInBand;

use tokio::process::Command;

use crate::{IpmiRequest, IpmiResponse};

/// Default management tool binary.
pub(crate) const DEFAULT_TOOL: &str = "ipmitool";

/// BMC address `0x00`, the default channel and slave.
pub(crate) const DEFAULT_ADDR: &str = "0x00";

/// Renders a raw command as `raw 0xNN 0xNN …` tool arguments.
pub(crate) fn raw_args(request: &IpmiRequest) -> Vec<String> {
    let mut args = Vec::with_capacity(request.data.len() + 1);
    args.push("raw".to_string());
    args.extend(request.data.iter().map(|b| format!("0x{b:02x}")));
    args
}

/// Bridge-addressing arguments, emitted only when the target is not the
/// default BMC address.
pub(crate) fn bridge_args(channel: &str, slave: &str) -> Vec<String> {
    if channel == DEFAULT_ADDR && slave == DEFAULT_ADDR {
        return Vec::new();
    }
    vec![
        "-b".to_string(),
        channel.to_string(),
        "-t".to_string(),
        slave.to_string(),
    ]
}

/// Parses `ipmitool raw` stdout (whitespace-separated hex bytes) into a
/// payload, prefixing the zero completion code the tool strips on success.
pub(crate) fn payload_from_stdout(stdout: &str) -> Option<Vec<u8>> {
    let mut payload = vec![0u8];
    for token in stdout.split_whitespace() {
        payload.push(u8::from_str_radix(token, 16).ok()?);
    }
    Some(payload)
}

/// Extracts the controller completion code from an ipmitool failure line
/// such as `Unable to send RAW command (… rsp=0xc9): …`.
pub(crate) fn completion_code_from_stderr(stderr: &str) -> Option<u8> {
    let start = stderr.find("rsp=0x")? + "rsp=0x".len();
    let hex = stderr.get(start..start + 2)?;
    u8::from_str_radix(hex, 16).ok()
}

/// Runs one tool invocation and shapes the outcome into a response.
pub(crate) async fn exec_tool(
    program: &str,
    args: Vec<String>,
    source: &str,
    index: usize,
) -> IpmiResponse {
    match Command::new(program).args(&args).output().await {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            match payload_from_stdout(&stdout) {
                Some(data) => IpmiResponse {
                    data,
                    valid: true,
                    source: source.to_string(),
                    index,
                },
                None => {
                    tracing::warn!(target_host = source, index, "unparseable tool output");
                    IpmiResponse::failed(source, index)
                }
            }
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            match completion_code_from_stderr(&stderr) {
                // The controller answered; keep its completion code for the
                // validator to surface.
                Some(code) => IpmiResponse {
                    data: vec![code],
                    valid: true,
                    source: source.to_string(),
                    index,
                },
                None => {
                    tracing::warn!(
                        target_host = source,
                        index,
                        stderr = %stderr.trim(),
                        "tool command failed"
                    );
                    IpmiResponse::failed(source, index)
                }
            }
        }
        Err(e) => {
            tracing::warn!(target_host = source, index, error = %e, "failed to run tool");
            IpmiResponse::failed(source, index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_args_render_hex_bytes() {
        let request = IpmiRequest::new([0x2e, 0xc8, 0x00]);
        assert_eq!(raw_args(&request), vec!["raw", "0x2e", "0xc8", "0x00"]);
    }

    #[test]
    fn bridge_args_empty_for_default_address() {
        assert!(bridge_args("0x00", "0x00").is_empty());
        assert_eq!(
            bridge_args("0x06", "0x2c"),
            vec!["-b", "0x06", "-t", "0x2c"]
        );
    }

    #[test]
    fn stdout_payload_is_prefixed_with_completion_code() {
        assert_eq!(
            payload_from_stdout(" 57 01 00 0a 00\n"),
            Some(vec![0, 0x57, 0x01, 0x00, 0x0a, 0x00])
        );
        assert_eq!(payload_from_stdout(""), Some(vec![0]));
        assert_eq!(payload_from_stdout("57 zz"), None);
    }

    #[test]
    fn stderr_completion_code_is_extracted() {
        let stderr = "Unable to send RAW command (channel=0x0 netfn=0x2e lun=0x0 cmd=0xc8 rsp=0xc9): Parameter out of range";
        assert_eq!(completion_code_from_stderr(stderr), Some(0xc9));
        assert_eq!(completion_code_from_stderr("connection timeout"), None);
    }
}
