//! IPMI command/response abstraction and binary response decoding.
//!
//! A [`RequestDescriptor`] catalog entry binds a raw command payload to a
//! [`ResponseFormat`] decoder and a metrics-namespace root. An
//! [`IpmiExecutor`] runs batches of raw commands against a target
//! controller (local or remote) and returns one [`IpmiResponse`] per
//! request, in submission order: batch position is the sole correlation
//! key between a request and its response, so executors must never drop,
//! reorder, or merge responses.

pub mod catalog;
pub mod error;
pub mod exec;
pub mod formats;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::catalog::RequestDescriptor;
use crate::error::Result;

/// Reserved marker meaning a metric's true value could not be obtained.
///
/// Downstream consumers must treat it as "value unavailable", never as a
/// legitimate reading.
pub const VALUE_UNAVAILABLE: u16 = 0xFFFF;

/// Raw IPMI command payload: network function, command, and data bytes.
///
/// The bytes are fixed per-platform configuration data; they carry no
/// decoding information of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpmiRequest {
    pub data: Vec<u8>,
}

impl IpmiRequest {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

/// One response obtained for a request in a batch.
#[derive(Debug, Clone)]
pub struct IpmiResponse {
    /// Response payload; byte 0 is the controller's completion code.
    pub data: Vec<u8>,
    /// Communication-success flag: `false` when the transport never
    /// obtained a reply at all.
    pub valid: bool,
    /// Host the response came from.
    pub source: String,
    /// Position of the originating request in its batch.
    pub index: usize,
}

impl IpmiResponse {
    /// A response for a request whose transport exchange failed.
    pub fn failed(source: impl Into<String>, index: usize) -> Self {
        Self {
            data: Vec::new(),
            valid: false,
            source: source.into(),
            index,
        }
    }
}

/// A stateless response decoder tied to one IPMI command.
///
/// Decoders are constructed once (see the `FORMAT_*` statics in
/// [`formats`]) and shared by every request of that command type.
pub trait ResponseFormat: Send + Sync {
    /// The fixed, ordered set of metric names this command produces.
    ///
    /// The empty string is the reserved name for a command's single
    /// primary metric with no sub-label; callers append it directly under
    /// the command's namespace root.
    fn metrics(&self) -> Vec<String>;

    /// Decodes a response into a value for every declared metric name.
    ///
    /// Every name from [`ResponseFormat::metrics`] appears in the result
    /// exactly once. A response that fails validation, or a field beyond
    /// the end of the payload, yields [`VALUE_UNAVAILABLE`].
    fn parse(&self, response: &IpmiResponse) -> HashMap<String, u16>;
}

/// An execution strategy for raw IPMI commands.
#[async_trait]
pub trait IpmiExecutor: Send + Sync {
    /// Short mode name for logging (e.g. `"inband_tool"`, `"oob"`).
    fn mode(&self) -> &str;

    /// Executes a batch of raw commands against one target.
    ///
    /// The returned vector has the same length and order as `requests`;
    /// `responses[i]` answers `requests[i]`. A communication failure for
    /// an individual request produces a response with `valid == false`
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Only conditions that make the whole batch unattemptable (e.g. an
    /// unusable target address) abort with an error; the caller treats
    /// those as a full-batch communication failure for this target only.
    async fn batch_exec(&self, requests: &[IpmiRequest], target: &str)
        -> Result<Vec<IpmiResponse>>;

    /// Maps each host to the catalog of commands its platform answers.
    ///
    /// The catalog is pre-populated configuration data; the default maps
    /// every host to the generic vendor table.
    fn platform_capabilities(&self, hosts: &[String]) -> HashMap<String, Vec<RequestDescriptor>> {
        hosts
            .iter()
            .map(|host| (host.clone(), catalog::generic_vendor()))
            .collect()
    }
}
