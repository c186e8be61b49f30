/// Errors produced by the IPMI command layer.
///
/// Per-request failures (`Communication`, `EmptyResponse`, `Device`) are
/// recovered at the validator/decoder boundary by degrading the affected
/// metrics to the unavailable sentinel; only `Configuration` is fatal to a
/// collection attempt.
///
/// # Examples
///
/// ```rust
/// use bmcmon_ipmi::error::IpmiError;
///
/// let err = IpmiError::Device(0xc9);
/// assert!(err.to_string().contains("0xc9"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum IpmiError {
    /// The transport never obtained a reply (subprocess failure,
    /// unreachable host, timeout).
    #[error("IPMI: communication failed: {0}")]
    Communication(String),

    /// The controller replied with a zero-length payload.
    #[error("IPMI: zero length response")]
    EmptyResponse,

    /// The controller returned a nonzero completion code.
    #[error("IPMI: device completion code 0x{0:02x}")]
    Device(u8),

    /// No valid execution mode, or a required setting is missing or
    /// unusable.
    #[error("IPMI: configuration error: {0}")]
    Configuration(String),
}

/// Convenience `Result` alias for IPMI operations.
pub type Result<T> = std::result::Result<T, IpmiError>;
