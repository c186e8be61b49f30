//! Per-vendor capability catalogs.
//!
//! A catalog lists the raw commands a platform answers, where each
//! command's metrics live in the namespace, and which decoder understands
//! its response. Catalogs are configuration data built once per collector
//! and treated as a read-only snapshot during a collection pass.

use std::fmt;

use crate::formats::{
    FORMAT_CUPS, FORMAT_NODE_MANAGER, FORMAT_PECI, FORMAT_PMBUS, FORMAT_SENSOR,
    FORMAT_TEMPERATURE,
};
use crate::{IpmiRequest, ResponseFormat};

/// Immutable catalog entry binding a raw command to its namespace root and
/// response decoder.
#[derive(Clone)]
pub struct RequestDescriptor {
    pub request: IpmiRequest,
    /// Path segment identifying this command's place in the metric
    /// namespace, directly under the host segment.
    pub metrics_root: &'static str,
    pub format: &'static dyn ResponseFormat,
}

impl RequestDescriptor {
    pub fn new(
        request_data: &[u8],
        metrics_root: &'static str,
        format: &'static dyn ResponseFormat,
    ) -> Self {
        Self {
            request: IpmiRequest::new(request_data),
            metrics_root,
            format,
        }
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("metrics_root", &self.metrics_root)
            .field("request", &self.request)
            .finish()
    }
}

/// Capability catalog for the generic Intel Node Manager platform.
///
/// The raw command bytes are fixed by the platform documentation; they are
/// configuration data, not computed values.
pub fn generic_vendor() -> Vec<RequestDescriptor> {
    vec![
        // Get Node Manager Statistics (C8h), mode 01h: global power
        RequestDescriptor::new(
            &[0x2e, 0xc8, 0x57, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00],
            "power",
            &FORMAT_NODE_MANAGER,
        ),
        // Get Node Manager Statistics (C8h), mode 02h: inlet temperature
        RequestDescriptor::new(
            &[0x2e, 0xc8, 0x57, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00],
            "temperature",
            &FORMAT_NODE_MANAGER,
        ),
        // Get Node Manager Statistics (C8h), mode 04h: volumetric airflow
        RequestDescriptor::new(
            &[0x2e, 0xc8, 0x57, 0x01, 0x00, 0x04, 0x00, 0x00, 0x00],
            "airflow",
            &FORMAT_NODE_MANAGER,
        ),
        // Get CUPS Data (65h), parameter 05h: dynamic load factors
        RequestDescriptor::new(&[0x2e, 0x65, 0x57, 0x01, 0x00, 0x05], "cups", &FORMAT_CUPS),
        // Get CPU and Memory Temperature (4Bh), all sockets and DIMMs
        RequestDescriptor::new(
            &[
                0x2e, 0x4b, 0x57, 0x01, 0x00, 0x03, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00,
            ],
            "temp",
            &FORMAT_TEMPERATURE,
        ),
        // Send Raw PECI (40h): package thermal margin
        RequestDescriptor::new(
            &[0x2e, 0x40, 0x57, 0x01, 0x00, 0x30, 0x05, 0x05, 0xa1, 0x00, 0x00, 0x10, 0x00],
            "margin",
            &FORMAT_PECI,
        ),
        // Send Raw PMBus Command (D9h): voltage regulator readings
        RequestDescriptor::new(
            &[
                0x2e, 0xd9, 0x57, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x8d,
                0x00,
            ],
            "vr",
            &FORMAT_PMBUS,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_vendor_roots_are_unique() {
        let catalog = generic_vendor();
        let mut roots: Vec<&str> = catalog.iter().map(|d| d.metrics_root).collect();
        roots.sort_unstable();
        roots.dedup();
        assert_eq!(roots.len(), catalog.len());
    }

    #[test]
    fn generic_vendor_commands_carry_payloads() {
        for descriptor in generic_vendor() {
            assert!(!descriptor.request.data.is_empty());
            assert!(!descriptor.format.metrics().is_empty());
        }
    }
}
