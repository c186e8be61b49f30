//! Response validation and per-command binary format decoders.
//!
//! Each decoder pairs a fixed metric-name set with the byte layout of one
//! IPMI command response. The layouts are vendor protocol knowledge: an
//! off-by-one in an offset silently corrupts a metric instead of failing
//! loudly, so every offset is declared in a constant table that can be
//! checked against the command documentation byte for byte.
//!
//! All multi-byte fields are 16-bit little-endian. All reads are
//! bounds-checked; a field beyond the end of the payload decodes to
//! [`VALUE_UNAVAILABLE`], as does every metric of a response that fails
//! [`validate`].

use std::collections::HashMap;

use crate::error::{IpmiError, Result};
use crate::{IpmiResponse, ResponseFormat, VALUE_UNAVAILABLE};

/// Verifies a response before any payload byte is interpreted.
///
/// Passes only when communication succeeded, the payload is non-empty, and
/// the completion code in byte 0 is zero. Decoders never read payload
/// offsets of a response that fails this check.
///
/// # Errors
///
/// [`IpmiError::Communication`] when the transport never obtained a reply,
/// [`IpmiError::EmptyResponse`] for a zero-length payload, and
/// [`IpmiError::Device`] carrying the nonzero completion code.
pub fn validate(response: &IpmiResponse) -> Result<()> {
    if !response.valid {
        return Err(IpmiError::Communication(
            "no response from controller".to_string(),
        ));
    }
    match response.data.first() {
        None => Err(IpmiError::EmptyResponse),
        Some(0) => Ok(()),
        Some(&code) => Err(IpmiError::Device(code)),
    }
}

fn read_u8(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset).map(|&b| u16::from(b))
}

fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    let lo = *data.get(offset)?;
    let hi = *data.get(offset + 1)?;
    Some(u16::from(lo) | u16::from(hi) << 8)
}

/// Decodes every `(name, offset)` pair as a 16-bit little-endian field.
fn parse_u16_fields(fields: &[(&str, usize)], response: &IpmiResponse) -> HashMap<String, u16> {
    let usable = validate(response).is_ok();
    fields
        .iter()
        .map(|&(name, offset)| {
            let value = if usable {
                read_u16_le(&response.data, offset)
            } else {
                None
            };
            (name.to_string(), value.unwrap_or(VALUE_UNAVAILABLE))
        })
        .collect()
}

/// Get CUPS Data (65h): bytes 5:6 CPU, 7:8 memory, 9:10 IO dynamic load
/// factors.
const CUPS_FIELDS: [(&str, usize); 3] = [
    ("cpu_cstate", 4),
    ("memory_bandwidth", 6),
    ("io_bandwidth", 8),
];

/// Decoder for Get CUPS Data (65h): CPU utilization and memory/IO
/// bandwidth load factors.
pub struct CupsFormat;

impl ResponseFormat for CupsFormat {
    fn metrics(&self) -> Vec<String> {
        CUPS_FIELDS
            .iter()
            .map(|&(name, _)| name.to_string())
            .collect()
    }

    fn parse(&self, response: &IpmiResponse) -> HashMap<String, u16> {
        parse_u16_fields(&CUPS_FIELDS, response)
    }
}

/// Get Node Manager Statistics (C8h): bytes 5:6 current, 7:8 min, 9:10
/// max, 11:12 average. The current value is the command's primary metric
/// and carries no sub-label.
const NODE_MANAGER_FIELDS: [(&str, usize); 4] = [("", 4), ("min", 6), ("max", 8), ("avg", 10)];

/// Decoder for Get Node Manager Statistics (C8h): current/min/max/average
/// of the monitored quantity.
pub struct NodeManagerFormat;

impl ResponseFormat for NodeManagerFormat {
    fn metrics(&self) -> Vec<String> {
        NODE_MANAGER_FIELDS
            .iter()
            .map(|&(name, _)| name.to_string())
            .collect()
    }

    fn parse(&self, response: &IpmiResponse) -> HashMap<String, u16> {
        parse_u16_fields(&NODE_MANAGER_FIELDS, response)
    }
}

/// Get CPU and Memory Temperature (4Bh): bytes 5:8 are one byte per
/// socket, bytes 9.. one byte per DIMM slot.
const CPU_TEMP_OFFSET: usize = 4;
const DIMM_TEMP_OFFSET: usize = 8;
const CPU_SLOTS: usize = 4;
const DIMM_SLOTS: usize = 64;

/// Decoder for Get CPU and Memory Temperature (4Bh): per-socket and
/// per-DIMM temperatures as single bytes.
///
/// Controllers report only the DIMM slots they have; the trailing slots of
/// a shorter payload decode to [`VALUE_UNAVAILABLE`] so the declared
/// metric set stays fixed at 4 sockets + 64 DIMMs.
pub struct TemperatureFormat;

impl ResponseFormat for TemperatureFormat {
    fn metrics(&self) -> Vec<String> {
        let mut names: Vec<String> = (0..CPU_SLOTS).map(|i| format!("cpu/cpu{i}")).collect();
        names.extend((0..DIMM_SLOTS).map(|i| format!("memory/dimm{i}")));
        names
    }

    fn parse(&self, response: &IpmiResponse) -> HashMap<String, u16> {
        let usable = validate(response).is_ok();
        let mut values = HashMap::with_capacity(CPU_SLOTS + DIMM_SLOTS);
        for i in 0..CPU_SLOTS {
            let value = if usable {
                read_u8(&response.data, CPU_TEMP_OFFSET + i)
            } else {
                None
            };
            values.insert(format!("cpu/cpu{i}"), value.unwrap_or(VALUE_UNAVAILABLE));
        }
        for i in 0..DIMM_SLOTS {
            let value = if usable {
                read_u8(&response.data, DIMM_TEMP_OFFSET + i)
            } else {
                None
            };
            values.insert(format!("memory/dimm{i}"), value.unwrap_or(VALUE_UNAVAILABLE));
        }
        values
    }
}

/// Send Raw PECI (40h): byte 7 is the current margin offset, bytes 8:9 the
/// TJmax threshold.
const PECI_MARGIN_OFFSET: usize = 6;
const PECI_TJMAX_OFFSET: usize = 7;

/// Decoder for Send Raw PECI (40h): thermal margin data. The primary
/// metric is TJmax; `margin_offset` is the current reduction from it.
pub struct PeciFormat;

impl ResponseFormat for PeciFormat {
    fn metrics(&self) -> Vec<String> {
        vec![String::new(), "margin_offset".to_string()]
    }

    fn parse(&self, response: &IpmiResponse) -> HashMap<String, u16> {
        let usable = validate(response).is_ok();
        let margin = if usable {
            read_u8(&response.data, PECI_MARGIN_OFFSET)
        } else {
            None
        };
        let tjmax = if usable {
            read_u16_le(&response.data, PECI_TJMAX_OFFSET)
        } else {
            None
        };
        let mut values = HashMap::with_capacity(2);
        values.insert(String::new(), tjmax.unwrap_or(VALUE_UNAVAILABLE));
        values.insert(
            "margin_offset".to_string(),
            margin.unwrap_or(VALUE_UNAVAILABLE),
        );
        values
    }
}

/// Send Raw PMBus Command (D9h): six 16-bit voltage-regulator readings
/// starting at byte 5.
const PMBUS_FIELDS: [(&str, usize); 6] = [
    ("VR0", 4),
    ("VR1", 6),
    ("VR2", 8),
    ("VR3", 10),
    ("VR4", 12),
    ("VR5", 14),
];

/// Decoder for Send Raw PMBus Command (D9h): voltage-regulator readings
/// reported by the PSU.
pub struct PmbusFormat;

impl ResponseFormat for PmbusFormat {
    fn metrics(&self) -> Vec<String> {
        PMBUS_FIELDS
            .iter()
            .map(|&(name, _)| name.to_string())
            .collect()
    }

    fn parse(&self, response: &IpmiResponse) -> HashMap<String, u16> {
        parse_u16_fields(&PMBUS_FIELDS, response)
    }
}

/// Get Sensor Reading (2Dh): byte 1 is the raw reading.
const SENSOR_READING_OFFSET: usize = 1;

/// Decoder for Get Sensor Reading (2Dh): a single raw sensor byte with no
/// sub-label.
pub struct SensorFormat;

impl ResponseFormat for SensorFormat {
    fn metrics(&self) -> Vec<String> {
        vec![String::new()]
    }

    fn parse(&self, response: &IpmiResponse) -> HashMap<String, u16> {
        let value = if validate(response).is_ok() {
            read_u8(&response.data, SENSOR_READING_OFFSET)
        } else {
            None
        };
        let mut values = HashMap::with_capacity(1);
        values.insert(String::new(), value.unwrap_or(VALUE_UNAVAILABLE));
        values
    }
}

/// Shared decoder instances, one per command type.
pub static FORMAT_CUPS: CupsFormat = CupsFormat;
pub static FORMAT_NODE_MANAGER: NodeManagerFormat = NodeManagerFormat;
pub static FORMAT_TEMPERATURE: TemperatureFormat = TemperatureFormat;
pub static FORMAT_PECI: PeciFormat = PeciFormat;
pub static FORMAT_PMBUS: PmbusFormat = PmbusFormat;
pub static FORMAT_SENSOR: SensorFormat = SensorFormat;

/// Every shared decoder, for contract tests that quantify over all
/// formats.
pub fn all_formats() -> Vec<&'static dyn ResponseFormat> {
    vec![
        &FORMAT_CUPS,
        &FORMAT_NODE_MANAGER,
        &FORMAT_TEMPERATURE,
        &FORMAT_PECI,
        &FORMAT_PMBUS,
        &FORMAT_SENSOR,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_response(data: Vec<u8>) -> IpmiResponse {
        IpmiResponse {
            data,
            valid: true,
            source: "node1".to_string(),
            index: 0,
        }
    }

    #[test]
    fn validate_accepts_zero_completion_code() {
        assert!(validate(&ok_response(vec![0, 1, 2])).is_ok());
    }

    #[test]
    fn validate_rejects_failed_communication() {
        let response = IpmiResponse::failed("node1", 0);
        assert!(matches!(
            validate(&response),
            Err(IpmiError::Communication(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_payload() {
        assert!(matches!(
            validate(&ok_response(vec![])),
            Err(IpmiError::EmptyResponse)
        ));
    }

    #[test]
    fn validate_preserves_device_completion_code() {
        assert!(matches!(
            validate(&ok_response(vec![5, 1, 2])),
            Err(IpmiError::Device(5))
        ));
    }

    #[test]
    fn every_format_returns_its_full_metric_set_for_any_input() {
        let inputs = [
            ok_response(vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
            ok_response(vec![0]),
            ok_response(vec![]),
            ok_response(vec![0xc9]),
            IpmiResponse::failed("node1", 0),
        ];
        for format in all_formats() {
            let declared = format.metrics();
            for response in &inputs {
                let parsed = format.parse(response);
                assert_eq!(parsed.len(), declared.len());
                for name in &declared {
                    assert!(parsed.contains_key(name), "missing metric {name:?}");
                }
            }
        }
    }

    #[test]
    fn every_format_yields_only_the_sentinel_for_failed_responses() {
        let response = IpmiResponse::failed("node1", 3);
        for format in all_formats() {
            for (name, value) in format.parse(&response) {
                assert_eq!(value, VALUE_UNAVAILABLE, "metric {name:?}");
            }
        }
    }

    #[test]
    fn cups_decodes_little_endian_load_factors() {
        let response = ok_response(vec![0, 0, 0, 0, 0x34, 0x12, 0x01, 0x00, 0xff, 0x00]);
        let values = FORMAT_CUPS.parse(&response);
        assert_eq!(values["cpu_cstate"], 4660);
        assert_eq!(values["memory_bandwidth"], 1);
        assert_eq!(values["io_bandwidth"], 255);
    }

    #[test]
    fn node_manager_decodes_statistics_fields() {
        let response = ok_response(vec![0, 0, 0, 0, 10, 0, 20, 0, 30, 0, 0x40, 0x01]);
        let values = FORMAT_NODE_MANAGER.parse(&response);
        assert_eq!(values[""], 10);
        assert_eq!(values["min"], 20);
        assert_eq!(values["max"], 30);
        assert_eq!(values["avg"], 0x140);
    }

    #[test]
    fn temperature_decodes_sockets_then_dimms() {
        let response = ok_response(vec![0, 0, 0, 0, 10, 20, 30, 40, 5, 6, 7]);
        let values = FORMAT_TEMPERATURE.parse(&response);
        assert_eq!(values["cpu/cpu0"], 10);
        assert_eq!(values["cpu/cpu1"], 20);
        assert_eq!(values["cpu/cpu2"], 30);
        assert_eq!(values["cpu/cpu3"], 40);
        assert_eq!(values["memory/dimm0"], 5);
        assert_eq!(values["memory/dimm1"], 6);
        assert_eq!(values["memory/dimm2"], 7);
    }

    #[test]
    fn temperature_marks_absent_dimm_slots_unavailable() {
        let response = ok_response(vec![0, 0, 0, 0, 10, 20, 30, 40, 5, 6, 7]);
        let values = FORMAT_TEMPERATURE.parse(&response);
        assert_eq!(values["memory/dimm3"], VALUE_UNAVAILABLE);
        assert_eq!(values["memory/dimm63"], VALUE_UNAVAILABLE);
        assert_eq!(values.len(), FORMAT_TEMPERATURE.metrics().len());
    }

    #[test]
    fn peci_decodes_margin_and_tjmax() {
        let response = ok_response(vec![0, 0, 0, 0, 0, 0, 9, 0x5f, 0x00]);
        let values = FORMAT_PECI.parse(&response);
        assert_eq!(values["margin_offset"], 9);
        assert_eq!(values[""], 0x5f);
    }

    #[test]
    fn pmbus_decodes_all_six_regulators() {
        let response = ok_response(vec![
            0, 0, 0, 0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 0x10, 0x02,
        ]);
        let values = FORMAT_PMBUS.parse(&response);
        assert_eq!(values["VR0"], 1);
        assert_eq!(values["VR1"], 2);
        assert_eq!(values["VR2"], 3);
        assert_eq!(values["VR3"], 4);
        assert_eq!(values["VR4"], 5);
        assert_eq!(values["VR5"], 0x210);
    }

    #[test]
    fn sensor_decodes_raw_reading_byte() {
        let response = ok_response(vec![0, 42]);
        assert_eq!(FORMAT_SENSOR.parse(&response)[""], 42);
    }

    #[test]
    fn sensor_marks_short_payload_unavailable() {
        let response = ok_response(vec![0]);
        assert_eq!(FORMAT_SENSOR.parse(&response)[""], VALUE_UNAVAILABLE);
    }

    #[test]
    fn device_error_payload_decodes_to_sentinels() {
        // Completion code 0xc9: the payload bytes past it are not read.
        let response = ok_response(vec![0xc9, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        for (name, value) in FORMAT_CUPS.parse(&response) {
            assert_eq!(value, VALUE_UNAVAILABLE, "metric {name:?}");
        }
    }
}
