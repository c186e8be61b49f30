use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single decoded metric value attributed to one host.
///
/// `namespace` is the full hierarchical path of the metric (see
/// [`crate::namespace`]); `source` is the host the value was read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub namespace: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub value: u16,
}

/// One collection pass worth of samples sharing a timestamp.
///
/// The timestamp is assigned once, after every per-host batch has
/// completed, so all samples in a batch carry the same instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricBatch {
    pub timestamp: DateTime<Utc>,
    pub samples: Vec<MetricSample>,
}
