// Copyright 2025 FIO Exporter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed view of an fio `--output-format=json` document.
//!
//! Only the fields the exporter publishes are modelled. Everything else in
//! the document is ignored, so newer fio releases that add fields still
//! decode. Missing required fields fail the decode with a message naming the
//! field.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// One fio run as written to a result file.
#[derive(Debug, Clone, Deserialize)]
pub struct FioResult {
    /// fio release that produced the document.
    #[serde(rename = "fio version", default)]
    pub fio_version: Option<String>,
    /// Unix timestamp of the run.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Human readable timestamp of the run.
    pub time: String,
    /// Options shared by every job.
    #[serde(rename = "global options")]
    pub global_options: GlobalOptions,
    /// Per-job measurements, in document order.
    pub jobs: Vec<JobResult>,
}

impl FioResult {
    /// Declared run duration in seconds, truncated towards zero.
    ///
    /// Returns `None` when the value is not a number or does not fit in an
    /// `i64`.
    pub fn runtime_secs(&self) -> Option<i64> {
        let secs = match &self.global_options.runtime {
            OptionValue::Number(n) => *n,
            OptionValue::Text(s) => s.trim().parse::<f64>().ok()?,
        }
        .trunc();
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        (secs >= i64::MIN as f64 && secs < i64::MAX as f64).then(|| secs as i64)
    }
}

/// The `global options` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalOptions {
    /// Run duration. fio writes every option as a string.
    pub runtime: OptionValue,
    /// All remaining options, kept for logging.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// A global option value, either as fio writes it (a string) or as a bare
/// number from hand-edited files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Numeric value.
    Number(f64),
    /// String value.
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// I/O direction reported per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Read operations.
    Read,
    /// Write operations.
    Write,
}

impl Direction {
    /// All published directions, in emission order.
    pub const ALL: [Direction; 2] = [Direction::Read, Direction::Write];

    /// Lowercase name used in metric names and descriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurements of one job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResult {
    /// Job name from the job file.
    #[serde(default)]
    pub jobname: Option<String>,
    /// Read statistics, absent when the job did not read.
    #[serde(default)]
    pub read: Option<DirectionStats>,
    /// Write statistics, absent when the job did not write.
    #[serde(default)]
    pub write: Option<DirectionStats>,
}

impl JobResult {
    /// Statistics for `direction`, if the document carries them.
    pub fn direction(&self, direction: Direction) -> Option<&DirectionStats> {
        match direction {
            Direction::Read => self.read.as_ref(),
            Direction::Write => self.write.as_ref(),
        }
    }

    /// Present directions, read before write.
    pub fn directions(&self) -> impl Iterator<Item = (Direction, &DirectionStats)> {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.direction(d).map(|stats| (d, stats)))
    }
}

/// Statistics for one direction of one job.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionStats {
    /// Bandwidth in bytes per second.
    #[serde(default)]
    pub bw: Option<f64>,
    /// I/O operations per second.
    #[serde(default)]
    pub iops: Option<f64>,
    /// Total (submission + completion) latency.
    #[serde(default)]
    pub lat_ns: Option<LatencySummary>,
    /// Completion latency breakdown.
    pub clat_ns: CompletionLatency,
}

impl DirectionStats {
    /// Mean total latency in nanoseconds.
    pub fn mean_latency(&self) -> Option<f64> {
        self.lat_ns.as_ref().and_then(|l| l.mean)
    }
}

/// Summary of the `lat_ns` block.
#[derive(Debug, Clone, Deserialize)]
pub struct LatencySummary {
    /// Mean latency in nanoseconds.
    #[serde(default)]
    pub mean: Option<f64>,
}

/// The `clat_ns` block. All values are nanoseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionLatency {
    /// Fastest completion.
    pub min: f64,
    /// Slowest completion.
    pub max: f64,
    /// Mean completion latency.
    pub mean: f64,
    /// Standard deviation of completion latency.
    pub stddev: f64,
    /// Percentile label (e.g. `"99.950000"`) to latency, in document order.
    /// fio omits the map when percentile reporting is disabled.
    #[serde(default, rename = "percentile", deserialize_with = "ordered_percentiles")]
    pub percentiles: Vec<(String, f64)>,
}

fn ordered_percentiles<'de, D>(deserializer: D) -> Result<Vec<(String, f64)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PercentileVisitor;

    impl<'de> Visitor<'de> for PercentileVisitor {
        type Value = Vec<(String, f64)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of percentile labels to latencies")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((label, latency)) = map.next_entry::<String, f64>()? {
                entries.push((label, latency));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(PercentileVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(runtime: serde_json::Value) -> serde_json::Value {
        json!({
            "fio version": "fio-3.16",
            "timestamp": 1573722196,
            "time": "Thu Nov 14 09:03:16 2019",
            "global options": { "runtime": runtime, "rw": "randread" },
            "jobs": [{
                "jobname": "job0",
                "read": {
                    "bw": 10, "iops": 2.5, "lat_ns": { "mean": 100.0 },
                    "clat_ns": {
                        "min": 1, "max": 9, "mean": 5.0, "stddev": 1.5,
                        "percentile": { "5.000000": 2, "10.000000": 3, "1.000000": 1 }
                    }
                }
            }]
        })
    }

    #[test]
    fn test_decode_keeps_percentile_order() {
        let text = r#"{
            "fio version": "fio-3.16",
            "time": "Thu Nov 14 09:03:16 2019",
            "global options": { "runtime": "30", "rw": "randread" },
            "jobs": [{
                "read": {
                    "clat_ns": {
                        "min": 1, "max": 9, "mean": 5.0, "stddev": 1.5,
                        "percentile": { "5.000000": 2, "10.000000": 3, "1.000000": 1 }
                    }
                }
            }]
        }"#;
        let doc: FioResult = serde_json::from_str(text).unwrap();
        let clat = &doc.jobs[0].read.as_ref().unwrap().clat_ns;
        let labels: Vec<&str> = clat.percentiles.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["5.000000", "10.000000", "1.000000"]);
        assert_eq!(doc.global_options.other["rw"], json!("randread"));
        assert_eq!(doc.fio_version.as_deref(), Some("fio-3.16"));
    }

    #[test]
    fn test_runtime_string_and_number() {
        let doc: FioResult = serde_json::from_value(document(json!("30"))).unwrap();
        assert_eq!(doc.runtime_secs(), Some(30));

        let doc: FioResult = serde_json::from_value(document(json!(45.9))).unwrap();
        assert_eq!(doc.runtime_secs(), Some(45));

        let doc: FioResult = serde_json::from_value(document(json!(" 12.7 "))).unwrap();
        assert_eq!(doc.runtime_secs(), Some(12));

        let doc: FioResult = serde_json::from_value(document(json!("forever"))).unwrap();
        assert_eq!(doc.runtime_secs(), None);

        let doc: FioResult = serde_json::from_value(document(json!("1e30"))).unwrap();
        assert_eq!(doc.runtime_secs(), None);

        let doc: FioResult = serde_json::from_value(document(json!("inf"))).unwrap();
        assert_eq!(doc.runtime_secs(), None);
    }

    #[test]
    fn test_missing_runtime_is_rejected() {
        let mut value = document(json!("30"));
        value["global options"].as_object_mut().unwrap().remove("runtime");
        let err = serde_json::from_value::<FioResult>(value).unwrap_err();
        assert!(err.to_string().contains("runtime"));
    }

    #[test]
    fn test_missing_clat_field_is_rejected() {
        let mut value = document(json!("30"));
        value["jobs"][0]["read"]["clat_ns"]
            .as_object_mut()
            .unwrap()
            .remove("stddev");
        let err = serde_json::from_value::<FioResult>(value).unwrap_err();
        assert!(err.to_string().contains("stddev"));
    }

    #[test]
    fn test_absent_direction_and_percentiles() {
        let mut value = document(json!("30"));
        value["jobs"][0]["read"]["clat_ns"]
            .as_object_mut()
            .unwrap()
            .remove("percentile");
        let doc: FioResult = serde_json::from_value(value).unwrap();
        let job = &doc.jobs[0];

        assert!(job.write.is_none());
        assert!(job.read.as_ref().unwrap().clat_ns.percentiles.is_empty());
        let present: Vec<Direction> = job.directions().map(|(d, _)| d).collect();
        assert_eq!(present, vec![Direction::Read]);
    }

    #[test]
    fn test_null_summary_fields_decode_as_none() {
        let mut value = document(json!("30"));
        value["jobs"][0]["read"]["bw"] = serde_json::Value::Null;
        value["jobs"][0]["read"]["lat_ns"] = serde_json::Value::Null;
        let doc: FioResult = serde_json::from_value(value).unwrap();
        let stats = doc.jobs[0].read.as_ref().unwrap();
        assert_eq!(stats.bw, None);
        assert_eq!(stats.mean_latency(), None);
    }
}
