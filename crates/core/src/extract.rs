// Copyright 2025 FIO Exporter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Turns one fio result document into named gauge samples.
//!
//! # Naming
//!
//! Every name is `fio_<direction>_<statistic>`:
//!
//! | statistic        | source                      | unit |
//! |------------------|-----------------------------|------|
//! | `bandwidth`      | `bw`                        | B/s  |
//! | `iops`           | `iops`                      |      |
//! | `latency`        | `lat_ns.mean`               | ns   |
//! | `clat_min`, `clat_max`, `clat_mean`, `clat_stddev` | `clat_ns` | ns |
//! | `clat_<label>`   | `clat_ns.percentile[label]`, `.` replaced by `_` | ns |
//!
//! The three summary samples are only emitted when `bw`, `iops` and the mean
//! total latency are all non-zero. The completion latency samples are always
//! emitted for a direction that is present in the document.

use crate::error::{Error, Result};
use crate::registry::MetricRegistry;
use crate::result::{Direction, DirectionStats, FioResult};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Prefix shared by every published metric.
pub const TOOL_PREFIX: &str = "fio";

/// The kind of statistic a sample carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic<'a> {
    /// Bandwidth in bytes per second.
    Bandwidth,
    /// Operations per second.
    Iops,
    /// Mean total latency.
    Latency,
    /// Minimum completion latency.
    ClatMin,
    /// Maximum completion latency.
    ClatMax,
    /// Mean completion latency.
    ClatMean,
    /// Standard deviation of completion latency.
    ClatStddev,
    /// Completion latency at the given percentile label.
    ClatPercentile(&'a str),
}

impl Statistic<'_> {
    fn name_suffix(&self) -> Cow<'static, str> {
        match self {
            Self::Bandwidth => Cow::Borrowed("bandwidth"),
            Self::Iops => Cow::Borrowed("iops"),
            Self::Latency => Cow::Borrowed("latency"),
            Self::ClatMin => Cow::Borrowed("clat_min"),
            Self::ClatMax => Cow::Borrowed("clat_max"),
            Self::ClatMean => Cow::Borrowed("clat_mean"),
            Self::ClatStddev => Cow::Borrowed("clat_stddev"),
            Self::ClatPercentile(label) => {
                Cow::Owned(format!("clat_{}", label.replace('.', "_")))
            }
        }
    }
}

/// Build the metric name for `statistic` in `direction`.
pub fn metric_name(direction: Direction, statistic: Statistic<'_>) -> String {
    format!("{TOOL_PREFIX}_{direction}_{}", statistic.name_suffix())
}

/// Build the help text for `statistic` in `direction`.
pub fn metric_description(direction: Direction, statistic: Statistic<'_>) -> String {
    match statistic {
        Statistic::Bandwidth => format!("FIO {direction} bandwidth (B/s)"),
        Statistic::Iops => format!("FIO {direction} IOPS"),
        Statistic::Latency => format!("FIO {direction} latency (ns)"),
        Statistic::ClatMin => format!("FIO {direction} clat min (ns)"),
        Statistic::ClatMax => format!("FIO {direction} clat max (ns)"),
        Statistic::ClatMean => format!("FIO {direction} clat mean (ns)"),
        Statistic::ClatStddev => format!("FIO {direction} clat stddev (ns)"),
        Statistic::ClatPercentile(label) => format!("FIO {direction} clat {label} (ns)"),
    }
}

/// One gauge observation derived from a result document.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Metric name.
    pub name: String,
    /// Help text.
    pub description: String,
    /// Observed value.
    pub value: f64,
}

impl MetricSample {
    fn new(direction: Direction, statistic: Statistic<'_>, value: f64) -> Self {
        Self {
            name: metric_name(direction, statistic),
            description: metric_description(direction, statistic),
            value,
        }
    }
}

impl fmt::Display for MetricSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.description, self.value)
    }
}

/// Samples and declared runtime of one result file.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Run duration in seconds.
    pub runtime: i64,
    /// Samples in emission order.
    pub samples: Vec<MetricSample>,
}

impl Extraction {
    /// Record every sample into `registry`, in emission order.
    pub fn publish(&self, registry: &MetricRegistry) -> Result<()> {
        for sample in &self.samples {
            registry.record(&sample.name, &sample.description, sample.value)?;
        }
        Ok(())
    }
}

/// Derive every sample from a decoded document, in emission order.
pub fn document_samples(result: &FioResult) -> Vec<MetricSample> {
    let mut samples = Vec::new();
    for job in &result.jobs {
        for (direction, stats) in job.directions() {
            direction_samples(direction, stats, &mut samples);
        }
    }
    samples
}

fn direction_samples(direction: Direction, stats: &DirectionStats, out: &mut Vec<MetricSample>) {
    let nonzero = |v: Option<f64>| v.filter(|v| *v != 0.0);

    // lat_ns is slat + clat, the latency the submitting application sees.
    if let (Some(bw), Some(iops), Some(latency)) = (
        nonzero(stats.bw),
        nonzero(stats.iops),
        nonzero(stats.mean_latency()),
    ) {
        out.push(MetricSample::new(direction, Statistic::Bandwidth, bw));
        out.push(MetricSample::new(direction, Statistic::Iops, iops));
        out.push(MetricSample::new(direction, Statistic::Latency, latency));
    }

    let clat = &stats.clat_ns;
    out.push(MetricSample::new(direction, Statistic::ClatMin, clat.min));
    out.push(MetricSample::new(direction, Statistic::ClatMax, clat.max));
    out.push(MetricSample::new(direction, Statistic::ClatMean, clat.mean));
    out.push(MetricSample::new(direction, Statistic::ClatStddev, clat.stddev));

    for (label, latency) in &clat.percentiles {
        out.push(MetricSample::new(
            direction,
            Statistic::ClatPercentile(label),
            *latency,
        ));
    }
}

/// Read and decode the result file at `path`.
pub fn load(path: &Path) -> Result<FioResult> {
    let bytes = std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the result file at `path` into samples and its declared runtime.
pub fn extract(path: &Path) -> Result<Extraction> {
    let result = load(path)?;

    info!(file = %path.display(), "Processing file");
    info!(
        time = %result.time,
        started = ?result.timestamp.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        fio_version = result.fio_version.as_deref().unwrap_or("unknown"),
        runtime = %result.global_options.runtime,
        global_options = ?result.global_options.other,
        "Result metadata"
    );

    let runtime = result.runtime_secs().ok_or_else(|| Error::InvalidRuntime {
        path: path.to_path_buf(),
        value: result.global_options.runtime.to_string(),
    })?;

    Ok(Extraction {
        runtime,
        samples: document_samples(&result),
    })
}

/// Parse the result file at `path`, publish every sample to `registry` and
/// return the declared runtime in seconds.
pub fn process_results(path: &Path, registry: &MetricRegistry) -> Result<i64> {
    let extraction = extract(path)?;
    extraction.publish(registry)?;
    debug!(
        file = %path.display(),
        samples = extraction.samples.len(),
        "Published samples"
    );
    Ok(extraction.runtime)
}
