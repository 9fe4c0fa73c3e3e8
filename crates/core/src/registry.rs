// Copyright 2025 FIO Exporter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gauge registry backing the scrape endpoint.
//!
//! A [`MetricRegistry`] owns a Prometheus recorder that is never installed as
//! the process-global `metrics` recorder. It is built once at startup, wrapped
//! in an `Arc` and shared between the playback loop (writer) and the HTTP
//! endpoint (reader) for the lifetime of the process.
//!
//! Every gauge carries the same two labels:
//!
//! - `model` = [`MODEL_LABEL_VALUE`]
//! - `unit` = [`UNIT_LABEL_VALUE`], the "no grouping" deployment marker

use crate::error::{Error, Result};
use metrics::{Gauge, Key, Label, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Label keys attached to every gauge, in order.
pub const LABEL_KEYS: [&str; 2] = ["model", "unit"];

/// Value of the `model` label.
pub const MODEL_LABEL_VALUE: &str = "fioparser";

/// Value of the `unit` label.
pub const UNIT_LABEL_VALUE: &str = "no-juju";

struct Instrument {
    description: String,
    gauge: Gauge,
    value: f64,
}

/// Process-wide store of named gauges.
pub struct MetricRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    instruments: Mutex<HashMap<String, Instrument>>,
}

impl MetricRegistry {
    /// Create an empty registry with its own Prometheus recorder.
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        Self {
            recorder,
            handle,
            instruments: Mutex::new(HashMap::new()),
        }
    }

    /// Set the gauge called `name` to `value`, creating it on first use.
    ///
    /// The description is only used when the gauge is created; later calls
    /// with a different description update the value but keep the original
    /// help text.
    pub fn record(&self, name: &str, description: &str, value: f64) -> Result<()> {
        let mut instruments = self.lock();

        let instrument = match instruments.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                validate_name(name)?;
                let gauge = self.register(name, description);
                entry.insert(Instrument {
                    description: description.to_string(),
                    gauge,
                    value: 0.0,
                })
            }
        };
        instrument.gauge.set(value);
        instrument.value = value;

        debug!(metric = name, description, value, "Setting metric");
        Ok(())
    }

    /// Last value set on `name`, if it has been recorded.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.lock().get(name).map(|i| i.value)
    }

    /// Help text fixed when `name` was first recorded.
    pub fn description(&self, name: &str) -> Option<String> {
        self.lock().get(name).map(|i| i.description.clone())
    }

    /// Number of registered gauges.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no gauge has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Render every gauge in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    fn register(&self, name: &str, description: &str) -> Gauge {
        self.recorder
            .describe_gauge(name.to_string().into(), None, description.to_string().into());

        let key = Key::from_parts(
            name.to_string(),
            vec![
                Label::new(LABEL_KEYS[0], MODEL_LABEL_VALUE),
                Label::new(LABEL_KEYS[1], UNIT_LABEL_VALUE),
            ],
        );
        let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));
        self.recorder.register_gauge(&key, &metadata)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instrument>> {
        // A panic mid-update leaves at worst a stale value behind.
        self.instruments.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("instruments", &self.len())
            .finish()
    }
}

/// Check `name` against the Prometheus metric name grammar
/// `[a-zA-Z_:][a-zA-Z0-9_:]*`.
fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::Registry {
            name: name.to_string(),
            reason: "not a valid Prometheus metric name".to_string(),
        })
    }
}
