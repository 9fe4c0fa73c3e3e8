// Copyright 2025 FIO Exporter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Republishes fio benchmark results as Prometheus gauges.
//!
//! The exporter replays a directory of fio JSON result files belonging to one
//! series, publishing each file's bandwidth, IOPS and latency statistics and
//! pausing between files for the runtime the previous file declares.
//!
//! # Quick Start
//!
//! ```no_run
//! use fio_exporter_core::{server, MetricRegistry, Playback, TokioPacer};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> fio_exporter_core::Result<()> {
//! let registry = Arc::new(MetricRegistry::new());
//! let addr = ([0, 0, 0, 0], server::DEFAULT_PORT).into();
//! let (_addr, _server) = server::start_server(addr, Arc::clone(&registry)).await?;
//!
//! let mut playback = Playback::new(registry, TokioPacer);
//! playback.run("4k_randread", Path::new("results")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`discovery`] - Series file lookup
//! - [`result`] - Typed fio result document
//! - [`extract`] - Metric naming and sample derivation
//! - [`registry`] - Gauge registry
//! - [`playback`] - Paced replay driver
//! - [`server`] - HTTP scrape endpoint

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod discovery;
pub mod error;
pub mod extract;
pub mod playback;
pub mod registry;
pub mod result;
pub mod server;

pub use error::{Error, Result};
pub use extract::{process_results, Extraction, MetricSample};
pub use playback::{Pacer, Playback, PlaybackState, PlaybackSummary, TokioPacer};
pub use registry::MetricRegistry;
pub use result::{Direction, FioResult};
