// Copyright 2025 FIO Exporter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Paced replay of a series of result files.
//!
//! Files are published one after another. Between two files the driver
//! deliberately waits for the runtime the previous file declares, so that a
//! scraper polling at a fixed interval sees the series change at the cadence
//! it was originally collected at. The wait only throttles this loop; the
//! scrape endpoint runs on its own task and keeps answering.
//!
//! ```text
//! Idle ──first file──▶ Streaming ──last file──▶ Done
//!   └──────────── no files ────────────────────▶ Done
//! ```

use crate::discovery;
use crate::error::Result;
use crate::extract;
use crate::registry::MetricRegistry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Decides how the driver waits between two files.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Suspend the playback loop until `delay` has passed since `since`, the
    /// moment the previous file finished publishing.
    async fn wait(&self, since: Instant, delay: Duration);
}

/// Waits on the tokio timer until `since + delay`.
///
/// Time spent parsing the next file is not added on top of the delay. A
/// deadline past what `Instant` can represent waits indefinitely.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

/// Roughly 30 years, as tokio uses for its own far-future deadlines.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[async_trait]
impl Pacer for TokioPacer {
    async fn wait(&self, since: Instant, delay: Duration) {
        let deadline = since
            .checked_add(delay)
            .unwrap_or_else(|| Instant::now() + FAR_FUTURE);
        debug!(delay_secs = delay.as_secs(), "Waiting before next file");
        tokio::time::sleep_until(deadline).await;
    }
}

/// Where the driver is in a playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No file processed yet.
    Idle,
    /// At least one file processed.
    Streaming {
        /// Runtime the last file declared, in seconds.
        next_delay: i64,
    },
    /// Every file processed.
    Done,
}

/// Outcome of a completed playback run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    /// Files published, in order.
    pub files: Vec<PathBuf>,
    /// Samples recorded across all files.
    pub samples_recorded: usize,
}

/// Replays result files into a [`MetricRegistry`].
pub struct Playback<P> {
    registry: Arc<MetricRegistry>,
    pacer: P,
    state: PlaybackState,
}

impl<P: Pacer> Playback<P> {
    /// Create a driver publishing into `registry`.
    pub fn new(registry: Arc<MetricRegistry>, pacer: P) -> Self {
        Self {
            registry,
            pacer,
            state: PlaybackState::Idle,
        }
    }

    /// Pacing policy in use.
    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Discover the files of `series` in `directory` and replay them.
    pub async fn run(&mut self, series: &str, directory: &Path) -> Result<PlaybackSummary> {
        let files = discovery::series_paths(series, directory)?;
        info!(
            series,
            directory = %directory.display(),
            count = files.len(),
            files = ?files,
            "Discovered series files"
        );
        self.play(&files).await
    }

    /// Replay `files` in the given order.
    ///
    /// The first error aborts the remaining files; a file whose runtime
    /// cannot be read leaves no sensible delay for the next one.
    pub async fn play(&mut self, files: &[PathBuf]) -> Result<PlaybackSummary> {
        let mut summary = PlaybackSummary::default();
        let mut published_at = Instant::now();

        for path in files {
            if let PlaybackState::Streaming { next_delay } = self.state {
                if next_delay > 0 {
                    // Mimic a live collection interval.
                    self.pacer
                        .wait(published_at, Duration::from_secs(next_delay.unsigned_abs()))
                        .await;
                }
            }

            let extraction = extract::extract(path)?;
            extraction.publish(&self.registry)?;
            published_at = Instant::now();

            summary.samples_recorded += extraction.samples.len();
            summary.files.push(path.clone());
            self.state = PlaybackState::Streaming {
                next_delay: extraction.runtime,
            };
        }

        self.state = PlaybackState::Done;
        info!(
            files = summary.files.len(),
            samples = summary.samples_recorded,
            "Done"
        );
        Ok(summary)
    }
}
