use crate::cancel::CancelToken;
use crate::config::{ValidatedConfig, default_progress_interval};
use crate::hash::{HashError, HashFunction};
use crate::mutator::{self, Chunk};
use crate::report::{DurableWrite, Reporter};
use crate::scorer::Scorer;
use crate::stats::{Counters, RunStats, SearchProgress};
use std::io::{self, Read};
use thiserror::Error;

/// Errors that end a search. None of them are retried.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The input source could not supply a full chunk.
    #[error("read: {0}")]
    ShortRead(#[source] io::Error),
    /// The hash backend reported one of its recognised failures.
    #[error("Error: {0}")]
    Hash(#[from] HashError),
    /// A new-best report could not be written out.
    #[error("failed to write report: {0}")]
    Report(#[source] io::Error),
}

/// Lowest distance seen so far and what produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestScore {
    pub distance: u32,
    pub candidate: String,
    pub digest: Vec<u8>,
}

impl BestScore {
    /// Starts at the largest possible distance, so the first report requires at
    /// least one matching bit.
    pub fn worst(output_bits: usize) -> Self {
        Self {
            distance: u32::try_from(output_bits).unwrap_or(u32::MAX),
            candidate: String::new(),
            digest: Vec::new(),
        }
    }
}

/// Why [`SearchSession::run`] returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    BudgetExhausted,
}

/// State of one search run: the scorer, the running best, and the counters.
pub struct SearchSession<H: HashFunction> {
    scorer: Scorer<H>,
    chunk_size: usize,
    max_hashes: Option<u64>,
    progress_interval: u64,
    best: BestScore,
    counters: Counters,
    progress: SearchProgress,
}

fn stop_reason(
    counters: &Counters,
    max_hashes: Option<u64>,
    cancel: &CancelToken,
) -> Option<StopReason> {
    if cancel.is_cancelled() {
        return Some(StopReason::Cancelled);
    }
    match max_hashes {
        Some(max) if counters.hashes >= max => Some(StopReason::BudgetExhausted),
        _ => None,
    }
}

impl<H: HashFunction> SearchSession<H> {
    pub fn new(scorer: Scorer<H>, chunk_size: usize) -> Self {
        let best = BestScore::worst(scorer.output_bits());
        let progress = SearchProgress::new(best.distance);
        Self {
            scorer,
            chunk_size,
            max_hashes: None,
            progress_interval: default_progress_interval(),
            best,
            counters: Counters::start(),
            progress,
        }
    }

    pub fn from_config(config: &ValidatedConfig, hasher: H) -> Self {
        let scorer = Scorer::new(hasher, config.target.clone(), config.output_bits);
        Self::new(scorer, config.chunk_size)
            .with_max_hashes(config.max_hashes)
            .with_progress_interval(config.progress_interval)
    }

    pub fn with_max_hashes(mut self, max_hashes: Option<u64>) -> Self {
        self.max_hashes = max_hashes;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn best(&self) -> &BestScore {
        &self.best
    }

    pub fn hashes(&self) -> u64 {
        self.counters.hashes
    }

    /// Handle for reading this session's counters from another thread.
    pub fn progress(&self) -> SearchProgress {
        self.progress.clone()
    }

    /// Searches chunk after chunk of `source` until `cancel` fires or the hash
    /// budget runs out.
    ///
    /// Cancellation is checked before every scoring step and before every read,
    /// so the returned hash count is exactly the number of completed scoring
    /// calls. The source is dropped before the statistics are captured.
    pub fn run<R: Read, W: DurableWrite>(
        &mut self,
        mut source: R,
        reporter: &mut Reporter<W>,
        cancel: &CancelToken,
    ) -> Result<(RunStats, StopReason), SearchError> {
        tracing::info!(
            "Searching with {} ({}-bit digest, {}-byte chunks)",
            self.scorer.hasher_name(),
            self.scorer.output_bits(),
            self.chunk_size
        );
        self.counters = Counters::start();
        self.progress.begin(&self.counters, self.best.distance);

        let mut chunk = Chunk::zeroed(self.chunk_size);
        let reason = 'search: loop {
            if let Some(reason) = stop_reason(&self.counters, self.max_hashes, cancel) {
                break 'search reason;
            }
            chunk.fill_from(&mut source).map_err(SearchError::ShortRead)?;

            let mut pass = mutator::mutate_and_score(chunk, &mut self.scorer);
            loop {
                if let Some(reason) = stop_reason(&self.counters, self.max_hashes, cancel) {
                    // the chunk is discarded anyway, no need to finish the pass
                    break 'search reason;
                }
                let Some(step) = pass.next_scored() else {
                    break;
                };
                let step = step?;
                self.counters.record_hash();

                if step.distance < self.best.distance {
                    self.best.distance = step.distance;
                    self.best.candidate = step.candidate_text().into_owned();
                    self.best.digest.clear();
                    self.best.digest.extend_from_slice(step.digest);
                    tracing::debug!(
                        "New best distance {} at position {} after {} hashes",
                        step.distance,
                        step.position,
                        self.counters.hashes
                    );
                    reporter
                        .new_best(&self.best.candidate, self.best.distance, &self.best.digest)
                        .map_err(SearchError::Report)?;
                }
                self.progress.publish(&self.counters, self.best.distance);

                if self.progress_interval > 0
                    && self.counters.hashes % self.progress_interval == 0
                {
                    let elapsed = self.counters.elapsed().as_secs_f64();
                    tracing::info!(
                        "{} hashes, best distance {}, {:.2} hashes/s",
                        self.counters.hashes,
                        self.best.distance,
                        self.counters.hashes as f64 / elapsed
                    );
                }
            }
            chunk = pass.finish();
        };
        drop(source);

        let stats = RunStats::capture(&self.counters, self.best.distance);
        tracing::info!(
            "Search stopped ({:?}) after {} hashes, best distance {}",
            reason,
            stats.hashes,
            stats.best_distance
        );
        Ok((stats, reason))
    }
}
