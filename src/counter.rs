use crate::alignment_record::Fragment;
use crate::error::MutationErr;
use crate::profile::ProfileCollection;
use crate::walker::{ReadEvent, ReadWalker};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

/// Per-read failures reported in full before switching to debug level
const MAX_REPORTED_FAILURES: u64 = 10;

/// Configuration for a counting run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountConfig {
    /// Reference positions ignored at each end of every read.
    /// Default: 0
    pub excluded_bases: u64,

    /// Minimum total (matches + deletions + substitutions) for a position to be reported.
    /// Default: 1
    pub coverage_threshold: u64,
}

impl Default for CountConfig {
    fn default() -> Self {
        CountConfig {
            excluded_bases: 0,
            coverage_threshold: 1,
        }
    }
}

impl CountConfig {
    /// Validate raw command-line values; negatives are rejected before any scanning.
    pub fn new(excluded_bases: i64, coverage_threshold: i64) -> Result<Self, MutationErr> {
        if excluded_bases < 0 {
            return Err(MutationErr::InvalidConfig(format!(
                "number of bases excluded from read ends must be non-negative, got {}",
                excluded_bases
            )));
        }
        if coverage_threshold < 0 {
            return Err(MutationErr::InvalidConfig(format!(
                "coverage threshold must be non-negative, got {}",
                coverage_threshold
            )));
        }
        Ok(CountConfig {
            excluded_bases: excluded_bases as u64,
            coverage_threshold: coverage_threshold as u64,
        })
    }
}

/// Statistics collected during a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Fragments handed to the counter
    pub fragments: u64,
    /// Fragments that contributed to the profiles
    pub counted: u64,
    /// Skipped fragments, by error kind
    pub skipped: FxHashMap<&'static str, u64>,
    /// Counter increments applied
    pub events: u64,
    /// Deletions, insertions and substitutions among `events`
    pub mutations: u64,
}

impl ScanStats {
    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    pub fn log_summary(&self) {
        info!(
            "Processed {} fragments: {} counted, {} skipped, {} events ({} mutations)",
            self.fragments,
            self.counted,
            self.skipped_total(),
            self.events,
            self.mutations
        );
        let mut kinds: Vec<_> = self.skipped.iter().collect();
        kinds.sort();
        for (kind, count) in kinds {
            info!("  skipped ({}): {}", kind, count);
        }
    }
}

/// Drives the walker over fragments and accumulates the results.
///
/// A fragment is walked into a buffer first and applied only when every mate
/// was walked without error, so a failed read never leaves partial counts.
pub struct MutationCounter {
    walker: ReadWalker,
    config: CountConfig,
    profiles: ProfileCollection,
    stats: ScanStats,
    events: Vec<ReadEvent>,
}

impl MutationCounter {
    pub fn new(config: CountConfig, profiles: ProfileCollection) -> Self {
        Self {
            walker: ReadWalker::new(config.excluded_bases),
            config,
            profiles,
            stats: ScanStats::default(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &CountConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileCollection {
        &self.profiles
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Count one fragment.
    ///
    /// Returns the applied events, or `None` if the fragment was skipped
    /// because of a per-read error. Only non-per-read errors are returned.
    pub fn process(&mut self, fragment: &Fragment) -> Result<Option<&[ReadEvent]>, MutationErr> {
        self.stats.fragments += 1;
        self.events.clear();

        if let Err(e) = self
            .walker
            .walk_fragment(fragment, &self.profiles, &mut self.events)
        {
            if !e.is_per_read() {
                return Err(e);
            }
            self.report_failure(fragment, &e);
            self.events.clear();
            return Ok(None);
        }

        let chromosome = fragment.reference();
        for event in &self.events {
            if let Some(counter) = event.counter() {
                self.profiles
                    .record(chromosome, event.strand, event.position, counter)?;
                self.stats.events += 1;
                if event.is_reported_mutation() {
                    self.stats.mutations += 1;
                }
            }
        }
        self.stats.counted += 1;
        Ok(Some(self.events.as_slice()))
    }

    fn report_failure(&mut self, fragment: &Fragment, e: &MutationErr) {
        let failures = self.stats.skipped_total() + 1;
        if failures <= MAX_REPORTED_FAILURES {
            warn!("Skipping read {}: {}", fragment.name(), e);
            if failures == MAX_REPORTED_FAILURES {
                warn!("Further skipped reads are reported at debug level");
            }
        } else {
            debug!("Skipping read {}: {}", fragment.name(), e);
        }
        *self.stats.skipped.entry(e.kind()).or_insert(0) += 1;
    }

    pub fn finish(self) -> (ProfileCollection, ScanStats) {
        (self.profiles, self.stats)
    }
}
