use crate::alignment_record::{AlignedRead, Fragment, Strand};
use crate::cigar::AlignmentOperator;
use crate::profile::ProfileCollection;
use log::{debug, info, warn};
use rust_htslib::bam::{self, record::Aux, Read, Record};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::io;

/// Counts of records dropped before they reach the walker
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputStats {
    pub records: u64,
    pub unmapped: u64,
    pub secondary: u64,
    pub supplementary: u64,
    /// Paired records whose mate never showed up
    pub orphans: u64,
}

impl InputStats {
    pub fn log_summary(&self) {
        info!(
            "Read {} records ({} unmapped, {} secondary, {} supplementary skipped; {} orphan mates)",
            self.records, self.unmapped, self.secondary, self.supplementary, self.orphans
        );
    }
}

fn open_reader(path: &str, threads: usize) -> io::Result<bam::Reader> {
    let mut reader = bam::Reader::from_path(path)
        .map_err(|e| io::Error::other(format!("Failed to open alignment file '{path}': {e}")))?;
    if threads > 1 {
        reader
            .set_threads(threads)
            .map_err(|e| io::Error::other(format!("Failed to set reader threads: {e}")))?;
    }
    Ok(reader)
}

fn target_names(header: &bam::HeaderView) -> Vec<String> {
    (0..header.target_count())
        .map(|tid| String::from_utf8_lossy(header.tid2name(tid)).to_string())
        .collect()
}

/// Register every reference sequence listed in the header of `path`.
pub fn register_from_header(path: &str, profiles: &mut ProfileCollection) -> io::Result<()> {
    let reader = open_reader(path, 1)?;
    let header = reader.header();
    for tid in 0..header.target_count() {
        let name = String::from_utf8_lossy(header.tid2name(tid)).to_string();
        match header.target_len(tid) {
            Some(length) if length > 0 => profiles.register(&name, length)?,
            _ => warn!("Reference {} has no length in the header, skipping", name),
        }
    }
    info!("Registered {} references from the header", profiles.len());
    Ok(())
}

/// Discover references by scanning the reads themselves.
///
/// References are returned in first-seen order, each with a length of one
/// past the furthest aligned end observed on it.
pub fn prescan_chromosomes(path: &str, threads: usize) -> io::Result<Vec<(String, u64)>> {
    let mut reader = open_reader(path, threads)?;
    let names = target_names(reader.header());
    let mut order: Vec<(String, u64)> = Vec::new();
    let mut index: FxHashMap<i32, usize> = FxHashMap::default();

    let mut record = Record::new();
    while let Some(result) = reader.read(&mut record) {
        result.map_err(|e| io::Error::other(format!("Failed to read record: {e}")))?;
        if skip_reason(&record).is_some() {
            continue;
        }
        let tid = record.tid();
        let Some(name) = usize::try_from(tid).ok().and_then(|t| names.get(t)) else {
            continue;
        };
        let end = record.cigar().end_pos().max(0) as u64;
        let slot = *index.entry(tid).or_insert_with(|| {
            order.push((name.clone(), 0));
            order.len() - 1
        });
        order[slot].1 = order[slot].1.max(end + 1);
    }

    info!("Pre-scan found {} references", order.len());
    Ok(order)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Unmapped,
    Secondary,
    Supplementary,
}

/// Why a record does not take part in counting, if it doesn't
fn skip_reason(record: &Record) -> Option<SkipReason> {
    if record.is_unmapped() || record.tid() < 0 {
        Some(SkipReason::Unmapped)
    } else if record.is_secondary() {
        Some(SkipReason::Secondary)
    } else if record.is_supplementary() {
        Some(SkipReason::Supplementary)
    } else {
        None
    }
}

/// Convert an htslib record into an [`AlignedRead`].
///
/// The strand is that of the fragment: the read's own orientation, flipped
/// for the second mate of a pair so that both mates agree with read 1.
pub fn to_aligned_read(record: &Record, reference: &str) -> AlignedRead {
    let name = String::from_utf8_lossy(record.qname()).to_string();

    let mut strand = if record.is_reverse() {
        Strand::Negative
    } else {
        Strand::Positive
    };
    if record.is_paired() && record.is_last_in_template() {
        strand = strand.flip();
    }

    // An operator htslib knows but we don't leaves the CIGAR empty, which the walker rejects
    let cigar: Vec<(u32, AlignmentOperator)> = record
        .cigar()
        .iter()
        .map(|c| AlignmentOperator::from_code(c.char()).map(|op| (c.len(), op)))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();

    let md_tag = match record.aux(b"MD") {
        Ok(Aux::String(md)) => Some(md.to_string()),
        _ => None,
    };

    AlignedRead::new(
        &name,
        reference,
        record.pos(),
        strand,
        &record.seq().as_bytes(),
        cigar,
        md_tag.as_deref(),
    )
}

/// Reads an alignment file and yields fragments, bundling mates when asked to.
///
/// In paired mode a record is held back until its mate arrives. Mates on
/// different references, records whose mate is unmapped, and unpaired
/// records are yielded as singles. Mates still waiting at the end of the
/// input are flushed as singles.
pub struct FragmentReader {
    reader: bam::Reader,
    names: Vec<String>,
    paired: bool,
    record: Record,
    pending: FxHashMap<String, AlignedRead>,
    flushed: VecDeque<AlignedRead>,
    exhausted: bool,
    stats: InputStats,
}

impl FragmentReader {
    pub fn open(path: &str, threads: usize, paired: bool) -> io::Result<Self> {
        let reader = open_reader(path, threads)?;
        let names = target_names(reader.header());
        debug!("Opened {} with {} references", path, names.len());
        Ok(Self {
            reader,
            names,
            paired,
            record: Record::new(),
            pending: FxHashMap::default(),
            flushed: VecDeque::new(),
            exhausted: false,
            stats: InputStats::default(),
        })
    }

    pub fn stats(&self) -> &InputStats {
        &self.stats
    }

    /// Next usable record as an `AlignedRead`, `None` at end of input
    fn next_read(&mut self) -> Option<io::Result<(AlignedRead, bool)>> {
        loop {
            match self.reader.read(&mut self.record)? {
                Ok(()) => {}
                Err(e) => {
                    return Some(Err(io::Error::other(format!("Failed to read record: {e}"))))
                }
            }
            self.stats.records += 1;

            match skip_reason(&self.record) {
                Some(SkipReason::Unmapped) => self.stats.unmapped += 1,
                Some(SkipReason::Secondary) => self.stats.secondary += 1,
                Some(SkipReason::Supplementary) => self.stats.supplementary += 1,
                None => {
                    let tid = self.record.tid() as usize;
                    let Some(reference) = self.names.get(tid) else {
                        self.stats.unmapped += 1;
                        continue;
                    };
                    let read = to_aligned_read(&self.record, reference);
                    let bundle = self.paired
                        && self.record.is_paired()
                        && !self.record.is_mate_unmapped()
                        && self.record.mtid() == self.record.tid();
                    return Some(Ok((read, bundle)));
                }
            }
        }
    }

    fn flush_pending(&mut self) {
        let mut orphans: Vec<AlignedRead> = self.pending.drain().map(|(_, read)| read).collect();
        orphans.sort_by(|a, b| {
            (&a.reference, a.reference_start, &a.name).cmp(&(&b.reference, b.reference_start, &b.name))
        });
        self.stats.orphans += orphans.len() as u64;
        if !orphans.is_empty() {
            debug!("Flushing {} mates without partner as single reads", orphans.len());
        }
        self.flushed.extend(orphans);
    }
}

impl Iterator for FragmentReader {
    type Item = io::Result<Fragment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.exhausted {
                return self.flushed.pop_front().map(|read| Ok(Fragment::Single(read)));
            }

            let (read, bundle) = match self.next_read() {
                Some(Ok(next)) => next,
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.exhausted = true;
                    self.flush_pending();
                    continue;
                }
            };

            if !bundle {
                return Some(Ok(Fragment::Single(read)));
            }

            // Read 1 goes first so it claims overlapping positions
            let first_in_template = self.record.is_first_in_template();
            match self.pending.remove(&read.name) {
                Some(mate) if first_in_template => return Some(Ok(Fragment::Pair(read, mate))),
                Some(mate) => return Some(Ok(Fragment::Pair(mate, read))),
                None => {
                    self.pending.insert(read.name.clone(), read);
                }
            }
        }
    }
}
