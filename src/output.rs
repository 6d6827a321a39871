use crate::alignment_record::{Fragment, Strand};
use crate::profile::{PositionRecord, ProfileCollection, RateKind};
use crate::walker::ReadEvent;
use log::info;
use noodles::bgzf;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Where and how output files are written
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Every output file name starts with this
    pub prefix: String,
    /// BGZF-compress every output (adds `.gz`)
    pub compress: bool,
    /// Replace existing outputs instead of refusing to run
    pub force: bool,
}

impl OutputOptions {
    pub fn path(&self, suffix: &str) -> PathBuf {
        if self.compress {
            PathBuf::from(format!("{}{}.gz", self.prefix, suffix))
        } else {
            PathBuf::from(format!("{}{}", self.prefix, suffix))
        }
    }

    /// Fail if any of the outputs with these suffixes already exists (unless forced).
    pub fn check_overwrite(&self, suffixes: &[String]) -> io::Result<()> {
        if self.force {
            return Ok(());
        }
        for suffix in suffixes {
            let path = self.path(suffix);
            if path.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Output {} already exists (use --force to overwrite)", path.display()),
                ));
            }
        }
        Ok(())
    }

    pub fn create(&self, suffix: &str) -> io::Result<Box<dyn Write>> {
        let path = self.path(suffix);
        let file = File::create(&path).map_err(|e| {
            io::Error::new(e.kind(), format!("Failed to create {}: {e}", path.display()))
        })?;
        let writer: Box<dyn Write> = if self.compress {
            Box::new(bgzf::io::Writer::new(file))
        } else {
            Box::new(BufWriter::new(file))
        };
        Ok(writer)
    }
}

pub const CSV_SUFFIX: &str = ".csv";
pub const READ_MUTATIONS_SUFFIX: &str = "_read_mutations.txt";

pub const CSV_HEADER: &str =
    "chromosome,orientation,position,=,I,D,A,C,G,T,total,mutationRate,deletionRate,substitutionRate";

pub fn track_suffix(strand: Strand, kind: RateKind) -> String {
    format!("_{}_{}_rate.bedgraph", strand.short_label(), kind.label())
}

/// Suffixes of the CSV and the six rate tracks
pub fn profile_suffixes() -> Vec<String> {
    let mut suffixes = vec![CSV_SUFFIX.to_string()];
    for strand in [Strand::Positive, Strand::Negative] {
        for kind in RateKind::ALL {
            suffixes.push(track_suffix(strand, kind));
        }
    }
    suffixes
}

fn write_csv_row<W: Write>(writer: &mut W, record: &PositionRecord<'_>) -> io::Result<()> {
    let counts = &record.counts;
    let rates = record.rates();
    writeln!(
        writer,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        record.chromosome,
        record.strand.label(),
        record.position + 1,
        counts.matches,
        counts.insertions,
        counts.deletions,
        counts.substitutions[0],
        counts.substitutions[1],
        counts.substitutions[2],
        counts.substitutions[3],
        counts.total(),
        rates.mutation,
        rates.deletion,
        rates.substitution
    )
}

/// Tidy table: one row per touched position and strand, 1-based positions.
pub fn write_csv<W: Write>(
    writer: &mut W,
    profiles: &ProfileCollection,
    coverage_threshold: u64,
) -> io::Result<usize> {
    writeln!(writer, "{}", CSV_HEADER)?;
    let records = profiles.records(coverage_threshold);
    for record in &records {
        write_csv_row(writer, record)?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// One bedGraph track: 0-based, one-base intervals with a nonzero rate.
pub fn write_track<W: Write>(
    writer: &mut W,
    profiles: &ProfileCollection,
    strand: Strand,
    kind: RateKind,
    coverage_threshold: u64,
) -> io::Result<usize> {
    writeln!(writer, "track type=bedGraph")?;
    let mut lines = 0;
    for chromosome in profiles.iter() {
        for (position, rate) in chromosome.track(strand, kind, coverage_threshold) {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                chromosome.name(),
                position,
                position + 1,
                rate
            )?;
            lines += 1;
        }
    }
    writer.flush()?;
    Ok(lines)
}

/// Write the CSV and all six rate tracks under `options`.
pub fn write_profiles(
    options: &OutputOptions,
    profiles: &ProfileCollection,
    coverage_threshold: u64,
) -> io::Result<()> {
    let mut csv = options.create(CSV_SUFFIX)?;
    let rows = write_csv(&mut csv, profiles, coverage_threshold)?;
    drop(csv);
    info!("Wrote {} rows to {}", rows, options.path(CSV_SUFFIX).display());

    for strand in [Strand::Positive, Strand::Negative] {
        for kind in RateKind::ALL {
            let suffix = track_suffix(strand, kind);
            let mut track = options.create(&suffix)?;
            let lines = write_track(&mut track, profiles, strand, kind, coverage_threshold)?;
            drop(track);
            info!("Wrote {} intervals to {}", lines, options.path(&suffix).display());
        }
    }
    Ok(())
}

/// Per-read mutation listing: `chromosome read position D|I|REF->READ`, 1-based.
pub struct ReadMutationWriter {
    writer: Box<dyn Write>,
    lines: usize,
}

impl ReadMutationWriter {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer, lines: 0 }
    }

    pub fn write_fragment(&mut self, fragment: &Fragment, events: &[ReadEvent]) -> io::Result<()> {
        for event in events.iter().filter(|e| e.is_reported_mutation()) {
            writeln!(
                self.writer,
                "{} {} {} {}",
                fragment.reference(),
                fragment.name(),
                event.position + 1,
                event.describe()
            )?;
            self.lines += 1;
        }
        Ok(())
    }

    /// Flush and return the number of lines written
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.lines)
    }
}
