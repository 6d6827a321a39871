use crate::bam::{prescan_chromosomes, register_from_header, FragmentReader};
use crate::counter::{CountConfig, MutationCounter, ScanStats};
use crate::output::{
    profile_suffixes, write_profiles, OutputOptions, ReadMutationWriter, READ_MUTATIONS_SUFFIX,
};
use crate::profile::ProfileCollection;
use log::info;
use std::io;
use std::path::Path;

/// Configuration for the count command
pub struct CountOptions {
    /// BAM/SAM/CRAM with MD tags
    pub input: String,
    pub output: OutputOptions,
    pub config: CountConfig,
    /// htslib decompression threads
    pub threads: usize,
    /// Bundle mates into one fragment
    pub paired: bool,
    /// Register references from the reads instead of the header
    pub prescan: bool,
    /// Also write every mutation of every read
    pub dump_reads: bool,
    /// Snapshot path for later merging
    pub save_profiles: Option<String>,
}

fn check_snapshot_path(path: &str, force: bool) -> io::Result<()> {
    if !force && Path::new(path).exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Output {} already exists (use --force to overwrite)", path),
        ));
    }
    Ok(())
}

pub fn register_references(
    input: &str,
    threads: usize,
    prescan: bool,
) -> io::Result<ProfileCollection> {
    let mut profiles = ProfileCollection::new();
    if prescan {
        for (name, length) in prescan_chromosomes(input, threads)? {
            profiles.register(&name, length)?;
        }
    } else {
        register_from_header(input, &mut profiles)?;
    }
    Ok(profiles)
}

/// Count mutations in `options.input` and write profiles, tracks and optional extras.
pub fn run_count(options: &CountOptions) -> io::Result<ScanStats> {
    // Refuse before doing any work
    let mut suffixes = profile_suffixes();
    if options.dump_reads {
        suffixes.push(READ_MUTATIONS_SUFFIX.to_string());
    }
    options.output.check_overwrite(&suffixes)?;
    if let Some(path) = &options.save_profiles {
        check_snapshot_path(path, options.output.force)?;
    }

    let profiles = register_references(&options.input, options.threads, options.prescan)?;
    if profiles.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No reference sequences found for {}", options.input),
        ));
    }

    info!(
        "Counting mutations in {} ({} bases excluded at read ends, {} mode)",
        options.input,
        options.config.excluded_bases,
        if options.paired { "paired" } else { "single" }
    );

    let mut reader = FragmentReader::open(&options.input, options.threads, options.paired)?;
    let mut counter = MutationCounter::new(options.config, profiles);
    let mut dump = if options.dump_reads {
        Some(ReadMutationWriter::new(
            options.output.create(READ_MUTATIONS_SUFFIX)?,
        ))
    } else {
        None
    };

    for fragment in reader.by_ref() {
        let fragment = fragment?;
        let applied = counter.process(&fragment)?;
        if let (Some(dump), Some(events)) = (dump.as_mut(), applied) {
            dump.write_fragment(&fragment, events)?;
        }
    }

    reader.stats().log_summary();
    if let Some(dump) = dump {
        let lines = dump.finish()?;
        info!(
            "Wrote {} read mutations to {}",
            lines,
            options.output.path(READ_MUTATIONS_SUFFIX).display()
        );
    }

    let (profiles, stats) = counter.finish();
    stats.log_summary();

    write_profiles(&options.output, &profiles, options.config.coverage_threshold)?;
    if let Some(path) = &options.save_profiles {
        profiles.save(Path::new(path))?;
        info!("Saved profiles to {}", path);
    }

    Ok(stats)
}
