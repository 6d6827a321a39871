use clap::Parser;
use log::info;
use mutcount::commands::count::{run_count, CountOptions};
use mutcount::commands::merge::run_merge;
use mutcount::commands::stats::write_stats;
use mutcount::counter::CountConfig;
use mutcount::output::OutputOptions;
use mutcount::profile::ProfileCollection;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::Path;

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Number of threads for BAM decompression.
    #[clap(short = 't', long, value_parser, default_value = "1")]
    threads: NonZeroUsize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

/// Options deciding where results go
#[derive(Parser, Debug)]
struct OutputOpts {
    /// Prefix of every output file
    #[clap(short = 'o', long, value_parser)]
    output_prefix: String,

    /// Compress outputs with BGZF
    #[clap(long, action)]
    compress: bool,

    /// Overwrite existing outputs
    #[clap(long, action)]
    force: bool,

    /// Positions with fewer observations than this are not reported
    #[clap(short = 'c', long, value_parser, default_value_t = 1, allow_negative_numbers = true)]
    coverage_threshold: i64,

    /// Also save the profiles as a binary snapshot for later merging
    #[clap(long, value_parser)]
    save_profiles: Option<String>,
}

impl OutputOpts {
    fn output_options(&self) -> OutputOptions {
        OutputOptions {
            prefix: self.output_prefix.clone(),
            compress: self.compress,
            force: self.force,
        }
    }
}

/// Per-position mutation rates from aligned reads with MD tags.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Count matches, insertions, deletions and substitutions per reference position and strand
    Count {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(flatten)]
        output: OutputOpts,

        /// Input BAM/SAM/CRAM file (reads need MD tags)
        #[clap(short = 'i', long, value_parser)]
        input: String,

        /// Number of bases ignored at each end of each read
        #[clap(short = 'n', long, value_parser, default_value_t = 0, allow_negative_numbers = true)]
        excluded_bases: i64,

        /// Count both mates of a pair as one fragment, overlapping bases once
        #[clap(long, action)]
        paired: bool,

        /// Take references from the reads instead of the header
        #[clap(long, action)]
        prescan: bool,

        /// Write every mutation of every read to PREFIX_read_mutations.txt
        #[clap(long, action)]
        dump_reads: bool,
    },
    /// Merge profile snapshots and write combined rates
    Merge {
        #[clap(flatten)]
        common: CommonOpts,

        #[clap(flatten)]
        output: OutputOpts,

        /// Snapshots written with --save-profiles
        #[clap(value_parser, required = true)]
        snapshots: Vec<String>,
    },
    /// Print profile snapshot statistics
    Stats {
        #[clap(flatten)]
        common: CommonOpts,

        /// Snapshot written with --save-profiles
        #[clap(value_parser)]
        snapshot: String,
    },
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::Count {
            common,
            output,
            input,
            excluded_bases,
            paired,
            prescan,
            dump_reads,
        } => {
            initialize_logger(&common);
            let config = CountConfig::new(excluded_bases, output.coverage_threshold)?;
            let options = CountOptions {
                input,
                output: output.output_options(),
                config,
                threads: common.threads.get(),
                paired,
                prescan,
                dump_reads,
                save_profiles: output.save_profiles.clone(),
            };
            let stats = run_count(&options)?;
            info!(
                "Counted {} of {} fragments",
                stats.counted, stats.fragments
            );
        }
        Args::Merge {
            common,
            output,
            snapshots,
        } => {
            initialize_logger(&common);
            let config = CountConfig::new(0, output.coverage_threshold)?;
            run_merge(
                &snapshots,
                &output.output_options(),
                config.coverage_threshold,
                output.save_profiles.as_deref(),
            )?;
        }
        Args::Stats { common, snapshot } => {
            initialize_logger(&common);
            let profiles = ProfileCollection::load(Path::new(&snapshot))?;
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_stats(&mut writer, &profiles)?;
            writer.flush()?;
        }
    }

    Ok(())
}

fn initialize_logger(common: &CommonOpts) {
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}
