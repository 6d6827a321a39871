use std::io::Error as IoError;

/// Everything that can go wrong while turning alignments into mutation counts.
///
/// The first group aborts a single read (or read pair) and the scan moves on;
/// the rest are setup or I/O failures that stop the run.
#[derive(Debug)]
pub enum MutationErr {
    /// Read carries no MD tag (or an empty one)
    MissingAnnotation(String),
    /// MD tag could not be tokenized
    MalformedAnnotation(String),
    /// CIGAR is missing, uses an unsupported operator or disagrees in length with the MD tag
    MalformedAlignment(String),
    /// CIGAR operator and MD operator contradict each other
    Incompatible { cigar: char, md: char },
    OutOfRangePosition {
        chromosome: String,
        position: i64,
        length: u64,
    },
    UnregisteredChromosome(String),
    ConflictingLength {
        chromosome: String,
        registered: u64,
        requested: u64,
    },
    InvalidConfig(String),
    Io(IoError),
}

impl MutationErr {
    /// Per-read failures skip the offending read; anything else is fatal for the run.
    pub fn is_per_read(&self) -> bool {
        matches!(
            self,
            MutationErr::MissingAnnotation(_)
                | MutationErr::MalformedAnnotation(_)
                | MutationErr::MalformedAlignment(_)
                | MutationErr::Incompatible { .. }
                | MutationErr::OutOfRangePosition { .. }
                | MutationErr::UnregisteredChromosome(_)
        )
    }

    /// Short stable label, used to bucket skipped reads in scan statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            MutationErr::MissingAnnotation(_) => "missing_annotation",
            MutationErr::MalformedAnnotation(_) => "malformed_annotation",
            MutationErr::MalformedAlignment(_) => "malformed_alignment",
            MutationErr::Incompatible { .. } => "incompatible",
            MutationErr::OutOfRangePosition { .. } => "out_of_range_position",
            MutationErr::UnregisteredChromosome(_) => "unregistered_chromosome",
            MutationErr::ConflictingLength { .. } => "conflicting_length",
            MutationErr::InvalidConfig(_) => "invalid_config",
            MutationErr::Io(_) => "io",
        }
    }
}

impl std::fmt::Display for MutationErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationErr::MissingAnnotation(read) => {
                write!(f, "Read {} does not have an MD tag", read)
            }
            MutationErr::MalformedAnnotation(msg) => write!(f, "Invalid MD tag: {}", msg),
            MutationErr::MalformedAlignment(msg) => write!(f, "Invalid alignment: {}", msg),
            MutationErr::Incompatible { cigar, md } => write!(
                f,
                "CIGAR string and MD tag are not compatible. CIGAR operator is {} and MD tag operator is {}",
                cigar, md
            ),
            MutationErr::OutOfRangePosition {
                chromosome,
                position,
                length,
            } => write!(
                f,
                "Position {} is outside of {} (length {})",
                position, chromosome, length
            ),
            MutationErr::UnregisteredChromosome(name) => {
                write!(f, "Chromosome {} was never registered", name)
            }
            MutationErr::ConflictingLength {
                chromosome,
                registered,
                requested,
            } => write!(
                f,
                "Chromosome {} already registered with length {}, got {}",
                chromosome, registered, requested
            ),
            MutationErr::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            MutationErr::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for MutationErr {}

impl From<IoError> for MutationErr {
    fn from(e: IoError) -> Self {
        MutationErr::Io(e)
    }
}

impl From<MutationErr> for IoError {
    fn from(e: MutationErr) -> Self {
        match e {
            MutationErr::Io(e) => e,
            MutationErr::InvalidConfig(_) | MutationErr::ConflictingLength { .. } => {
                IoError::new(std::io::ErrorKind::InvalidInput, e.to_string())
            }
            other => IoError::new(std::io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}
