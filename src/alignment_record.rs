use crate::cigar::AlignmentOperator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strand a fragment (and everything counted from it) is attributed to
#[derive(Default, PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Strand {
    #[default]
    Positive,
    Negative,
}

impl Strand {
    pub fn flip(self) -> Self {
        match self {
            Strand::Positive => Strand::Negative,
            Strand::Negative => Strand::Positive,
        }
    }

    /// Word used in tabular output
    pub fn label(self) -> &'static str {
        match self {
            Strand::Positive => "positive",
            Strand::Negative => "negative",
        }
    }

    /// Short form used in file names
    pub fn short_label(self) -> &'static str {
        match self {
            Strand::Positive => "pos",
            Strand::Negative => "neg",
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Positive => write!(f, "+"),
            Strand::Negative => write!(f, "-"),
        }
    }
}

/// One aligned read, as handed over by the input layer.
///
/// ## Coordinates
/// - `reference_start`: 0-based position of the first reference base the CIGAR consumes
/// - `reference_end`: exclusive end, i.e. start plus the reference length of the CIGAR
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRead {
    pub name: String,
    pub reference: String,
    pub reference_start: i64,
    pub reference_end: i64,
    pub strand: Strand,
    pub sequence: Vec<u8>,
    /// Empty when the record has no CIGAR
    pub cigar: Vec<(u32, AlignmentOperator)>,
    pub md_tag: Option<String>,
}

impl AlignedRead {
    /// Build a read whose end is derived from its CIGAR
    pub fn new(
        name: &str,
        reference: &str,
        reference_start: i64,
        strand: Strand,
        sequence: &[u8],
        cigar: Vec<(u32, AlignmentOperator)>,
        md_tag: Option<&str>,
    ) -> Self {
        let reference_len: i64 = cigar
            .iter()
            .filter(|(_, op)| op.consumes_reference_bases())
            .map(|&(len, _)| len as i64)
            .sum();
        Self {
            name: name.to_string(),
            reference: reference.to_string(),
            reference_start,
            reference_end: reference_start + reference_len,
            strand,
            sequence: sequence.to_vec(),
            cigar,
            md_tag: md_tag.map(str::to_string),
        }
    }
}

/// A single read or both mates of a pair, processed as one unit
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Single(AlignedRead),
    Pair(AlignedRead, AlignedRead),
}

impl Fragment {
    pub fn name(&self) -> &str {
        match self {
            Fragment::Single(read) | Fragment::Pair(read, _) => &read.name,
        }
    }

    pub fn reference(&self) -> &str {
        match self {
            Fragment::Single(read) | Fragment::Pair(read, _) => &read.reference,
        }
    }

    pub fn mates(&self) -> Vec<&AlignedRead> {
        match self {
            Fragment::Single(read) => vec![read],
            Fragment::Pair(first, second) => vec![first, second],
        }
    }
}
