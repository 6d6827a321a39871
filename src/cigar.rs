use crate::error::MutationErr;
use crate::run_stack::{Run, RunStack};
use std::fmt;

/// SAM CIGAR operators.
///
/// Only `M`, `I`, `D` and `S` take part in mutation counting; the others are
/// carried through so the walker can reject the read with a useful message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlignmentOperator {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Padding,
    SequenceMatch,
    SequenceMismatch,
}

// (code, consumes read, consumes reference), indexed by discriminant
const OPERATOR_TABLE: [(char, bool, bool); 9] = [
    ('M', true, true),
    ('I', true, false),
    ('D', false, true),
    ('N', false, true),
    ('S', true, false),
    ('H', false, false),
    ('P', false, false),
    ('=', true, true),
    ('X', true, true),
];

impl AlignmentOperator {
    pub fn from_code(code: char) -> Option<Self> {
        let op = match code {
            'M' => AlignmentOperator::Match,
            'I' => AlignmentOperator::Insertion,
            'D' => AlignmentOperator::Deletion,
            'N' => AlignmentOperator::Skip,
            'S' => AlignmentOperator::SoftClip,
            'H' => AlignmentOperator::HardClip,
            'P' => AlignmentOperator::Padding,
            '=' => AlignmentOperator::SequenceMatch,
            'X' => AlignmentOperator::SequenceMismatch,
            _ => return None,
        };
        Some(op)
    }

    pub fn code(self) -> char {
        OPERATOR_TABLE[self as usize].0
    }

    pub fn consumes_read_bases(self) -> bool {
        OPERATOR_TABLE[self as usize].1
    }

    pub fn consumes_reference_bases(self) -> bool {
        OPERATOR_TABLE[self as usize].2
    }

    /// Insertions and soft clips have no counterpart in the MD tag
    pub fn has_md_counterpart(self) -> bool {
        !matches!(
            self,
            AlignmentOperator::Insertion | AlignmentOperator::SoftClip
        )
    }
}

impl fmt::Display for AlignmentOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// CIGAR as a unit stack: `pop_unit` yields one operator per aligned base.
pub type CigarStack = RunStack<AlignmentOperator>;

impl RunStack<AlignmentOperator> {
    /// Load CIGAR runs so the leftmost operator is consumed first.
    pub fn from_cigar(cigar: &[(u32, AlignmentOperator)]) -> Self {
        Self::from_runs(cigar.iter().map(|&(len, op)| Run::new(len, op)))
    }
}

/// Parse a CIGAR string such as `5S20M1I10M` into runs
pub fn parse_cigar(cigar: &str) -> Result<Vec<(u32, AlignmentOperator)>, MutationErr> {
    if cigar.is_empty() || cigar == "*" {
        return Err(MutationErr::MalformedAlignment("missing CIGAR".to_string()));
    }

    let mut ops = Vec::new();
    let mut len: Option<u32> = None;

    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            let value = len
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| {
                    MutationErr::MalformedAlignment(format!("CIGAR length overflow in {}", cigar))
                })?;
            len = Some(value);
        } else {
            let op = AlignmentOperator::from_code(c).ok_or_else(|| {
                MutationErr::MalformedAlignment(format!(
                    "unknown CIGAR operator '{}' in {}",
                    c, cigar
                ))
            })?;
            let run_len = len.take().ok_or_else(|| {
                MutationErr::MalformedAlignment(format!(
                    "CIGAR operator '{}' without length in {}",
                    c, cigar
                ))
            })?;
            ops.push((run_len, op));
        }
    }

    if len.is_some() {
        return Err(MutationErr::MalformedAlignment(format!(
            "trailing length without operator in {}",
            cigar
        )));
    }

    Ok(ops)
}
