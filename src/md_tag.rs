//! MD tag parsing.
//!
//! An MD tag such as `10A5^AC6` describes, for every reference base a read
//! covers, whether the read matches it, mismatches it (and what the reference
//! base was) or deletes it. Insertions and soft clips are invisible here.
//! The tag is turned into runs of [`MismatchOperator`] and consumed one base
//! at a time through [`MdTagStack`].

use crate::error::MutationErr;
use crate::nucleotide::Nucleotide;
use crate::run_stack::{Run, RunStack};
use std::fmt;

/// The operators that can appear in an MD tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MismatchOperator {
    /// Deleted reference base of unknown identity
    GenericDeletion,
    DeletionOfA,
    DeletionOfC,
    DeletionOfG,
    DeletionOfT,
    ExactMatch,
    /// Mismatch against an unknown reference base
    GenericMismatch,
    MismatchFromA,
    MismatchFromC,
    MismatchFromG,
    MismatchFromT,
    /// `N` in the reference; the base is not judged
    Ignore,
}

// (canonical code, consumes read bases), indexed by discriminant
const MD_OPERATOR_TABLE: [(char, bool); 12] = [
    ('D', false),
    ('a', false),
    ('c', false),
    ('g', false),
    ('t', false),
    ('=', true),
    ('X', true),
    ('A', true),
    ('C', true),
    ('G', true),
    ('T', true),
    ('N', true),
];

impl MismatchOperator {
    pub const ALL: [MismatchOperator; 12] = [
        MismatchOperator::GenericDeletion,
        MismatchOperator::DeletionOfA,
        MismatchOperator::DeletionOfC,
        MismatchOperator::DeletionOfG,
        MismatchOperator::DeletionOfT,
        MismatchOperator::ExactMatch,
        MismatchOperator::GenericMismatch,
        MismatchOperator::MismatchFromA,
        MismatchOperator::MismatchFromC,
        MismatchOperator::MismatchFromG,
        MismatchOperator::MismatchFromT,
        MismatchOperator::Ignore,
    ];

    /// Single-character code used by the canonical run encoding
    pub fn code(self) -> char {
        MD_OPERATOR_TABLE[self as usize].0
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.code() == code)
    }

    pub fn consumes_read_bases(self) -> bool {
        MD_OPERATOR_TABLE[self as usize].1
    }

    pub fn is_deletion(self) -> bool {
        !self.consumes_read_bases()
    }

    /// Reference base named by the operator, if any
    pub fn reference_base(self) -> Option<Nucleotide> {
        match self {
            MismatchOperator::DeletionOfA | MismatchOperator::MismatchFromA => Some(Nucleotide::A),
            MismatchOperator::DeletionOfC | MismatchOperator::MismatchFromC => Some(Nucleotide::C),
            MismatchOperator::DeletionOfG | MismatchOperator::MismatchFromG => Some(Nucleotide::G),
            MismatchOperator::DeletionOfT | MismatchOperator::MismatchFromT => Some(Nucleotide::T),
            _ => None,
        }
    }

    /// Interpret one letter of an MD tag, either as a mismatch or, after `^`, as a deletion.
    fn from_md_letter(letter: char, deletion: bool) -> Option<Self> {
        let op = match (letter.to_ascii_uppercase(), deletion) {
            ('A', false) => MismatchOperator::MismatchFromA,
            ('C', false) => MismatchOperator::MismatchFromC,
            ('G', false) => MismatchOperator::MismatchFromG,
            ('T', false) => MismatchOperator::MismatchFromT,
            ('N', false) => MismatchOperator::Ignore,
            ('X', false) => MismatchOperator::GenericMismatch,
            ('A', true) => MismatchOperator::DeletionOfA,
            ('C', true) => MismatchOperator::DeletionOfC,
            ('G', true) => MismatchOperator::DeletionOfG,
            ('T', true) => MismatchOperator::DeletionOfT,
            ('N', true) | ('X', true) => MismatchOperator::GenericDeletion,
            _ => return None,
        };
        Some(op)
    }

    /// Letter written back into an MD tag (without the `^` of deletions)
    fn md_letter(self) -> Option<char> {
        match self {
            MismatchOperator::ExactMatch => None,
            MismatchOperator::GenericDeletion => Some('N'),
            MismatchOperator::GenericMismatch => Some('X'),
            MismatchOperator::Ignore => Some('N'),
            other => other.reference_base().map(|n| n.base() as char),
        }
    }
}

impl fmt::Display for MismatchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An MD tag as an ordered list of runs.
///
/// Matches have the length of the matched stretch. Mismatches and deletions
/// are one run per base identity, so `^AAC` is `2a1c`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MdTag {
    runs: Vec<Run<MismatchOperator>>,
}

impl MdTag {
    /// Parse the SAM representation of an MD tag.
    pub fn parse(md: &str) -> Result<Self, MutationErr> {
        let mut tag = MdTag::default();
        let mut number: Option<u32> = None;
        let mut deletion = false;
        // `^` seen, still waiting for its first deleted base
        let mut open_caret = false;

        for c in md.chars() {
            if let Some(digit) = c.to_digit(10) {
                if open_caret {
                    return Err(MutationErr::MalformedAnnotation(format!(
                        "'^' without deleted bases in {}",
                        md
                    )));
                }
                let value = number
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(|| {
                        MutationErr::MalformedAnnotation(format!("match length overflow in {}", md))
                    })?;
                number = Some(value);
                deletion = false;
                continue;
            }

            if let Some(len) = number.take() {
                tag.push_run(len, MismatchOperator::ExactMatch);
            }

            if c == '^' {
                if open_caret {
                    return Err(MutationErr::MalformedAnnotation(format!(
                        "repeated '^' in {}",
                        md
                    )));
                }
                deletion = true;
                open_caret = true;
                continue;
            }

            let op = MismatchOperator::from_md_letter(c, deletion).ok_or_else(|| {
                MutationErr::MalformedAnnotation(format!("unexpected character '{}' in {}", c, md))
            })?;
            open_caret = false;
            tag.push_run(1, op);
        }

        if open_caret {
            return Err(MutationErr::MalformedAnnotation(format!(
                "'^' without deleted bases in {}",
                md
            )));
        }
        if let Some(len) = number {
            tag.push_run(len, MismatchOperator::ExactMatch);
        }

        Ok(tag)
    }

    /// Parse the canonical run encoding produced by `Display`, e.g. `10=1A5=1a1c6=`.
    pub fn from_canonical(encoded: &str) -> Result<Self, MutationErr> {
        let mut tag = MdTag::default();
        let mut number: Option<u32> = None;

        for c in encoded.chars() {
            if let Some(digit) = c.to_digit(10) {
                let value = number
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(|| {
                        MutationErr::MalformedAnnotation(format!("run length overflow in {}", encoded))
                    })?;
                number = Some(value);
            } else {
                let op = MismatchOperator::from_code(c).ok_or_else(|| {
                    MutationErr::MalformedAnnotation(format!(
                        "unknown operator code '{}' in {}",
                        c, encoded
                    ))
                })?;
                let len = number.take().ok_or_else(|| {
                    MutationErr::MalformedAnnotation(format!(
                        "operator '{}' without length in {}",
                        c, encoded
                    ))
                })?;
                tag.push_run(len, op);
            }
        }

        if number.is_some() {
            return Err(MutationErr::MalformedAnnotation(format!(
                "trailing length without operator in {}",
                encoded
            )));
        }
        Ok(tag)
    }

    fn push_run(&mut self, len: u32, op: MismatchOperator) {
        match self.runs.last_mut() {
            Some(last) if last.op == op => last.len += len,
            _ => self.runs.push(Run::new(len, op)),
        }
    }

    pub fn runs(&self) -> &[Run<MismatchOperator>] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of reference bases the tag covers
    pub fn reference_length(&self) -> u64 {
        self.runs.iter().map(|run| run.len as u64).sum()
    }

    /// Number of read bases the tag covers (deleted bases excluded)
    pub fn read_length(&self) -> u64 {
        self.runs
            .iter()
            .filter(|run| run.op.consumes_read_bases())
            .map(|run| run.len as u64)
            .sum()
    }

    /// One operator per reference base
    pub fn units(&self) -> impl Iterator<Item = MismatchOperator> + '_ {
        self.runs
            .iter()
            .flat_map(|run| std::iter::repeat(run.op).take(run.len as usize))
    }

    /// Re-encode as a SAM MD tag, inserting `0` wherever the SAM grammar needs a number.
    pub fn to_md_string(&self) -> String {
        let mut out = String::new();
        // What was written last: None = nothing, Some(true) = letter, Some(false) = number
        let mut last_letter: Option<bool> = None;
        let mut in_deletion = false;

        for run in &self.runs {
            match run.op.md_letter() {
                None => {
                    out.push_str(&run.len.to_string());
                    last_letter = Some(false);
                    in_deletion = false;
                }
                Some(letter) => {
                    for _ in 0..run.len {
                        if run.op.is_deletion() {
                            if !in_deletion {
                                if last_letter != Some(false) {
                                    out.push('0');
                                }
                                out.push('^');
                                in_deletion = true;
                            }
                        } else {
                            if last_letter != Some(false) {
                                out.push('0');
                            }
                            in_deletion = false;
                        }
                        out.push(letter);
                        last_letter = Some(true);
                    }
                }
            }
        }

        if last_letter != Some(false) {
            out.push('0');
        }
        out
    }
}

impl fmt::Display for MdTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            write!(f, "{}{}", run.len, run.op)?;
        }
        Ok(())
    }
}

/// MD tag as a unit stack.
///
/// Zero-length runs, which some aligners emit (`0A0^C`), never yield a unit.
#[derive(Debug, Clone, Default)]
pub struct MdTagStack {
    stack: RunStack<MismatchOperator>,
}

impl MdTagStack {
    pub fn new(md_tag: &MdTag) -> Self {
        Self {
            stack: RunStack::from_runs(md_tag.runs.iter().copied()),
        }
    }

    pub fn pop_unit(&mut self) -> Option<MismatchOperator> {
        self.stack.pop_unit()
    }

    pub fn push_unit(&mut self, op: MismatchOperator) {
        self.stack.push_unit(op);
    }

    pub fn push_run(&mut self, len: u32, op: MismatchOperator) {
        self.stack.push_run(len, op);
    }

    pub fn reverse(&mut self) {
        self.stack.reverse();
    }

    /// Units left to consume
    pub fn units(&self) -> u64 {
        self.stack.units()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MismatchOperator::*;

    fn runs(tag: &MdTag) -> Vec<(u32, MismatchOperator)> {
        tag.runs().iter().map(|run| (run.len, run.op)).collect()
    }

    #[test]
    fn test_parse_mismatch_and_deletion() {
        let tag = MdTag::parse("10A5^AC6").unwrap();
        assert_eq!(
            runs(&tag),
            vec![
                (10, ExactMatch),
                (1, MismatchFromA),
                (5, ExactMatch),
                (1, DeletionOfA),
                (1, DeletionOfC),
                (6, ExactMatch),
            ]
        );
        assert_eq!(tag.reference_length(), 24);
        assert_eq!(tag.read_length(), 22);
        assert_eq!(tag.to_string(), "10=1A5=1a1c6=");
    }

    #[test]
    fn test_consecutive_deleted_bases_merge() {
        let tag = MdTag::parse("3^AAT3").unwrap();
        assert_eq!(
            runs(&tag),
            vec![(3, ExactMatch), (2, DeletionOfA), (1, DeletionOfT), (3, ExactMatch)]
        );
    }

    #[test]
    fn test_digits_end_deletion_mode() {
        let tag = MdTag::parse("2^G0C4").unwrap();
        assert_eq!(
            runs(&tag),
            vec![
                (2, ExactMatch),
                (1, DeletionOfG),
                (0, ExactMatch),
                (1, MismatchFromC),
                (4, ExactMatch),
            ]
        );
    }

    #[test]
    fn test_special_letters() {
        let tag = MdTag::parse("1N2X1^N1").unwrap();
        assert_eq!(
            runs(&tag),
            vec![
                (1, ExactMatch),
                (1, Ignore),
                (2, ExactMatch),
                (1, GenericMismatch),
                (1, ExactMatch),
                (1, GenericDeletion),
                (1, ExactMatch),
            ]
        );
    }

    #[test]
    fn test_lowercase_letters() {
        let tag = MdTag::parse("4c2^gt1").unwrap();
        assert_eq!(
            runs(&tag),
            vec![
                (4, ExactMatch),
                (1, MismatchFromC),
                (2, ExactMatch),
                (1, DeletionOfG),
                (1, DeletionOfT),
                (1, ExactMatch),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_unknown_letters() {
        assert!(matches!(
            MdTag::parse("10R5"),
            Err(MutationErr::MalformedAnnotation(_))
        ));
        assert!(matches!(
            MdTag::parse("3^AZ2"),
            Err(MutationErr::MalformedAnnotation(_))
        ));
        assert!(MdTag::parse("3^5").is_err());
        assert!(MdTag::parse("3^").is_err());
        assert!(MdTag::parse("3^^A1").is_err());
        assert!(MdTag::parse("5-2").is_err());
    }

    #[test]
    fn test_md_string_round_trip() {
        for md in ["10A5^AC6", "0A0C3", "2^G0C4", "7", "3T0^GG2A0", "1N2X1^N1"] {
            let tag = MdTag::parse(md).unwrap();
            let reencoded = MdTag::parse(&tag.to_md_string()).unwrap();
            assert_eq!(
                tag.units().collect::<Vec<_>>(),
                reencoded.units().collect::<Vec<_>>(),
                "{} re-encoded as {}",
                md,
                tag.to_md_string()
            );
        }
        assert_eq!(MdTag::parse("10A5^AC6").unwrap().to_md_string(), "10A5^AC6");
        assert_eq!(MdTag::parse("0A0C3").unwrap().to_md_string(), "0A0C3");
    }

    #[test]
    fn test_canonical_round_trip() {
        let tag = MdTag::parse("10A5^AC6").unwrap();
        let decoded = MdTag::from_canonical(&tag.to_string()).unwrap();
        assert_eq!(decoded, tag);
        assert!(MdTag::from_canonical("10=A").is_err());
        assert!(MdTag::from_canonical("10=3").is_err());
        assert!(MdTag::from_canonical("2Q").is_err());
    }

    #[test]
    fn test_stack_skips_zero_length_runs() {
        let tag = MdTag::parse("0A0^C2").unwrap();
        let mut stack = MdTagStack::new(&tag);
        assert_eq!(stack.units(), 4);
        assert_eq!(stack.pop_unit(), Some(MismatchFromA));
        assert_eq!(stack.pop_unit(), Some(DeletionOfC));
        assert_eq!(stack.pop_unit(), Some(ExactMatch));
        assert_eq!(stack.pop_unit(), Some(ExactMatch));
        assert_eq!(stack.pop_unit(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_stack_trailing_zero_run_is_empty() {
        let tag = MdTag::parse("1A0").unwrap();
        let mut stack = MdTagStack::new(&tag);
        assert_eq!(stack.pop_unit(), Some(ExactMatch));
        assert_eq!(stack.pop_unit(), Some(MismatchFromA));
        assert!(stack.is_empty());
        assert_eq!(stack.pop_unit(), None);
    }

    #[test]
    fn test_stack_push_back() {
        let tag = MdTag::parse("3").unwrap();
        let mut stack = MdTagStack::new(&tag);
        assert_eq!(stack.pop_unit(), Some(ExactMatch));
        stack.push_unit(ExactMatch);
        assert_eq!(stack.units(), 3);
        stack.push_run(2, MismatchFromG);
        assert_eq!(stack.pop_unit(), Some(MismatchFromG));
        stack.reverse();
        assert_eq!(stack.pop_unit(), Some(ExactMatch));
        assert_eq!(stack.units(), 3);
    }
}
