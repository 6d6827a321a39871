use crate::nucleotide::Nucleotide;
use std::fmt;

/// Combined view of one CIGAR unit and one MD unit.
///
/// Substitutions come out of reconciliation as `XToN` (the MD tag only knows
/// the reference base); the walker refines them with the read base it actually
/// sees, e.g. `AToN` becomes `AToG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GenericOperator {
    Deletion,
    DeletionOfA,
    DeletionOfC,
    DeletionOfG,
    DeletionOfT,
    Match,
    Insertion,
    UnknownMismatch,
    AToC,
    AToG,
    AToN,
    AToT,
    CToA,
    CToG,
    CToN,
    CToT,
    GToA,
    GToC,
    GToN,
    GToT,
    TToA,
    TToC,
    TToG,
    TToN,
    Unknown,
    SoftClip,
    SpliceJunction,
}

// (is mutation, consumes read bases, consumes reference bases, label), indexed by discriminant
const GENERIC_TABLE: [(bool, bool, bool, &str); 27] = [
    (true, false, true, "D"),
    (true, false, true, "DA"),
    (true, false, true, "DC"),
    (true, false, true, "DG"),
    (true, false, true, "DT"),
    (false, true, true, "="),
    (false, true, false, "I"),
    (true, true, true, "X"),
    (true, true, true, "AC"),
    (true, true, true, "AG"),
    (true, true, true, "AN"),
    (true, true, true, "AT"),
    (true, true, true, "CA"),
    (true, true, true, "CG"),
    (true, true, true, "CN"),
    (true, true, true, "CT"),
    (true, true, true, "GA"),
    (true, true, true, "GC"),
    (true, true, true, "GN"),
    (true, true, true, "GT"),
    (true, true, true, "TA"),
    (true, true, true, "TC"),
    (true, true, true, "TG"),
    (true, true, true, "TN"),
    (false, true, true, "N"),
    (false, true, true, "S"),
    (false, false, true, "J"),
];

impl GenericOperator {
    pub fn is_mutation(self) -> bool {
        GENERIC_TABLE[self as usize].0
    }

    pub fn consumes_read_bases(self) -> bool {
        GENERIC_TABLE[self as usize].1
    }

    pub fn consumes_reference_bases(self) -> bool {
        GENERIC_TABLE[self as usize].2
    }

    pub fn is_deletion(self) -> bool {
        self.is_mutation() && !self.consumes_read_bases()
    }

    /// Mismatch of a read base against the reference (known or not)
    pub fn is_substitution(self) -> bool {
        self.is_mutation() && self.consumes_read_bases()
    }

    pub fn label(self) -> &'static str {
        GENERIC_TABLE[self as usize].3
    }

    pub fn deletion_of(base: Option<Nucleotide>) -> Self {
        match base {
            None => GenericOperator::Deletion,
            Some(Nucleotide::A) => GenericOperator::DeletionOfA,
            Some(Nucleotide::C) => GenericOperator::DeletionOfC,
            Some(Nucleotide::G) => GenericOperator::DeletionOfG,
            Some(Nucleotide::T) => GenericOperator::DeletionOfT,
        }
    }

    /// Substitution of `from` by `to`; an unknown or identical read base gives `XToN`.
    pub fn substitution(from: Nucleotide, to: Option<Nucleotide>) -> Self {
        use GenericOperator::*;
        use Nucleotide::*;
        match (from, to) {
            (A, Some(C)) => AToC,
            (A, Some(G)) => AToG,
            (A, Some(T)) => AToT,
            (A, _) => AToN,
            (C, Some(A)) => CToA,
            (C, Some(G)) => CToG,
            (C, Some(T)) => CToT,
            (C, _) => CToN,
            (G, Some(A)) => GToA,
            (G, Some(C)) => GToC,
            (G, Some(T)) => GToT,
            (G, _) => GToN,
            (T, Some(A)) => TToA,
            (T, Some(C)) => TToC,
            (T, Some(G)) => TToG,
            (T, _) => TToN,
        }
    }

    /// Reference base of substitutions and deletions, when the MD tag named it
    pub fn reference_base(self) -> Option<Nucleotide> {
        use GenericOperator::*;
        match self {
            DeletionOfA | AToC | AToG | AToN | AToT => Some(Nucleotide::A),
            DeletionOfC | CToA | CToG | CToN | CToT => Some(Nucleotide::C),
            DeletionOfG | GToA | GToC | GToN | GToT => Some(Nucleotide::G),
            DeletionOfT | TToA | TToC | TToG | TToN => Some(Nucleotide::T),
            _ => None,
        }
    }

    /// Refine an `XToN` substitution with the base observed in the read.
    pub fn with_read_base(self, read_base: u8) -> Self {
        match self.reference_base() {
            Some(from) if self.is_substitution() => {
                Self::substitution(from, Nucleotide::from_base(read_base))
            }
            _ => self,
        }
    }
}

impl fmt::Display for GenericOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
