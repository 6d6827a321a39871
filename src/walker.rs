use crate::alignment_record::{AlignedRead, Fragment, Strand};
use crate::cigar::CigarStack;
use crate::error::MutationErr;
use crate::md_tag::{MdTag, MdTagStack};
use crate::nucleotide::Nucleotide;
use crate::operator::GenericOperator;
use crate::profile::{Counter, ProfileCollection};
use crate::reconcile::classify;
use rustc_hash::FxHashSet;

/// Reference positions already counted for the current fragment.
///
/// One set is shared by both mates of a pair so that overlapping coverage is
/// counted once. It never outlives a fragment.
#[derive(Debug, Default, Clone)]
pub struct VisitedPositions {
    positions: FxHashSet<i64>,
}

impl VisitedPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: i64) -> bool {
        self.positions.insert(position)
    }

    pub fn contains(&self, position: i64) -> bool {
        self.positions.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Pre-visit the first and last `margin` positions of `[start, end)`.
    ///
    /// The margin is capped at the span of the read.
    pub fn exclude_edges(&mut self, start: i64, end: i64, margin: u64) {
        let span = (end - start).max(0) as u64;
        let margin = margin.min(span) as i64;
        for i in 0..margin {
            self.positions.insert(start + i);
            self.positions.insert(end - 1 - i);
        }
    }
}

/// One counted observation at a reference position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadEvent {
    /// 0-based reference position
    pub position: i64,
    pub strand: Strand,
    /// Substitutions are already refined with the read base
    pub op: GenericOperator,
    /// Read base at the event, if the operator consumes one
    pub read_base: Option<u8>,
}

impl ReadEvent {
    /// The profile counter this event increments, if any.
    ///
    /// `Unknown` (an `N` in the reference) counts as a match. A substitution
    /// whose read base is not A/C/G/T touches the position but counts nothing.
    pub fn counter(&self) -> Option<Counter> {
        match self.op {
            GenericOperator::Match | GenericOperator::Unknown => Some(Counter::Match),
            GenericOperator::Insertion => Some(Counter::Insertion),
            op if op.is_deletion() => Some(Counter::Deletion),
            op if op.is_substitution() => self
                .read_base
                .and_then(Nucleotide::from_base)
                .map(Counter::Substitution),
            _ => None,
        }
    }

    /// Whether the per-read dump lists this event
    pub fn is_reported_mutation(&self) -> bool {
        self.op.is_mutation() || self.op == GenericOperator::Insertion
    }

    /// `D`, `I` or `REF->READ`, as written to the per-read dump
    pub fn describe(&self) -> String {
        if self.op.is_deletion() {
            "D".to_string()
        } else if self.op == GenericOperator::Insertion {
            "I".to_string()
        } else {
            let reference = self
                .op
                .reference_base()
                .map_or('N', |n| n.base() as char);
            let read = self.read_base.map_or('N', |b| b.to_ascii_uppercase() as char);
            format!("{}->{}", reference, read)
        }
    }
}

/// Walks reads base by base, reconciling CIGAR and MD tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadWalker {
    excluded_bases: u64,
}

impl ReadWalker {
    /// `excluded_bases`: reference positions ignored at each end of every read
    pub fn new(excluded_bases: u64) -> Self {
        Self { excluded_bases }
    }

    pub fn excluded_bases(&self) -> u64 {
        self.excluded_bases
    }

    /// Walk a single read, appending one event per counted position to `events`.
    ///
    /// Positions outside `[0, chromosome_length)` or already in `visited` are
    /// skipped. Every reconciled unit is still checked, so an inconsistent read
    /// fails even if the inconsistency falls on a skipped position. On error,
    /// `events` may hold a partial walk and must be discarded by the caller.
    pub fn walk_read(
        &self,
        read: &AlignedRead,
        chromosome_length: u64,
        visited: &mut VisitedPositions,
        events: &mut Vec<ReadEvent>,
    ) -> Result<(), MutationErr> {
        let md_tag = match read.md_tag.as_deref() {
            Some(md) if !md.is_empty() => MdTag::parse(md)?,
            _ => return Err(MutationErr::MissingAnnotation(read.name.clone())),
        };
        if read.cigar.is_empty() {
            return Err(MutationErr::MalformedAlignment(format!(
                "read {} has no CIGAR",
                read.name
            )));
        }

        visited.exclude_edges(read.reference_start, read.reference_end, self.excluded_bases);

        let mut cigar_stack = CigarStack::from_cigar(&read.cigar);
        let mut md_stack = MdTagStack::new(&md_tag);
        let mut reference_position = read.reference_start;
        let mut read_position: usize = 0;

        while let Some(cigar_op) = cigar_stack.pop_unit() {
            // MD tags skip insertions and soft clips
            let md_op = if cigar_op.has_md_counterpart() {
                md_stack.pop_unit()
            } else {
                None
            };
            let op = classify(cigar_op, md_op)?;

            let in_bounds =
                reference_position >= 0 && (reference_position as u64) < chromosome_length;
            // Soft-clipped bases are not marked: the other mate may still cover them
            if in_bounds
                && !visited.contains(reference_position)
                && op != GenericOperator::SoftClip
            {
                let read_base = if cigar_op.consumes_read_bases() {
                    read.sequence.get(read_position).copied()
                } else {
                    None
                };
                let op = match read_base {
                    Some(base) => op.with_read_base(base),
                    None => op,
                };
                events.push(ReadEvent {
                    position: reference_position,
                    strand: read.strand,
                    op,
                    read_base,
                });
                visited.insert(reference_position);
            }

            if cigar_op.consumes_reference_bases() {
                reference_position += 1;
            }
            if cigar_op.consumes_read_bases() {
                read_position += 1;
            }
        }

        if !md_stack.is_empty() {
            return Err(MutationErr::MalformedAlignment(format!(
                "read {}: MD tag describes {} more reference bases than the CIGAR",
                read.name,
                md_stack.units()
            )));
        }
        Ok(())
    }

    /// Walk every mate of a fragment against one shared visited set.
    pub fn walk_fragment(
        &self,
        fragment: &Fragment,
        profiles: &ProfileCollection,
        events: &mut Vec<ReadEvent>,
    ) -> Result<(), MutationErr> {
        if let Fragment::Pair(first, second) = fragment {
            if first.reference != second.reference {
                return Err(MutationErr::MalformedAlignment(format!(
                    "mates of {} map to different references ({} and {})",
                    first.name, first.reference, second.reference
                )));
            }
        }

        let mut visited = VisitedPositions::new();
        for read in fragment.mates() {
            let length = profiles
                .length(&read.reference)
                .ok_or_else(|| MutationErr::UnregisteredChromosome(read.reference.clone()))?;
            self.walk_read(read, length, &mut visited, events)?;
        }
        Ok(())
    }
}
