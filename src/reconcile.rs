use crate::cigar::AlignmentOperator;
use crate::error::MutationErr;
use crate::md_tag::MismatchOperator;
use crate::operator::GenericOperator;

/// Combine one CIGAR unit with one MD unit into a single operator.
///
/// Insertions and soft clips are absent from the MD tag, so `md` is not
/// consulted for them (and is usually `None`). Every other supported CIGAR
/// operator needs an MD unit; a missing one means the MD tag describes fewer
/// reference bases than the CIGAR.
pub fn classify(
    cigar: AlignmentOperator,
    md: Option<MismatchOperator>,
) -> Result<GenericOperator, MutationErr> {
    match cigar {
        AlignmentOperator::Insertion => Ok(GenericOperator::Insertion),
        AlignmentOperator::SoftClip => Ok(GenericOperator::SoftClip),
        AlignmentOperator::Match => classify_match(require_md(cigar, md)?),
        AlignmentOperator::Deletion => classify_deletion(require_md(cigar, md)?),
        other => Err(MutationErr::MalformedAlignment(format!(
            "unsupported CIGAR operator {} (only M, I, D and S are recognized)",
            other
        ))),
    }
}

fn require_md(
    cigar: AlignmentOperator,
    md: Option<MismatchOperator>,
) -> Result<MismatchOperator, MutationErr> {
    md.ok_or_else(|| {
        MutationErr::MalformedAlignment(format!(
            "MD tag exhausted while CIGAR still has {} bases",
            cigar
        ))
    })
}

fn classify_match(md: MismatchOperator) -> Result<GenericOperator, MutationErr> {
    match md {
        MismatchOperator::ExactMatch => Ok(GenericOperator::Match),
        MismatchOperator::GenericMismatch => Ok(GenericOperator::UnknownMismatch),
        MismatchOperator::Ignore => Ok(GenericOperator::Unknown),
        MismatchOperator::MismatchFromA
        | MismatchOperator::MismatchFromC
        | MismatchOperator::MismatchFromG
        | MismatchOperator::MismatchFromT => match md.reference_base() {
            Some(base) => Ok(GenericOperator::substitution(base, None)),
            None => Err(incompatible(AlignmentOperator::Match, md)),
        },
        _ => Err(incompatible(AlignmentOperator::Match, md)),
    }
}

fn classify_deletion(md: MismatchOperator) -> Result<GenericOperator, MutationErr> {
    if md.is_deletion() {
        Ok(GenericOperator::deletion_of(md.reference_base()))
    } else {
        Err(incompatible(AlignmentOperator::Deletion, md))
    }
}

fn incompatible(cigar: AlignmentOperator, md: MismatchOperator) -> MutationErr {
    MutationErr::Incompatible {
        cigar: cigar.code(),
        md: md.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AlignmentOperator as A;
    use GenericOperator as G;
    use MismatchOperator as M;

    #[test]
    fn test_match_column() {
        assert_eq!(classify(A::Match, Some(M::ExactMatch)).unwrap(), G::Match);
        assert_eq!(classify(A::Match, Some(M::MismatchFromA)).unwrap(), G::AToN);
        assert_eq!(classify(A::Match, Some(M::MismatchFromC)).unwrap(), G::CToN);
        assert_eq!(classify(A::Match, Some(M::MismatchFromG)).unwrap(), G::GToN);
        assert_eq!(classify(A::Match, Some(M::MismatchFromT)).unwrap(), G::TToN);
        assert_eq!(classify(A::Match, Some(M::Ignore)).unwrap(), G::Unknown);
        assert_eq!(
            classify(A::Match, Some(M::GenericMismatch)).unwrap(),
            G::UnknownMismatch
        );
    }

    #[test]
    fn test_deletion_column() {
        assert_eq!(classify(A::Deletion, Some(M::GenericDeletion)).unwrap(), G::Deletion);
        assert_eq!(classify(A::Deletion, Some(M::DeletionOfA)).unwrap(), G::DeletionOfA);
        assert_eq!(classify(A::Deletion, Some(M::DeletionOfC)).unwrap(), G::DeletionOfC);
        assert_eq!(classify(A::Deletion, Some(M::DeletionOfG)).unwrap(), G::DeletionOfG);
        assert_eq!(classify(A::Deletion, Some(M::DeletionOfT)).unwrap(), G::DeletionOfT);
    }

    #[test]
    fn test_md_ignored_for_insertions_and_soft_clips() {
        for md in MismatchOperator::ALL {
            assert_eq!(classify(A::Insertion, Some(md)).unwrap(), G::Insertion);
            assert_eq!(classify(A::SoftClip, Some(md)).unwrap(), G::SoftClip);
        }
        assert_eq!(classify(A::Insertion, None).unwrap(), G::Insertion);
        assert_eq!(classify(A::SoftClip, None).unwrap(), G::SoftClip);
    }

    #[test]
    fn test_incompatible_pairs() {
        for md in [M::DeletionOfA, M::GenericDeletion, M::DeletionOfT] {
            assert!(matches!(
                classify(A::Match, Some(md)),
                Err(MutationErr::Incompatible { cigar: 'M', .. })
            ));
        }
        for md in [M::ExactMatch, M::MismatchFromG, M::Ignore, M::GenericMismatch] {
            assert!(matches!(
                classify(A::Deletion, Some(md)),
                Err(MutationErr::Incompatible { cigar: 'D', .. })
            ));
        }
    }

    #[test]
    fn test_unsupported_and_exhausted() {
        for op in [A::Skip, A::HardClip, A::Padding, A::SequenceMatch, A::SequenceMismatch] {
            assert!(matches!(
                classify(op, Some(M::ExactMatch)),
                Err(MutationErr::MalformedAlignment(_))
            ));
        }
        assert!(matches!(
            classify(A::Match, None),
            Err(MutationErr::MalformedAlignment(_))
        ));
        assert!(matches!(
            classify(A::Deletion, None),
            Err(MutationErr::MalformedAlignment(_))
        ));
    }
}
