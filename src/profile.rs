//! Per-position mutation counters.
//!
//! Each registered chromosome owns two [`MutationProfile`]s, one per strand.
//! A profile keeps sparse position -> count maps for matches, insertions,
//! deletions and substitutions (broken down by the base the read carries).
//! Positions are 0-based reference coordinates.

use crate::alignment_record::Strand;
use crate::error::MutationErr;
use crate::nucleotide::Nucleotide;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Which counter a classified base increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Match,
    Insertion,
    Deletion,
    /// Substitution, keyed by the base found in the read
    Substitution(Nucleotide),
}

/// The three rates reported per position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKind {
    Mutation,
    Deletion,
    Substitution,
}

impl RateKind {
    pub const ALL: [RateKind; 3] = [RateKind::Mutation, RateKind::Deletion, RateKind::Substitution];

    pub fn label(self) -> &'static str {
        match self {
            RateKind::Mutation => "mutation",
            RateKind::Deletion => "deletion",
            RateKind::Substitution => "substitution",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rates {
    pub mutation: f64,
    pub deletion: f64,
    pub substitution: f64,
}

impl Rates {
    pub fn get(&self, kind: RateKind) -> f64 {
        match kind {
            RateKind::Mutation => self.mutation,
            RateKind::Deletion => self.deletion,
            RateKind::Substitution => self.substitution,
        }
    }
}

/// All counters at one position of one strand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionCounts {
    pub matches: u32,
    pub insertions: u32,
    pub deletions: u32,
    /// Indexed by `Nucleotide::index()`
    pub substitutions: [u32; 4],
}

impl PositionCounts {
    pub fn substitution_total(&self) -> u64 {
        self.substitutions.iter().map(|&c| c as u64).sum()
    }

    /// Reads that occupy the reference base: matches, deletions and substitutions.
    /// Insertions sit between reference bases and are left out.
    pub fn total(&self) -> u64 {
        self.matches as u64 + self.deletions as u64 + self.substitution_total()
    }

    /// True if anything at all was recorded here, insertions included
    pub fn is_touched(&self) -> bool {
        self.total() > 0 || self.insertions > 0
    }

    /// Rates over `total()`; all zero when nothing covers the position.
    pub fn rates(&self) -> Rates {
        let total = self.total();
        if total == 0 {
            return Rates::default();
        }
        let total = total as f64;
        let deletions = self.deletions as f64;
        let substitutions = self.substitution_total() as f64;
        Rates {
            mutation: (deletions + substitutions) / total,
            deletion: deletions / total,
            substitution: substitutions / total,
        }
    }
}

/// Counters for one strand of one chromosome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationProfile {
    chromosome: String,
    strand: Strand,
    length: u64,
    matches: FxHashMap<u64, u32>,
    insertions: FxHashMap<u64, u32>,
    deletions: FxHashMap<u64, u32>,
    substitutions: [FxHashMap<u64, u32>; 4],
}

impl MutationProfile {
    pub fn new(chromosome: &str, length: u64, strand: Strand) -> Result<Self, MutationErr> {
        if length == 0 {
            return Err(MutationErr::InvalidConfig(format!(
                "chromosome {} must have a positive length",
                chromosome
            )));
        }
        Ok(Self {
            chromosome: chromosome.to_string(),
            strand,
            length,
            matches: FxHashMap::default(),
            insertions: FxHashMap::default(),
            deletions: FxHashMap::default(),
            substitutions: Default::default(),
        })
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    fn counter_map(&mut self, counter: Counter) -> &mut FxHashMap<u64, u32> {
        match counter {
            Counter::Match => &mut self.matches,
            Counter::Insertion => &mut self.insertions,
            Counter::Deletion => &mut self.deletions,
            Counter::Substitution(n) => &mut self.substitutions[n.index()],
        }
    }

    /// Count one event at `position`
    pub fn increment(&mut self, counter: Counter, position: i64) -> Result<(), MutationErr> {
        self.add(counter, position, 1)
    }

    fn add(&mut self, counter: Counter, position: i64, amount: u32) -> Result<(), MutationErr> {
        if position < 0 || position as u64 >= self.length {
            return Err(MutationErr::OutOfRangePosition {
                chromosome: self.chromosome.clone(),
                position,
                length: self.length,
            });
        }
        let count = self.counter_map(counter).entry(position as u64).or_insert(0);
        *count = count.saturating_add(amount);
        Ok(())
    }

    pub fn count(&self, counter: Counter, position: u64) -> u32 {
        let map = match counter {
            Counter::Match => &self.matches,
            Counter::Insertion => &self.insertions,
            Counter::Deletion => &self.deletions,
            Counter::Substitution(n) => &self.substitutions[n.index()],
        };
        map.get(&position).copied().unwrap_or(0)
    }

    pub fn counts(&self, position: u64) -> PositionCounts {
        PositionCounts {
            matches: self.count(Counter::Match, position),
            insertions: self.count(Counter::Insertion, position),
            deletions: self.count(Counter::Deletion, position),
            substitutions: Nucleotide::ALL.map(|n| self.count(Counter::Substitution(n), position)),
        }
    }

    /// Every position with at least one recorded event, ascending
    pub fn touched_positions(&self) -> Vec<u64> {
        let mut positions: FxHashSet<u64> = FxHashSet::default();
        positions.extend(self.matches.keys());
        positions.extend(self.insertions.keys());
        positions.extend(self.deletions.keys());
        for map in &self.substitutions {
            positions.extend(map.keys());
        }
        let mut positions: Vec<u64> = positions.into_iter().collect();
        positions.sort_unstable();
        positions
    }

    /// Add every count of `other` (same chromosome, strand and length) into this profile.
    pub fn merge(&mut self, other: &MutationProfile) -> Result<(), MutationErr> {
        if other.chromosome != self.chromosome || other.strand != self.strand {
            return Err(MutationErr::InvalidConfig(format!(
                "cannot merge {}({}) into {}({})",
                other.chromosome, other.strand, self.chromosome, self.strand
            )));
        }
        if other.length != self.length {
            return Err(MutationErr::ConflictingLength {
                chromosome: self.chromosome.clone(),
                registered: self.length,
                requested: other.length,
            });
        }
        for (counter, map) in other.counter_maps() {
            for (&position, &count) in map {
                self.add(counter, position as i64, count)?;
            }
        }
        Ok(())
    }

    fn counter_maps(&self) -> Vec<(Counter, &FxHashMap<u64, u32>)> {
        let mut maps = vec![
            (Counter::Match, &self.matches),
            (Counter::Insertion, &self.insertions),
            (Counter::Deletion, &self.deletions),
        ];
        for n in Nucleotide::ALL {
            maps.push((Counter::Substitution(n), &self.substitutions[n.index()]));
        }
        maps
    }

    /// Sum of every counter over the whole strand
    pub fn totals(&self) -> PositionCounts {
        let sum = |map: &FxHashMap<u64, u32>| map.values().map(|&c| c as u64).sum::<u64>();
        let clamp = |value: u64| value.min(u32::MAX as u64) as u32;
        PositionCounts {
            matches: clamp(sum(&self.matches)),
            insertions: clamp(sum(&self.insertions)),
            deletions: clamp(sum(&self.deletions)),
            substitutions: Nucleotide::ALL.map(|n| clamp(sum(&self.substitutions[n.index()]))),
        }
    }
}

/// The positive and negative strand profiles of one chromosome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromosomeProfile {
    positive: MutationProfile,
    negative: MutationProfile,
}

impl ChromosomeProfile {
    pub fn new(positive: MutationProfile, negative: MutationProfile) -> Result<Self, MutationErr> {
        if positive.strand != Strand::Positive || negative.strand != Strand::Negative {
            return Err(MutationErr::InvalidConfig(
                "chromosome profile needs one positive and one negative strand profile".to_string(),
            ));
        }
        if positive.chromosome != negative.chromosome {
            return Err(MutationErr::InvalidConfig(format!(
                "strand profiles belong to different chromosomes ({} and {})",
                positive.chromosome, negative.chromosome
            )));
        }
        if positive.length != negative.length {
            return Err(MutationErr::InvalidConfig(format!(
                "strand profiles of {} have different lengths ({} and {})",
                positive.chromosome, positive.length, negative.length
            )));
        }
        Ok(Self { positive, negative })
    }

    pub(crate) fn into_strands(self) -> (MutationProfile, MutationProfile) {
        (self.positive, self.negative)
    }

    pub fn name(&self) -> &str {
        &self.positive.chromosome
    }

    pub fn length(&self) -> u64 {
        self.positive.length
    }

    pub fn strand(&self, strand: Strand) -> &MutationProfile {
        match strand {
            Strand::Positive => &self.positive,
            Strand::Negative => &self.negative,
        }
    }

    fn strand_mut(&mut self, strand: Strand) -> &mut MutationProfile {
        match strand {
            Strand::Positive => &mut self.positive,
            Strand::Negative => &mut self.negative,
        }
    }

    /// Positions touched on either strand, ascending
    pub fn touched_positions(&self) -> Vec<u64> {
        let mut positions = self.positive.touched_positions();
        positions.extend(self.negative.touched_positions());
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// `(position, rate)` pairs for one strand, restricted to covered positions with a nonzero rate
    pub fn track(&self, strand: Strand, kind: RateKind, coverage_threshold: u64) -> Vec<(u64, f64)> {
        let profile = self.strand(strand);
        profile
            .touched_positions()
            .into_iter()
            .filter_map(|position| {
                let counts = profile.counts(position);
                let rate = counts.rates().get(kind);
                (counts.total() >= coverage_threshold && rate != 0.0).then_some((position, rate))
            })
            .collect()
    }
}

/// One row of the tabular output
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord<'a> {
    pub chromosome: &'a str,
    pub strand: Strand,
    /// 0-based
    pub position: u64,
    pub counts: PositionCounts,
}

impl PositionRecord<'_> {
    pub fn rates(&self) -> Rates {
        self.counts.rates()
    }
}

/// Aggregate numbers over a whole collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSummary {
    pub chromosomes: usize,
    pub covered_positions: [usize; 2],
    pub matches: u64,
    pub insertions: u64,
    pub deletions: u64,
    pub substitutions: u64,
}

impl ProfileSummary {
    pub fn mean_mutation_rate(&self) -> f64 {
        let total = self.matches + self.deletions + self.substitutions;
        if total == 0 {
            0.0
        } else {
            (self.deletions + self.substitutions) as f64 / total as f64
        }
    }
}

/// Chromosome profiles keyed by name, iterated in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCollection {
    chromosomes: Vec<ChromosomeProfile>,
    name_to_id: FxHashMap<String, usize>,
}

impl ProfileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a collection from chromosome profiles, rejecting duplicate names.
    pub fn from_chromosomes(chromosomes: Vec<ChromosomeProfile>) -> Result<Self, MutationErr> {
        let mut collection = Self::new();
        for chromosome in chromosomes {
            if collection.name_to_id.contains_key(chromosome.name()) {
                return Err(MutationErr::InvalidConfig(format!(
                    "chromosome {} appears twice",
                    chromosome.name()
                )));
            }
            collection
                .name_to_id
                .insert(chromosome.name().to_string(), collection.chromosomes.len());
            collection.chromosomes.push(chromosome);
        }
        Ok(collection)
    }

    /// Register a chromosome. Registering the same name again with the same length is a no-op.
    pub fn register(&mut self, chromosome: &str, length: u64) -> Result<(), MutationErr> {
        if let Some(&id) = self.name_to_id.get(chromosome) {
            let registered = self.chromosomes[id].length();
            if registered != length {
                return Err(MutationErr::ConflictingLength {
                    chromosome: chromosome.to_string(),
                    registered,
                    requested: length,
                });
            }
            return Ok(());
        }

        let profile = ChromosomeProfile::new(
            MutationProfile::new(chromosome, length, Strand::Positive)?,
            MutationProfile::new(chromosome, length, Strand::Negative)?,
        )?;
        self.name_to_id
            .insert(chromosome.to_string(), self.chromosomes.len());
        self.chromosomes.push(profile);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn get(&self, chromosome: &str) -> Option<&ChromosomeProfile> {
        self.name_to_id
            .get(chromosome)
            .map(|&id| &self.chromosomes[id])
    }

    pub fn length(&self, chromosome: &str) -> Option<u64> {
        self.get(chromosome).map(ChromosomeProfile::length)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChromosomeProfile> + '_ {
        self.chromosomes.iter()
    }

    /// Count one event. Fails for unregistered chromosomes and positions outside the chromosome.
    pub fn record(
        &mut self,
        chromosome: &str,
        strand: Strand,
        position: i64,
        counter: Counter,
    ) -> Result<(), MutationErr> {
        let id = *self
            .name_to_id
            .get(chromosome)
            .ok_or_else(|| MutationErr::UnregisteredChromosome(chromosome.to_string()))?;
        self.chromosomes[id]
            .strand_mut(strand)
            .increment(counter, position)
    }

    pub fn counts(&self, chromosome: &str, strand: Strand, position: u64) -> Option<PositionCounts> {
        self.get(chromosome)
            .map(|profile| profile.strand(strand).counts(position))
    }

    /// Add all counts of `other` into this collection; chromosomes unknown here are appended.
    ///
    /// Lengths are checked for every chromosome before anything is summed, so a
    /// conflict leaves `self` untouched.
    pub fn merge(&mut self, other: &ProfileCollection) -> Result<(), MutationErr> {
        for chromosome in other.iter() {
            if let Some(registered) = self.length(chromosome.name()) {
                if registered != chromosome.length() {
                    return Err(MutationErr::ConflictingLength {
                        chromosome: chromosome.name().to_string(),
                        registered,
                        requested: chromosome.length(),
                    });
                }
            }
        }
        for chromosome in other.iter() {
            self.register(chromosome.name(), chromosome.length())?;
            let id = self.name_to_id[chromosome.name()];
            for strand in [Strand::Positive, Strand::Negative] {
                self.chromosomes[id]
                    .strand_mut(strand)
                    .merge(chromosome.strand(strand))?;
            }
        }
        Ok(())
    }

    /// Tabular rows: registration order, then position, positive strand before negative.
    ///
    /// Only positions with something recorded and a total of at least `coverage_threshold` are listed.
    pub fn records(&self, coverage_threshold: u64) -> Vec<PositionRecord<'_>> {
        let mut records = Vec::new();
        for chromosome in &self.chromosomes {
            for position in chromosome.touched_positions() {
                for strand in [Strand::Positive, Strand::Negative] {
                    let counts = chromosome.strand(strand).counts(position);
                    if counts.is_touched() && counts.total() >= coverage_threshold {
                        records.push(PositionRecord {
                            chromosome: chromosome.name(),
                            strand,
                            position,
                            counts,
                        });
                    }
                }
            }
        }
        records
    }

    pub fn summary(&self) -> ProfileSummary {
        let mut summary = ProfileSummary {
            chromosomes: self.chromosomes.len(),
            ..Default::default()
        };
        for chromosome in &self.chromosomes {
            for (i, strand) in [Strand::Positive, Strand::Negative].into_iter().enumerate() {
                let profile = chromosome.strand(strand);
                summary.covered_positions[i] += profile.touched_positions().len();
                let totals = profile.totals();
                summary.matches += totals.matches as u64;
                summary.insertions += totals.insertions as u64;
                summary.deletions += totals.deletions as u64;
                summary.substitutions += totals.substitution_total();
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_are_zero_without_coverage() {
        let counts = PositionCounts {
            insertions: 3,
            ..Default::default()
        };
        assert_eq!(counts.total(), 0);
        let rates = counts.rates();
        assert_eq!(rates.mutation, 0.0);
        assert_eq!(rates.deletion, 0.0);
        assert_eq!(rates.substitution, 0.0);
        assert!(counts.is_touched());
        assert!(!PositionCounts::default().is_touched());
    }

    #[test]
    fn test_rates() {
        let counts = PositionCounts {
            matches: 6,
            insertions: 5,
            deletions: 2,
            substitutions: [1, 0, 1, 0],
        };
        assert_eq!(counts.total(), 10);
        let rates = counts.rates();
        assert!((rates.mutation - 0.4).abs() < 1e-12);
        assert!((rates.deletion - 0.2).abs() < 1e-12);
        assert!((rates.substitution - 0.2).abs() < 1e-12);
        assert_eq!(rates.get(RateKind::Deletion), rates.deletion);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut profiles = ProfileCollection::new();
        profiles.register("chr1", 1000).unwrap();
        profiles.register("chr2", 500).unwrap();
        profiles.register("chr1", 1000).unwrap();
        assert_eq!(profiles.len(), 2);
        assert!(matches!(
            profiles.register("chr1", 999),
            Err(MutationErr::ConflictingLength { registered: 1000, requested: 999, .. })
        ));
        assert!(profiles.register("chr3", 0).is_err());
        let names: Vec<_> = profiles.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_record_and_read_back() {
        let mut profiles = ProfileCollection::new();
        profiles.register("chr1", 100).unwrap();
        profiles.record("chr1", Strand::Positive, 10, Counter::Match).unwrap();
        profiles.record("chr1", Strand::Positive, 10, Counter::Match).unwrap();
        profiles
            .record("chr1", Strand::Positive, 10, Counter::Substitution(Nucleotide::G))
            .unwrap();
        profiles.record("chr1", Strand::Negative, 10, Counter::Deletion).unwrap();

        let positive = profiles.counts("chr1", Strand::Positive, 10).unwrap();
        assert_eq!(positive.matches, 2);
        assert_eq!(positive.substitutions, [0, 0, 1, 0]);
        let negative = profiles.counts("chr1", Strand::Negative, 10).unwrap();
        assert_eq!(negative.deletions, 1);
        assert_eq!(negative.matches, 0);
        assert_eq!(
            profiles.counts("chr1", Strand::Positive, 11).unwrap(),
            PositionCounts::default()
        );
    }

    #[test]
    fn test_record_rejects_bad_targets() {
        let mut profiles = ProfileCollection::new();
        profiles.register("chr1", 100).unwrap();
        assert!(matches!(
            profiles.record("chrX", Strand::Positive, 1, Counter::Match),
            Err(MutationErr::UnregisteredChromosome(_))
        ));
        assert!(matches!(
            profiles.record("chr1", Strand::Positive, 100, Counter::Match),
            Err(MutationErr::OutOfRangePosition { .. })
        ));
        assert!(matches!(
            profiles.record("chr1", Strand::Positive, -1, Counter::Match),
            Err(MutationErr::OutOfRangePosition { .. })
        ));
    }

    #[test]
    fn test_chromosome_profile_validation() {
        let pos = MutationProfile::new("chr1", 10, Strand::Positive).unwrap();
        let neg = MutationProfile::new("chr1", 10, Strand::Negative).unwrap();
        let other_len = MutationProfile::new("chr1", 11, Strand::Negative).unwrap();
        let other_name = MutationProfile::new("chr2", 10, Strand::Negative).unwrap();
        assert!(ChromosomeProfile::new(pos.clone(), neg.clone()).is_ok());
        assert!(ChromosomeProfile::new(neg.clone(), pos.clone()).is_err());
        assert!(ChromosomeProfile::new(pos.clone(), other_len).is_err());
        assert!(ChromosomeProfile::new(pos, other_name).is_err());
    }

    #[test]
    fn test_records_order_and_threshold() {
        let mut profiles = ProfileCollection::new();
        profiles.register("chr2", 50).unwrap();
        profiles.register("chr1", 50).unwrap();
        profiles.record("chr1", Strand::Negative, 3, Counter::Match).unwrap();
        profiles.record("chr1", Strand::Positive, 3, Counter::Deletion).unwrap();
        profiles.record("chr1", Strand::Positive, 1, Counter::Match).unwrap();
        profiles.record("chr1", Strand::Positive, 1, Counter::Match).unwrap();
        profiles.record("chr2", Strand::Positive, 7, Counter::Insertion).unwrap();

        let rows: Vec<_> = profiles
            .records(0)
            .into_iter()
            .map(|r| (r.chromosome, r.strand, r.position))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("chr2", Strand::Positive, 7),
                ("chr1", Strand::Positive, 1),
                ("chr1", Strand::Positive, 3),
                ("chr1", Strand::Negative, 3),
            ]
        );

        let rows: Vec<_> = profiles
            .records(2)
            .into_iter()
            .map(|r| (r.chromosome, r.position))
            .collect();
        assert_eq!(rows, vec![("chr1", 1)]);
    }

    #[test]
    fn test_track_filters() {
        let mut profiles = ProfileCollection::new();
        profiles.register("chr1", 50).unwrap();
        for _ in 0..3 {
            profiles.record("chr1", Strand::Positive, 5, Counter::Match).unwrap();
        }
        profiles.record("chr1", Strand::Positive, 5, Counter::Deletion).unwrap();
        profiles.record("chr1", Strand::Positive, 6, Counter::Match).unwrap();
        profiles
            .record("chr1", Strand::Positive, 7, Counter::Substitution(Nucleotide::A))
            .unwrap();

        let chr1 = profiles.get("chr1").unwrap();
        assert_eq!(
            chr1.track(Strand::Positive, RateKind::Deletion, 1),
            vec![(5, 0.25)]
        );
        assert_eq!(
            chr1.track(Strand::Positive, RateKind::Mutation, 1),
            vec![(5, 0.25), (7, 1.0)]
        );
        assert_eq!(
            chr1.track(Strand::Positive, RateKind::Mutation, 2),
            vec![(5, 0.25)]
        );
        assert!(chr1.track(Strand::Negative, RateKind::Mutation, 0).is_empty());
    }

    #[test]
    fn test_merge_sums_counts() {
        let mut left = ProfileCollection::new();
        left.register("chr1", 20).unwrap();
        left.record("chr1", Strand::Positive, 2, Counter::Match).unwrap();

        let mut right = ProfileCollection::new();
        right.register("chr1", 20).unwrap();
        right.register("chr2", 30).unwrap();
        right.record("chr1", Strand::Positive, 2, Counter::Match).unwrap();
        right.record("chr2", Strand::Negative, 29, Counter::Insertion).unwrap();

        left.merge(&right).unwrap();
        assert_eq!(left.counts("chr1", Strand::Positive, 2).unwrap().matches, 2);
        assert_eq!(left.counts("chr2", Strand::Negative, 29).unwrap().insertions, 1);
        assert_eq!(left.len(), 2);

        let mut conflicting = ProfileCollection::new();
        conflicting.register("chr1", 21).unwrap();
        assert!(matches!(
            left.merge(&conflicting),
            Err(MutationErr::ConflictingLength { .. })
        ));
    }

    #[test]
    fn test_counts_saturate() {
        let mut profile = MutationProfile::new("chr1", 10, Strand::Positive).unwrap();
        profile.add(Counter::Match, 3, u32::MAX - 1).unwrap();
        profile.increment(Counter::Match, 3).unwrap();
        profile.increment(Counter::Match, 3).unwrap();
        assert_eq!(profile.count(Counter::Match, 3), u32::MAX);

        let other = profile.clone();
        profile.merge(&other).unwrap();
        assert_eq!(profile.count(Counter::Match, 3), u32::MAX);
    }

    #[test]
    fn test_merge_conflict_leaves_collection_untouched() {
        let mut left = ProfileCollection::new();
        left.register("chr1", 20).unwrap();
        left.register("chr2", 30).unwrap();
        left.record("chr1", Strand::Positive, 2, Counter::Match).unwrap();
        let before = left.clone();

        let mut right = ProfileCollection::new();
        right.register("chr3", 10).unwrap();
        right.register("chr1", 20).unwrap();
        right.register("chr2", 31).unwrap();
        right.record("chr1", Strand::Positive, 2, Counter::Match).unwrap();

        let err = left.merge(&right).unwrap_err();
        assert!(matches!(err, MutationErr::ConflictingLength { .. }));
        assert_eq!(left, before);
        assert_eq!(left.len(), 2);
        assert_eq!(left.counts("chr1", Strand::Positive, 2).unwrap().matches, 1);
    }

    #[test]
    fn test_summary() {
        let mut profiles = ProfileCollection::new();
        profiles.register("chr1", 20).unwrap();
        profiles.record("chr1", Strand::Positive, 1, Counter::Match).unwrap();
        profiles.record("chr1", Strand::Positive, 2, Counter::Match).unwrap();
        profiles.record("chr1", Strand::Negative, 2, Counter::Deletion).unwrap();
        profiles
            .record("chr1", Strand::Negative, 4, Counter::Substitution(Nucleotide::T))
            .unwrap();
        profiles.record("chr1", Strand::Negative, 4, Counter::Insertion).unwrap();

        let summary = profiles.summary();
        assert_eq!(summary.chromosomes, 1);
        assert_eq!(summary.covered_positions, [2, 2]);
        assert_eq!(summary.matches, 2);
        assert_eq!(summary.deletions, 1);
        assert_eq!(summary.substitutions, 1);
        assert_eq!(summary.insertions, 1);
        assert!((summary.mean_mutation_rate() - 0.5).abs() < 1e-12);
    }
}
