use crate::alignment_record::Strand;
use crate::profile::ProfileCollection;
use std::io::{self, Write};

/// Print a summary of a profile collection
pub fn write_stats<W: Write>(writer: &mut W, profiles: &ProfileCollection) -> io::Result<()> {
    let summary = profiles.summary();
    writeln!(writer, "Number of chromosomes: {}", summary.chromosomes)?;
    writeln!(
        writer,
        "Covered positions: {} positive, {} negative",
        summary.covered_positions[0], summary.covered_positions[1]
    )?;
    writeln!(writer, "Matches: {}", summary.matches)?;
    writeln!(writer, "Insertions: {}", summary.insertions)?;
    writeln!(writer, "Deletions: {}", summary.deletions)?;
    writeln!(writer, "Substitutions: {}", summary.substitutions)?;
    writeln!(writer, "Mean mutation rate: {:.6}", summary.mean_mutation_rate())?;

    let mut entries: Vec<(&str, usize)> = profiles
        .iter()
        .map(|chromosome| {
            let covered = [Strand::Positive, Strand::Negative]
                .into_iter()
                .map(|strand| chromosome.strand(strand).touched_positions().len())
                .sum();
            (chromosome.name(), covered)
        })
        .filter(|&(_, covered)| covered > 0)
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    if !entries.is_empty() {
        writeln!(writer, "\nTop chromosomes by covered positions:")?;
        for (idx, (name, covered)) in entries.iter().take(5).enumerate() {
            writeln!(writer, "{}. {}: {} positions", idx + 1, name, covered)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Counter;

    #[test]
    fn test_stats_report() {
        let mut profiles = ProfileCollection::new();
        profiles.register("chr1", 100).unwrap();
        profiles.register("chr2", 100).unwrap();
        profiles.register("chr3", 100).unwrap();
        profiles.record("chr1", Strand::Positive, 1, Counter::Match).unwrap();
        profiles.record("chr2", Strand::Positive, 1, Counter::Match).unwrap();
        profiles.record("chr2", Strand::Negative, 2, Counter::Deletion).unwrap();

        let mut buffer = Vec::new();
        write_stats(&mut buffer, &profiles).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Number of chromosomes: 3"));
        assert!(text.contains("Covered positions: 2 positive, 1 negative"));
        assert!(text.contains("Deletions: 1"));
        assert!(text.contains("1. chr2: 2 positions"));
        assert!(text.contains("2. chr1: 1 positions"));
        assert!(!text.contains("chr3:"));
    }
}
