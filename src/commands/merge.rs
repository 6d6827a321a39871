use crate::output::{profile_suffixes, write_profiles, OutputOptions};
use crate::profile::ProfileCollection;
use log::{debug, info};
use std::io;
use std::path::Path;

/// Sum several snapshots into one collection, in the order given.
pub fn merge_snapshots(snapshots: &[String]) -> io::Result<ProfileCollection> {
    if snapshots.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "At least one snapshot is required",
        ));
    }

    let mut merged = ProfileCollection::new();
    for path in snapshots {
        let profiles = ProfileCollection::load(Path::new(path))?;
        debug!("Merging {} chromosomes from {}", profiles.len(), path);
        merged.merge(&profiles)?;
    }
    info!(
        "Merged {} snapshots into {} chromosome profiles",
        snapshots.len(),
        merged.len()
    );
    Ok(merged)
}

/// Merge snapshots and write the combined CSV and tracks (and optionally a combined snapshot).
pub fn run_merge(
    snapshots: &[String],
    output: &OutputOptions,
    coverage_threshold: u64,
    save_profiles: Option<&str>,
) -> io::Result<ProfileCollection> {
    output.check_overwrite(&profile_suffixes())?;
    if let Some(path) = save_profiles {
        if !output.force && Path::new(path).exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Output {} already exists (use --force to overwrite)", path),
            ));
        }
    }

    let merged = merge_snapshots(snapshots)?;
    write_profiles(output, &merged, coverage_threshold)?;
    if let Some(path) = save_profiles {
        merged.save(Path::new(path))?;
        info!("Saved merged profiles to {}", path);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_record::Strand;
    use crate::profile::Counter;
    use tempfile::TempDir;

    #[test]
    fn test_merge_snapshots() {
        let dir = TempDir::new().unwrap();

        let mut first = ProfileCollection::new();
        first.register("chr1", 50).unwrap();
        first.record("chr1", Strand::Positive, 10, Counter::Match).unwrap();
        let first_path = dir.path().join("a.mutprof");
        first.save(&first_path).unwrap();

        let mut second = ProfileCollection::new();
        second.register("chr1", 50).unwrap();
        second.register("chr2", 20).unwrap();
        second.record("chr1", Strand::Positive, 10, Counter::Deletion).unwrap();
        second.record("chr2", Strand::Negative, 3, Counter::Match).unwrap();
        let second_path = dir.path().join("b.mutprof");
        second.save(&second_path).unwrap();

        let merged = merge_snapshots(&[
            first_path.to_string_lossy().to_string(),
            second_path.to_string_lossy().to_string(),
        ])
        .unwrap();
        let counts = merged.counts("chr1", Strand::Positive, 10).unwrap();
        assert_eq!(counts.matches, 1);
        assert_eq!(counts.deletions, 1);
        assert_eq!(merged.counts("chr2", Strand::Negative, 3).unwrap().matches, 1);

        assert!(merge_snapshots(&[]).is_err());
    }

    #[test]
    fn test_merge_conflicting_lengths() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for (i, length) in [50u64, 60].into_iter().enumerate() {
            let mut profiles = ProfileCollection::new();
            profiles.register("chr1", length).unwrap();
            let path = dir.path().join(format!("{}.mutprof", i));
            profiles.save(&path).unwrap();
            paths.push(path.to_string_lossy().to_string());
        }
        let err = merge_snapshots(&paths).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
