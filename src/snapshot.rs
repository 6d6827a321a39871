//! Binary snapshots of a [`ProfileCollection`], so that runs over separate
//! inputs (or separate regions of one input) can be merged afterwards.

use crate::profile::{ChromosomeProfile, ProfileCollection};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

const SNAPSHOT_MAGIC: &[u8; 8] = b"MUTPROF1";
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ProfileSnapshot {
    version: u32,
    chromosomes: Vec<ChromosomeProfile>,
}

impl ProfileCollection {
    /// Write the collection to `path`: magic bytes, then the bincode-encoded profiles.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(SNAPSHOT_MAGIC)?;
        self.write_snapshot(&mut writer)?;
        writer.flush()?;
        debug!("Saved {} chromosome profiles to {:?}", self.len(), path);
        Ok(())
    }

    fn write_snapshot<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let snapshot = ProfileSnapshot {
            version: SNAPSHOT_VERSION,
            chromosomes: self.iter().cloned().collect(),
        };
        bincode::serde::encode_into_std_write(&snapshot, writer, bincode::config::standard())
            .map_err(io::Error::other)?;
        Ok(())
    }

    /// Read a collection written by [`ProfileCollection::save`].
    pub fn load(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic_buf = [0u8; 8];
        reader.read_exact(&mut magic_buf)?;
        if &magic_buf != SNAPSHOT_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid magic bytes in {:?}", path),
            ));
        }

        let snapshot: ProfileSnapshot =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Failed to decode profiles from {:?}: {e}", path),
                    )
                })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Unsupported snapshot version: {} (expected {})",
                    snapshot.version, SNAPSHOT_VERSION
                ),
            ));
        }

        // Re-check strand pairing, the encoded form bypasses the constructor
        let chromosomes = snapshot
            .chromosomes
            .into_iter()
            .map(|chromosome| {
                let (positive, negative) = chromosome.into_strands();
                ChromosomeProfile::new(positive, negative)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let collection = ProfileCollection::from_chromosomes(chromosomes)?;
        debug!("Loaded {} chromosome profiles from {:?}", collection.len(), path);
        Ok(collection)
    }
}
