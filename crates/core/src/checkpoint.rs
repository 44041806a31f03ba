//! Trainer persistence.
//!
//! A checkpoint is one opaque bincode blob holding the iteration counter,
//! the RNG state, and both tables. Saves go through a sibling temporary
//! file and a rename, so a crash mid-write leaves the previous checkpoint
//! intact. The same format doubles as the play-time artifact: a
//! strategy-only export simply ships empty regrets.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cfr::ACTION_SLOTS;

const FORMAT_VERSION: u32 = 1;

/// Errors in checkpoint persistence.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt checkpoint: {0}")]
    Corrupt(String),

    #[error("checkpoint format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },
}

/// A trainer snapshot: everything needed to resume training exactly, or
/// to serve decisions at play time.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Iterations completed when the snapshot was taken.
    pub iteration: u64,
    /// RNG state at the snapshot; resuming from it replays the same
    /// stream an uninterrupted run would have drawn.
    pub rng_state: u64,
    /// Cumulative regrets. Empty in strategy-only exports.
    pub regret_sum: FxHashMap<String, [f64; ACTION_SLOTS]>,
    /// Cumulative strategy weights.
    pub strategy_sum: FxHashMap<String, [f64; ACTION_SLOTS]>,
}

/// On-disk shape. Plain `HashMap` and `Vec` keep serde derive happy
/// without dragging hasher types into the format.
#[derive(Serialize, Deserialize)]
struct WireCheckpoint {
    version: u32,
    iteration: u64,
    rng_state: u64,
    strategy_sum: HashMap<String, Vec<f64>>,
    regret_sum: HashMap<String, Vec<f64>>,
}

impl Checkpoint {
    /// A copy with regrets stripped, for distribution to the play side.
    /// Loading it restores the averaged strategy but cannot resume
    /// training losslessly.
    #[must_use]
    pub fn strategy_only(&self) -> Self {
        Self {
            iteration: self.iteration,
            rng_state: self.rng_state,
            regret_sum: FxHashMap::default(),
            strategy_sum: self.strategy_sum.clone(),
        }
    }

    /// Atomically write the checkpoint to `path`.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::Io`] on filesystem failure,
    /// [`CheckpointError::Serialization`] if encoding fails. On error the
    /// previous file at `path`, if any, is left untouched.
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        let wire = WireCheckpoint {
            version: FORMAT_VERSION,
            iteration: self.iteration,
            rng_state: self.rng_state,
            strategy_sum: rows_to_wire(&self.strategy_sum),
            regret_sum: rows_to_wire(&self.regret_sum),
        };

        let tmp_path = path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, &wire)
                .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Load a checkpoint from `path`.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::Io`] if the file cannot be opened,
    /// [`CheckpointError::Corrupt`] if the blob does not decode or a table
    /// row has the wrong width, [`CheckpointError::VersionMismatch`] for a
    /// foreign format version.
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let wire: WireCheckpoint = bincode::deserialize_from(reader)
            .map_err(|e| CheckpointError::Corrupt(e.to_string()))?;

        if wire.version != FORMAT_VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: FORMAT_VERSION,
                actual: wire.version,
            });
        }

        Ok(Self {
            iteration: wire.iteration,
            rng_state: wire.rng_state,
            regret_sum: rows_from_wire(wire.regret_sum)?,
            strategy_sum: rows_from_wire(wire.strategy_sum)?,
        })
    }
}

fn rows_to_wire(rows: &FxHashMap<String, [f64; ACTION_SLOTS]>) -> HashMap<String, Vec<f64>> {
    rows.iter()
        .map(|(key, row)| (key.clone(), row.to_vec()))
        .collect()
}

fn rows_from_wire(
    rows: HashMap<String, Vec<f64>>,
) -> Result<FxHashMap<String, [f64; ACTION_SLOTS]>, CheckpointError> {
    rows.into_iter()
        .map(|(key, row)| {
            let width = row.len();
            let row: [f64; ACTION_SLOTS] = row.try_into().map_err(|_| {
                CheckpointError::Corrupt(format!(
                    "table row for {key} has width {width}, expected {ACTION_SLOTS}"
                ))
            })?;
            Ok((key, row))
        })
        .collect()
}
