//! Snapshot files for the partitioned index.
//!
//! A snapshot is the bincode encoding of [`IndexEnvelope`]. It carries no
//! magic bytes or format version. Writes go to a uniquely named sibling
//! `.tmp` file that is fsynced and then renamed over the target, so a crash
//! never leaves a half-written snapshot in place.

use crate::compute::spatial::SpatialTree;
use crate::config::FailurePolicy;
use crate::error::Result;
use crate::index::PartitionedIndex;
use bincode::Options;
use geoshard_types::point::Point;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Everything persisted for an index: its points and its reported count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEnvelope {
    pub points: Vec<Point>,
    pub count: i64,
}

pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file exists and is non-empty.
    pub fn has_data(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false)
    }

    /// Decode the envelope. A missing file is an I/O error; a truncated or
    /// garbled one is a codec error.
    pub fn load(&self) -> Result<IndexEnvelope> {
        let file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        let reader = BufReader::new(file);

        // Same wire format as `bincode::serialize_into`, but no length prefix
        // may claim more bytes than the file holds.
        let envelope = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(len)
            .deserialize_from(reader)?;
        Ok(envelope)
    }

    /// Atomically replace the file with `envelope`. On error the target is
    /// untouched and the temporary file is removed.
    pub fn save(&self, envelope: &IndexEnvelope) -> Result<()> {
        let temp_path = self.temp_path();

        let result = Self::write_synced(&temp_path, envelope)
            .and_then(|()| std::fs::rename(&temp_path, &self.path).map_err(Into::into));
        if let Err(e) = result {
            if let Err(cleanup) = std::fs::remove_file(&temp_path) {
                debug!("Could not remove {}: {}", temp_path.display(), cleanup);
            }
            return Err(e);
        }

        self.sync_parent_dir()
    }

    fn write_synced(temp_path: &Path, envelope: &IndexEnvelope) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;

        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, envelope)?;

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }

    /// A sibling of the target, unique per process and per save so
    /// concurrent saves never share one.
    fn temp_path(&self) -> PathBuf {
        static NEXT_SAVE: AtomicU64 = AtomicU64::new(0);

        let mut temp = self.path.clone();
        if let Some(name) = temp.file_name() {
            let new_name = format!(
                "{}.{}.{}.tmp",
                name.to_string_lossy(),
                std::process::id(),
                NEXT_SAVE.fetch_add(1, Ordering::Relaxed)
            );
            temp.set_file_name(new_name);
        }
        temp
    }

    fn sync_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
        Ok(())
    }
}

impl<T: SpatialTree> PartitionedIndex<T> {
    /// Write every indexed point to `path` and return how many were written.
    ///
    /// The points and the recorded count come from one read-lock acquisition,
    /// so the caller must not hold any lock on this index. The extraction is
    /// strict regardless of the configured failure policy: a failing
    /// partition aborts the save rather than producing a short file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let (outcome, count) = self.contents();
        let envelope = IndexEnvelope {
            points: outcome.into_result(FailurePolicy::Strict)?,
            count: count as i64,
        };
        let written = envelope.points.len();

        let snapshot = SnapshotFile::new(path);
        snapshot.save(&envelope)?;

        info!("Saved {} points to {}", written, snapshot.path().display());
        Ok(written)
    }
}

impl<T: SpatialTree + Default> PartitionedIndex<T> {
    /// Replace the contents of this index with the snapshot at `path` and
    /// return how many points were indexed.
    ///
    /// The clear and the rebuild happen under one write lock, so concurrent
    /// readers see either the old contents or the new ones. On error the index
    /// is left untouched.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let snapshot = SnapshotFile::new(path);
        let envelope = snapshot.load()?;
        let recorded = envelope.count;

        let stored = self.replace_all(envelope.points);
        if recorded != stored as i64 {
            warn!(
                "Snapshot {} recorded count {} but {} points were indexed",
                snapshot.path().display(),
                recorded,
                stored
            );
        }

        info!("Loaded {} points from {}", stored, snapshot.path().display());
        Ok(stored)
    }
}
