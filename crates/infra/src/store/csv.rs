//! Flat-file backend: one CSV file per record set, with a header row.
//!
//! Every mutation rewrites the whole file through a sibling temp file and a
//! rename, so a crash mid-write leaves the previous version in place.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use ::csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, info};

use super::{Record, RecordSet, RecordStore, StorageError};

#[derive(Debug)]
pub struct CsvRecordStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles across all files.
    write_lock: Mutex<()>,
}

impl CsvRecordStore {
    /// Open (and create if needed) a data directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(set: RecordSet) -> &'static str {
        match set {
            RecordSet::Users => "users.csv",
            RecordSet::Items => "inventory.csv",
            RecordSet::Receipts => "receipts.csv",
            RecordSet::Issues => "issues.csv",
            RecordSet::Tombstones => "tombstones.csv",
        }
    }

    fn path(&self, set: RecordSet) -> PathBuf {
        self.dir.join(Self::file_name(set))
    }

    fn read<R: Record>(&self) -> Result<Vec<R>, StorageError> {
        Ok(self.read_with_layout::<R>()?.0)
    }

    /// Rows plus whether the file header already matches [`RecordSet::columns`].
    fn read_with_layout<R: Record>(&self) -> Result<(Vec<R>, bool), StorageError> {
        let path = self.path(R::SET);
        if !path.exists() {
            return Ok((vec![], true));
        }
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(&path)?;
        let current = reader.headers()?.iter().eq(R::SET.columns().iter().copied());
        let mut out = Vec::new();
        for row in reader.deserialize::<R>() {
            out.push(row?);
        }
        Ok((out, current))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.write_lock
            .lock()
            .map_err(|_| StorageError::Lock(format!("csv store at {}", self.dir.display())))
    }

    fn write<R: Record>(&self, records: &[R]) -> Result<(), StorageError> {
        let path = self.path(R::SET);
        let tmp = path.with_extension("csv.tmp");
        {
            let file = BufWriter::new(File::create(&tmp)?);
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
            writer.write_record(R::SET.columns())?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(set = %R::SET, rows = records.len(), path = %path.display(), "record set written");
        Ok(())
    }

    fn modify<R, F>(&self, f: F) -> Result<(), StorageError>
    where
        R: Record,
        F: FnOnce(&mut Vec<R>) -> Result<(), StorageError>,
    {
        let _guard = self.lock()?;
        let mut records = self.read::<R>()?;
        f(&mut records)?;
        self.write(&records)
    }
}

impl RecordStore for CsvRecordStore {
    /// Files written with an older column layout are rewritten in the current
    /// one, so defaulted fields (such as minted transaction ids) stick.
    fn load_all<R: Record>(&self) -> Result<Vec<R>, StorageError> {
        let _guard = self.lock()?;
        let (records, current) = self.read_with_layout::<R>()?;
        if !current {
            self.write(&records)?;
            info!(set = %R::SET, rows = records.len(), "record set upgraded to current columns");
        }
        Ok(records)
    }

    fn insert<R: Record>(&self, record: &R) -> Result<(), StorageError> {
        self.modify::<R, _>(|records| {
            let key = record.key();
            if records.iter().any(|r| r.key() == key) {
                return Err(StorageError::DuplicateKey { set: R::SET, key });
            }
            records.push(record.clone());
            Ok(())
        })
    }

    fn update<R: Record>(&self, key: &str, record: &R) -> Result<(), StorageError> {
        self.modify::<R, _>(|records| {
            let slot = records
                .iter_mut()
                .find(|r| r.key() == key)
                .ok_or_else(|| StorageError::MissingKey {
                    set: R::SET,
                    key: key.to_string(),
                })?;
            *slot = record.clone();
            Ok(())
        })
    }

    fn delete<R: Record>(&self, key: &str) -> Result<(), StorageError> {
        self.modify::<R, _>(|records| {
            let before = records.len();
            records.retain(|r| r.key() != key);
            if records.len() == before {
                return Err(StorageError::MissingKey {
                    set: R::SET,
                    key: key.to_string(),
                });
            }
            Ok(())
        })
    }
}
