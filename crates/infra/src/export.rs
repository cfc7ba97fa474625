//! CSV export of record sets.

use std::io;

use ::csv::WriterBuilder;

use crate::store::{Record, StorageError};

/// Write `records` as CSV with a header row, even when there are none.
pub fn write_csv<R: Record>(records: &[R], out: impl io::Write) -> Result<(), StorageError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(R::SET.columns())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Same as [`write_csv`], into a byte buffer.
pub fn to_csv_bytes<R: Record>(records: &[R]) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(buf)
}
