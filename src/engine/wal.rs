//! ARBOR - Write-Ahead Log (WAL)
//! Provides durability by logging all mutations to disk
//! before they are applied to the in-memory entry table.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};
use crate::types::Entry;

use super::keycodec;
use super::table::EntryTable;

/// A logged mutation, as decoded during recovery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum WalRecord {
    /// Create or fully replace an entry.
    Set(Entry),
    /// Remove a batch of encoded paths atomically.
    Delete(Vec<String>),
}

/// Borrowed form of `WalRecord` used on the write path.
/// Variant order must match `WalRecord`; bincode encodes both identically.
#[derive(Debug, Serialize)]
enum WalFrame<'a> {
    Set(&'a Entry),
    Delete(&'a [String]),
}

/// Frame header: payload length.
const LEN_SIZE: usize = 4;
/// Frame trailer: CRC32 of the payload.
const CRC_SIZE: usize = 4;

/// Write-Ahead Log for crash recovery and durability.
///
/// ## Binary Format (per frame)
/// ```text
/// [payload_len: 4 bytes (LE)][payload: bincode(WalRecord)][crc: 4 bytes (LE)]
/// ```
pub struct WriteAheadLog {
    /// Path to the WAL file on disk.
    path: PathBuf,
    /// File handle opened for appending.
    file: File,
    /// Whether each append is fsynced.
    sync: bool,
}

impl WriteAheadLog {
    /// Open or create a WAL file at the specified path.
    pub fn open(path: PathBuf, sync: bool) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file, sync })
    }

    /// Encode a record into a checksummed frame.
    fn encode(record: &WalFrame<'_>) -> Result<Bytes> {
        let payload = bincode::serialize(record)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| ArborError::Serialization("WAL record exceeds 4 GiB".into()))?;
        let mut buf = BytesMut::with_capacity(LEN_SIZE + payload.len() + CRC_SIZE);
        buf.put_u32_le(len);
        buf.put_slice(&payload);
        buf.put_u32_le(crc32fast::hash(&payload));
        Ok(buf.freeze())
    }

    fn append(&mut self, record: &WalFrame<'_>) -> Result<()> {
        let frame = Self::encode(record)?;
        self.file.write_all(&frame)?;
        if self.sync {
            self.file.sync_all()?; // fsync for durability
        }
        Ok(())
    }

    /// Append a SET operation. Must complete before the table is mutated.
    pub fn append_set(&mut self, entry: &Entry) -> Result<()> {
        self.append(&WalFrame::Set(entry))
    }

    /// Append a DELETE of one or more paths as a single frame.
    pub fn append_delete(&mut self, paths: &[String]) -> Result<()> {
        self.append(&WalFrame::Delete(paths))
    }

    /// Replay the WAL at `path` into a fresh table.
    ///
    /// A missing file yields an empty table. A trailing partial frame
    /// (torn write during a crash) is dropped with a warning; a checksum
    /// mismatch on a complete frame is reported as corruption.
    pub fn recover(path: &Path) -> Result<EntryTable> {
        let mut table = EntryTable::new();
        if !path.exists() {
            return Ok(table);
        }

        let mut data = Bytes::from(fs::read(path)?);
        let mut frames = 0usize;

        while data.has_remaining() {
            if data.remaining() < LEN_SIZE {
                log::warn!("WAL {:?}: dropping {} trailing bytes", path, data.remaining());
                break;
            }
            let len = (&data[..LEN_SIZE]).get_u32_le() as usize;
            if data.remaining() < LEN_SIZE + len + CRC_SIZE {
                log::warn!(
                    "WAL {:?}: dropping torn frame after {} complete frames",
                    path,
                    frames
                );
                break;
            }

            data.advance(LEN_SIZE);
            let payload = data.split_to(len);
            let expected = data.get_u32_le();
            let actual = crc32fast::hash(&payload);
            if actual != expected {
                return Err(ArborError::Corruption(format!(
                    "frame {} checksum mismatch (expected {:08x}, got {:08x})",
                    frames, expected, actual
                )));
            }

            let record: WalRecord = bincode::deserialize(&payload)
                .map_err(|e| ArborError::RecoveryFailed(format!("frame {}: {}", frames, e)))?;
            Self::apply(&mut table, record)?;
            frames += 1;
        }

        log::debug!("WAL {:?}: replayed {} frames", path, frames);
        Ok(table)
    }

    /// Apply a single record to the table.
    pub(crate) fn apply(table: &mut EntryTable, record: WalRecord) -> Result<()> {
        match record {
            WalRecord::Set(entry) => {
                let path = keycodec::encode(&entry.key)
                    .map_err(|e| ArborError::RecoveryFailed(e.to_string()))?;
                table.upsert(path, entry);
            }
            WalRecord::Delete(paths) => {
                for path in paths {
                    table.remove(&path);
                }
            }
        }
        Ok(())
    }

    /// Rewrite the log so it holds exactly one `Set` frame per entry in `table`.
    ///
    /// The new log is written beside the old one and renamed over it, so a
    /// crash mid-rewrite leaves the previous log intact.
    pub fn rewrite(&mut self, table: &EntryTable) -> Result<()> {
        let tmp_path = self.path.with_extension("wal.tmp");
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            for (_, entry) in table.iter() {
                tmp.write_all(&Self::encode(&WalFrame::Set(entry))?)?;
            }
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        Ok(())
    }

    /// Returns the current size of the log file in bytes.
    pub fn file_size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &[&str], value: &[u8]) -> Entry {
        Entry {
            key: key.iter().map(|s| s.to_string()).collect(),
            value: value.to_vec(),
            metadata: None,
            updated_at: 1,
            expires_at: Some(99),
        }
    }

    #[test]
    fn test_replay_set_and_batch_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        {
            let mut wal = WriteAheadLog::open(path.clone(), true).unwrap();
            wal.append_set(&entry(&["a"], b"1")).unwrap();
            wal.append_set(&entry(&["a", "b"], b"2")).unwrap();
            wal.append_set(&entry(&["c"], b"3")).unwrap();
            wal.append_delete(&["a".to_string(), "c".to_string()]).unwrap();
        }

        let table = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(table.len(), 1);
        let survivor = table.get("a\u{0}b").unwrap();
        assert_eq!(survivor.value, b"2");
        assert_eq!(survivor.expires_at, Some(99));
        assert_eq!(table.expiring_len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = WriteAheadLog::recover(&dir.path().join("absent.wal")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_torn_tail_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torn.wal");
        {
            let mut wal = WriteAheadLog::open(path.clone(), false).unwrap();
            wal.append_set(&entry(&["ok"], b"v")).unwrap();
        }
        let mut bytes = fs::read(&path).unwrap();
        let frame = WriteAheadLog::encode(&WalFrame::Set(&entry(&["lost"], b"v"))).unwrap();
        bytes.extend_from_slice(&frame[..frame.len() - 3]);
        fs::write(&path, &bytes).unwrap();

        let table = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("ok").is_some());
    }

    #[test]
    fn test_checksum_mismatch_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.wal");
        {
            let mut wal = WriteAheadLog::open(path.clone(), false).unwrap();
            wal.append_set(&entry(&["k"], b"value")).unwrap();
        }
        let mut bytes = fs::read(&path).unwrap();
        bytes[LEN_SIZE + 2] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            WriteAheadLog::recover(&path),
            Err(ArborError::Corruption(_))
        ));
    }

    #[test]
    fn test_rewrite_compacts_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compact.wal");
        let mut wal = WriteAheadLog::open(path.clone(), false).unwrap();
        let mut table = EntryTable::new();
        for i in 0..20 {
            let next = entry(&["k"], format!("v{}", i).as_bytes());
            wal.append_set(&next).unwrap();
            WriteAheadLog::apply(&mut table, WalRecord::Set(next)).unwrap();
        }
        let before = wal.file_size().unwrap();

        wal.rewrite(&table).unwrap();
        assert!(wal.file_size().unwrap() < before);

        let replayed = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(replayed.get("k").unwrap().value, b"v19");
    }
}
