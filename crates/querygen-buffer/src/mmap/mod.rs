//! Memory-mapped column buffer.
//!
//! A column file is created with room for `capacity` rows and mapped
//! read-write for the load path. Sealing stamps the row count and a payload
//! checksum into the header; a sealed file can later be reopened read-only
//! with [`ParMMapBuffer::open`].

mod header;

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut, MmapOptions};

use querygen_core::config::{BufferBackend, SyncPolicy};
use querygen_core::schema::PhysicalType;
use querygen_core::types::PhysicalValue;

use crate::buffer::{check_append, ParBuffer};
use crate::error::{Error, Result};

pub use header::{payload_checksum, ColumnHeader, HEADER_LEN, MAGIC, VERSION};

#[derive(Debug)]
enum Region {
    Writable(MmapMut),
    ReadOnly(Mmap),
}

impl Region {
    fn bytes(&self) -> &[u8] {
        match self {
            Region::Writable(m) => &m[..],
            Region::ReadOnly(m) => &m[..],
        }
    }
}

#[derive(Debug)]
pub struct ParMMapBuffer {
    path: PathBuf,
    file: File,
    region: Region,
    header: ColumnHeader,
    sync: SyncPolicy,
    unflushed_rows: u64,
}

impl ParMMapBuffer {
    /// Create a new column file at `path` sized for `capacity` rows.
    ///
    /// Fails if `path` already exists; a live column file is never truncated.
    pub fn create(
        path: impl AsRef<Path>,
        physical: PhysicalType,
        capacity: usize,
        sync: SyncPolicy,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let header = ColumnHeader::open(physical, capacity as u64);
        let file_len = header
            .file_len()
            .ok_or(Error::CapacityExceeded { capacity })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.set_len(file_len)?;

        #[allow(unsafe_code)]
        // The file is owned by this buffer for the lifetime of the mapping.
        let mut map = unsafe { MmapOptions::new().map_mut(&file)? };
        map[..HEADER_LEN].copy_from_slice(&header.to_bytes());

        tracing::debug!(path = %path.display(), ?physical, capacity, "created mmap column");
        Ok(Self {
            path,
            file,
            region: Region::Writable(map),
            header,
            sync,
            unflushed_rows: 0,
        })
    }

    /// Reopen a sealed column file read-only, validating its header and checksum.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let actual_len = file.metadata()?.len();
        if actual_len < HEADER_LEN as u64 {
            return Err(Error::Corrupt(format!(
                "{}: {actual_len} bytes is shorter than the header",
                path.display()
            )));
        }

        #[allow(unsafe_code)]
        // Sealed column files are never written again.
        let map = unsafe { MmapOptions::new().map(&file)? };
        let header = ColumnHeader::from_bytes(&map[..HEADER_LEN])?;
        if !header.sealed {
            return Err(Error::Corrupt(format!("{}: column was never sealed", path.display())));
        }
        match header.file_len() {
            Some(need) if need <= actual_len => {}
            _ => {
                return Err(Error::Corrupt(format!(
                    "{}: truncated (capacity {} rows, {actual_len} bytes)",
                    path.display(),
                    header.capacity
                )))
            }
        }

        let buf = Self {
            path,
            file,
            region: Region::ReadOnly(map),
            header,
            sync: SyncPolicy::Manual,
            unflushed_rows: 0,
        };
        let sum = payload_checksum(buf.as_bytes());
        if sum != header.checksum {
            return Err(Error::Corrupt(format!(
                "{}: checksum mismatch (header {:#018x}, payload {sum:#018x})",
                buf.path.display(),
                header.checksum
            )));
        }
        Ok(buf)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> ColumnHeader {
        self.header
    }

    fn writable(&mut self) -> Result<&mut MmapMut> {
        match &mut self.region {
            Region::Writable(m) => Ok(m),
            Region::ReadOnly(_) => Err(Error::SealedBuffer),
        }
    }

    fn write_header(&mut self) -> Result<()> {
        let bytes = self.header.to_bytes();
        self.writable()?[..HEADER_LEN].copy_from_slice(&bytes);
        Ok(())
    }

    fn payload_len(&self) -> usize {
        self.header.rows as usize * self.header.physical.width()
    }
}

impl ParBuffer for ParMMapBuffer {
    fn backend(&self) -> BufferBackend {
        BufferBackend::Mmap
    }

    fn physical_type(&self) -> PhysicalType {
        self.header.physical
    }

    fn len(&self) -> usize {
        self.header.rows as usize
    }

    fn capacity(&self) -> usize {
        self.header.capacity as usize
    }

    fn as_bytes(&self) -> &[u8] {
        &self.region.bytes()[HEADER_LEN..HEADER_LEN + self.payload_len()]
    }

    fn append(&mut self, value: PhysicalValue) -> Result<()> {
        check_append(&*self, &value)?;
        let offset = HEADER_LEN + self.payload_len();
        let bytes = value.to_le_vec();
        self.writable()?[offset..offset + bytes.len()].copy_from_slice(&bytes);
        self.header.rows += 1;
        self.unflushed_rows += 1;

        if let SyncPolicy::EveryRows(n) = self.sync {
            if self.unflushed_rows >= n {
                self.flush()?;
            }
        }
        Ok(())
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        if self.header.sealed {
            return Err(Error::SealedBuffer);
        }
        let rows = self.len().saturating_add(additional);
        if rows <= self.capacity() {
            return Ok(());
        }
        let mut grown = self.header;
        grown.capacity = rows as u64;
        let new_len = grown
            .file_len()
            .ok_or(Error::CapacityExceeded { capacity: rows })?;

        self.writable()?.flush()?;
        self.file.set_len(new_len)?;
        #[allow(unsafe_code)]
        // Remap after growing the file we own; the old mapping is dropped here.
        let map = unsafe { MmapOptions::new().map_mut(&self.file)? };
        self.region = Region::Writable(map);
        self.header = grown;
        self.write_header()?;
        tracing::trace!(path = %self.path.display(), capacity = rows, "grew mmap column");
        Ok(())
    }

    fn seal(&mut self) -> Result<()> {
        if self.header.sealed {
            return Ok(());
        }
        self.header.checksum = payload_checksum(self.as_bytes());
        self.header.sealed = true;
        self.write_header()?;
        if self.sync != SyncPolicy::Manual {
            self.flush()?;
        }
        tracing::debug!(
            path = %self.path.display(),
            rows = self.header.rows,
            checksum = self.header.checksum,
            "sealed mmap column"
        );
        Ok(())
    }

    fn is_sealed(&self) -> bool {
        self.header.sealed
    }

    fn flush(&mut self) -> Result<()> {
        if let Region::Writable(m) = &self.region {
            m.flush()?;
        }
        self.unflushed_rows = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::typed_values;

    fn values() -> Vec<PhysicalValue> {
        [5u64, 1, 9, 1].into_iter().map(PhysicalValue::U64).collect()
    }

    #[test]
    fn sealed_file_reopens_with_same_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.qgc");
        let mut buf = ParMMapBuffer::create(&path, PhysicalType::U64, 4, SyncPolicy::OnSeal).unwrap();
        for v in values() {
            buf.append(v).unwrap();
        }
        buf.seal().unwrap();
        drop(buf);

        let reopened = ParMMapBuffer::open(&path).unwrap();
        assert!(reopened.is_sealed());
        assert_eq!(reopened.len(), 4);
        let got: Vec<u64> = typed_values(&reopened).unwrap().collect();
        assert_eq!(got, vec![5, 1, 9, 1]);
        assert!(matches!(reopened.at(4), Err(Error::OutOfRange { row: 4, len: 4 })));
    }

    #[test]
    fn no_implicit_growth() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = ParMMapBuffer::create(
            dir.path().join("c"),
            PhysicalType::U64,
            2,
            SyncPolicy::EveryRows(1),
        )
        .unwrap();
        buf.append(PhysicalValue::U64(1)).unwrap();
        buf.append(PhysicalValue::U64(2)).unwrap();
        assert!(matches!(
            buf.append(PhysicalValue::U64(3)),
            Err(Error::CapacityExceeded { capacity: 2 })
        ));
        buf.reserve(2).unwrap();
        buf.append(PhysicalValue::U64(3)).unwrap();
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.at(0).unwrap(), PhysicalValue::U64(1));
        assert_eq!(buf.at(2).unwrap(), PhysicalValue::U64(3));
    }

    #[test]
    fn corrupted_payload_is_detected_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.qgc");
        let mut buf = ParMMapBuffer::create(&path, PhysicalType::U64, 4, SyncPolicy::OnSeal).unwrap();
        for v in values() {
            buf.append(v).unwrap();
        }
        buf.seal().unwrap();
        drop(buf);

        let mut raw = std::fs::read(&path).unwrap();
        raw[HEADER_LEN] ^= 0x01;
        std::fs::write(&path, raw).unwrap();
        assert!(matches!(ParMMapBuffer::open(&path), Err(Error::Corrupt(_))));
    }

    #[test]
    fn unsealed_file_cannot_be_opened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.qgc");
        let mut buf = ParMMapBuffer::create(&path, PhysicalType::U8, 1, SyncPolicy::OnSeal).unwrap();
        buf.append(PhysicalValue::U8(1)).unwrap();
        buf.flush().unwrap();
        assert!(matches!(ParMMapBuffer::open(&path), Err(Error::Corrupt(_))));
    }

    #[test]
    fn existing_column_file_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.qgc");
        let mut buf = ParMMapBuffer::create(&path, PhysicalType::U64, 4, SyncPolicy::OnSeal).unwrap();
        for v in values() {
            buf.append(v).unwrap();
        }
        buf.seal().unwrap();

        let err = ParMMapBuffer::create(&path, PhysicalType::U64, 4, SyncPolicy::OnSeal).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists));
        assert_eq!(buf.at(0).unwrap(), PhysicalValue::U64(5));
        assert_eq!(ParMMapBuffer::open(&path).unwrap().len(), 4);
    }

    #[test]
    fn sealed_mmap_rejects_appends_and_reserve() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf =
            ParMMapBuffer::create(dir.path().join("c"), PhysicalType::I32, 2, SyncPolicy::Manual).unwrap();
        buf.append(PhysicalValue::I32(-1)).unwrap();
        buf.seal().unwrap();
        assert!(matches!(buf.append(PhysicalValue::I32(2)), Err(Error::SealedBuffer)));
        assert!(matches!(buf.reserve(10), Err(Error::SealedBuffer)));
    }
}
