//! Column file header.
//!
//! Layout on disk (little-endian, 32 bytes):
//! [ magic: u32 ][ version: u16 ][ physical: u8 ][ flags: u8 ]
//! [ rows: u64 ][ capacity: u64 ][ checksum: u64 ]
//! [ payload: capacity * width bytes ]
//!
//! `checksum` is the blake3 prefix of the first `rows * width` payload bytes
//! and is only meaningful once the sealed flag is set.

use querygen_core::schema::PhysicalType;

use crate::error::{Error, Result};

pub const MAGIC: u32 = 0x5147_434C; // "QGCL"
pub const VERSION: u16 = 1;
pub const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 8 + 8 + 8;

const FLAG_SEALED: u8 = 0b0000_0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnHeader {
    pub physical: PhysicalType,
    pub sealed: bool,
    pub rows: u64,
    pub capacity: u64,
    pub checksum: u64,
}

impl ColumnHeader {
    pub fn open(physical: PhysicalType, capacity: u64) -> Self {
        Self {
            physical,
            sealed: false,
            rows: 0,
            capacity,
            checksum: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        out[4..6].copy_from_slice(&VERSION.to_le_bytes());
        out[6] = self.physical as u8;
        out[7] = if self.sealed { FLAG_SEALED } else { 0 };
        out[8..16].copy_from_slice(&self.rows.to_le_bytes());
        out[16..24].copy_from_slice(&self.capacity.to_le_bytes());
        out[24..32].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Corrupt("short header".into()));
        }
        let magic = u32::from_le_bytes(le::<4>(&bytes[0..4]));
        let version = u16::from_le_bytes(le::<2>(&bytes[4..6]));
        if magic != MAGIC || version != VERSION {
            return Err(Error::Corrupt("bad magic/version".into()));
        }
        let physical = PhysicalType::from_u8(bytes[6])
            .ok_or_else(|| Error::Corrupt(format!("unknown physical type tag {}", bytes[6])))?;
        let flags = bytes[7];
        if flags & !FLAG_SEALED != 0 {
            return Err(Error::Corrupt(format!("unknown flags {flags:#04x}")));
        }
        let hdr = Self {
            physical,
            sealed: flags & FLAG_SEALED != 0,
            rows: u64::from_le_bytes(le::<8>(&bytes[8..16])),
            capacity: u64::from_le_bytes(le::<8>(&bytes[16..24])),
            checksum: u64::from_le_bytes(le::<8>(&bytes[24..32])),
        };
        if hdr.rows > hdr.capacity {
            return Err(Error::Corrupt(format!(
                "rows {} exceed capacity {}",
                hdr.rows, hdr.capacity
            )));
        }
        Ok(hdr)
    }

    /// Bytes a file with this header must hold.
    pub fn file_len(&self) -> Option<u64> {
        self.capacity
            .checked_mul(self.physical.width() as u64)?
            .checked_add(HEADER_LEN as u64)
    }
}

pub fn payload_checksum(payload: &[u8]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(payload);
    let digest: [u8; 32] = hasher.finalize().into();
    u64::from_le_bytes(le::<8>(&digest))
}

fn le<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
