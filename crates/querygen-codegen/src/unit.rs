//! Output of template instantiation.

use std::fs;
use std::path::{Path, PathBuf};

use querygen_core::hash::{hash_str, Hash256};

use crate::descriptor::UnitDescriptor;
use crate::error::Result;
use crate::lifecycle::Stage;

const FINGERPRINT_SUFFIX_LEN: usize = 12;

/// Generated source plus the descriptor that drives in-process dispatch.
///
/// The fingerprint is the BLAKE3 hash of `source` and keys the host's cache
/// of registered units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    source: String,
    descriptor: UnitDescriptor,
    fingerprint: Hash256,
}

impl GeneratedUnit {
    pub(crate) fn new(source: String, descriptor: UnitDescriptor) -> Self {
        let fingerprint = hash_str(&source);
        Self {
            source,
            descriptor,
            fingerprint,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn descriptor(&self) -> &UnitDescriptor {
        &self.descriptor
    }

    pub fn unit_name(&self) -> &str {
        &self.descriptor.unit_name
    }

    pub fn fingerprint(&self) -> Hash256 {
        self.fingerprint
    }

    pub fn stage(&self) -> Stage {
        Stage::Generated
    }

    /// `<unit_name>_<first 12 hex digits of the fingerprint>`. Units that
    /// share a name but differ in columns or literals get distinct stems.
    pub fn file_stem(&self) -> String {
        let hex = self.fingerprint.to_hex();
        format!("{}_{}", self.unit_name(), &hex[..FINGERPRINT_SUFFIX_LEN])
    }

    /// Write `<file_stem>.rs` into `dir`, creating it if needed.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.rs", self.file_stem()));
        fs::write(&path, &self.source)?;
        tracing::debug!(path = %path.display(), "wrote generated source");
        Ok(path)
    }
}
