//! Logical and physical column types. Pure data.
//!
//! A logical type is what the user sees (`Utf8`, `Int32`, ...). A physical type
//! is the fixed-width little-endian representation stored in column buffers
//! and read by generated units. Each logical type admits a small closed set of
//! physical encodings; the first one listed is the default.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogicalType {
    Boolean,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Utf8,
}

impl LogicalType {
    /// Physical encodings this logical type may be stored as. Default first.
    pub fn admitted(self) -> &'static [PhysicalType] {
        use PhysicalType::*;
        match self {
            LogicalType::Boolean => &[U8],
            LogicalType::Int32 => &[I32, I64],
            LogicalType::Int64 => &[I64],
            LogicalType::UInt32 => &[U32, U64],
            LogicalType::UInt64 => &[U64],
            LogicalType::Float32 => &[F32, F64],
            LogicalType::Float64 => &[F64],
            LogicalType::Utf8 => &[U32, U64],
        }
    }

    pub fn default_physical(self) -> PhysicalType {
        self.admitted()[0]
    }

    pub fn admits(self, physical: PhysicalType) -> bool {
        self.admitted().contains(&physical)
    }

    pub fn is_string(self) -> bool {
        matches!(self, LogicalType::Utf8)
    }

    pub fn name(self) -> &'static str {
        match self {
            LogicalType::Boolean => "Boolean",
            LogicalType::Int32 => "Int32",
            LogicalType::Int64 => "Int64",
            LogicalType::UInt32 => "UInt32",
            LogicalType::UInt64 => "UInt64",
            LogicalType::Float32 => "Float32",
            LogicalType::Float64 => "Float64",
            LogicalType::Utf8 => "Utf8",
        }
    }

    /// Parse the names used in query files and CSV schemas.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "Boolean" | "bool" => LogicalType::Boolean,
            "Int32" | "i32" => LogicalType::Int32,
            "Int64" | "i64" => LogicalType::Int64,
            "UInt32" | "u32" => LogicalType::UInt32,
            "UInt64" | "u64" => LogicalType::UInt64,
            "Float32" | "f32" => LogicalType::Float32,
            "Float64" | "f64" => LogicalType::Float64,
            "Utf8" | "string" | "str" => LogicalType::Utf8,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum PhysicalType {
    U8 = 0,
    I32 = 1,
    I64 = 2,
    U32 = 3,
    U64 = 4,
    F32 = 5,
    F64 = 6,
}

impl PhysicalType {
    pub const ALL: [PhysicalType; 7] = [
        PhysicalType::U8,
        PhysicalType::I32,
        PhysicalType::I64,
        PhysicalType::U32,
        PhysicalType::U64,
        PhysicalType::F32,
        PhysicalType::F64,
    ];

    /// Width in bytes of one stored value.
    pub const fn width(self) -> usize {
        match self {
            PhysicalType::U8 => 1,
            PhysicalType::I32 | PhysicalType::U32 | PhysicalType::F32 => 4,
            PhysicalType::I64 | PhysicalType::U64 | PhysicalType::F64 => 8,
        }
    }

    /// Rust type name emitted into generated sources.
    pub const fn rust_type(self) -> &'static str {
        match self {
            PhysicalType::U8 => "u8",
            PhysicalType::I32 => "i32",
            PhysicalType::I64 => "i64",
            PhysicalType::U32 => "u32",
            PhysicalType::U64 => "u64",
            PhysicalType::F32 => "f32",
            PhysicalType::F64 => "f64",
        }
    }

    /// Identifier-safe tag used in generated unit names.
    pub const fn tag(self) -> &'static str {
        match self {
            PhysicalType::U8 => "U8",
            PhysicalType::I32 => "I32",
            PhysicalType::I64 => "I64",
            PhysicalType::U32 => "U32",
            PhysicalType::U64 => "U64",
            PhysicalType::F32 => "F32",
            PhysicalType::F64 => "F64",
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    pub const fn is_float(self) -> bool {
        matches!(self, PhysicalType::F32 | PhysicalType::F64)
    }

    /// Integer-like types usable as grouping keys (exact equality + hashing).
    pub const fn is_key(self) -> bool {
        !self.is_float()
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.tag().eq_ignore_ascii_case(s) || p.rust_type() == s)
    }
}

/// A (logical, physical) pair whose compatibility has been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnType {
    logical: LogicalType,
    physical: PhysicalType,
}

impl ColumnType {
    pub fn new(logical: LogicalType, physical: PhysicalType) -> Result<Self> {
        if !logical.admits(physical) {
            return Err(Error::Encoding(format!(
                "{} cannot be stored as {}",
                logical.name(),
                physical.tag()
            )));
        }
        Ok(Self { logical, physical })
    }

    /// Column type using the logical type's default physical encoding.
    pub fn of(logical: LogicalType) -> Self {
        Self {
            logical,
            physical: logical.default_physical(),
        }
    }

    pub fn logical(&self) -> LogicalType {
        self.logical
    }

    pub fn physical(&self) -> PhysicalType {
        self.physical
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub column_type: ColumnType,
}

impl Field {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
