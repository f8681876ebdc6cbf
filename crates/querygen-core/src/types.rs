//! Raw values (as loaded) and physical values (as stored).
//!
//! `Scalar` is the host-facing value a column is loaded from and decoded back
//! into. `PhysicalValue` is the fixed-width value a buffer stores; strings only
//! ever appear physically as surrogate keys.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{LogicalType, PhysicalType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
}

impl Scalar {
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Scalar::Bool(_) => LogicalType::Boolean,
            Scalar::I32(_) => LogicalType::Int32,
            Scalar::I64(_) => LogicalType::Int64,
            Scalar::U32(_) => LogicalType::UInt32,
            Scalar::U64(_) => LogicalType::UInt64,
            Scalar::F32(_) => LogicalType::Float32,
            Scalar::F64(_) => LogicalType::Float64,
            Scalar::Str(_) => LogicalType::Utf8,
        }
    }

    /// Parse a textual cell (CSV, CLI) as a value of `logical`.
    pub fn parse(text: &str, logical: LogicalType) -> Option<Self> {
        let t = text.trim();
        Some(match logical {
            LogicalType::Boolean => Scalar::Bool(t.parse().ok()?),
            LogicalType::Int32 => Scalar::I32(t.parse().ok()?),
            LogicalType::Int64 => Scalar::I64(t.parse().ok()?),
            LogicalType::UInt32 => Scalar::U32(t.parse().ok()?),
            LogicalType::UInt64 => Scalar::U64(t.parse().ok()?),
            LogicalType::Float32 => Scalar::F32(t.parse().ok()?),
            LogicalType::Float64 => Scalar::F64(t.parse().ok()?),
            // Strings keep their surrounding whitespace.
            LogicalType::Utf8 => Scalar::Str(text.to_string()),
        })
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Str(v) => f.write_str(v),
        }
    }
}

/// Total order for presenting results: values of the same variant compare
/// naturally (NaN last), mixed variants order by variant.
pub fn scalar_cmp(a: &Scalar, b: &Scalar) -> Ordering {
    use Scalar::*;
    match (a, b) {
        (Bool(x), Bool(y)) => x.cmp(y),
        (I32(x), I32(y)) => x.cmp(y),
        (I64(x), I64(y)) => x.cmp(y),
        (U32(x), U32(y)) => x.cmp(y),
        (U64(x), U64(y)) => x.cmp(y),
        (F32(x), F32(y)) => float_cmp(*x as f64, *y as f64),
        (F64(x), F64(y)) => float_cmp(*x, *y),
        (Str(x), Str(y)) => x.cmp(y),
        _ => scalar_type_order(a).cmp(&scalar_type_order(b)),
    }
}

fn float_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn scalar_type_order(s: &Scalar) -> u8 {
    use Scalar::*;
    match s {
        Bool(_) => 0,
        I32(_) => 1,
        I64(_) => 2,
        U32(_) => 3,
        U64(_) => 4,
        F32(_) => 5,
        F64(_) => 6,
        Str(_) => 7,
    }
}

/// One fixed-width stored value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhysicalValue {
    U8(u8),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl PhysicalValue {
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            PhysicalValue::U8(_) => PhysicalType::U8,
            PhysicalValue::I32(_) => PhysicalType::I32,
            PhysicalValue::I64(_) => PhysicalType::I64,
            PhysicalValue::U32(_) => PhysicalType::U32,
            PhysicalValue::U64(_) => PhysicalType::U64,
            PhysicalValue::F32(_) => PhysicalType::F32,
            PhysicalValue::F64(_) => PhysicalType::F64,
        }
    }

    /// Append the little-endian bytes of this value.
    pub fn write_le(&self, out: &mut Vec<u8>) {
        match *self {
            PhysicalValue::U8(v) => out.push(v),
            PhysicalValue::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
            PhysicalValue::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
            PhysicalValue::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            PhysicalValue::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
            PhysicalValue::F32(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
            PhysicalValue::F64(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
        }
    }

    pub fn to_le_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.physical_type().width());
        self.write_le(&mut out);
        out
    }

    /// Read one value of `ty`. `bytes` must hold at least `ty.width()` bytes.
    pub fn read_le(ty: PhysicalType, bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..ty.width())?;
        Some(match ty {
            PhysicalType::U8 => PhysicalValue::U8(bytes[0]),
            PhysicalType::I32 => PhysicalValue::I32(i32::read_le(bytes)),
            PhysicalType::I64 => PhysicalValue::I64(i64::read_le(bytes)),
            PhysicalType::U32 => PhysicalValue::U32(u32::read_le(bytes)),
            PhysicalType::U64 => PhysicalValue::U64(u64::read_le(bytes)),
            PhysicalType::F32 => PhysicalValue::F32(f32::read_le(bytes)),
            PhysicalType::F64 => PhysicalValue::F64(f64::read_le(bytes)),
        })
    }
}

/// Rust primitives that a column of a given physical type holds.
///
/// Generated units are generic over these; the monomorphized code reads a
/// buffer's bytes directly as `Self` without going through `PhysicalValue`.
pub trait FixedWidth: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const PHYSICAL: PhysicalType;

    /// Decode from exactly `PHYSICAL.width()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    fn into_physical(self) -> PhysicalValue;

    fn from_physical(v: PhysicalValue) -> Option<Self>;
}

macro_rules! fixed_width {
    ($t:ty, $variant:ident) => {
        impl FixedWidth for $t {
            const PHYSICAL: PhysicalType = PhysicalType::$variant;

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                <$t>::from_le_bytes(raw)
            }

            fn into_physical(self) -> PhysicalValue {
                PhysicalValue::$variant(self)
            }

            fn from_physical(v: PhysicalValue) -> Option<Self> {
                match v {
                    PhysicalValue::$variant(x) => Some(x),
                    _ => None,
                }
            }
        }
    };
}

fixed_width!(u8, U8);
fixed_width!(i32, I32);
fixed_width!(i64, I64);
fixed_width!(u32, U32);
fixed_width!(u64, U64);
fixed_width!(f32, F32);
fixed_width!(f64, F64);
