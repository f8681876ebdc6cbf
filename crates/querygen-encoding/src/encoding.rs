//! Raw value ⇄ physical value conversion.
//!
//! `encode` is total over every value of the column's logical type; `decode` is
//! its left inverse and rejects physical values outside the logical domain,
//! which always means the binding and the data disagree.

use querygen_core::schema::{ColumnType, LogicalType, PhysicalType};
use querygen_core::types::{PhysicalValue, Scalar};
use querygen_trie::{SurrogateKey, Trie};

use crate::error::{Error, Result};

/// Encode `value` as a value of `ty`.
///
/// `Utf8` columns intern into `dict`; every other type ignores it.
pub fn encode(value: &Scalar, ty: ColumnType, dict: Option<&mut Trie>) -> Result<PhysicalValue> {
    let physical = ty.physical();
    if value.logical_type() != ty.logical() {
        return Err(Error::Encoding(format!(
            "{} value cannot be encoded into a {} column",
            value.logical_type().name(),
            ty.logical().name()
        )));
    }

    Ok(match (value, physical) {
        (Scalar::Bool(b), PhysicalType::U8) => PhysicalValue::U8(u8::from(*b)),
        (Scalar::I32(v), PhysicalType::I32) => PhysicalValue::I32(*v),
        (Scalar::I32(v), PhysicalType::I64) => PhysicalValue::I64(i64::from(*v)),
        (Scalar::I64(v), PhysicalType::I64) => PhysicalValue::I64(*v),
        (Scalar::U32(v), PhysicalType::U32) => PhysicalValue::U32(*v),
        (Scalar::U32(v), PhysicalType::U64) => PhysicalValue::U64(u64::from(*v)),
        (Scalar::U64(v), PhysicalType::U64) => PhysicalValue::U64(*v),
        (Scalar::F32(v), PhysicalType::F32) => PhysicalValue::F32(*v),
        (Scalar::F32(v), PhysicalType::F64) => PhysicalValue::F64(f64::from(*v)),
        (Scalar::F64(v), PhysicalType::F64) => PhysicalValue::F64(*v),
        (Scalar::Str(s), _) => {
            let dict = dict.ok_or_else(|| {
                Error::Encoding("Utf8 column encoded without a dictionary".into())
            })?;
            surrogate_to_physical(dict.intern(s)?, physical)?
        }
        // ColumnType construction already rejected every other pairing.
        (v, p) => {
            return Err(Error::Encoding(format!(
                "no encoding of {:?} as {}",
                v,
                p.tag()
            )))
        }
    })
}

/// Store a surrogate key at the column's physical width.
pub fn surrogate_to_physical(key: SurrogateKey, physical: PhysicalType) -> Result<PhysicalValue> {
    match physical {
        PhysicalType::U32 => u32::try_from(key.get())
            .map(PhysicalValue::U32)
            .map_err(|_| Error::Encoding(format!("surrogate {key} does not fit a U32 column"))),
        PhysicalType::U64 => Ok(PhysicalValue::U64(key.get())),
        other => Err(Error::Encoding(format!(
            "surrogate keys cannot be stored as {}",
            other.tag()
        ))),
    }
}

/// Decode `value` back to the raw value it encodes under `ty`.
///
/// `Utf8` columns resolve the surrogate through `dict`.
pub fn decode(value: PhysicalValue, ty: ColumnType, dict: Option<&Trie>) -> Result<Scalar> {
    if value.physical_type() != ty.physical() {
        return Err(Error::Encoding(format!(
            "{} column holds {} values, got {:?}",
            ty.logical().name(),
            ty.physical().tag(),
            value
        )));
    }

    let out_of_domain = || {
        Error::Encoding(format!(
            "{:?} is outside the {} domain",
            value,
            ty.logical().name()
        ))
    };

    Ok(match (ty.logical(), value) {
        (LogicalType::Boolean, PhysicalValue::U8(0)) => Scalar::Bool(false),
        (LogicalType::Boolean, PhysicalValue::U8(1)) => Scalar::Bool(true),
        (LogicalType::Int32, PhysicalValue::I32(v)) => Scalar::I32(v),
        (LogicalType::Int32, PhysicalValue::I64(v)) => {
            Scalar::I32(i32::try_from(v).map_err(|_| out_of_domain())?)
        }
        (LogicalType::Int64, PhysicalValue::I64(v)) => Scalar::I64(v),
        (LogicalType::UInt32, PhysicalValue::U32(v)) => Scalar::U32(v),
        (LogicalType::UInt32, PhysicalValue::U64(v)) => {
            Scalar::U32(u32::try_from(v).map_err(|_| out_of_domain())?)
        }
        (LogicalType::UInt64, PhysicalValue::U64(v)) => Scalar::U64(v),
        (LogicalType::Float32, PhysicalValue::F32(v)) => Scalar::F32(v),
        (LogicalType::Float32, PhysicalValue::F64(v)) => {
            let narrowed = v as f32;
            if !v.is_nan() && f64::from(narrowed) != v {
                return Err(out_of_domain());
            }
            Scalar::F32(narrowed)
        }
        (LogicalType::Float64, PhysicalValue::F64(v)) => Scalar::F64(v),
        (LogicalType::Utf8, PhysicalValue::U32(k)) => {
            Scalar::Str(lookup(dict, SurrogateKey::new(u64::from(k)))?)
        }
        (LogicalType::Utf8, PhysicalValue::U64(k)) => Scalar::Str(lookup(dict, SurrogateKey::new(k))?),
        _ => return Err(out_of_domain()),
    })
}

fn lookup(dict: Option<&Trie>, key: SurrogateKey) -> Result<String> {
    let dict =
        dict.ok_or_else(|| Error::Encoding("Utf8 column decoded without a dictionary".into()))?;
    Ok(dict.lookup(key)?)
}

/// Load-path encoder for one column: owns the column's dictionary while it is
/// being built.
#[derive(Debug)]
pub struct ColumnEncoder {
    ty: ColumnType,
    dict: Option<Trie>,
}

impl ColumnEncoder {
    pub fn new(ty: ColumnType) -> Self {
        let dict = ty.logical().is_string().then(Trie::new);
        Self { ty, dict }
    }

    pub fn column_type(&self) -> ColumnType {
        self.ty
    }

    pub fn encode(&mut self, value: &Scalar) -> Result<PhysicalValue> {
        encode(value, self.ty, self.dict.as_mut())
    }

    /// Seal and hand over the dictionary (string columns only).
    pub fn finish(self) -> Option<Trie> {
        self.dict.map(|mut d| {
            d.seal();
            d
        })
    }
}
