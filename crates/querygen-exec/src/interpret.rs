//! Decoding a unit's opaque result back into host values.

use std::any::type_name;

use serde::{Deserialize, Serialize};

use querygen_codegen::kernels::{GroupTable, KeyType};
use querygen_codegen::{Annotation, ResultHandle, UnitDescriptor};
use querygen_core::schema::PhysicalType;
use querygen_core::types::{scalar_cmp, FixedWidth, Scalar};
use querygen_encoding::{decode, Dictionaries};
use querygen_trie::Trie;

use crate::error::{ExecError, Result};

/// One decoded result row: a group key and its aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub key: Scalar,
    pub value: Scalar,
}

/// Downcast `handle` to the result type `desc` promises and decode its keys
/// (through the key column's dictionary for strings). Rows are sorted by
/// decoded key.
pub fn interpret(
    desc: &UnitDescriptor,
    handle: ResultHandle,
    dicts: &Dictionaries,
) -> Result<Vec<ResultRow>> {
    let physical = desc.key()?.physical();
    let not_a_key = |other: PhysicalType| {
        ExecError::Input(format!("unit '{}' has a {other:?} key", desc.unit_name))
    };
    match desc.annotation {
        Annotation::Count => querygen_codegen::with_key_type!(physical, K => {
            decode_table::<K, u64>(desc, handle, dicts, Scalar::U64)
        }, else other => Err(not_a_key(other))),
        Annotation::SumI64 => querygen_codegen::with_key_type!(physical, K => {
            decode_table::<K, i64>(desc, handle, dicts, Scalar::I64)
        }, else other => Err(not_a_key(other))),
        Annotation::SumF64 => querygen_codegen::with_key_type!(physical, K => {
            decode_table::<K, f64>(desc, handle, dicts, Scalar::F64)
        }, else other => Err(not_a_key(other))),
    }
}

fn decode_table<K: KeyType, A: Send + 'static>(
    desc: &UnitDescriptor,
    handle: ResultHandle,
    dicts: &Dictionaries,
    aggregate: fn(A) -> Scalar,
) -> Result<Vec<ResultRow>> {
    let table = handle
        .downcast::<GroupTable<K, A>>()
        .map_err(|_| ExecError::ResultType {
            unit: desc.unit_name.clone(),
            expected: type_name::<GroupTable<K, A>>(),
        })?;

    let key = desc.key()?;
    let dict: Option<&Trie> = if key.logical().is_string() {
        Some(dicts.require(&key.column)?.as_ref())
    } else {
        None
    };

    let mut rows = table
        .into_entries()
        .into_iter()
        .map(|(k, a)| {
            Ok(ResultRow {
                key: decode(k.into_physical(), key.column_type, dict)?,
                value: aggregate(a),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    rows.sort_by(|a, b| scalar_cmp(&a.key, &b.key));
    Ok(rows)
}
