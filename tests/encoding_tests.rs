//! Encode/decode across every non-string logical type and its admitted
//! physical encodings.

use querygen_core::schema::{ColumnType, LogicalType, PhysicalType};
use querygen_core::types::Scalar;
use querygen_encoding::{decode, encode, ColumnEncoder, Error};

fn samples(logical: LogicalType) -> Vec<Scalar> {
    match logical {
        LogicalType::Boolean => vec![Scalar::Bool(false), Scalar::Bool(true)],
        LogicalType::Int32 => vec![
            Scalar::I32(i32::MIN),
            Scalar::I32(-1),
            Scalar::I32(0),
            Scalar::I32(i32::MAX),
        ],
        LogicalType::Int64 => vec![Scalar::I64(i64::MIN), Scalar::I64(0), Scalar::I64(i64::MAX)],
        LogicalType::UInt32 => vec![Scalar::U32(0), Scalar::U32(7), Scalar::U32(u32::MAX)],
        LogicalType::UInt64 => vec![Scalar::U64(0), Scalar::U64(u64::MAX)],
        LogicalType::Float32 => vec![
            Scalar::F32(-1.5),
            Scalar::F32(0.0),
            Scalar::F32(f32::MAX),
            Scalar::F32(f32::MIN_POSITIVE),
        ],
        LogicalType::Float64 => vec![Scalar::F64(-2.25), Scalar::F64(1e300), Scalar::F64(0.1)],
        LogicalType::Utf8 => Vec::new(),
    }
}

#[test]
fn non_string_values_round_trip_under_every_admitted_encoding() {
    let logicals = [
        LogicalType::Boolean,
        LogicalType::Int32,
        LogicalType::Int64,
        LogicalType::UInt32,
        LogicalType::UInt64,
        LogicalType::Float32,
        LogicalType::Float64,
    ];
    for logical in logicals {
        for &physical in logical.admitted() {
            let ty = ColumnType::new(logical, physical).unwrap();
            for v in samples(logical) {
                let encoded = encode(&v, ty, None).unwrap();
                assert_eq!(encoded.physical_type(), physical);
                assert_eq!(decode(encoded, ty, None).unwrap(), v, "{logical:?} as {physical:?}");
            }
        }
    }
}

#[test]
fn strings_round_trip_through_the_column_dictionary() {
    let ty = ColumnType::of(LogicalType::Utf8);
    let mut enc = ColumnEncoder::new(ty);
    let words = ["a", "b", "a", "c", "b", "a"];
    let encoded: Vec<_> = words
        .iter()
        .map(|w| enc.encode(&Scalar::Str(w.to_string())).unwrap())
        .collect();
    let dict = enc.finish().unwrap();
    assert_eq!(dict.len(), 3);

    for (w, v) in words.iter().zip(encoded) {
        assert_eq!(decode(v, ty, Some(&dict)).unwrap(), Scalar::Str(w.to_string()));
    }
}

#[test]
fn mismatched_values_are_encoding_errors() {
    let int32 = ColumnType::of(LogicalType::Int32);
    assert!(matches!(
        encode(&Scalar::I64(1), int32, None),
        Err(Error::Encoding(_))
    ));

    // A widened Int32 column holding a value outside the Int32 domain.
    let wide = ColumnType::new(LogicalType::Int32, PhysicalType::I64).unwrap();
    let v = encode(&Scalar::I64(i64::MAX), ColumnType::of(LogicalType::Int64), None).unwrap();
    assert!(matches!(decode(v, wide, None), Err(Error::Encoding(_))));

    let boolean = ColumnType::of(LogicalType::Boolean);
    let uint32 = ColumnType::of(LogicalType::UInt32);
    let two = encode(&Scalar::U32(2), uint32, None).unwrap();
    assert!(decode(two, boolean, None).is_err());
}
