//! Tagged-variant dispatch from runtime type tags to concrete Rust types.
//!
//! Each macro matches a tag and evaluates `$body` with a local type alias bound
//! to the matching type, so a generic kernel can be monomorphized from a
//! descriptor. The host uses the same macros to downcast results.

/// Bind `$K` to the key type for a [`PhysicalType`](crate::PhysicalType).
/// Float tags evaluate `$fallback` with the tag bound to `$other`.
#[macro_export]
macro_rules! with_key_type {
    ($physical:expr, $K:ident => $body:expr, else $other:ident => $fallback:expr) => {
        match $physical {
            $crate::PhysicalType::U8 => {
                type $K = u8;
                $body
            }
            $crate::PhysicalType::I32 => {
                type $K = i32;
                $body
            }
            $crate::PhysicalType::I64 => {
                type $K = i64;
                $body
            }
            $crate::PhysicalType::U32 => {
                type $K = u32;
                $body
            }
            $crate::PhysicalType::U64 => {
                type $K = u64;
                $body
            }
            $other => $fallback,
        }
    };
}

/// Bind `$V` to a summable value type. `U8` evaluates `$fallback`.
#[macro_export]
macro_rules! with_sum_type {
    ($physical:expr, $V:ident => $body:expr, else $other:ident => $fallback:expr) => {
        match $physical {
            $crate::PhysicalType::I32 => {
                type $V = i32;
                $body
            }
            $crate::PhysicalType::I64 => {
                type $V = i64;
                $body
            }
            $crate::PhysicalType::U32 => {
                type $V = u32;
                $body
            }
            $crate::PhysicalType::U64 => {
                type $V = u64;
                $body
            }
            $crate::PhysicalType::F32 => {
                type $V = f32;
                $body
            }
            $crate::PhysicalType::F64 => {
                type $V = f64;
                $body
            }
            $other => $fallback,
        }
    };
}

/// Bind `$S` to the strategy type for a [`HashKind`](crate::HashKind).
#[macro_export]
macro_rules! with_hash_strategy {
    ($kind:expr, $S:ident => $body:expr) => {
        match $kind {
            $crate::HashKind::Fx => {
                type $S = $crate::hash::Fx;
                $body
            }
            $crate::HashKind::Mix64 => {
                type $S = $crate::hash::Mix64;
                $body
            }
            $crate::HashKind::Blake3 => {
                type $S = $crate::hash::Blake3;
                $body
            }
        }
    };
}
