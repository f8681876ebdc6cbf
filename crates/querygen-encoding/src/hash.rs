//! Hash strategies over physical values.
//!
//! A strategy hashes the little-endian bytes of one fixed-width value. The same
//! strategy type is plugged into the kernels' hash tables through
//! [`StrategyHasher`], so a key written as a single value hashes to exactly
//! `hash(&value, S::KIND)`. Collisions are expected; tables resolve them by
//! equality.

use std::hash::{BuildHasherDefault, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use querygen_core::types::PhysicalValue;

const FX_SEED: u64 = 0x51_7c_c1_b7_27_22_0a_95;
const MIX_SEED: u64 = 0x9e_37_79_b9_7f_4a_7c_15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Fx,
    Mix64,
    Blake3,
}

impl HashKind {
    pub const ALL: [HashKind; 3] = [HashKind::Fx, HashKind::Mix64, HashKind::Blake3];

    /// Identifier-safe tag used in generated unit names.
    pub const fn tag(self) -> &'static str {
        match self {
            HashKind::Fx => "FX",
            HashKind::Mix64 => "MIX64",
            HashKind::Blake3 => "BLAKE3",
        }
    }

    /// Path of the strategy type as referenced from generated sources.
    pub const fn type_path(self) -> &'static str {
        match self {
            HashKind::Fx => "querygen_encoding::hash::Fx",
            HashKind::Mix64 => "querygen_encoding::hash::Mix64",
            HashKind::Blake3 => "querygen_encoding::hash::Blake3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.tag().eq_ignore_ascii_case(s.trim()))
    }
}

/// A deterministic 64-bit hash over a byte string.
pub trait HashStrategy: Copy + Default + Send + Sync + 'static {
    const KIND: HashKind;

    fn hash_bytes(bytes: &[u8]) -> u64;

    /// Fold a further hashed field into an accumulated hash.
    #[inline]
    fn combine(acc: u64, h: u64) -> u64 {
        fx_add(acc, h)
    }
}

#[inline]
fn fx_add(h: u64, word: u64) -> u64 {
    (h.rotate_left(5) ^ word).wrapping_mul(FX_SEED)
}

#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// Split into little-endian words; the tail is zero-padded.
#[inline]
fn words(bytes: &[u8]) -> impl Iterator<Item = u64> + '_ {
    bytes.chunks(8).map(|c| {
        let mut w = [0u8; 8];
        w[..c.len()].copy_from_slice(c);
        u64::from_le_bytes(w)
    })
}

/// Multiply-rotate word hash. Fast, weak avalanche.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fx;

impl HashStrategy for Fx {
    const KIND: HashKind = HashKind::Fx;

    #[inline]
    fn hash_bytes(bytes: &[u8]) -> u64 {
        let h = words(bytes).fold(0u64, fx_add);
        fx_add(h, bytes.len() as u64)
    }
}

/// Word-wise 64-bit finalizer mixing. Full avalanche per word.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mix64;

impl HashStrategy for Mix64 {
    const KIND: HashKind = HashKind::Mix64;

    #[inline]
    fn hash_bytes(bytes: &[u8]) -> u64 {
        let h = words(bytes).fold(MIX_SEED ^ bytes.len() as u64, |h, w| fmix64(h ^ w));
        fmix64(h)
    }

    #[inline]
    fn combine(acc: u64, h: u64) -> u64 {
        fmix64(acc ^ h.rotate_left(31))
    }
}

/// First eight bytes of the BLAKE3 digest. Slow; for adversarial key sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3;

impl HashStrategy for Blake3 {
    const KIND: HashKind = HashKind::Blake3;

    fn hash_bytes(bytes: &[u8]) -> u64 {
        let digest = blake3::hash(bytes);
        let mut w = [0u8; 8];
        w.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(w)
    }
}

/// Hash one physical value with the strategy named by `kind`.
pub fn hash(value: &PhysicalValue, kind: HashKind) -> u64 {
    let mut buf = [0u8; 8];
    let bytes = le_bytes(value, &mut buf);
    match kind {
        HashKind::Fx => Fx::hash_bytes(bytes),
        HashKind::Mix64 => Mix64::hash_bytes(bytes),
        HashKind::Blake3 => Blake3::hash_bytes(bytes),
    }
}

fn le_bytes<'a>(value: &PhysicalValue, buf: &'a mut [u8; 8]) -> &'a [u8] {
    let width = value.physical_type().width();
    match *value {
        PhysicalValue::U8(v) => buf[0] = v,
        PhysicalValue::I32(v) => buf[..4].copy_from_slice(&v.to_le_bytes()),
        PhysicalValue::I64(v) => buf.copy_from_slice(&v.to_le_bytes()),
        PhysicalValue::U32(v) => buf[..4].copy_from_slice(&v.to_le_bytes()),
        PhysicalValue::U64(v) => buf.copy_from_slice(&v.to_le_bytes()),
        PhysicalValue::F32(v) => buf[..4].copy_from_slice(&v.to_bits().to_le_bytes()),
        PhysicalValue::F64(v) => buf.copy_from_slice(&v.to_bits().to_le_bytes()),
    }
    &buf[..width]
}

/// `std::hash::Hasher` adapter so kernel hash tables hash with strategy `S`.
///
/// Integer writes are taken little-endian regardless of platform, so hashing a
/// `u32` key through a table equals `hash(&PhysicalValue::U32(k), S::KIND)`.
pub struct StrategyHasher<S: HashStrategy> {
    acc: Option<u64>,
    _strategy: PhantomData<S>,
}

impl<S: HashStrategy> Default for StrategyHasher<S> {
    fn default() -> Self {
        Self {
            acc: None,
            _strategy: PhantomData,
        }
    }
}

impl<S: HashStrategy> Hasher for StrategyHasher<S> {
    #[inline]
    fn finish(&self) -> u64 {
        self.acc.unwrap_or_else(|| S::hash_bytes(&[]))
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let h = S::hash_bytes(bytes);
        self.acc = Some(match self.acc {
            None => h,
            Some(acc) => S::combine(acc, h),
        });
    }

    fn write_u8(&mut self, i: u8) {
        self.write(&[i]);
    }

    fn write_u16(&mut self, i: u16) {
        self.write(&i.to_le_bytes());
    }

    fn write_u32(&mut self, i: u32) {
        self.write(&i.to_le_bytes());
    }

    fn write_u64(&mut self, i: u64) {
        self.write(&i.to_le_bytes());
    }

    fn write_i32(&mut self, i: i32) {
        self.write(&i.to_le_bytes());
    }

    fn write_i64(&mut self, i: i64) {
        self.write(&i.to_le_bytes());
    }

    fn write_usize(&mut self, i: usize) {
        self.write(&(i as u64).to_le_bytes());
    }
}

pub type StrategyBuildHasher<S> = BuildHasherDefault<StrategyHasher<S>>;
