use derive_more::Display;
use fnv::FnvHasher;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    convert::TryFrom,
    fmt,
    hash::{Hash, Hasher},
};

/// World seed. Every random decision made during generation is derived from
/// this value plus the lattice coordinate the decision is about, never from
/// shared RNG state. That makes regions reproducible in any order.
///
/// When deserializing, a few inputs are accepted:
/// - A non-negative integer that fits into `u64` is used as-is
/// - A string that parses into a `u64` is used as the parsed value
/// - Any other string is hashed (FNV-1a) into a `u64`
///
/// Seeds always serialize as a **string**. JSON and TOML can't reliably hold
/// 64-bit unsigned integers, and the string form parses back into the same
/// number.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, Hash)]
pub struct Seed(pub u64);

/// Salts separate the independent random streams that share a coordinate
/// space. Two grids jittering the same `(q, r)` must not get the same sample.
pub mod salt {
    pub const BASIN_GRID: u32 = 0x6261_736e;
    pub const RIVER_GRID: u32 = 0x7269_7672;
    pub const CLIMATE: u32 = 0x636c_696d;
    pub const DRAINAGE: u32 = 0x6472_6169;
}

impl Seed {
    /// Derive a fresh RNG for one coordinate of one random stream. This is a
    /// pure function of `(seed, salt, x, z)`; calling it twice gives two
    /// generators that produce identical sequences.
    pub fn rng_at(self, salt: u32, x: i32, z: i32) -> Pcg32 {
        // Hash explicit little-endian bytes so the result doesn't depend on
        // the host's endianness
        let mut hasher = FnvHasher::default();
        hasher.write(&self.0.to_le_bytes());
        hasher.write(&salt.to_le_bytes());
        hasher.write(&x.to_le_bytes());
        hasher.write(&z.to_le_bytes());
        Pcg32::seed_from_u64(hasher.finish())
    }

    fn hash_text(text: &str) -> u64 {
        let mut hasher = FnvHasher::default();
        text.hash(&mut hasher);
        hasher.finish()
    }
}

impl From<u64> for Seed {
    fn from(seed: u64) -> Self {
        Self(seed)
    }
}

// Numeric strings parse, anything else gets hashed
impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        match text.parse::<u64>() {
            Ok(seed) => Self(seed),
            Err(_) => Self(Self::hash_text(text)),
        }
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SeedVisitor)
    }
}

struct SeedVisitor;

impl<'de> Visitor<'de> for SeedVisitor {
    type Value = Seed;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a positive integer or string")
    }

    // Serde forwards all the smaller integer types to these two
    fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Seed, E> {
        Ok(Seed(value))
    }

    fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<Seed, E> {
        u64::try_from(value)
            .map(Seed)
            .map_err(|_| E::custom(format!("u64 out of range: {}", value)))
    }

    fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Seed, E> {
        Ok(value.into())
    }
}
