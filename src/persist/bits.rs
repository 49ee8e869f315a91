//! Serde adapter that stores an `f64` as its IEEE-754 bit pattern.
//!
//! Round trips must be bit-exact even through text backends, and a poisoned
//! accumulator legitimately holds NaN, which JSON cannot represent directly.

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(value.to_bits())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(f64::from_bits)
}
