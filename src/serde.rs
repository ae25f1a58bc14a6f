//! # Serde module for sketches
//!
//! Provides serde-based (serialization and deserialization) features for [`HyperMinHash`] and
//! [`BetaMinHash`] on top of the binary format in [`crate::codec`]: a sketch is serialized as
//! its encoded byte string, and deserialization runs the same validation as
//! [`crate::codec::decode`].
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::beta_minhash::BetaMinHash;
use crate::codec::SketchSerde;
use crate::sketch::HyperMinHash;

fn serialize_sketch<T: SketchSerde, S: Serializer>(
    sketch: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_bytes(&sketch.to_bytes())
}

fn deserialize_sketch<'de, T: SketchSerde, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<T, D::Error> {
    // Self-describing formats such as JSON hand bytes back as a sequence, so go through
    // `Vec<u8>` which accepts both.
    let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
    T::from_bytes(&bytes).map_err(|e| Error::custom(e.to_string()))
}

impl Serialize for HyperMinHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_sketch(self, serializer)
    }
}

impl<'de> Deserialize<'de> for HyperMinHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_sketch(deserializer)
    }
}

impl Serialize for BetaMinHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_sketch(self, serializer)
    }
}

impl<'de> Deserialize<'de> for BetaMinHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_sketch(deserializer)
    }
}
