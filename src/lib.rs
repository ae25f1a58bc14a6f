//! `hyperminhash` is a Rust crate for estimating cardinality, union, intersection and Jaccard
//! similarity of streams in sub-logarithmic space.
//!
//! [`HyperMinHash`] extends HyperLogLog registers with a few bits of a second, independent hash
//! (a minhash mantissa), which makes registers of different sketches comparable and enables
//! similarity estimation. [`BetaMinHash`] fixes its parameters so that cardinality can be
//! estimated with the closed-form LogLog-Beta estimator.
//!
//! ```
//! use hyperminhash::{combiner, HyperMinHash, IntersectionSketch};
//!
//! let mut lhs = HyperMinHash::new(14, 35).unwrap();
//! let mut rhs = HyperMinHash::new(14, 35).unwrap();
//! for i in 0..10_000u32 {
//!     lhs.offer(&i.to_be_bytes());
//!     rhs.offer(&(i + 5_000).to_be_bytes());
//! }
//! let union = combiner::union(&[&lhs, &rhs]).unwrap();
//! let intersection = combiner::intersection_cardinality(&[&lhs, &rhs]).unwrap();
//! assert!(union.cardinality() > intersection);
//! ```
mod beta;
mod beta_minhash;
pub mod codec;
pub mod combiner;
mod error;
pub mod estimator;
pub mod hash;
pub mod packer;
pub mod registers;
#[cfg(feature = "with_serde")]
mod serde;
mod sketch;

pub use beta_minhash::BetaMinHash;
pub use codec::{decode, encode, size_in_bytes, SketchSerde};
pub use error::{Result, SketchError};
pub use estimator::BiasTable;
pub use registers::{RegisterStore, RegisterStoreTrait, RegisterWidth};
pub use sketch::{
    HyperMinHash, IntersectionSketch, MAX_PRECISION, MAX_RETAINED_BITS, MIN_PRECISION,
    MIN_RETAINED_BITS,
};
