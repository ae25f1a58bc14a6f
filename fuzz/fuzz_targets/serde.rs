#![no_main]

use hyperminhash::{BetaMinHash, HyperMinHash, IntersectionSketch};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut sketch) = serde_json::from_slice::<HyperMinHash>(data) {
        sketch.offer(b"item");
        assert!(sketch.cardinality() > 0);
    }
    if let Ok(mut sketch) = serde_json::from_slice::<BetaMinHash>(data) {
        sketch.offer(b"item");
    }
});
