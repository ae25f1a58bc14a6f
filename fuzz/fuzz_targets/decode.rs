#![no_main]

use hyperminhash::{decode, encode, size_in_bytes, BetaMinHash, HyperMinHash, IntersectionSketch};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut sketch) = decode::<HyperMinHash>(data) {
        let encoded = encode(&sketch);
        assert_eq!(size_in_bytes(&sketch), encoded.len());
        assert_eq!(decode::<HyperMinHash>(&encoded).unwrap(), sketch);
        sketch.offer(b"item");
        assert!(sketch.cardinality() > 0);
    }
    if let Ok(mut sketch) = decode::<BetaMinHash>(data) {
        assert_eq!(decode::<BetaMinHash>(&encode(&sketch)).unwrap(), sketch);
        sketch.offer(b"item");
    }
});
