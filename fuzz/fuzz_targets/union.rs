#![no_main]

use hyperminhash::combiner::{similarity, union};
use hyperminhash::{decode, encode, BetaMinHash, HyperMinHash, IntersectionSketch};
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);
    let r = 2 + (data[0] as u32 % 56);

    let mut sketch1 = HyperMinHash::new(8, r).unwrap();
    let mut beta1 = BetaMinHash::new();
    for chunk in first_half.chunks(4) {
        sketch1.offer(chunk);
        beta1.offer(chunk);
        assert!(sketch1.cardinality() > 0);
    }

    let mut sketch2 = HyperMinHash::new(8, r).unwrap();
    let mut beta2 = BetaMinHash::new();
    for chunk in second_half.chunks(4) {
        sketch2.offer(chunk);
        beta2.offer(chunk);
        assert!(sketch2.cardinality() > 0);
    }

    let merged = union(&[&sketch1, &sketch2]).unwrap();
    assert_eq!(union(&[&sketch2, &sketch1]).unwrap(), merged);
    let jaccard = similarity(&[&sketch1, &sketch2]).unwrap();
    assert!((0.0..=1.0).contains(&jaccard));
    assert_eq!(decode::<HyperMinHash>(&encode(&merged)).unwrap(), merged);

    let merged = union(&[&beta1, &beta2]).unwrap();
    assert_eq!(decode::<BetaMinHash>(&encode(&merged)).unwrap(), merged);
});
