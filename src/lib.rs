//! Linear-time error and erasure correction over explicit expander graphs.
//!
//! The code is a Spielman / Guruswami-Indyk style composition: a "left"
//! inner code living on the edges of an explicit LPS Ramanujan graph, a
//! per-block Reed-Solomon stage, and an expander interleaver that turns
//! block bursts into well-spread symbol noise. Any mix of `s` block
//! erasures and `e` block errors with `s + 2e <= (1 - r - epsilon) * n`
//! decodes in time linear in the codeword length.
//!
//! ```no_run
//! use expander_ec::Codec;
//!
//! let mut codec = Codec::new(0.25, 0.5);
//! codec.choose(0).unwrap();
//! let k = codec.params().unwrap().k;
//! let message = vec![0x5a; k];
//! let codeword = codec.encode(&message).unwrap();
//! let (decoded, ok) = codec.decode(&codeword, &[], None).unwrap();
//! assert!(ok && decoded == message);
//! ```

pub mod errors;
pub use errors::*;

pub mod codec;
pub mod expander;
pub mod galois;
pub mod graph;
pub mod left_code;
pub mod params;
pub mod primes;
pub mod reed_solomon;

pub use codec::{Codec, CodecOptions, Codeword};
pub use params::ParamSet;

use rand::Rng;

/// Fixed seed for deterministic channel simulation in tests and benches.
pub const RNG_SEED: [u8; 32] = [
	0x1f, 7, 0x2e, 1, 0x44, 9, 23, 71, 12, 0o32, 0x37, 0x5d, 81, 0b101, 99, 46, 18, 60, 74, 38, 0,
	2, 0, 5, 4, 8, 1, 6, 93, 113, 127, 101,
];

/// Overwrite every byte of the chosen blocks with fresh garbage
/// (guaranteed to differ from the original).
pub fn scramble_blocks(codeword: &mut Codeword, indices: &[usize], rng: &mut impl Rng) {
	for &i in indices {
		for byte in codeword.blocks_mut()[i].iter_mut() {
			*byte ^= rng.gen_range(1..=255u8);
		}
	}
}

/// Blank the chosen blocks, as a channel that knows it lost them would.
pub fn erase_blocks(codeword: &mut Codeword, indices: &[usize]) {
	for &i in indices {
		for byte in codeword.blocks_mut()[i].iter_mut() {
			*byte = 0;
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use rand::prelude::*;

	/// The cheapest candidate for the (0.25, 0.5) target: k = 120120,
	/// 1092 blocks of 198 bytes.
	fn committed_codec() -> Codec {
		let mut codec = Codec::new(0.25, 0.5);
		codec.choose(0).expect("the half-rate target always has candidates");
		codec
	}

	fn random_message(len: usize) -> Vec<u8> {
		let mut rng = StdRng::from_seed(RNG_SEED);
		(0..len).map(|_| rng.gen()).collect()
	}

	#[test]
	fn clean_roundtrip() {
		let mut codec = committed_codec();
		let k = codec.params().unwrap().k;
		let message = random_message(k);

		let codeword = codec.encode(&message).unwrap();
		assert_eq!(codeword.num_blocks(), 1092);
		assert_eq!(codeword.block_len(), 198);

		let (decoded, ok) = codec.decode(&codeword, &[], None).unwrap();
		assert!(ok);
		itertools::assert_equal(decoded.iter(), message.iter());
	}

	#[test]
	fn roundtrip_with_padding() {
		let mut codec = committed_codec();
		let k = codec.params().unwrap().k;
		let message = random_message(k - 1000);

		let codeword = codec.encode(&message).unwrap();
		let (decoded, ok) = codec.decode(&codeword, &[], None).unwrap();
		assert!(ok);
		assert_eq!(decoded.len(), k);
		assert_eq!(&decoded[..message.len()], &message[..]);
		assert!(decoded[message.len()..].iter().all(|&b| b == 0));

		let (trimmed, ok) = codec.decode(&codeword, &[], Some(message.len())).unwrap();
		assert!(ok);
		assert_eq!(trimmed, message);
	}

	#[test]
	fn erasure_tolerance_at_the_bound() {
		let mut codec = committed_codec();
		let k = codec.params().unwrap().k;
		let n = codec.params().unwrap().num_blocks();
		let (_, max_erasures) = codec.correction_capacity(0, 0).unwrap();
		assert_eq!(max_erasures, 167);

		let message = random_message(k);
		let mut codeword = codec.encode(&message).unwrap();

		let mut rng = StdRng::from_seed(RNG_SEED);
		let erased: Vec<usize> = rand::seq::index::sample(&mut rng, n, max_erasures).into_vec();
		erase_blocks(&mut codeword, &erased);

		let (decoded, ok) = codec.decode(&codeword, &erased, None).unwrap();
		assert!(ok);
		assert_eq!(decoded, message);
	}

	#[test]
	fn error_tolerance_at_the_bound() {
		let mut codec = committed_codec();
		let k = codec.params().unwrap().k;
		let n = codec.params().unwrap().num_blocks();
		let (max_errors, _) = codec.correction_capacity(0, 0).unwrap();
		assert_eq!(max_errors, 83);

		let message = random_message(k);
		let mut codeword = codec.encode(&message).unwrap();

		let mut rng = StdRng::from_seed(RNG_SEED);
		let bad: Vec<usize> = rand::seq::index::sample(&mut rng, n, max_errors).into_vec();
		scramble_blocks(&mut codeword, &bad, &mut rng);

		let (decoded, ok) = codec.decode(&codeword, &[], None).unwrap();
		assert!(ok);
		assert_eq!(decoded, message);
	}

	#[test]
	fn mixed_tolerance_at_the_bound() {
		let mut codec = committed_codec();
		let k = codec.params().unwrap().k;
		let n = codec.params().unwrap().num_blocks();

		let errors = 41;
		let (_, erasures) = codec.correction_capacity(errors, 0).unwrap();
		assert_eq!(erasures + 2 * errors, 167);

		let message = random_message(k);
		let mut codeword = codec.encode(&message).unwrap();

		let mut rng = StdRng::from_seed(RNG_SEED);
		let picked: Vec<usize> =
			rand::seq::index::sample(&mut rng, n, errors + erasures).into_vec();
		let (bad, erased) = picked.split_at(errors);
		scramble_blocks(&mut codeword, bad, &mut rng);
		erase_blocks(&mut codeword, erased);

		let (decoded, ok) = codec.decode(&codeword, erased, None).unwrap();
		assert!(ok);
		assert_eq!(decoded, message);
	}

	#[test]
	fn wire_roundtrip_through_bytes() {
		let mut codec = Codec::by_code_dimension(80_808).unwrap();
		let message = random_message(codec.params().unwrap().k);
		let codeword = codec.encode(&message).unwrap();

		let restored = Codeword::from_bytes(&codeword.to_bytes()).unwrap();
		assert_eq!(restored, codeword);

		let (decoded, ok) = codec.decode(&restored, &[], None).unwrap();
		assert!(ok);
		assert_eq!(decoded, message);
	}
}
