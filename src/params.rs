//! Parameter solving: picking graph primes, block size and the exact
//! rate/epsilon pair that realize a caller's request.
//!
//! Everything rests on the table of valid `(p, q)` pairs and the induced
//! code dimensions `k = q(q^2 - 1)(p + 1) / 2`. Epsilon is always snapped
//! so that `epsilon * d / 32` is a whole number `t`; the per-vertex inner
//! codes are sized from `t` alone (`L = 4t`, `R1 = t` rounded up to even,
//! `R2 = L - R1`), which keeps the encode and decode splits in exact
//! agreement without any floating point.

use std::fmt;

use crate::errors::{Error, Result};
use crate::primes::PairTable;

/// A committed parameter tuple.
///
/// `k` is the code dimension in bytes, `b` the block size fed to the
/// per-block Reed-Solomon stage, `r` and `epsilon` the realized rate and
/// gap. `(p_r, q_r)` name the Ramanujan graph of the left code and
/// `(p_e, q_e)` the interleaving expander.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSet {
	pub p_r: usize,
	pub q_r: usize,
	pub p_e: usize,
	pub q_e: usize,
	pub b: usize,
	pub r: f64,
	pub epsilon: f64,
	pub k: usize,
}

impl ParamSet {
	/// Degree of the left-code graph.
	pub fn ramanujan_degree(&self) -> usize {
		self.p_r + 1
	}

	/// Output block length in bytes (degree of the expander).
	pub fn block_len(&self) -> usize {
		self.p_e + 1
	}

	/// Number of codeword blocks (vertices per expander side).
	pub fn num_blocks(&self) -> usize {
		self.q_e * (self.q_e * self.q_e - 1) / 2
	}

	pub fn codeword_len(&self) -> usize {
		self.num_blocks() * self.block_len()
	}

	/// Fraction of blocks that may be lost, `1 - r - epsilon`.
	pub fn correctable_fraction(&self) -> f64 {
		1.0 - self.r - self.epsilon
	}
}

impl fmt::Display for ParamSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"k = {} rate = {:.4} epsilon = {:.4} ({} blocks of {} bytes, graphs ({}, {}) and ({}, {}), corrects {:.2}% loss)",
			self.k,
			self.r,
			self.epsilon,
			self.num_blocks(),
			self.block_len(),
			self.p_r,
			self.q_r,
			self.p_e,
			self.q_e,
			100.0 * self.correctable_fraction(),
		)
	}
}

// RS blocks over GF(2^8) cannot be longer than 255 bytes
const MAX_BLOCK_LEN: usize = 255;

/// All parameter sets hitting a target `(r, epsilon)` within the given
/// tolerances, sorted ascending by code dimension. Empty when nothing in
/// range satisfies the request.
pub fn choose_params(
	r: f64,
	epsilon: f64,
	r_dist: f64,
	eps_dist: f64,
	prime_limit: usize,
	max_k: usize,
) -> Vec<ParamSet> {
	let table = PairTable::build(prime_limit);
	let mut params = Vec::new();

	for (&p_r, qs) in &table.qs_for_p {
		let d = p_r + 1;
		// snap epsilon to the nearest multiple of 32 / d
		let t = (epsilon * d as f64 / 32.0).round();
		if t == 0.0 {
			continue;
		}
		let eps_opt = 32.0 * t / d as f64;
		if (epsilon - eps_opt).abs() >= eps_dist {
			continue;
		}
		let t = t as usize;

		for &q in qs {
			let k = q * (q * q - 1) * (p_r + 1) / 2;
			if k > max_k {
				continue;
			}
			// b = round(n_tag / n) lands exactly on d + 8t
			let b = d + 8 * t;

			for &p_e in &table.ps_for_q[&q] {
				let delta = p_e + 1;
				if delta > MAX_BLOCK_LEN {
					continue;
				}
				let r_opt = 4.0 * b as f64 / (delta as f64 * (4.0 + eps_opt));
				if r_opt > r && r_opt - r < r_dist && r_opt + eps_opt < 1.0 {
					params.push(ParamSet { p_r, q_r: q, p_e, q_e: q, b, r: r_opt, epsilon: eps_opt, k });
				}
			}
		}
	}

	params.sort_by_key(|p| p.k);
	tracing::debug!(candidates = params.len(), r, epsilon, "solved parameter candidates");
	params
}

/// The parameter set for the smallest admissible code dimension `>= k`.
///
/// Epsilon is fixed near 1/4 via `32 * (d / 64) / d`; when no expander
/// prime fits the resulting block size the search retries from the next
/// dimension up.
pub fn choose_params_by_code_dimension(k: usize, prime_limit: usize) -> Result<ParamSet> {
	let table = PairTable::build(prime_limit);
	let mut want = k;
	loop {
		let entry = *table.smallest_k_at_least(want).ok_or(Error::NoParameters)?;
		let (p_r, q) = (entry.p, entry.q);
		let d = p_r + 1;
		let t = d / 64;
		let epsilon = 32.0 * t as f64 / d as f64;
		let b = d + 8 * t;

		let found = table.ps_for_q[&q].iter().copied().find(|&p_e| {
			let delta = p_e + 1;
			delta > b
				&& delta <= MAX_BLOCK_LEN
				&& 4.0 * b as f64 / (delta as f64 * (4.0 + epsilon)) + epsilon < 1.0
		});
		if let Some(p_e) = found {
			let delta = p_e + 1;
			let r = 4.0 * b as f64 / (delta as f64 * (4.0 + epsilon));
			return Ok(ParamSet { p_r, q_r: q, p_e, q_e: q, b, r, epsilon, k: entry.k });
		}
		want = entry.k + 1;
	}
}

// tolerance for "this float is a whole number" in the exact solver; the
// quantities involved are products of small rationals, far from 2^53
const INT_TOL: f64 = 1e-6;

/// Parameter sets realizing `(r, epsilon)` exactly, epsilon untouched.
///
/// Unlike [`choose_params`] the expander pair may use a different `q` than
/// the left graph. Unless `padding` is allowed, candidates must satisfy
/// `b * n = (1 + epsilon/4) * k` exactly so the encoded word fills its
/// blocks with no tail padding.
pub fn choose_params_exact(
	epsilon: f64,
	r: f64,
	padding: bool,
	prime_limit: usize,
	max_k: usize,
) -> Vec<ParamSet> {
	let table = PairTable::build(prime_limit);
	let mut params = Vec::new();

	for entry in &table.entries {
		if entry.k > max_k {
			continue;
		}
		let k = entry.k;
		let n_tag_f = (1.0 + epsilon / 4.0) * k as f64;
		let n_tag = n_tag_f.round();
		if (n_tag_f - n_tag).abs() > INT_TOL {
			continue;
		}
		let n_tag = n_tag as usize;
		let r_tag = (1.0 + epsilon / 4.0) * r;
		let delta_n = k as f64 / r;

		for (&p_e, qes) in &table.qs_for_p {
			let delta = p_e + 1;
			if delta > MAX_BLOCK_LEN {
				continue;
			}
			for &q_e in qes {
				let n = q_e * (q_e * q_e - 1) / 2;
				if n < delta {
					continue;
				}
				let b = (r_tag * delta as f64 + INT_TOL).floor() as usize;
				if b == 0 || b >= delta {
					continue;
				}
				let b_padding = r_tag * delta as f64 - n_tag as f64 / n as f64;
				if (delta * n) as f64 >= delta_n - INT_TOL && b_padding < delta as f64 / 16.0 {
					if padding || b * n == n_tag {
						let rate_eff = k as f64 / (delta * n) as f64;
						params.push(ParamSet {
							p_r: entry.p,
							q_r: entry.q,
							p_e,
							q_e,
							b,
							r: rate_eff,
							epsilon,
							k,
						});
					}
				}
			}
		}
	}

	params.sort_by_key(|p| p.k);
	params
}

#[cfg(test)]
mod test {
	use super::*;

	const PRIME_LIMIT: usize = 200;
	const MAX_K: usize = 15_000_000;

	#[test]
	fn target_solver_finds_half_rate_candidates() {
		let params = choose_params(0.5, 0.25, 0.1, 0.1, PRIME_LIMIT, MAX_K);
		assert!(!params.is_empty());
		assert!(params.windows(2).all(|w| w[0].k <= w[1].k));

		for c in &params {
			assert!(c.r > 0.5 && c.r < 0.6);
			assert!((c.epsilon - 0.25).abs() < 0.1);
			assert!(c.r + c.epsilon < 1.0);
			assert!(c.b >= 1 && c.b < c.block_len());
			assert!((c.p_r, c.q_r) != (193, 13) && (c.p_e, c.q_e) != (193, 13));
			// epsilon * d / 32 is a positive whole number
			let t = c.epsilon * c.ramanujan_degree() as f64 / 32.0;
			assert!(t.fract().abs() < 1e-9 && t >= 1.0);
		}
	}

	#[test]
	fn smallest_half_rate_candidate() {
		let params = choose_params(0.5, 0.25, 0.1, 0.1, PRIME_LIMIT, MAX_K);
		let c = params[0];
		assert_eq!((c.p_r, c.q_r, c.p_e, c.q_e), (109, 13, 197, 13));
		assert_eq!(c.k, 120_120);
		assert_eq!(c.b, 118);
		assert_eq!(c.num_blocks(), 1092);
		assert_eq!(c.block_len(), 198);
		assert!((c.epsilon - 32.0 / 110.0).abs() < 1e-12);
		let expected_r = 4.0 * 118.0 / (198.0 * (4.0 + 32.0 / 110.0));
		assert!((c.r - expected_r).abs() < 1e-12);
	}

	#[test]
	fn dimension_solver_hits_the_exact_table_entry() {
		let c = choose_params_by_code_dimension(80_808, PRIME_LIMIT).unwrap();
		assert_eq!(c.k, 80_808);
		assert_eq!((c.p_r, c.q_r), (73, 13));
		assert_eq!(c.p_e, 137);
		assert_eq!(c.q_e, 13);
		assert_eq!(c.b, 82);
		assert!((c.epsilon - 32.0 / 74.0).abs() < 1e-12);
		assert!(c.r + c.epsilon < 1.0);
	}

	#[test]
	fn dimension_solver_skips_dimensions_without_an_expander() {
		// every q = 5 entry fails the expander search, so the retry loop
		// must climb to the first q = 13 dimension
		let c = choose_params_by_code_dimension(1, PRIME_LIMIT).unwrap();
		assert_eq!(c.k, 80_808);
		assert_eq!((c.p_r, c.q_r), (73, 13));
	}

	#[test]
	fn exact_solver_recovers_the_target_candidate() {
		let target = choose_params(0.5, 0.25, 0.1, 0.1, PRIME_LIMIT, MAX_K)[0];
		let params = choose_params_exact(target.epsilon, target.r, false, PRIME_LIMIT, MAX_K);
		assert!(params
			.iter()
			.any(|c| (c.p_r, c.q_r, c.p_e, c.q_e, c.b, c.k) == (109, 13, 197, 13, 118, 120_120)));
		for c in &params {
			// no-padding candidates tile the left-code output exactly
			let n_tag = ((1.0 + c.epsilon / 4.0) * c.k as f64).round() as usize;
			assert_eq!(c.b * c.num_blocks(), n_tag);
		}
	}

	#[test]
	fn display_mentions_the_shape() {
		let c = choose_params_by_code_dimension(80_808, PRIME_LIMIT).unwrap();
		let text = c.to_string();
		assert!(text.contains("k = 80808"));
		assert!(text.contains("blocks"));
	}
}
