//! Prime and Legendre-symbol utilities backing the graph construction.

use std::collections::BTreeMap;

use crate::errors::{Error, Result};

/// Pairs for which the Cayley construction empirically fails the
/// regularity check. Every solver path must reject them.
pub const NOT_RAMANUJAN_PAIRS: &[(usize, usize)] = &[(193, 13)];

/// Primes `<= limit` congruent to 1 mod 4, ascending.
pub fn primes_1_mod_4(limit: usize) -> Vec<usize> {
	if limit < 2 {
		return Vec::new();
	}
	// sieve of eratosthenes
	let mut sieve = vec![true; limit + 1];
	sieve[0] = false;
	sieve[1] = false;
	let mut start = 2;
	while start * start <= limit {
		if sieve[start] {
			let mut multiple = start * start;
			while multiple <= limit {
				sieve[multiple] = false;
				multiple += start;
			}
		}
		start += 1;
	}
	(2..=limit).filter(|&n| sieve[n] && n % 4 == 1).collect()
}

fn mod_pow(base: u64, mut exp: u64, modulus: u64) -> u64 {
	let mut base = base % modulus;
	let mut acc: u64 = 1;
	while exp > 0 {
		if exp & 1 == 1 {
			acc = ((acc as u128 * base as u128) % modulus as u128) as u64;
		}
		base = ((base as u128 * base as u128) % modulus as u128) as u64;
		exp >>= 1;
	}
	acc
}

/// The Legendre symbol as a residue: `q^((p-1)/2) mod p`.
pub fn legendre(p: usize, q: usize) -> usize {
	mod_pow(q as u64, (p as u64 - 1) / 2, p as u64) as usize
}

/// `true` iff `(p/q) = -1`, i.e. the symbol above equals `p - 1`.
pub fn legendre_is_minus_one(p: usize, q: usize) -> bool {
	legendre(p, q) == p - 1
}

/// Precondition check shared by the graph builder and the solvers.
pub fn check_pair(p: usize, q: usize) -> Result<()> {
	if NOT_RAMANUJAN_PAIRS.contains(&(p, q)) {
		return Err(Error::BlacklistedPair { p, q });
	}
	if !legendre_is_minus_one(p, q) {
		return Err(Error::LegendreNotMinusOne { p, q });
	}
	Ok(())
}

/// A valid `(p, q)` pair together with the code dimension
/// `k = q(q^2 - 1)(p + 1) / 2` it induces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairEntry {
	pub p: usize,
	pub q: usize,
	pub k: usize,
}

/// All valid pairs below a prime limit, plus the two adjacency maps the
/// solvers enumerate over.
///
/// `ps_for_q` only lists `p` with `p + 1 < q(q^2 - 1)` (the graph must
/// have more vertices than its degree); `qs_for_p` carries no such bound,
/// callers that need one check it against their own block counts.
#[derive(Debug, Clone)]
pub struct PairTable {
	/// sorted ascending by `k`
	pub entries: Vec<PairEntry>,
	pub ps_for_q: BTreeMap<usize, Vec<usize>>,
	pub qs_for_p: BTreeMap<usize, Vec<usize>>,
}

// the first eight primes 1 mod 4 give degrees <= 62; the expansion
// guarantee needs d > 64
const SMALL_PRIME_CUTOFF: usize = 8;

impl PairTable {
	pub fn build(prime_limit: usize) -> PairTable {
		let primes = primes_1_mod_4(prime_limit);
		let large_primes = &primes[primes.len().min(SMALL_PRIME_CUTOFF)..];

		let mut entries = Vec::new();
		let mut ps_for_q = BTreeMap::new();
		let mut qs_for_p = BTreeMap::new();

		for &q in &primes {
			let nodes = q * (q * q - 1);
			let ps: Vec<usize> = large_primes
				.iter()
				.copied()
				.filter(|&p| check_pair(p, q).is_ok() && p + 1 < nodes)
				.collect();
			for &p in &ps {
				entries.push(PairEntry { p, q, k: nodes * (p + 1) / 2 });
			}
			ps_for_q.insert(q, ps);
		}

		for &p in large_primes {
			let qs: Vec<usize> =
				primes.iter().copied().filter(|&q| check_pair(p, q).is_ok()).collect();
			qs_for_p.insert(p, qs);
		}

		entries.sort_by_key(|e| e.k);
		tracing::debug!(pairs = entries.len(), prime_limit, "built prime pair table");
		PairTable { entries, ps_for_q, qs_for_p }
	}

	/// Smallest entry whose code dimension is at least `k`.
	pub fn smallest_k_at_least(&self, k: usize) -> Option<&PairEntry> {
		self.entries.iter().find(|e| e.k >= k)
	}
}
