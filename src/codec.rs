//! The assembled codec: left code, per-block Reed-Solomon, interleaver.
//!
//! A [`Codec`] is created for a target `(epsilon, rate)` pair, commits to
//! one solver candidate, and from then on encodes `k`-byte messages into
//! `n` blocks of `delta` bytes. Graphs are built once per `(p, q)` pair
//! and cached behind `Arc`, so clones of a warmed-up codec share them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::expander::{decode_expander, encode_expander};
use crate::graph::{ramanujan, Graph};
use crate::left_code::{decode_ramanujan, encode_ramanujan, InnerSizes};
use crate::params::{choose_params, choose_params_by_code_dimension, ParamSet};
use crate::reed_solomon::RsCodec;

/// Solver knobs; the defaults mirror the reference parameter search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecOptions {
	pub eps_dist: f64,
	pub r_dist: f64,
	pub prime_limit: usize,
	pub max_k: usize,
}

impl Default for CodecOptions {
	fn default() -> Self {
		CodecOptions { eps_dist: 0.1, r_dist: 0.1, prime_limit: 200, max_k: 15_000_000 }
	}
}

/// An encoded message: `n` blocks of `delta` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codeword {
	block_len: usize,
	blocks: Vec<Vec<u8>>,
}

impl Codeword {
	pub fn block_len(&self) -> usize {
		self.block_len
	}

	pub fn num_blocks(&self) -> usize {
		self.blocks.len()
	}

	pub fn blocks(&self) -> &[Vec<u8>] {
		&self.blocks
	}

	/// Mutable block access, for channel simulation and tests.
	pub fn blocks_mut(&mut self) -> &mut [Vec<u8>] {
		&mut self.blocks
	}

	/// Wire format: 4-byte little-endian block length, then the raw
	/// blocks back to back. No framing, no trailer; the block count is
	/// recovered from the total length.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(4 + self.blocks.len() * self.block_len);
		out.extend_from_slice(&(self.block_len as u32).to_le_bytes());
		for block in &self.blocks {
			out.extend_from_slice(block);
		}
		out
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Codeword> {
		if bytes.len() < 4 {
			return Err(Error::MalformedCodeword("missing block length header"));
		}
		let mut header = [0u8; 4];
		header.copy_from_slice(&bytes[..4]);
		let block_len = u32::from_le_bytes(header) as usize;
		if block_len == 0 {
			return Err(Error::MalformedCodeword("zero block length"));
		}
		let body = &bytes[4..];
		if body.len() % block_len != 0 {
			return Err(Error::MalformedCodeword("length is not a whole number of blocks"));
		}
		let blocks = body.chunks(block_len).map(|c| c.to_vec()).collect();
		Ok(Codeword { block_len, blocks })
	}
}

/// One-shot encoder/decoder for a committed parameter set.
///
/// Not thread-safe to mutate (the graph cache lives inside), but once the
/// graphs are built a clone can be handed to another thread and both see
/// the same shared graphs.
#[derive(Debug, Clone)]
pub struct Codec {
	epsilon: f64,
	r: f64,
	options: CodecOptions,
	params: Option<ParamSet>,
	graphs: HashMap<(usize, usize), Arc<Graph>>,
}

impl Codec {
	/// A codec aiming for the given gap and rate, nothing committed yet.
	pub fn new(epsilon: f64, r: f64) -> Codec {
		Codec::with_options(epsilon, r, CodecOptions::default())
	}

	pub fn with_options(epsilon: f64, r: f64, options: CodecOptions) -> Codec {
		Codec { epsilon, r, options, params: None, graphs: HashMap::new() }
	}

	/// Adopt an externally solved parameter set, e.g. one returned by
	/// [`crate::params::choose_params_exact`].
	///
	/// Rejects sets whose `n * b` cannot hold the left-code output; the
	/// two in-house solvers never produce such a set, but the exact
	/// solver's padding mode can.
	pub fn with_params(params: ParamSet) -> Result<Codec> {
		let d = params.ramanujan_degree();
		let nodes = params.q_r * (params.q_r * params.q_r - 1);
		let t = (params.epsilon * d as f64 / 32.0).round() as usize;
		if t == 0 || params.b * params.num_blocks() < params.k + nodes * 4 * t {
			return Err(Error::NoParameters);
		}
		Ok(Codec {
			epsilon: params.epsilon,
			r: params.r,
			options: CodecOptions::default(),
			params: Some(params),
			graphs: HashMap::new(),
		})
	}

	/// Solve for the smallest admissible dimension `>= k` and build both
	/// graphs up front.
	pub fn by_code_dimension(k: usize) -> Result<Codec> {
		let options = CodecOptions::default();
		let params = choose_params_by_code_dimension(k, options.prime_limit)?;
		let mut codec = Codec {
			epsilon: params.epsilon,
			r: params.r,
			options,
			params: Some(params),
			graphs: HashMap::new(),
		};
		codec.graph(params.p_r, params.q_r)?;
		codec.graph(params.p_e, params.q_e)?;
		Ok(codec)
	}

	/// Every solver candidate for the requested `(epsilon, r)`, cheapest
	/// dimension first. Empty means the request is unsatisfiable within
	/// the configured tolerances.
	pub fn parameter_options(&self) -> Vec<ParamSet> {
		choose_params(
			self.r,
			self.epsilon,
			self.options.r_dist,
			self.options.eps_dist,
			self.options.prime_limit,
			self.options.max_k,
		)
	}

	/// Commit to one candidate from [`Codec::parameter_options`].
	pub fn choose(&mut self, index: usize) -> Result<()> {
		let candidates = self.parameter_options();
		if index >= candidates.len() {
			return Err(Error::CandidateOutOfRange { index, len: candidates.len() });
		}
		self.params = Some(candidates[index]);
		Ok(())
	}

	pub fn params(&self) -> Option<&ParamSet> {
		self.params.as_ref()
	}

	fn committed(&self) -> Result<ParamSet> {
		self.params.ok_or(Error::ParamsNotChosen)
	}

	fn graph(&mut self, p: usize, q: usize) -> Result<Arc<Graph>> {
		if let Some(g) = self.graphs.get(&(p, q)) {
			return Ok(Arc::clone(g));
		}
		let g = Arc::new(ramanujan(p, q)?);
		self.graphs.insert((p, q), Arc::clone(&g));
		Ok(g)
	}

	/// Encode a message of up to `k` bytes; shorter messages are padded
	/// with zeros.
	pub fn encode(&mut self, message: &[u8]) -> Result<Codeword> {
		let ps = self.committed()?;
		if message.len() > ps.k {
			return Err(Error::MessageTooLong { len: message.len(), k: ps.k });
		}
		let gr = self.graph(ps.p_r, ps.q_r)?;
		let ge = self.graph(ps.p_e, ps.q_e)?;

		let gamma = ps.epsilon / 4.0;
		let gamma_tag = gamma / 8.0;

		let mut word = message.to_vec();
		word.resize(ps.k, 0);
		let u = encode_ramanujan(&gr, &word, gamma_tag);

		let n = ps.num_blocks();
		let b = ps.b;
		let delta = ps.block_len();
		debug_assert!(n * b >= u.len());
		let rs3 = RsCodec::new(delta - b);

		let mut blocks = Vec::with_capacity(n);
		for i in 0..n {
			// the tail block may be partial or missing entirely, pad with zeros
			let lo = (i * b).min(u.len());
			let hi = ((i + 1) * b).min(u.len());
			let mut chunk = u[lo..hi].to_vec();
			chunk.resize(b, 0);
			blocks.push(rs3.encode(&chunk)?);
		}

		tracing::debug!(k = ps.k, n, delta, "encoded message");
		Ok(Codeword { block_len: delta, blocks: encode_expander(&ge, &blocks) })
	}

	/// Decode a codeword, treating the listed block indices as erased.
	///
	/// Returns the recovered word (trimmed to `target_len` when given)
	/// and a flag that is `true` only if every inner decode succeeded.
	/// The word is still the decoder's best effort when the flag is
	/// `false`.
	pub fn decode(
		&mut self,
		codeword: &Codeword,
		erasures: &[usize],
		target_len: Option<usize>,
	) -> Result<(Vec<u8>, bool)> {
		let ps = self.committed()?;
		let n = ps.num_blocks();
		let b = ps.b;
		let delta = ps.block_len();

		if codeword.blocks.len() != n {
			return Err(Error::MalformedCodeword("wrong number of blocks"));
		}
		for (index, block) in codeword.blocks.iter().enumerate() {
			if block.len() != delta {
				return Err(Error::BlockLengthMismatch { index, expected: delta, got: block.len() });
			}
		}
		for &e in erasures {
			if e >= n {
				return Err(Error::ErasureOutOfRange { index: e, n });
			}
		}

		let gr = self.graph(ps.p_r, ps.q_r)?;
		let ge = self.graph(ps.p_e, ps.q_e)?;

		let gamma = ps.epsilon / 4.0;
		let gamma_tag = gamma / 8.0;

		let (u_blocks, slot_erasures) = decode_expander(&ge, &codeword.blocks, erasures);

		let rs3 = RsCodec::new(delta - b);
		let mut word = Vec::with_capacity(n * b);
		for i in 0..n {
			match rs3.decode(&u_blocks[i], &slot_erasures[i]) {
				Ok((msg, _)) => word.extend_from_slice(&msg),
				Err(_) => {
					// best effort: keep the systematic prefix, blank out
					// the erased slots in a fresh buffer
					let mut prefix = u_blocks[i][..b].to_vec();
					for &ep in &slot_erasures[i] {
						if ep < b {
							prefix[ep] = 0;
						}
					}
					word.extend_from_slice(&prefix);
				}
			}
		}

		// re-split: word part, then one L-byte armored checksum per vertex,
		// sized exactly like the encoder sized them
		let m = gr.num_edges();
		let nn = gr.num_nodes();
		let l = InnerSizes::new(gr.degree(), gamma_tag).codeword_len;
		let word_part = word[..m].to_vec();
		let checks: Vec<Vec<u8>> =
			(0..nn).map(|v| word[m + v * l..m + (v + 1) * l].to_vec()).collect();

		let (decoded, ok) = decode_ramanujan(&gr, word_part, &checks, gamma_tag);
		tracing::debug!(n, erased = erasures.len(), ok, "decoded codeword");

		let out = match target_len {
			Some(t) => decoded[..t.min(decoded.len())].to_vec(),
			None => decoded,
		};
		Ok((out, ok))
	}

	/// How much loss the committed code can absorb, from
	/// `erasures + 2 * errors <= (1 - r - epsilon) * n`.
	///
	/// Given a number of errors and erasures already accounted for,
	/// returns how many more of the other kind fit: maximum additional
	/// errors alongside `erasures`, and maximum additional erasures
	/// alongside `errors`.
	pub fn correction_capacity(&self, errors: usize, erasures: usize) -> Result<(usize, usize)> {
		let ps = self.committed()?;
		let n = ps.num_blocks();
		let budget = (ps.correctable_fraction() * n as f64).floor() as usize;
		let max_errors = budget.saturating_sub(erasures) / 2;
		let max_erasures = budget.saturating_sub(2 * errors);
		Ok((max_errors, max_erasures))
	}
}
