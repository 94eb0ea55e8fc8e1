//! The inner code on the Ramanujan graph.
//!
//! Every byte of the word lives on one edge and is seen by its two
//! endpoints. Encoding gives each vertex a Reed-Solomon checksum over its
//! incident edge symbols, then armors that checksum with a second, much
//! stronger code. Decoding walks the graph: any vertex whose neighborhood
//! is mostly clean repairs all of its edges at once, and the expansion of
//! the graph drags the remaining corruption down geometrically.

use crate::graph::Graph;
use crate::reed_solomon::RsCodec;

/// Per-vertex code sizes derived from `t = gamma' * d`, which the
/// parameter solver guarantees to be a positive integer.
///
/// `codeword_len` is `L = 4t`; `first_red` is `t` rounded up to even
/// (matching the reference sizing `round(gamma' * d + 0.5)` under
/// round-half-to-even); the armor code takes the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerSizes {
	pub t: usize,
	pub codeword_len: usize,
	pub first_red: usize,
	pub second_red: usize,
}

impl InnerSizes {
	pub fn new(degree: usize, gamma_tag: f64) -> InnerSizes {
		let t = (gamma_tag * degree as f64).round() as usize;
		debug_assert!(t >= 1, "gamma' * d must round to a positive integer");
		let codeword_len = 4 * t;
		let first_red = t + (t & 1);
		InnerSizes { t, codeword_len, first_red, second_red: codeword_len - first_red }
	}
}

/// Edge indices incident to each vertex, in the canonical edge order.
/// Encode slots and decode slots agree because both sides scan this.
fn incident_edges(graph: &Graph) -> Vec<u32> {
	let d = graph.degree();
	let nn = graph.num_nodes();
	let mut ev = vec![0u32; nn * d];
	let mut filled = vec![0u16; nn];
	for (i, (u, v)) in graph.edges().enumerate() {
		for &node in &[u as usize, v as usize] {
			ev[node * d + filled[node] as usize] = i as u32;
			filled[node] += 1;
		}
	}
	ev
}

/// Systematic encode: `word || per-vertex armored checksums`.
///
/// `word` must have exactly one byte per graph edge; output length is
/// `M + N * L`.
pub fn encode_ramanujan(graph: &Graph, word: &[u8], gamma_tag: f64) -> Vec<u8> {
	let m = graph.num_edges();
	let d = graph.degree();
	let nn = graph.num_nodes();
	assert_eq!(word.len(), m, "left code word must cover every edge");

	// fan the edge symbols into per-vertex vectors
	let mut vertices = vec![0u8; nn * d];
	let mut filled = vec![0u16; nn];
	for ((u, v), &sym) in graph.edges().zip(word.iter()) {
		for &node in &[u as usize, v as usize] {
			vertices[node * d + filled[node] as usize] = sym;
			filled[node] += 1;
		}
	}

	let sizes = InnerSizes::new(d, gamma_tag);
	let rs1 = RsCodec::new(sizes.first_red);
	let rs2 = RsCodec::new(sizes.second_red);

	let mut out = Vec::with_capacity(m + nn * sizes.codeword_len);
	out.extend_from_slice(word);
	for v in 0..nn {
		// the checksum is the non-systematic tail of the first code, the
		// second code wraps it to full strength
		let checked = rs1
			.encode(&vertices[v * d..(v + 1) * d])
			.and_then(|c1| rs2.encode(&c1[d..]))
			.expect("the solver keeps inner code lengths within GF(2^8); qed");
		out.extend_from_slice(&checked);
	}
	out
}

/// Iterative decode. `redundancies` holds one `L`-byte chunk per vertex.
///
/// Returns the repaired word and whether every vertex finished cleanly;
/// callers may use the word best-effort when the flag is false.
pub fn decode_ramanujan(
	graph: &Graph,
	word: Vec<u8>,
	redundancies: &[Vec<u8>],
	gamma_tag: f64,
) -> (Vec<u8>, bool) {
	let m = graph.num_edges();
	let d = graph.degree();
	let nn = graph.num_nodes();
	assert_eq!(word.len(), m);
	assert_eq!(redundancies.len(), nn);

	let sizes = InnerSizes::new(d, gamma_tag);
	let rs1 = RsCodec::new(sizes.first_red);
	let rs2 = RsCodec::new(sizes.second_red);
	let mut word = word;

	let mut finished = vec![false; nn];
	let mut ok = true;

	// unwrap the per-vertex checksums; a vertex whose armor fails is out
	// of the game but the rest of the decode continues without it
	let mut checks: Vec<Vec<u8>> = Vec::with_capacity(nn);
	for (v, red) in redundancies.iter().enumerate() {
		match rs2.decode(red, &[]) {
			Ok((msg, _)) => checks.push(msg),
			Err(_) => {
				ok = false;
				finished[v] = true;
				checks.push(Vec::new());
			}
		}
	}

	let ev = incident_edges(graph);
	let mut queue: Vec<u32> = graph.left().to_vec();
	let mut queued = vec![false; nn];
	let mut first_pass = true;
	let mut candidate = vec![0u8; d + sizes.first_red];
	let mut round = 0usize;

	while !queue.is_empty() {
		let mut next: Vec<u32> = Vec::new();
		let mut repaired = 0usize;

		for i in 0..queue.len() {
			let x = queue[i] as usize;
			queued[x] = false;
			if finished[x] {
				continue;
			}
			let edges_of_x = &ev[x * d..(x + 1) * d];
			for (j, &e) in edges_of_x.iter().enumerate() {
				candidate[j] = word[e as usize];
			}
			candidate[d..].copy_from_slice(&checks[x]);

			let (repaired_syms, errata) = match rs1.decode(&candidate, &[]) {
				Ok(r) => r,
				// too dirty this round, a neighbor may requeue us later
				Err(_) => continue,
			};
			if errata.iter().any(|&pos| pos >= d) {
				// the checksum corrected itself, don't trust the result
				continue;
			}

			for (j, &e) in edges_of_x.iter().enumerate() {
				word[e as usize] = repaired_syms[j];
			}
			finished[x] = true;
			repaired += 1;
			for &nb in graph.neighbors_of(x) {
				if !queued[nb as usize] {
					queued[nb as usize] = true;
					next.push(nb);
				}
			}
		}

		tracing::trace!(round, queued = queue.len(), repaired, "left decode round");
		round += 1;

		if first_pass {
			// the A pass only seeds edge repairs; propagation proper
			// starts from the full B side, not from A's neighbor set
			for &nb in &next {
				queued[nb as usize] = false;
			}
			queue = graph.right().to_vec();
			first_pass = false;
		} else {
			queue = next;
		}
	}

	let ok = ok && finished.iter().all(|&f| f);
	(word, ok)
}
