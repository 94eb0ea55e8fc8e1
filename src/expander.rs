//! The expander interleaver.
//!
//! Blocks enter on the left side of the bipartite expander and every
//! symbol travels along one edge, so a burst hitting one output block is
//! spread across `delta` different input blocks on the way back. Block
//! erasures are rewritten into per-block symbol erasures in the same pass.
//!
//! Neighbor order is ascending by vertex id on both sides; together with
//! the id-ascending side arrays this makes decode the exact inverse of
//! encode, slot by slot.

use crate::graph::Graph;

/// Scatter `n` blocks from the left side and collect them on the right.
pub fn encode_expander(graph: &Graph, blocks: &[Vec<u8>]) -> Vec<Vec<u8>> {
	let delta = graph.degree();
	let nn = graph.num_nodes();
	assert_eq!(blocks.len(), nn / 2);

	let mut mid = vec![vec![0u8; delta]; nn];
	let mut filled = vec![0u16; nn];
	let mut nbrs: Vec<u32> = Vec::with_capacity(delta);

	for (i, block) in blocks.iter().enumerate() {
		assert_eq!(block.len(), delta);
		nbrs.clear();
		nbrs.extend_from_slice(graph.neighbors_of(graph.left()[i] as usize));
		nbrs.sort_unstable();
		for (j, &nb) in nbrs.iter().enumerate() {
			let nb = nb as usize;
			mid[nb][filled[nb] as usize] = block[j];
			filled[nb] += 1;
		}
	}

	graph.right().iter().map(|&r| std::mem::take(&mut mid[r as usize])).collect()
}

/// Mirror of [`encode_expander`], right to left.
///
/// `erasures` are indices of fully erased right-side blocks; the second
/// return value lists, for every recovered left block, the slots whose
/// symbol came out of an erased block.
pub fn decode_expander(
	graph: &Graph,
	blocks: &[Vec<u8>],
	erasures: &[usize],
) -> (Vec<Vec<u8>>, Vec<Vec<usize>>) {
	let delta = graph.degree();
	let nn = graph.num_nodes();
	assert_eq!(blocks.len(), nn / 2);

	let mut erased = vec![false; nn / 2];
	for &e in erasures {
		erased[e] = true;
	}

	let mut out = vec![vec![0u8; delta]; nn];
	let mut slot_erasures: Vec<Vec<usize>> = vec![Vec::new(); nn];
	let mut filled = vec![0u16; nn];
	let mut nbrs: Vec<u32> = Vec::with_capacity(delta);

	for (i, block) in blocks.iter().enumerate() {
		assert_eq!(block.len(), delta);
		nbrs.clear();
		nbrs.extend_from_slice(graph.neighbors_of(graph.right()[i] as usize));
		nbrs.sort_unstable();
		for (j, &nb) in nbrs.iter().enumerate() {
			let nb = nb as usize;
			let slot = filled[nb] as usize;
			out[nb][slot] = block[j];
			filled[nb] += 1;
			if erased[i] {
				slot_erasures[nb].push(slot);
			}
		}
	}

	let word = graph.left().iter().map(|&l| std::mem::take(&mut out[l as usize])).collect();
	let word_erasures =
		graph.left().iter().map(|&l| std::mem::take(&mut slot_erasures[l as usize])).collect();
	(word, word_erasures)
}
