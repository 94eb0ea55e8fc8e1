use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the codec and its building blocks.
///
/// Construction preconditions (bad primes, failed regularity) and misuse
/// (encoding before committing parameters, oversized messages) are hard
/// errors. Reed-Solomon decode failures inside the iterative decoder are
/// *not* surfaced through this type; they only degrade the `ok` flag that
/// `decode` returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("legendre symbol ({p}/{q}) is not -1")]
	LegendreNotMinusOne { p: usize, q: usize },
	#[error("the ({p}, {q}) cayley graph is not ramanujan")]
	BlacklistedPair { p: usize, q: usize },
	#[error("graph for ({p}, {q}) failed the regularity check")]
	NotRamanujan { p: usize, q: usize },
	#[error("no parameter set satisfies the requested rate and epsilon")]
	NoParameters,
	#[error("codec used before parameters were committed")]
	ParamsNotChosen,
	#[error("candidate index {index} out of range ({len} candidates)")]
	CandidateOutOfRange { index: usize, len: usize },
	#[error("message of {len} bytes exceeds code dimension k = {k}")]
	MessageTooLong { len: usize, k: usize },
	#[error("codeword blocks must all be {expected} bytes, block {index} has {got}")]
	BlockLengthMismatch { index: usize, expected: usize, got: usize },
	#[error("malformed codeword bytes: {0}")]
	MalformedCodeword(&'static str),
	#[error("erased block index {index} out of range ({n} blocks)")]
	ErasureOutOfRange { index: usize, n: usize },

	// reed-solomon primitive
	#[error("reed-solomon message of {len} symbols does not fit in GF(2^8)")]
	RsMessageLength { len: usize },
	#[error("more erasures than check symbols")]
	RsTooManyErasures,
	#[error("error count exceeds correction capacity")]
	RsTooManyErrors,
	#[error("could not locate errors")]
	RsLocatorFailure,
	#[error("correction left a non-zero syndrome")]
	RsCorrectionFailure,
}
