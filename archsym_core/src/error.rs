use thiserror::Error;

/// Everything that can go wrong while building or querying groups.
///
/// Programmer errors (mixed-degree composition, applying a permutation to a
/// point outside its degree, taking the degree of an empty permutation set)
/// panic instead, they are bugs in the caller rather than conditions to
/// recover from.
#[derive(Debug, Error)]
pub enum Error {
    /// An explicit image vector does not describe a bijection on `1..=n`.
    #[error("image vector is not a bijection on 1..={degree}")]
    InvalidImage { degree: usize },

    /// An operation mixed objects of different degrees.
    #[error("degree mismatch: expected {expected}, got {got}")]
    DegreeMismatch { expected: usize, got: usize },

    /// A point lies outside `1..=degree`.
    #[error("point {point} out of range 1..={degree}")]
    OutOfRange { point: usize, degree: usize },

    /// The argument set of a restriction is not invariant under the
    /// permutation.
    #[error("set is not closed under the permutation")]
    NotClosed,

    /// The solvable-group construction ran out of commutator steps, the
    /// generators do not generate a solvable group.
    #[error("generators do not generate a solvable group")]
    NotSolvable,

    /// The randomized Schreier-Sims construction exhausted its attempt cap.
    #[error("randomized Schreier-Sims did not converge within {attempts} attempts")]
    SchreierSimsDivergence { attempts: usize },

    /// An out-of-scope code path was hit.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A representative query ran against an invalidated cache.
    #[error("representative cache is invalid, call init_repr() first")]
    CacheInvalid,

    /// The architecture description did not parse.
    #[error(transparent)]
    Parse(#[from] Box<pest::error::Error<crate::loader::Rule>>),
}

pub type Result<T> = std::result::Result<T, Error>;
