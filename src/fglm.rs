//! Multi-modular lifting of sparse FGLM multiplication matrices.
//!
//! A lift starts from the image of the matrix modulo a first prime. Every new
//! prime image is folded into a [CrtMatrix](matrix::CrtMatrix) with the Chinese remainder theorem,
//! after which a [RationalMatrix](matrix::RationalMatrix) is (partially) recovered with rational
//! reconstruction. The reconstruction scan is resumable: the entries that were recovered
//! in a previous round are trusted until the scan fails, which is tracked in a
//! [ResumeCursor](reconstruct::ResumeCursor).
//!
//! For example:
//! ```
//! use fglm_lift::{
//!     domains::rational::{BoundedReconstruction, Rational},
//!     fglm::{
//!         lift::{LiftSettings, MultiModularLift},
//!         matrix::{MatrixStructure, ModularMatrix},
//!     },
//! };
//!
//! let structure = MatrixStructure::from_parallel(1, 2, &[0], &[1], &[1], &[1]).unwrap();
//! // the entries -3/2 and 1/3 modulo two primes
//! let first = ModularMatrix::from_residues(structure.clone(), 1000003, vec![500000, 666669]).unwrap();
//! let second = ModularMatrix::from_residues(structure, 1000033, vec![500015, 666689]).unwrap();
//!
//! let mut lift =
//!     MultiModularLift::new(&first, LiftSettings::default(), BoundedReconstruction::new()).unwrap();
//! lift.add_image(&second).unwrap();
//! assert!(lift.reconstruct().unwrap().is_complete());
//! assert_eq!(lift.rational_matrix().data()[0], Rational::from((-3, 2)));
//! ```
pub mod crt;
pub mod lift;
pub mod matrix;
pub mod reconstruct;

/// Errors that can occur while lifting a matrix.
///
/// Not being able to reconstruct every entry yet is not an error:
/// it is reported by [ScanOutcome](reconstruct::ScanOutcome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiftError {
    /// The sparsity data does not describe a valid matrix.
    InvalidShape(String),
    /// A modular image has a different sparsity pattern than the first image of the lift.
    StructureMismatch,
    /// The modulus of an image is not an odd prime.
    InvalidPrime(u64),
    /// A residue is not reduced modulo the prime.
    ResidueOutOfRange { index: usize, residue: u64, prime: u64 },
    /// The number of dense entries does not match the shape.
    DimensionMismatch { expected: usize, found: usize },
    /// The prime divides the running modulus, for example because it was used before.
    NonCoprimeModulus(u64),
    /// The supplied product is not the running modulus times the prime.
    ModulusMismatch,
    /// The dense entries could not be allocated.
    OutOfMemory(usize),
    /// The worker pool could not be created.
    ThreadPool(String),
}

impl std::fmt::Display for LiftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiftError::InvalidShape(reason) => write!(f, "Invalid matrix shape: {}", reason),
            LiftError::StructureMismatch => write!(
                f,
                "The sparsity pattern of the image does not match the lift: the prime is unlucky"
            ),
            LiftError::InvalidPrime(p) => write!(f, "{} is not an odd prime", p),
            LiftError::ResidueOutOfRange {
                index,
                residue,
                prime,
            } => write!(
                f,
                "Residue {} at position {} is not reduced modulo {}",
                residue, index, prime
            ),
            LiftError::DimensionMismatch { expected, found } => write!(
                f,
                "Expected {} dense entries, found {}",
                expected, found
            ),
            LiftError::NonCoprimeModulus(p) => {
                write!(f, "The prime {} divides the running modulus", p)
            }
            LiftError::ModulusMismatch => {
                write!(f, "The product is not the running modulus times the prime")
            }
            LiftError::OutOfMemory(n) => write!(f, "Could not allocate {} dense entries", n),
            LiftError::ThreadPool(e) => write!(f, "Could not create the thread pool: {}", e),
        }
    }
}

impl std::error::Error for LiftError {}

/// Allocate a vector of `len` entries generated by `f`, failing
/// with [LiftError::OutOfMemory] instead of aborting.
pub(crate) fn try_collect<T>(len: usize, f: impl FnMut(usize) -> T) -> Result<Vec<T>, LiftError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| LiftError::OutOfMemory(len))?;
    v.extend((0..len).map(f));
    Ok(v)
}
