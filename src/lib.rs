//! Exact rational lifting of FGLM multiplication matrices.
//!
//! A polynomial system solver computes the multiplication matrix of a zero-dimensional
//! quotient algebra modulo a sequence of word-sized primes. This crate accumulates
//! these images with the Chinese remainder theorem and recovers the rational entries
//! with rational reconstruction, see [fglm].
//!
//! For example:
//!
//! ```
//! use fglm_lift::{
//!     domains::{integer::Integer, rational::{BoundedReconstruction, RationalReconstruction}},
//! };
//!
//! let m = Integer::from(1000003);
//! let q = BoundedReconstruction::new().reconstruct(&Integer::from(250000), &m);
//! assert_eq!(q.unwrap().to_string(), "-3/4");
//! ```
pub mod domains;
pub mod fglm;
