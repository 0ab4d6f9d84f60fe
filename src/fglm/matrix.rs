//! The sparse FGLM matrix in its modular, CRT-accumulated and rational form.
//!
//! Only the rows of the multiplication matrix that are not unit vectors are stored densely.
//! The other rows are determined by the staircase and are described by a [MatrixStructure],
//! which is shared by all primes of a lift.

use std::{fmt::Display, ops::Index};

use crate::domains::{
    finite_field::{is_prime_u64, Zp64},
    integer::{Integer, IntegerRing, Z},
    rational::{RationalField, Q},
    Ring,
};

use super::{try_collect, LiftError};

/// A row of the full `ncols x ncols` multiplication matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowDescriptor {
    /// Row `row` is determined by the staircase and has a single one at `position`.
    Trivial { row: u32, position: u32 },
    /// Row `row` is stored densely and is written to slot `destination`.
    Dense { row: u32, destination: u32 },
}

/// The sparsity pattern of an FGLM matrix: `nrows` dense rows of length `ncols`
/// and `ncols - nrows` trivial rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatrixStructure {
    nrows: u32,
    ncols: u32,
    rows: Vec<RowDescriptor>,
}

impl MatrixStructure {
    /// Create a new structure from a list of row descriptors.
    pub fn new(nrows: u32, ncols: u32, rows: Vec<RowDescriptor>) -> Result<Self, LiftError> {
        if ncols < nrows {
            return Err(LiftError::InvalidShape(format!(
                "{} dense rows do not fit in {} columns",
                nrows, ncols
            )));
        }

        if (nrows as usize).checked_mul(ncols as usize).is_none() {
            return Err(LiftError::InvalidShape(format!(
                "{}x{} entries do not fit in memory",
                nrows, ncols
            )));
        }

        let n_dense = rows
            .iter()
            .filter(|r| matches!(r, RowDescriptor::Dense { .. }))
            .count();
        let n_trivial = rows.len() - n_dense;

        if n_dense != nrows as usize || n_trivial != (ncols - nrows) as usize {
            return Err(LiftError::InvalidShape(format!(
                "expected {} dense and {} trivial rows, found {} and {}",
                nrows,
                ncols - nrows,
                n_dense,
                n_trivial
            )));
        }

        Ok(MatrixStructure { nrows, ncols, rows })
    }

    /// Create a structure from the parallel index arrays of the trivial rows
    /// (`trivial_index`, `trivial_position`) and dense rows (`dense_index`, `destination`).
    pub fn from_parallel(
        nrows: u32,
        ncols: u32,
        trivial_index: &[u32],
        trivial_position: &[u32],
        dense_index: &[u32],
        destination: &[u32],
    ) -> Result<Self, LiftError> {
        if trivial_index.len() != trivial_position.len() {
            return Err(LiftError::InvalidShape(format!(
                "{} trivial row indices but {} positions",
                trivial_index.len(),
                trivial_position.len()
            )));
        }
        if dense_index.len() != destination.len() {
            return Err(LiftError::InvalidShape(format!(
                "{} dense row indices but {} destinations",
                dense_index.len(),
                destination.len()
            )));
        }

        let rows = trivial_index
            .iter()
            .zip(trivial_position)
            .map(|(&row, &position)| RowDescriptor::Trivial { row, position })
            .chain(
                dense_index
                    .iter()
                    .zip(destination)
                    .map(|(&row, &destination)| RowDescriptor::Dense { row, destination }),
            )
            .collect();

        Self::new(nrows, ncols, rows)
    }

    /// Return the trivial row indices, trivial positions, dense row indices and destinations
    /// as parallel arrays.
    pub fn to_parallel(&self) -> (Vec<u32>, Vec<u32>, Vec<u32>, Vec<u32>) {
        let (trivial_index, trivial_position) = self.trivial_rows().unzip();
        let (dense_index, destination) = self.dense_rows().unzip();
        (trivial_index, trivial_position, dense_index, destination)
    }

    #[inline]
    pub fn nrows(&self) -> u32 {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> u32 {
        self.ncols
    }

    /// The number of densely stored entries, `nrows * ncols`.
    #[inline]
    pub fn dense_len(&self) -> usize {
        self.nrows as usize * self.ncols as usize
    }

    pub fn rows(&self) -> &[RowDescriptor] {
        &self.rows
    }

    /// Iterate over the `(row, position)` pairs of the trivial rows.
    pub fn trivial_rows(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rows.iter().filter_map(|r| match r {
            RowDescriptor::Trivial { row, position } => Some((*row, *position)),
            RowDescriptor::Dense { .. } => None,
        })
    }

    /// Iterate over the `(row, destination)` pairs of the dense rows.
    pub fn dense_rows(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rows.iter().filter_map(|r| match r {
            RowDescriptor::Dense { row, destination } => Some((*row, *destination)),
            RowDescriptor::Trivial { .. } => None,
        })
    }
}

/// An FGLM matrix with dense entries in the ring `F`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FglmMatrix<F: Ring> {
    pub(crate) structure: MatrixStructure,
    pub(crate) data: Vec<F::Element>,
    pub(crate) field: F,
}

/// The image of an FGLM matrix modulo a word-sized prime.
pub type ModularMatrix = FglmMatrix<Zp64>;
/// An FGLM matrix whose entries are residues modulo the running modulus of a lift.
pub type CrtMatrix = FglmMatrix<IntegerRing>;
/// An FGLM matrix with reconstructed rational entries.
pub type RationalMatrix = FglmMatrix<RationalField>;

impl<F: Ring> FglmMatrix<F> {
    #[inline]
    pub fn nrows(&self) -> u32 {
        self.structure.nrows
    }

    #[inline]
    pub fn ncols(&self) -> u32 {
        self.structure.ncols
    }

    /// The number of dense entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn structure(&self) -> &MatrixStructure {
        &self.structure
    }

    /// The dense entries in row-major order.
    pub fn data(&self) -> &[F::Element] {
        &self.data
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    /// Get the dense entry in row `row` and column `col`, if it exists.
    pub fn get(&self, row: u32, col: u32) -> Option<&F::Element> {
        if row >= self.nrows() || col >= self.ncols() {
            return None;
        }
        self.data
            .get(row as usize * self.ncols() as usize + col as usize)
    }

    /// Create a matrix with the same structure and every dense entry set to zero in `field`.
    fn zeros_like<G: Ring>(&self, field: G) -> Result<FglmMatrix<G>, LiftError> {
        Ok(FglmMatrix {
            structure: self.structure.clone(),
            data: try_collect(self.len(), |_| field.zero())?,
            field,
        })
    }
}

impl<F: Ring> Index<(u32, u32)> for FglmMatrix<F> {
    type Output = F::Element;

    /// Get the `i`th row and `j`th column of the dense block, where `index=(i,j)`.
    #[inline]
    fn index(&self, index: (u32, u32)) -> &Self::Output {
        &self.data[index.0 as usize * self.ncols() as usize + index.1 as usize]
    }
}

impl<F: Ring> Display for FglmMatrix<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, row) in self.data.chunks(self.ncols().max(1) as usize).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str("{")?;
            for (j, e) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(",")?;
                }
                self.field.fmt_element(e, f)?;
            }
            f.write_str("}")?;
        }
        f.write_str("}")
    }
}

impl ModularMatrix {
    /// Create the image of an FGLM matrix modulo the odd prime `prime` from
    /// row-major residues in `[0, prime)`.
    pub fn from_residues(
        structure: MatrixStructure,
        prime: u64,
        residues: Vec<u64>,
    ) -> Result<ModularMatrix, LiftError> {
        if prime == 2 || !is_prime_u64(prime) {
            return Err(LiftError::InvalidPrime(prime));
        }

        if residues.len() != structure.dense_len() {
            return Err(LiftError::DimensionMismatch {
                expected: structure.dense_len(),
                found: residues.len(),
            });
        }

        if let Some((index, &residue)) = residues.iter().enumerate().find(|(_, r)| **r >= prime) {
            return Err(LiftError::ResidueOutOfRange {
                index,
                residue,
                prime,
            });
        }

        let field = Zp64::new(prime);
        let data = try_collect(residues.len(), |i| field.to_element(residues[i]))?;

        Ok(FglmMatrix {
            structure,
            data,
            field,
        })
    }

    #[inline]
    pub fn prime(&self) -> u64 {
        self.field.get_prime()
    }

    /// Get the `index`th dense entry as a residue in `[0, p)`.
    #[inline]
    pub fn residue(&self, index: usize) -> u64 {
        self.field.from_element(&self.data[index])
    }

    /// Iterate over the dense entries as residues in `[0, p)`.
    pub fn residues(&self) -> impl Iterator<Item = u64> + '_ {
        self.data.iter().map(|e| self.field.from_element(e))
    }
}

impl CrtMatrix {
    /// Start a lift from the first modular image. The entries are the residues
    /// modulo the first prime.
    pub fn from_modular(image: &ModularMatrix) -> Result<CrtMatrix, LiftError> {
        Ok(FglmMatrix {
            structure: image.structure.clone(),
            data: try_collect(image.len(), |i| Integer::from(image.residue(i)))?,
            field: Z,
        })
    }
}

impl RationalMatrix {
    /// Create the rational matrix of a lift with all entries set to `0/1`.
    pub fn from_modular(image: &ModularMatrix) -> Result<RationalMatrix, LiftError> {
        image.zeros_like(Q)
    }

    /// Check if every entry reduces to the corresponding entry of `image`.
    /// Returns `false` when a denominator is divisible by the prime of the image.
    pub fn agrees_with(&self, image: &ModularMatrix) -> Result<bool, LiftError> {
        if self.structure != image.structure {
            return Err(LiftError::StructureMismatch);
        }

        Ok(self
            .data
            .iter()
            .zip(&image.data)
            .all(|(q, e)| q.try_to_finite_field(&image.field).as_ref() == Some(e)))
    }
}
