//! The state of a single multi-modular lift.

use tracing::{debug, instrument};

use crate::domains::{integer::Integer, rational::RationalReconstruction};

use super::{
    crt::CrtAccumulator,
    matrix::{CrtMatrix, ModularMatrix, RationalMatrix},
    reconstruct::{reconstruct_dense_entries, ResumeCursor, ScanOutcome},
    LiftError,
};

/// Settings for a [MultiModularLift].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LiftSettings {
    /// The number of threads used to fold in new images.
    pub n_threads: usize,
    /// Write the reconstruction progress to stderr.
    pub verbose: bool,
}

impl Default for LiftSettings {
    fn default() -> Self {
        LiftSettings {
            n_threads: 1,
            verbose: false,
        }
    }
}

/// A lift of an FGLM matrix over the rationals from its images modulo several primes.
///
/// The lift does not decide how many primes to use: the caller adds images
/// with [add_image](MultiModularLift::add_image) and attempts a reconstruction with
/// [reconstruct](MultiModularLift::reconstruct) until it is complete.
pub struct MultiModularLift<R: RationalReconstruction> {
    crt: CrtMatrix,
    rational: RationalMatrix,
    modulus: Integer,
    cursor: ResumeCursor,
    primes: Vec<u64>,
    accumulator: CrtAccumulator,
    reconstructor: R,
    settings: LiftSettings,
}

impl<R: RationalReconstruction> MultiModularLift<R> {
    /// Start a new lift from the image of the matrix modulo the first prime.
    pub fn new(
        first: &ModularMatrix,
        settings: LiftSettings,
        reconstructor: R,
    ) -> Result<MultiModularLift<R>, LiftError> {
        debug!(
            "Starting lift of a {}x{} matrix with prime {}",
            first.nrows(),
            first.ncols(),
            first.prime()
        );

        Ok(MultiModularLift {
            crt: CrtMatrix::from_modular(first)?,
            rational: RationalMatrix::from_modular(first)?,
            modulus: Integer::from(first.prime()),
            cursor: ResumeCursor::new(),
            primes: vec![first.prime()],
            accumulator: CrtAccumulator::new(settings.n_threads)?,
            reconstructor,
            settings,
        })
    }

    /// Fold the image modulo a new prime into the lift.
    #[instrument(skip_all, fields(prime = image.prime()))]
    pub fn add_image(&mut self, image: &ModularMatrix) -> Result<(), LiftError> {
        let product = Integer::from(&self.modulus * image.prime());
        self.accumulator
            .accumulate(&mut self.crt, image, &self.modulus, &product)?;
        self.modulus = product;
        self.primes.push(image.prime());

        debug!(
            "Modulus has {} bits after {} primes",
            self.modulus.significant_bits(),
            self.primes.len()
        );
        Ok(())
    }

    /// Attempt to reconstruct the rational matrix with the current modulus,
    /// resuming from the previous scan.
    pub fn reconstruct(&mut self) -> Result<ScanOutcome, LiftError> {
        let outcome = reconstruct_dense_entries(
            &mut self.rational,
            &self.crt,
            &self.modulus,
            &self.reconstructor,
            self.cursor,
        )?;
        self.cursor = outcome.cursor;

        if self.settings.verbose {
            if let Some(p) = &outcome.progress {
                p.emit();
            }
        }

        Ok(outcome)
    }

    /// Check the reconstructed matrix against the image modulo a prime
    /// that was not used in the lift.
    pub fn verify(&self, image: &ModularMatrix) -> Result<bool, LiftError> {
        if self.primes.contains(&image.prime()) {
            return Err(LiftError::NonCoprimeModulus(image.prime()));
        }
        self.rational.agrees_with(image)
    }

    /// Forget all confirmed entries, so that the next scan reconstructs
    /// every entry again. Use this after a failed [verify](MultiModularLift::verify).
    pub fn restart_scan(&mut self) {
        debug!("Restarting scan at cursor {}", self.cursor.position());
        self.cursor.reset();
    }

    /// Returns `true` iff all entries have been reconstructed.
    pub fn is_complete(&self) -> bool {
        self.cursor.position() == self.crt.len()
    }

    /// The product of all primes in the lift.
    pub fn modulus(&self) -> &Integer {
        &self.modulus
    }

    pub fn cursor(&self) -> ResumeCursor {
        self.cursor
    }

    /// The primes of the lift, in the order they were added.
    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    pub fn settings(&self) -> &LiftSettings {
        &self.settings
    }

    pub fn crt_matrix(&self) -> &CrtMatrix {
        &self.crt
    }

    pub fn rational_matrix(&self) -> &RationalMatrix {
        &self.rational
    }

    pub fn into_rational_matrix(self) -> RationalMatrix {
        self.rational
    }
}

#[cfg(test)]
mod test {
    use crate::{
        domains::{integer::Integer, rational::BoundedReconstruction},
        fglm::{
            lift::{LiftSettings, MultiModularLift},
            matrix::{MatrixStructure, ModularMatrix},
            LiftError,
        },
    };

    fn structure() -> MatrixStructure {
        MatrixStructure::from_parallel(2, 3, &[0], &[2], &[1, 2], &[0, 1]).unwrap()
    }

    #[test]
    fn repeated_prime() {
        let first = ModularMatrix::from_residues(structure(), 7, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut lift =
            MultiModularLift::new(&first, LiftSettings::default(), BoundedReconstruction::new())
                .unwrap();

        assert_eq!(lift.add_image(&first), Err(LiftError::NonCoprimeModulus(7)));
        assert_eq!(lift.modulus(), &Integer::from(7));
        assert_eq!(lift.primes(), &[7]);
        assert_eq!(lift.verify(&first), Err(LiftError::NonCoprimeModulus(7)));
    }

    #[test]
    fn is_complete_tracks_cursor() {
        let first = ModularMatrix::from_residues(structure(), 1000003, vec![1, 2, 3, 4, 5, 6])
            .unwrap();
        let settings = LiftSettings {
            n_threads: 2,
            verbose: true,
        };
        let mut lift = MultiModularLift::new(&first, settings, BoundedReconstruction::new()).unwrap();

        assert!(!lift.is_complete());
        let outcome = lift.reconstruct().unwrap();
        assert!(outcome.is_complete());
        assert!(lift.is_complete());
        assert_eq!(lift.settings().n_threads, 2);
        assert_eq!(lift.crt_matrix().data(), &[1, 2, 3, 4, 5, 6]);

        lift.restart_scan();
        assert!(!lift.is_complete());
        assert_eq!(lift.cursor().position(), 0);
    }
}
