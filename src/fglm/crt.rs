//! Folding new modular images into the CRT matrix of a lift.

use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use tracing::{debug, instrument};

use crate::domains::{
    finite_field::{FiniteFieldElement, ToFiniteField, Zp64},
    integer::Integer,
    Ring,
};

use super::{
    matrix::{CrtMatrix, ModularMatrix},
    LiftError,
};

/// Combine `a mod modulus` with `b mod p` into the unique `x` in `[0, modulus * p)`
/// with Garner's algorithm, where `field` is `Z/pZ` and `modulus_inv` is the inverse of
/// `modulus` in `field`. The result overwrites `a`.
#[inline]
pub fn chinese_remainder_u64(
    a: &mut Integer,
    b: &FiniteFieldElement<u64>,
    modulus: &Integer,
    field: &Zp64,
    modulus_inv: &FiniteFieldElement<u64>,
) {
    let a_p = a.to_finite_field(field);
    let v = field.from_element(&field.mul(&field.sub(b, &a_p), modulus_inv));
    if v != 0 {
        *a += Integer::from(modulus * v);
    }
}

/// Folds modular images into a [CrtMatrix], splitting the dense entries
/// over a fixed number of worker threads.
pub struct CrtAccumulator {
    n_threads: usize,
    pool: Option<ThreadPool>,
}

impl CrtAccumulator {
    /// Create an accumulator that uses `n_threads` workers. With a single thread,
    /// no pool is created and the entries are processed on the calling thread.
    pub fn new(n_threads: usize) -> Result<CrtAccumulator, LiftError> {
        let n_threads = n_threads.max(1);

        let pool = if n_threads > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(n_threads)
                    .build()
                    .map_err(|e| LiftError::ThreadPool(e.to_string()))?,
            )
        } else {
            None
        };

        Ok(CrtAccumulator { n_threads, pool })
    }

    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    /// Update every entry `a` of `crt`, a residue modulo `modulus`, to the unique
    /// `x` in `[0, product)` with `x = a mod modulus` and `x = b mod p`, where `b` is the
    /// corresponding entry of `image` and `product = modulus * p`.
    ///
    /// The caller is responsible for advancing the running modulus to `product` afterwards.
    #[instrument(skip_all, fields(prime = image.prime(), entries = crt.len()))]
    pub fn accumulate(
        &self,
        crt: &mut CrtMatrix,
        image: &ModularMatrix,
        modulus: &Integer,
        product: &Integer,
    ) -> Result<(), LiftError> {
        if crt.structure != image.structure {
            debug!("Image structure differs from the lift");
            return Err(LiftError::StructureMismatch);
        }

        let p = image.prime();
        if Integer::from(modulus * p) != *product {
            return Err(LiftError::ModulusMismatch);
        }

        let field = &image.field;
        let modulus_inv = field
            .try_inv(&modulus.to_finite_field(field))
            .ok_or(LiftError::NonCoprimeModulus(p))?;

        let fold = |entries: &mut [Integer], residues: &[FiniteFieldElement<u64>]| {
            for (a, b) in entries.iter_mut().zip(residues) {
                chinese_remainder_u64(a, b, modulus, field, &modulus_inv);
            }
        };

        match &self.pool {
            Some(pool) => {
                // static partition: one contiguous range per worker
                let chunk_size = ((crt.len() + self.n_threads - 1) / self.n_threads).max(1);
                debug!("Folding in chunks of {}", chunk_size);
                pool.install(|| {
                    crt.data
                        .par_chunks_mut(chunk_size)
                        .zip(image.data.par_chunks(chunk_size))
                        .for_each(|(entries, residues)| fold(entries, residues));
                });
            }
            None => fold(&mut crt.data, &image.data),
        }

        debug_assert!(crt.data.iter().all(|x| *x >= 0 && x < product));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::{
        domains::{
            finite_field::{PrimeIteratorU64, Zp64},
            integer::Integer,
        },
        fglm::{
            crt::{chinese_remainder_u64, CrtAccumulator},
            matrix::{CrtMatrix, MatrixStructure, ModularMatrix},
            LiftError,
        },
    };

    fn structure() -> MatrixStructure {
        MatrixStructure::from_parallel(2, 3, &[0], &[2], &[1, 2], &[0, 1]).unwrap()
    }

    #[test]
    fn garner_step() {
        let field = Zp64::new(11);
        let modulus = Integer::from(7);
        let inv = field.inv(&field.to_element(7));

        let mut a = Integer::from(3);
        chinese_remainder_u64(&mut a, &field.to_element(5), &modulus, &field, &inv);
        assert_eq!(a, 38);
    }

    #[test]
    fn identity_image() {
        let first = ModularMatrix::from_residues(structure(), 7, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let second = ModularMatrix::from_residues(structure(), 11, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut crt = CrtMatrix::from_modular(&first).unwrap();

        let acc = CrtAccumulator::new(1).unwrap();
        acc.accumulate(&mut crt, &second, &Integer::from(7), &Integer::from(77))
            .unwrap();
        assert_eq!(crt.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(crt.structure(), &structure());
    }

    #[test]
    fn random_images() {
        let mut rng = StdRng::seed_from_u64(7);
        let primes: Vec<u64> = PrimeIteratorU64::new(1 << 62).take(4).collect();

        let images: Vec<_> = primes
            .iter()
            .map(|&p| {
                let residues = (0..6).map(|_| rng.gen_range(0..p)).collect();
                ModularMatrix::from_residues(structure(), p, residues).unwrap()
            })
            .collect();

        let single = CrtAccumulator::new(1).unwrap();
        let multi = CrtAccumulator::new(4).unwrap();
        assert_eq!(multi.n_threads(), 4);

        let mut crt_single = CrtMatrix::from_modular(&images[0]).unwrap();
        let mut crt_multi = crt_single.clone();
        let mut modulus = Integer::from(primes[0]);

        for image in &images[1..] {
            let product = Integer::from(&modulus * image.prime());
            single
                .accumulate(&mut crt_single, image, &modulus, &product)
                .unwrap();
            multi
                .accumulate(&mut crt_multi, image, &modulus, &product)
                .unwrap();
            modulus = product;
        }

        assert_eq!(crt_single, crt_multi);

        for x in crt_single.data() {
            assert!(*x >= 0 && *x < modulus);
        }
        for image in &images {
            for (x, b) in crt_single.data().iter().zip(image.residues()) {
                assert_eq!(Integer::from(x % image.prime()), b);
            }
        }
    }

    #[test]
    fn precondition_violations() {
        let first = ModularMatrix::from_residues(structure(), 7, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut crt = CrtMatrix::from_modular(&first).unwrap();
        let acc = CrtAccumulator::new(2).unwrap();

        let other = MatrixStructure::from_parallel(2, 3, &[0], &[1], &[1, 2], &[0, 1]).unwrap();
        let unlucky = ModularMatrix::from_residues(other, 11, vec![0; 6]).unwrap();
        assert_eq!(
            acc.accumulate(&mut crt, &unlucky, &Integer::from(7), &Integer::from(77)),
            Err(LiftError::StructureMismatch)
        );

        assert_eq!(
            acc.accumulate(&mut crt, &first, &Integer::from(7), &Integer::from(49)),
            Err(LiftError::NonCoprimeModulus(7))
        );

        let second = ModularMatrix::from_residues(structure(), 11, vec![0; 6]).unwrap();
        assert_eq!(
            acc.accumulate(&mut crt, &second, &Integer::from(7), &Integer::from(78)),
            Err(LiftError::ModulusMismatch)
        );

        // failed calls leave the entries untouched
        assert_eq!(crt.data(), &[1, 2, 3, 4, 5, 6]);
    }
}
